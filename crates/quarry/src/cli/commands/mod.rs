//! Command implementations and dispatch.

pub mod add;
pub mod check;
pub mod init;
mod input;
pub mod search;

use std::process::ExitCode;

use super::{args::Commands, context::CommandContext};

/// Dispatches to the selected subcommand.
pub fn run(command: Commands, ctx: &mut CommandContext) -> ExitCode {
    match command {
        Commands::Init(cmd) => init::run(ctx, &cmd),
        Commands::Check => check::run(ctx),
        Commands::Add(cmd) => add::run(ctx, &cmd),
        Commands::Search(cmd) => search::run(ctx, &cmd),
    }
}
