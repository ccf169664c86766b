//! Clap argument definitions for the `quarry` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI options.
#[derive(Parser)]
#[command(name = "quarry")]
#[command(about = "Book search with computed relevance scores")]
pub struct Cli {
    /// Verbosity level (-v for progress, -vv for per-search details)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Shared output mode flags.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Shared explain flag.
#[derive(Args, Debug, Clone, Default)]
pub struct ExplainArgs {
    /// Show how each hit's score was computed
    #[arg(long)]
    pub explain: bool,
}

/// Arguments for `quarry init`.
#[derive(Args, Debug, Clone)]
pub struct InitCommand {
    /// Overwrite existing configuration file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for `quarry add`.
#[derive(Args, Debug, Clone)]
pub struct AddCommand {
    /// JSON-lines file with one {"title", "isbn"} object per line, or - for stdin
    pub file: PathBuf,
}

/// Arguments for `quarry search`.
#[derive(Args, Debug, Clone)]
pub struct SearchCommand {
    /// JSON query file, or - for stdin
    pub query: PathBuf,

    /// Maximum hits to return [default: 10]
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Output format flags.
    #[command(flatten)]
    pub output: OutputArgs,

    /// Explain flag.
    #[command(flatten)]
    pub explain: ExplainArgs,
}

/// Supported `quarry` subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Initialize quarry configuration in current directory
    Init(InitCommand),

    /// Validate configuration and scoring bindings
    Check,

    /// Index books from a JSON-lines file and commit them
    Add(AddCommand),

    /// Search the index with a JSON query
    #[command(after_help = "\
QUERY FORMAT:
  \"match_all\"                                      Every book
  {\"match\": {\"field\": \"title\", \"text\": \"lucene\"}}  Analyzed title text
  {\"term\": {\"field\": \"isbn\", \"term\": {\"string\": \"55063554A\"}}}
                                                   Exact ISBN
  {\"boolean\": {\"clauses\": [{\"should\": Q}, {\"must_not\": Q}],
               \"minimum_should_match\": 1}}
  {\"constant_score\": {\"query\": Q, \"boost\": 2.0}}
  {\"boosted\": {\"query\": Q, \"boost\": 2.0}}

EXAMPLES:
  quarry search query.json
  echo '\"match_all\"' | quarry search - -n 3
  quarry search query.json --json --explain")]
    Search(SearchCommand),
}

impl Commands {
    /// Whether the command reads the configuration before running.
    ///
    /// `init` must work even when an existing config file is invalid.
    pub fn needs_config(&self) -> bool {
        !matches!(self, Self::Init(_))
    }
}

/// Parses CLI arguments, exiting with clap's message on error.
pub fn parse_cli() -> Cli {
    Cli::parse()
}
