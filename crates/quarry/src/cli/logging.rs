//! Diagnostic logging for the CLI.
//!
//! Library crates emit `tracing` events; the binary installs one formatting
//! subscriber that writes them to stderr, so stdout stays clean for results.

use std::io;

use tracing::{Level, subscriber};
use tracing_subscriber::FmtSubscriber;

/// Maps the `-v` count to the most verbose level shown.
pub fn level_for(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    }
}

/// Installs the global subscriber.
pub fn init(verbose: u8) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level_for(verbose))
        .with_target(false)
        .with_writer(io::stderr)
        .finish();

    if let Err(e) = subscriber::set_global_default(subscriber) {
        eprintln!("warning: could not install logger: {e}");
    }
}
