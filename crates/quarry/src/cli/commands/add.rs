//! Implementation of `quarry add`.

use std::process::ExitCode;

use quarry_index::Doc;
use tracing::info;

use super::input::read_input;
use crate::cli::{args::AddCommand, context::CommandContext, output::warning};

/// Indexes every book in a JSON-lines file, then commits once.
pub fn run(ctx: &mut CommandContext, cmd: &AddCommand) -> ExitCode {
    let contents = match read_input(&cmd.file) {
        Ok(contents) => contents,
        Err(e) => {
            eprintln!("error: failed to read {}: {e}", cmd.file.display());
            return ExitCode::FAILURE;
        }
    };

    let docs = match parse_docs(&contents) {
        Ok(docs) => docs,
        Err(e) => {
            eprintln!("error: {}: {e}", cmd.file.display());
            return ExitCode::FAILURE;
        }
    };

    if docs.is_empty() {
        println!("No documents to add.");
        return ExitCode::SUCCESS;
    }

    if ctx.config.index.path.is_none() {
        eprintln!(
            "{}",
            warning("warning: no index path configured; documents are discarded on exit")
        );
    }

    let service = match ctx.service() {
        Ok(service) => service,
        Err(code) => return code,
    };

    for doc in &docs {
        if let Err(e) = service.add_doc(doc) {
            eprintln!("error: failed to add '{}': {e}", doc.title);
            return ExitCode::FAILURE;
        }
    }
    if let Err(e) = service.commit() {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }

    info!(added = docs.len(), "indexed documents");
    println!(
        "Added {} documents ({} in index)",
        docs.len(),
        service.num_docs()
    );
    ExitCode::SUCCESS
}

/// Parses one document per non-blank line.
fn parse_docs(contents: &str) -> Result<Vec<Doc>, String> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| format!("line {}: invalid document: {e}", i + 1))
        })
        .collect()
}
