//! Rendering and JSON serialization for CLI output.

use std::process::ExitCode;

use comfy_table::{Cell, CellAlignment, Table, presets::UTF8_FULL_CONDENSED};
use quarry_index::Hit;
use quarry_query::QueryNode;
use serde::Serialize;
use serde_json::Value;

/// ANSI escape codes for terminal output.
mod colors {
    /// Bold text.
    pub const BOLD: &str = "\x1b[1m";
    /// Yellow text.
    pub const YELLOW: &str = "\x1b[33m";
    /// Dim text.
    pub const DIM: &str = "\x1b[2m";
    /// Reset all formatting.
    pub const RESET: &str = "\x1b[0m";
}

/// Formats text as a subheader (bold).
pub fn subheader(text: &str) -> String {
    format!("{}{}{}", colors::BOLD, text, colors::RESET)
}

/// Formats text as dimmed.
pub fn dim(text: &str) -> String {
    format!("{}{}{}", colors::DIM, text, colors::RESET)
}

/// Formats text as a warning (yellow).
pub fn warning(text: &str) -> String {
    format!("{}{}{}", colors::YELLOW, text, colors::RESET)
}

/// One ranked hit, with its explanation when requested.
#[derive(Serialize)]
pub struct RankedHit {
    /// 1-based rank.
    pub rank: usize,
    /// Book title.
    pub title: String,
    /// Book ISBN.
    pub isbn: String,
    /// Computed score.
    pub score: f32,
    /// Score explanation tree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Value>,
}

impl RankedHit {
    /// Builds the entry for the hit at `index` in rank order.
    pub fn new(index: usize, hit: Hit, explanation: Option<Value>) -> Self {
        Self {
            rank: index + 1,
            title: hit.doc.title,
            isbn: hit.doc.isbn,
            score: hit.score,
            explanation,
        }
    }
}

/// JSON output for `quarry search`.
#[derive(Serialize)]
struct JsonSearchOutput<'a> {
    /// The query as parsed.
    query: &'a QueryNode,
    /// Number of hits returned.
    total_hits: usize,
    /// Hits in rank order.
    hits: &'a [RankedHit],
}

/// Prints search hits as JSON or as a table.
pub fn output_hits(query: &QueryNode, hits: &[RankedHit], json: bool) -> ExitCode {
    if json {
        let json_output = JsonSearchOutput {
            query,
            total_hits: hits.len(),
            hits,
        };
        return match serde_json::to_string_pretty(&json_output) {
            Ok(json_str) => {
                println!("{json_str}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: failed to serialize JSON: {e}");
                ExitCode::FAILURE
            }
        };
    }

    if hits.is_empty() {
        println!("{}", dim("No results found."));
        return ExitCode::SUCCESS;
    }

    println!("{}", hits_table(hits));

    for hit in hits {
        let Some(explanation) = &hit.explanation else {
            continue;
        };
        println!();
        println!("{}", subheader(&format!("#{} {}", hit.rank, hit.title)));
        match serde_json::to_string_pretty(explanation) {
            Ok(tree) => {
                for line in tree.lines() {
                    println!("   {line}");
                }
            }
            Err(e) => {
                eprintln!("error: failed to render explanation: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

/// Lays hits out as a table of rank, score, title and ISBN.
fn hits_table(hits: &[RankedHit]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["#", "Score", "Title", "ISBN"]);
    for hit in hits {
        table.add_row(vec![
            Cell::new(hit.rank).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2}", hit.score)).set_alignment(CellAlignment::Right),
            Cell::new(&hit.title),
            Cell::new(&hit.isbn),
        ]);
    }
    table
}
