//! Implementation of `quarry search`.

use std::process::ExitCode;

use quarry_query::QueryNode;
use serde_json::Value;

use super::input::read_input;
use crate::cli::{
    args::SearchCommand,
    context::CommandContext,
    output::{RankedHit, output_hits},
};

/// Runs a JSON query against the index and prints the ranked hits.
pub fn run(ctx: &mut CommandContext, cmd: &SearchCommand) -> ExitCode {
    let query = match read_query(cmd) {
        Ok(query) => query,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let limit = cmd.limit.unwrap_or(ctx.config.search.default_limit);
    let service = match ctx.service() {
        Ok(service) => service,
        Err(code) => return code,
    };

    let hits = if cmd.explain.explain {
        service.explain_top(&query, limit).map(|explained| {
            explained
                .into_iter()
                .enumerate()
                .map(|(i, (hit, explanation))| {
                    let tree = serde_json::to_value(&explanation).unwrap_or(Value::Null);
                    RankedHit::new(i, hit, Some(tree))
                })
                .collect::<Vec<_>>()
        })
    } else {
        service.search_docs(&query, limit).map(|hits| {
            hits.into_iter()
                .enumerate()
                .map(|(i, hit)| RankedHit::new(i, hit, None))
                .collect()
        })
    };

    match hits {
        Ok(hits) => output_hits(&query, &hits, cmd.output.json),
        Err(e) => {
            eprintln!("error: search failed: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Reads and parses the query document.
fn read_query(cmd: &SearchCommand) -> Result<QueryNode, String> {
    let contents = read_input(&cmd.query)
        .map_err(|e| format!("failed to read {}: {e}", cmd.query.display()))?;
    serde_json::from_str(&contents)
        .map_err(|e| format!("invalid query in {}: {e}", cmd.query.display()))
}
