//! Implementation of `quarry check`.

use std::process::ExitCode;

use quarry_config::{ConfigWarning, discover_config_files};
use quarry_index::{FunctionRegistry, IndexSchema, ScoringGraph};

use crate::cli::{
    context::CommandContext,
    output::{dim, subheader, warning},
};

/// Shows configuration files, scoring bindings, index status, and validation warnings.
pub fn run(ctx: &mut CommandContext) -> ExitCode {
    let config_files = discover_config_files(&ctx.cwd);
    if config_files.is_empty() {
        println!("{}", dim("No configuration files found."));
        println!();
        println!(
            "Run {} to create a configuration file.",
            subheader("quarry init")
        );
        return ExitCode::SUCCESS;
    }

    println!("{}", subheader("Config files:"));
    for path in &config_files {
        println!("   {}", path.display());
    }
    println!();

    let registry = FunctionRegistry::builtin();
    let graph = match ScoringGraph::from_config(&ctx.config.scoring, &registry) {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("error: invalid scoring bindings: {e}");
            print_function_hint(&registry);
            return ExitCode::FAILURE;
        }
    };

    let score = ctx.config.search.score.clone();
    println!("{}", subheader("Scoring:"));
    for name in graph.names() {
        let kind = graph
            .value_type(name)
            .map(|kind| kind.to_string())
            .unwrap_or_default();
        let marker = if name == score { " <- score" } else { "" };
        println!("   {name} {}{marker}", dim(&format!("({kind})")));
    }
    println!();

    if let Err(e) = graph
        .check_entry(&score)
        .and_then(|()| graph.validate_fields(&IndexSchema::new()))
    {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }

    if let Err(code) = print_index_status(ctx) {
        return code;
    }

    let warnings = ctx.config.validate();
    if warnings.is_empty() {
        println!("No issues found.");
        return ExitCode::SUCCESS;
    }

    println!("{}", subheader(&format!("Warnings ({}):", warnings.len())));
    for w in &warnings {
        println!("   {}", warning(&w.to_string()));
    }
    println!();
    print_hints(&warnings);

    ExitCode::FAILURE
}

/// Prints where the index lives and, if it exists, how many documents it holds.
fn print_index_status(ctx: &mut CommandContext) -> Result<(), ExitCode> {
    println!("{}", subheader("Index:"));
    match ctx.config.index.path.clone() {
        None => println!("   {}", dim("(in memory)")),
        Some(path) if !path.join("meta.json").exists() => {
            println!("   {} {}", path.display(), dim("(not created yet)"));
        }
        Some(path) => {
            let docs = ctx.service()?.num_docs();
            println!("   {} {}", path.display(), dim(&format!("({docs} documents)")));
        }
    }
    println!();
    Ok(())
}

/// Lists the functions derived bindings may use.
fn print_function_hint(registry: &FunctionRegistry) {
    let names: Vec<&str> = registry.names().collect();
    println!(
        "{}",
        dim(&format!("Hint: available functions: {}", names.join(", ")))
    );
}

/// Prints hints for resolving common warnings.
fn print_hints(warnings: &[ConfigWarning]) {
    for w in warnings {
        match w {
            ConfigWarning::InMemoryIndex => {
                println!("{}", dim("Hint: set [index] path in .quarry.toml"));
            }
            ConfigWarning::UnknownScore { .. } => {
                println!(
                    "{}",
                    dim("Hint: point [search] score at a [[scoring.derived]] name")
                );
            }
            ConfigWarning::UnusedBinding { .. } => {}
        }
    }
}
