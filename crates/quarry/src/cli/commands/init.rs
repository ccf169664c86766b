//! Implementation of `quarry init`.

use std::{
    fs,
    io::{self, Write},
    path::Path,
    process::ExitCode,
};

use quarry_config::{CONFIG_FILENAME, local_template};

use crate::cli::{args::InitCommand, context::CommandContext, output::subheader};

/// Pattern appended to `.gitignore` for the index directory the template configures.
const INDEX_PATTERN: &str = "index/";

/// Initializes a `.quarry.toml` configuration file.
pub fn run(ctx: &CommandContext, cmd: &InitCommand) -> ExitCode {
    let config_path = ctx.cwd.join(CONFIG_FILENAME);

    if config_path.exists() && !cmd.force {
        eprintln!(
            "error: configuration file already exists: {}",
            config_path.display()
        );
        eprintln!("use --force to overwrite");
        return ExitCode::FAILURE;
    }

    let template = local_template();
    if let Err(e) = fs::write(&config_path, &template) {
        eprintln!("error: failed to write {}: {e}", config_path.display());
        return ExitCode::FAILURE;
    }

    println!("Created {}", config_path.display());
    println!();
    println!("{}", subheader("Next steps:"));
    println!("   quarry add books.jsonl");
    println!("   quarry search query.json");

    if let Err(e) = update_gitignore(&config_path) {
        eprintln!("warning: could not update .gitignore: {e}");
    }

    ExitCode::SUCCESS
}

/// Adds the index directory to `.gitignore` if it exists and doesn't already contain it.
fn update_gitignore(config_path: &Path) -> io::Result<()> {
    let Some(parent) = config_path.parent() else {
        return Ok(());
    };

    let gitignore_path = parent.join(".gitignore");
    if !gitignore_path.exists() {
        return Ok(());
    }

    let contents = fs::read_to_string(&gitignore_path)?;
    let bare = INDEX_PATTERN.trim_end_matches('/');
    if contents
        .lines()
        .map(str::trim)
        .any(|line| line == INDEX_PATTERN || line == bare || line == "/index/")
    {
        return Ok(());
    }

    let mut file = fs::OpenOptions::new().append(true).open(&gitignore_path)?;
    if !contents.is_empty() && !contents.ends_with('\n') {
        writeln!(file)?;
    }
    writeln!(file, "{INDEX_PATTERN}")?;
    println!("Added {INDEX_PATTERN} to .gitignore");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gitignore_gains_index_once() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILENAME);
        let gitignore = dir.path().join(".gitignore");
        fs::write(&gitignore, "target").unwrap();

        update_gitignore(&config_path).unwrap();
        update_gitignore(&config_path).unwrap();
        assert_eq!(fs::read_to_string(&gitignore).unwrap(), "target\nindex/\n");
    }

    #[test]
    fn missing_gitignore_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        update_gitignore(&dir.path().join(CONFIG_FILENAME)).unwrap();
        assert!(!dir.path().join(".gitignore").exists());
    }
}
