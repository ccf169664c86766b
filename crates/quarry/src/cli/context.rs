//! Shared context for running CLI commands.

use std::{
    env,
    path::{Path, PathBuf},
    process::ExitCode,
};

use quarry_config::Config;
use quarry_index::{FunctionRegistry, SearchService};
use tracing::debug;

/// Command execution context built once per CLI invocation.
pub struct CommandContext {
    /// Current working directory.
    pub cwd: PathBuf,
    /// Loaded configuration (may be default if no config files found).
    pub config: Config,
    /// Search service opened on first use.
    service: Option<SearchService>,
}

impl CommandContext {
    /// Loads the current directory and configuration.
    pub fn load() -> Result<Self, ExitCode> {
        let cwd = current_dir_or_failure()?;
        let config = load_config_or_failure(&cwd)?;
        debug!(root = ?config.config_root, "loaded configuration");
        Ok(Self {
            cwd,
            config,
            service: None,
        })
    }

    /// Loads only the current directory, skipping configuration parsing.
    ///
    /// Used for `init`, which should work even when an existing config file is invalid.
    pub fn load_cwd_only() -> Result<Self, ExitCode> {
        let cwd = current_dir_or_failure()?;
        Ok(Self {
            cwd,
            config: Config::default(),
            service: None,
        })
    }

    /// Returns the search service, opening the configured index on first use.
    pub fn service(&mut self) -> Result<&SearchService, ExitCode> {
        let service = match self.service.take() {
            Some(service) => service,
            None => open_service_or_failure(&self.config)?,
        };
        Ok(self.service.insert(service))
    }
}

/// Returns the current working directory or exits with a consistent error.
fn current_dir_or_failure() -> Result<PathBuf, ExitCode> {
    env::current_dir().map_err(|e| {
        eprintln!("error: could not determine current directory: {e}");
        ExitCode::FAILURE
    })
}

/// Loads configuration from the provided directory or exits with an error.
fn load_config_or_failure(cwd: &Path) -> Result<Config, ExitCode> {
    Config::load(cwd).map_err(|e| {
        eprintln!("error: failed to load configuration: {e}");
        ExitCode::FAILURE
    })
}

/// Opens the search service with the built-in scoring functions.
fn open_service_or_failure(config: &Config) -> Result<SearchService, ExitCode> {
    SearchService::from_config(config, &FunctionRegistry::builtin()).map_err(|e| {
        eprintln!("error: failed to open index: {e}");
        ExitCode::FAILURE
    })
}
