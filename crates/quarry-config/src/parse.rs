//! Configuration file parsing.
//!
//! Parses individual `.quarry.toml` files into `RawConfig` structures whose fields
//! stay optional until every discovered file has been merged.

use std::{fs, path::Path};

use serde::Deserialize;
#[cfg(test)]
use toml::de::Error as TomlError;

use crate::{ConfigError, DerivedBinding, LeafBinding};

/// Raw configuration as parsed directly from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// When true, stop discovery here and ignore parent and global configs.
    pub root: Option<bool>,
    /// `[index]` section.
    pub index: Option<RawIndexSettings>,
    /// `[search]` section.
    pub search: Option<RawSearchSettings>,
    /// `[scoring]` section.
    pub scoring: Option<RawScoringSettings>,
}

/// Raw `[index]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawIndexSettings {
    /// Index directory, relative to the file that declares it.
    pub path: Option<String>,
    /// Stemming language for analyzed fields.
    pub language: Option<String>,
    /// Writer heap budget in bytes.
    pub heap_size: Option<usize>,
}

/// Raw `[search]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSearchSettings {
    /// Hits returned when the caller gives no limit.
    pub default_limit: Option<usize>,
    /// Name of the scoring binding used as the document score.
    pub score: Option<String>,
}

/// Raw `[scoring]` section.
///
/// Bindings are taken as a whole from the closest file that declares any.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawScoringSettings {
    /// `[[scoring.leaf]]` entries.
    pub leaf: Vec<LeafBinding>,
    /// `[[scoring.derived]]` entries.
    pub derived: Vec<DerivedBinding>,
}

/// Parses a configuration file from disk.
pub fn parse_config_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config_str(&contents, path)
}

/// Parses configuration from a TOML string.
///
/// The `path` parameter is used for error reporting.
pub fn parse_config_str(contents: &str, path: &Path) -> Result<RawConfig, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses configuration from a TOML string without path context.
#[cfg(test)]
pub fn parse_config(contents: &str) -> Result<RawConfig, TomlError> {
    toml::from_str(contents)
}

/// Checks if a config file has `root = true` set.
///
/// Returns false if the file cannot be read or parsed.
pub fn is_root_config(path: &Path) -> bool {
    let Ok(contents) = fs::read_to_string(path) else {
        return false;
    };
    let Ok(config) = toml::from_str::<RawConfig>(&contents) else {
        return false;
    };
    config.root == Some(true)
}
