//! Configuration merging.
//!
//! Merges multiple `RawConfig` files into a single resolved `Config`.

use std::path::{Path, PathBuf};

use crate::{
    Config, ConfigError, IndexSettings, ScoringSettings, SearchSettings,
    parse::{RawConfig, RawIndexSettings, RawSearchSettings},
    resolve::resolve_index_path,
};

/// A parsed config file with its source path.
pub struct ParsedConfig {
    /// Path to the config file.
    pub path: PathBuf,
    /// Parsed raw configuration.
    pub config: RawConfig,
}

impl ParsedConfig {
    /// Directory holding the config file.
    fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Merges multiple configuration files into a single resolved `Config`.
///
/// Configs are given highest precedence first (closest to the working directory).
///
/// Merge rules:
/// - Scalar settings: first defined value wins
/// - Index path: resolved relative to the file that defines it
/// - Scoring bindings: taken whole from the first file with a `[scoring]` section
pub fn merge_configs(configs: &[ParsedConfig]) -> Result<Config, ConfigError> {
    if configs.is_empty() {
        return Ok(Config::default());
    }

    let index = merge_index_settings(configs)?;
    let search = merge_search_settings(configs);
    let scoring = configs
        .iter()
        .find_map(|parsed| parsed.config.scoring.as_ref())
        .map(|raw| ScoringSettings {
            leaf: raw.leaf.clone(),
            derived: raw.derived.clone(),
        })
        .unwrap_or_default();
    let config_root = configs.first().map(|c| c.dir().to_path_buf());

    Ok(Config {
        index,
        search,
        scoring,
        config_root,
    })
}

/// Merges `[index]` sections.
fn merge_index_settings(configs: &[ParsedConfig]) -> Result<IndexSettings, ConfigError> {
    let mut result = IndexSettings::default();

    // Lowest precedence first so closer files overwrite.
    for parsed in configs.iter().rev() {
        if let Some(ref raw) = parsed.config.index {
            apply_raw_index(&mut result, raw, parsed.dir())?;
        }
    }

    Ok(result)
}

/// Applies one raw `[index]` section, overwriting any present values.
fn apply_raw_index(
    result: &mut IndexSettings,
    raw: &RawIndexSettings,
    config_dir: &Path,
) -> Result<(), ConfigError> {
    if let Some(ref path) = raw.path {
        result.path = Some(resolve_index_path(path, config_dir)?);
    }
    if let Some(ref v) = raw.language {
        result.language = v.clone();
    }
    if let Some(v) = raw.heap_size {
        result.heap_size = v;
    }
    Ok(())
}

/// Merges `[search]` sections.
fn merge_search_settings(configs: &[ParsedConfig]) -> SearchSettings {
    let mut result = SearchSettings::default();

    for parsed in configs.iter().rev() {
        if let Some(ref raw) = parsed.config.search {
            apply_raw_search(&mut result, raw);
        }
    }

    result
}

/// Applies one raw `[search]` section.
fn apply_raw_search(result: &mut SearchSettings, raw: &RawSearchSettings) {
    if let Some(v) = raw.default_limit {
        result.default_limit = v;
    }
    if let Some(ref v) = raw.score {
        result.score = v.clone();
    }
}
