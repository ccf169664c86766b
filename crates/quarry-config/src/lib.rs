//! Configuration system for quarry.
//!
//! quarry uses TOML configuration files named `.quarry.toml`. Configuration is resolved by
//! walking up the directory tree from the current working directory, collecting any
//! `.quarry.toml` files found, then loading `~/.quarry.toml` as the global config with
//! lowest precedence.
//!
//! Besides index and search settings, the configuration declares the scoring bindings:
//! named leaves that read one stored field of the current document, and derived values
//! that apply a registered function to earlier bindings. With no configuration at all,
//! the bindings score each book by the combined length of its title and ISBN.

#![warn(missing_docs)]

mod discovery;
mod error;
mod merge;
mod parse;
mod resolve;
mod templates;
mod validate;

use std::path::{Path, PathBuf};

pub use discovery::{CONFIG_FILENAME, discover_config_files, global_config_path};
pub use error::ConfigError;
pub use merge::{ParsedConfig, merge_configs};
pub use parse::{
    RawConfig, RawIndexSettings, RawScoringSettings, RawSearchSettings, parse_config_file,
    parse_config_str,
};
pub use resolve::resolve_index_path;
use serde::{Deserialize, Serialize};
pub use templates::local_template;
pub use validate::ConfigWarning;
use validate::validate_config;

/// Default writer heap budget in bytes.
pub const DEFAULT_HEAP_SIZE: usize = 50_000_000;

/// Top-level merged configuration for quarry.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Index settings.
    pub index: IndexSettings,
    /// Search settings.
    pub search: SearchSettings,
    /// Scoring bindings.
    pub scoring: ScoringSettings,
    /// Directory containing the most specific config file.
    pub config_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration by discovering and merging all relevant `.quarry.toml` files.
    ///
    /// Returns `Ok(Config::default())` if no configuration files are found.
    pub fn load(cwd: &Path) -> Result<Self, ConfigError> {
        let config_files = discover_config_files(cwd);
        Self::load_from_files(&config_files)
    }

    /// Loads configuration from a specific list of config file paths.
    ///
    /// Files should be provided in precedence order: highest precedence first.
    pub fn load_from_files(files: &[PathBuf]) -> Result<Self, ConfigError> {
        let parsed = files
            .iter()
            .map(|path| {
                let config = parse_config_file(path)?;
                Ok(ParsedConfig {
                    path: path.clone(),
                    config,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        merge_configs(&parsed)
    }

    /// Validates the configuration and returns any warnings.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        validate_config(self)
    }

    /// Serializes the effective settings to TOML, in the same layout as a
    /// `.quarry.toml` file.
    pub fn settings_to_toml(&self) -> Result<String, ConfigError> {
        let serializable = SerializableSettings {
            index: &self.index,
            search: &self.search,
            scoring: &self.scoring,
        };
        Ok(toml::to_string_pretty(&serializable)?)
    }
}

/// Index settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Absolute index directory; `None` keeps the index in memory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Stemming language for analyzed fields.
    pub language: String,
    /// Writer heap budget in bytes.
    pub heap_size: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            path: None,
            language: String::from("english"),
            heap_size: DEFAULT_HEAP_SIZE,
        }
    }
}

/// Search settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Hits returned when the caller gives no limit.
    pub default_limit: usize,
    /// Name of the scoring binding used as the document score.
    pub score: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: 10,
            score: String::from("weird_score"),
        }
    }
}

/// The storage shape a leaf binding reads a field as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// The field's first value as text.
    String,
    /// Every value of the field as text.
    Strings,
    /// The field's first value as raw bytes.
    Bytes,
    /// Every value of the field as raw bytes.
    BytesList,
}

/// A scoring binding that reads one stored field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LeafBinding {
    /// Binding name.
    pub name: String,
    /// Schema field to read.
    pub field: String,
    /// How to read it.
    pub kind: FieldKind,
}

impl LeafBinding {
    /// Creates a leaf binding.
    pub fn new(name: &str, field: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            field: field.to_string(),
            kind,
        }
    }
}

/// A scoring binding computed from earlier bindings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DerivedBinding {
    /// Binding name.
    pub name: String,
    /// Registered function to apply.
    pub function: String,
    /// Names of the bindings passed as arguments, in order.
    pub inputs: Vec<String>,
}

impl DerivedBinding {
    /// Creates a derived binding.
    pub fn new(name: &str, function: &str, inputs: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            function: function.to_string(),
            inputs: inputs.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

/// The scoring bindings, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoringSettings {
    /// Field-reading bindings.
    pub leaf: Vec<LeafBinding>,
    /// Computed bindings. Each may only read bindings declared before it.
    pub derived: Vec<DerivedBinding>,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            leaf: vec![
                LeafBinding::new("title", "title", FieldKind::String),
                LeafBinding::new("isbn", "isbn", FieldKind::String),
            ],
            derived: vec![
                DerivedBinding::new("title_length", "length", &["title"]),
                DerivedBinding::new("isbn_length", "length", &["isbn"]),
                DerivedBinding::new("weird_score", "sum", &["title_length", "isbn_length"]),
            ],
        }
    }
}

/// Borrowed view of the settings for TOML output.
#[derive(Serialize)]
struct SerializableSettings<'a> {
    /// Index settings.
    index: &'a IndexSettings,
    /// Search settings.
    search: &'a SearchSettings,
    /// Scoring bindings.
    scoring: &'a ScoringSettings,
}
