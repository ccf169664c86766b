//! Configuration validation.
//!
//! Reports non-fatal issues with a loaded configuration. Problems that make the
//! scoring graph unbuildable are reported by the graph itself when it is wired.

use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use crate::Config;

/// A non-fatal warning about the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// No index path is set, so documents do not outlive the process.
    InMemoryIndex,
    /// The score entry point names no binding.
    UnknownScore {
        /// The configured entry point.
        name: String,
    },
    /// A binding that the score entry point never reads.
    UnusedBinding {
        /// Name of the binding.
        name: String,
    },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InMemoryIndex => {
                write!(f, "no index path configured; documents are kept in memory only")
            }
            Self::UnknownScore { name } => {
                write!(f, "score entry point '{name}' is not a scoring binding")
            }
            Self::UnusedBinding { name } => {
                write!(f, "scoring binding '{name}' does not contribute to the score")
            }
        }
    }
}

/// Validates the configuration and returns any warnings.
pub fn validate_config(config: &Config) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    if config.index.path.is_none() {
        warnings.push(ConfigWarning::InMemoryIndex);
    }

    let scoring = &config.scoring;
    let inputs: HashMap<&str, &[String]> = scoring
        .leaf
        .iter()
        .map(|leaf| (leaf.name.as_str(), &[] as &[String]))
        .chain(
            scoring
                .derived
                .iter()
                .map(|derived| (derived.name.as_str(), derived.inputs.as_slice())),
        )
        .collect();

    let entry = config.search.score.as_str();
    if !inputs.contains_key(entry) {
        warnings.push(ConfigWarning::UnknownScore {
            name: entry.to_string(),
        });
        return warnings;
    }

    let mut reachable = HashSet::new();
    let mut pending = vec![entry];
    while let Some(name) = pending.pop() {
        if !reachable.insert(name) {
            continue;
        }
        if let Some(deps) = inputs.get(name) {
            pending.extend(deps.iter().map(String::as_str));
        }
    }

    let declared = scoring
        .leaf
        .iter()
        .map(|leaf| &leaf.name)
        .chain(scoring.derived.iter().map(|derived| &derived.name));
    for name in declared {
        if !reachable.contains(name.as_str()) {
            warnings.push(ConfigWarning::UnusedBinding { name: name.clone() });
        }
    }

    warnings
}
