//! Path resolution for the index location.

use std::path::{Path, PathBuf};

use directories::BaseDirs;

use crate::ConfigError;

/// Resolves a configured index path to an absolute path.
///
/// - Tilde paths (`~/index`) expand to the home directory
/// - Relative paths resolve against `config_dir`, the directory of the declaring file
/// - Absolute paths are returned as-is
///
/// The directory does not have to exist yet; the index creates it on first open.
pub fn resolve_index_path(path: &str, config_dir: &Path) -> Result<PathBuf, ConfigError> {
    let expanded = expand_tilde(path)?;
    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        Ok(config_dir.join(expanded))
    }
}

/// Expands a leading `~` to the home directory.
fn expand_tilde(path: &str) -> Result<PathBuf, ConfigError> {
    if path == "~" {
        return home_dir();
    }

    if let Some(rest) = path.strip_prefix("~/") {
        return Ok(home_dir()?.join(rest));
    }

    Ok(PathBuf::from(path))
}

/// Returns the current user's home directory.
fn home_dir() -> Result<PathBuf, ConfigError> {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDirectory)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_joins_config_dir() {
        let resolved = resolve_index_path("./index", Path::new("/srv/books")).unwrap();
        assert_eq!(resolved, Path::new("/srv/books/./index"));
    }

    #[test]
    fn absolute_unchanged() {
        let resolved = resolve_index_path("/var/quarry", Path::new("/srv/books")).unwrap();
        assert_eq!(resolved, Path::new("/var/quarry"));
    }

    #[test]
    fn tilde_expands() {
        let Some(dirs) = BaseDirs::new() else {
            return;
        };
        let resolved = resolve_index_path("~/index", Path::new("/srv/books")).unwrap();
        assert_eq!(resolved, dirs.home_dir().join("index"));
    }
}
