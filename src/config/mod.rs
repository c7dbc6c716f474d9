//! Configuration loading and parsing.
//!
//! This module provides YAML-based settings for the runner and its task list.

mod error;
mod yaml;

pub use error::ConfigError;
pub use yaml::{Settings, TaskSourceConfig, YamlLoader};

use std::path::{Path, PathBuf};

/// Settings files tried, in order, when no path is given.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["taskmon.local.yaml", "taskmon.yaml"];

/// Pick the settings file to load.
///
/// An explicit path is used as is. Otherwise the first existing entry of
/// [`DEFAULT_CONFIG_FILES`] under `base` wins.
pub fn resolve_config_path(explicit: Option<&Path>, base: &Path) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let candidates: Vec<PathBuf> = DEFAULT_CONFIG_FILES.iter().map(|f| base.join(f)).collect();
    match candidates.iter().find(|p| p.is_file()) {
        Some(found) => {
            tracing::debug!(path = %found.display(), "Using settings file");
            Ok(found.clone())
        }
        None => Err(ConfigError::NotFound { tried: candidates }),
    }
}
