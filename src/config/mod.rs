//! Configuration module for Typeahead-RS
//!
//! Handles loading settings from YAML files and environment variables.

mod settings;

pub use settings::*;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit settings file
pub const SETTINGS_PATH_VAR: &str = "TYPEAHEAD_SETTINGS_PATH";

/// Default locations searched for a settings file, in order
pub fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("typeahead.yml"),
        PathBuf::from("config/typeahead.yml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("typeahead-rs/typeahead.yml"));
    }
    paths
}

/// Find the settings file to use, if any
///
/// An existing file named by `TYPEAHEAD_SETTINGS_PATH` wins over the
/// default locations.
pub fn locate() -> Option<PathBuf> {
    std::env::var(SETTINGS_PATH_VAR)
        .ok()
        .map(PathBuf::from)
        .into_iter()
        .chain(default_paths())
        .find(|path| path.exists())
}

/// Load settings from `path` (or defaults), then apply environment overrides
pub fn load_from(path: Option<&Path>) -> Result<Settings> {
    let mut settings = match path {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };
    settings.merge_env();
    Ok(settings)
}

/// Load settings from the first file found by [`locate`]
pub fn load() -> Result<Settings> {
    load_from(locate().as_deref())
}
