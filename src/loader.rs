//! Config file discovery and loading.
//!
//! Handles finding the tool config file across different platforms and
//! loading it. The search order is:
//!
//! 1. `$XDG_CONFIG_HOME/ansibleconnect/config.toml`
//! 2. `~/.config/ansibleconnect/config.toml`
//! 3. Platform default (e.g., `~/Library/Application Support` on macOS)
//!
//! Unlike an explicit `--config` path, a missing default file is not an
//! error: every setting has a default.

use crate::config::Config;
use crate::error::{ConnectError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "ansibleconnect";
const CONFIG_FILE: &str = "config.toml";

/// Find an existing config file, if any.
///
/// Checks locations in order of preference:
/// 1. `$XDG_CONFIG_HOME/ansibleconnect/config.toml` (if XDG_CONFIG_HOME is set)
/// 2. `~/.config/ansibleconnect/config.toml`
/// 3. Platform default via `dirs::config_dir()`
pub fn default_config_path() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        candidates.push(PathBuf::from(xdg).join(APP_DIR).join(CONFIG_FILE));
    }
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".config").join(APP_DIR).join(CONFIG_FILE));
    }
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join(APP_DIR).join(CONFIG_FILE));
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Load and parse a config file from the given path.
///
/// # Errors
///
/// - [`ConnectError::ConfigNotFound`] if the file doesn't exist
/// - [`ConnectError::IoError`] if reading fails
/// - [`ConnectError::ParseError`] if TOML parsing fails
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(ConnectError::ConfigNotFound(path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(path)?;
    let config = contents.parse::<Config>()?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Load config from the default path, or defaults when there is none.
pub fn load_default_config() -> Result<Config> {
    match default_config_path() {
        Some(path) => load_config(&path),
        None => {
            debug!("no config file found, using defaults");
            Ok(Config::default())
        }
    }
}
