use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::tool::USER_DATA_DIR;

/// Get the home directory
pub fn home_dir() -> Result<PathBuf> {
    directories::BaseDirs::new()
        .context("Failed to get home directory")
        .map(|bd| bd.home_dir().to_path_buf())
}

/// Get the persisted settings directory for the updater
///
/// Returns `~/.claude-code-updater`
pub fn user_data_dir(home: &Path) -> PathBuf {
    home.join(USER_DATA_DIR)
}

/// Get the settings file inside the user data directory
pub fn config_file(home: &Path) -> PathBuf {
    user_data_dir(home).join("config.toml")
}

/// Root that absolute system locations (e.g. `/usr/local/bin`) hang off
pub fn system_root() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("C:\\")
    } else {
        PathBuf::from("/")
    }
}
