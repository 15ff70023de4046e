//! Subcommands.

pub mod analyze;
pub mod batch;
pub mod config;
mod output;

use std::path::{Path, PathBuf};

use tracing::debug;

use ledgr_core::models::config::LedgrConfig;

/// `<config_dir>/ledgr/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ledgr")
        .join("config.json")
}

/// The explicit path wins, then the default file if present, then defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<LedgrConfig> {
    if let Some(path) = config_path {
        debug!("Loading config from {}", path);
        return Ok(LedgrConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Loading config from {}", default_path.display());
        Ok(LedgrConfig::from_file(&default_path)?)
    } else {
        Ok(LedgrConfig::default())
    }
}
