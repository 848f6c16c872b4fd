//! CLI subcommands.

pub mod config;
pub mod generate;

use std::path::{Path, PathBuf};

use cartbill_core::CartBillConfig;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cartbill")
        .join("config.json")
}

/// Config file in effect: the explicit path, else the default location.
pub fn config_path(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load the configuration, falling back to defaults when no file exists.
///
/// An explicitly named file must exist.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<CartBillConfig> {
    match explicit {
        Some(path) => Ok(CartBillConfig::from_file(Path::new(path))?),
        None => Ok(CartBillConfig::load_or_default(&default_config_path())?),
    }
}
