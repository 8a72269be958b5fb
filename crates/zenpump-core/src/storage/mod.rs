mod config;
pub mod records;

pub use config::{AlertsConfig, Config, FileRoutineStore, RunnerConfig};
pub use records::{export_csv, export_file_name, write_export, Database, ProductionRecord};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/zenpump[-dev]/` based on ZENPUMP_ENV.
///
/// Set ZENPUMP_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("ZENPUMP_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("zenpump-dev")
    } else {
        base_dir.join("zenpump")
    };

    std::fs::create_dir_all(&dir).map_err(ConfigError::DataDir)?;
    Ok(dir)
}
