mod achievements;
mod config;
pub mod database;
mod logbook;
pub mod migrations;
mod recipes;
mod rewards;

pub use config::{
    AppTheme, Config, Gender, HeightUnit, JourneyDefaults, ProfileConfig, UiConfig, WeightUnit,
};
pub use database::Database;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `CHEATMETER_DATA_DIR` overrides the location outright. Otherwise this is
/// `~/.config/cheatmeter[-dev]/`, with the `-dev` suffix when
/// `CHEATMETER_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("CHEATMETER_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("CHEATMETER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("cheatmeter-dev")
            } else {
                base_dir.join("cheatmeter")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
