pub mod achievements;
pub mod config;
pub mod journey;
pub mod measure;
pub mod recipe;
pub mod reward;
pub mod slip;
pub mod stats;
pub mod weight;

use cheatmeter_core::storage::Database;
use cheatmeter_core::tracker::require_active_journey;
use cheatmeter_core::{Config, Journey, WeightUnit};
use serde::Serialize;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Open the store and fetch the journey in progress.
pub fn open_active() -> Result<(Database, Journey), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let journey = require_active_journey(&db)?;
    tracing::debug!(journey = %journey.id, "active journey loaded");
    Ok((db, journey))
}

/// Display unit from settings; falls back to kilograms.
pub fn weight_unit() -> WeightUnit {
    Config::load_or_default().profile.weight_unit
}

/// Format a stored kilogram value in the display unit.
pub fn fmt_weight(unit: WeightUnit, kg: f64) -> String {
    format!("{:.1} {}", unit.from_kg(kg), unit.as_str())
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
