//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Profile data used by analytics (height, display unit)
//! - Appearance
//! - Defaults offered when starting a new journey
//!
//! Configuration is stored at `~/.config/cheatmeter/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::journey::{CheckpointMetric, RewardType};

const LBS_PER_KG: f64 = 2.204_622_621_8;
const CM_PER_FT: f64 = 30.48;

/// Unit weights are entered and displayed in. Storage is always kilograms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    Kg,
    Lbs,
}

impl WeightUnit {
    pub fn to_kg(&self, value: f64) -> f64 {
        match self {
            WeightUnit::Kg => value,
            WeightUnit::Lbs => value / LBS_PER_KG,
        }
    }

    pub fn from_kg(&self, kg: f64) -> f64 {
        match self {
            WeightUnit::Kg => kg,
            WeightUnit::Lbs => kg * LBS_PER_KG,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lbs => "lbs",
        }
    }
}

/// Unit height is shown in. Storage is always centimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeightUnit {
    Cm,
    Ft,
}

impl HeightUnit {
    pub fn to_cm(&self, value: f64) -> f64 {
        match self {
            HeightUnit::Cm => value,
            HeightUnit::Ft => value * CM_PER_FT,
        }
    }

    pub fn from_cm(&self, cm: f64) -> f64 {
        match self {
            HeightUnit::Cm => cm,
            HeightUnit::Ft => cm / CM_PER_FT,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HeightUnit::Cm => "cm",
            HeightUnit::Ft => "ft",
        }
    }

    /// `175 cm`, or feet and whole inches such as `5'9"`.
    pub fn format(&self, cm: f64) -> String {
        match self {
            HeightUnit::Cm => format!("{cm:.0} cm"),
            HeightUnit::Ft => {
                let inches = (cm / (CM_PER_FT / 12.0)).round() as i64;
                format!("{}'{}\"", inches / 12, inches % 12)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppTheme {
    System,
    Light,
    Dark,
}

/// Personal data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default = "default_weight_unit")]
    pub weight_unit: WeightUnit,
    #[serde(default = "default_gender")]
    pub gender: Gender,
    /// Height in centimetres, used for BMI.
    #[serde(default = "default_height_cm")]
    pub height_cm: f64,
    #[serde(default = "default_height_unit")]
    pub height_unit: HeightUnit,
}

/// UI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_theme")]
    pub theme: AppTheme,
}

/// Values `journey start` falls back to when a flag is omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JourneyDefaults {
    #[serde(default = "default_checkpoint_metric")]
    pub checkpoint_metric: CheckpointMetric,
    #[serde(default = "default_checkpoint_value")]
    pub checkpoint_value: f64,
    #[serde(default = "default_reward_type")]
    pub reward_type: RewardType,
    #[serde(default = "default_one")]
    pub reward_amount: u32,
    #[serde(default = "default_reward_duration_hours")]
    pub reward_duration_hours: u32,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/cheatmeter/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub profile: ProfileConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub journey_defaults: JourneyDefaults,
    #[serde(default)]
    pub has_completed_onboarding: bool,
}

// Default functions
fn default_weight_unit() -> WeightUnit {
    WeightUnit::Kg
}
fn default_gender() -> Gender {
    Gender::Male
}
fn default_height_cm() -> f64 {
    175.0
}
fn default_height_unit() -> HeightUnit {
    HeightUnit::Cm
}
fn default_theme() -> AppTheme {
    AppTheme::System
}
fn default_checkpoint_metric() -> CheckpointMetric {
    CheckpointMetric::AbsoluteKg
}
fn default_checkpoint_value() -> f64 {
    1.0
}
fn default_reward_type() -> RewardType {
    RewardType::Meals
}
fn default_one() -> u32 {
    1
}
fn default_reward_duration_hours() -> u32 {
    2
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            weight_unit: default_weight_unit(),
            gender: default_gender(),
            height_cm: default_height_cm(),
            height_unit: default_height_unit(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
        }
    }
}

impl Default for JourneyDefaults {
    fn default() -> Self {
        Self {
            checkpoint_metric: default_checkpoint_metric(),
            checkpoint_value: default_checkpoint_value(),
            reward_type: default_reward_type(),
            reward_amount: default_one(),
            reward_duration_hours: default_reward_duration_hours(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: ProfileConfig::default(),
            ui: UiConfig::default(),
            journey_defaults: JourneyDefaults::default(),
            has_completed_onboarding: false,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(unknown());
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing and returning defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Same as [`Config::load`], for an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Update a value by dot-separated key without saving.
    ///
    /// The whole tree is re-deserialized, so enum values and integer fields
    /// are type-checked.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Set a config value by key and persist. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.set_value(key, value)?;
        self.save()
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using default configuration");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.profile.weight_unit, WeightUnit::Kg);
        assert_eq!(parsed.journey_defaults.reward_duration_hours, 2);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let parsed: Config = toml::from_str("[profile]\nheight_cm = 182.0\n").unwrap();
        assert_eq!(parsed.profile.height_cm, 182.0);
        assert_eq!(parsed.profile.gender, Gender::Male);
        assert_eq!(parsed.ui.theme, AppTheme::System);
        assert_eq!(parsed.journey_defaults.checkpoint_metric, CheckpointMetric::AbsoluteKg);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("profile.weight_unit").as_deref(), Some("kg"));
        assert_eq!(cfg.get("journey_defaults.reward_amount").as_deref(), Some("1"));
        assert_eq!(cfg.get("has_completed_onboarding").as_deref(), Some("false"));
        assert!(cfg.get("profile.missing_key").is_none());
    }

    #[test]
    fn set_value_updates_enum_and_number() {
        let mut cfg = Config::default();
        cfg.set_value("profile.weight_unit", "lbs").unwrap();
        cfg.set_value("profile.height_cm", "168.5").unwrap();
        cfg.set_value("journey_defaults.checkpoint_metric", "percent").unwrap();
        assert_eq!(cfg.profile.weight_unit, WeightUnit::Lbs);
        assert_eq!(cfg.profile.height_cm, 168.5);
        assert_eq!(cfg.journey_defaults.checkpoint_metric, CheckpointMetric::PercentOfGoal);
    }

    #[test]
    fn set_value_rejects_bad_enum_and_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set_value("ui.theme", "neon"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            cfg.set_value("ui.font", "mono"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(cfg.set_value("profile", "x").is_err());
        assert_eq!(cfg.ui.theme, AppTheme::System);
    }

    #[test]
    fn set_value_rejects_fraction_for_integer_field() {
        let mut cfg = Config::default();
        assert!(cfg.set_value("journey_defaults.reward_amount", "2.5").is_err());
        assert!(cfg.set_value("journey_defaults.reward_amount", "3").is_ok());
        assert_eq!(cfg.journey_defaults.reward_amount, 3);
    }

    #[test]
    fn load_from_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.profile.height_cm, 175.0);

        let mut edited = cfg.clone();
        edited.set_value("ui.theme", "dark").unwrap();
        edited.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().ui.theme, AppTheme::Dark);
    }

    #[test]
    fn weight_unit_conversion_is_symmetric() {
        let lbs = WeightUnit::Lbs.from_kg(80.0);
        assert!((lbs - 176.369_809_7).abs() < 1e-6);
        assert!((WeightUnit::Lbs.to_kg(lbs) - 80.0).abs() < 1e-9);
        assert_eq!(WeightUnit::Kg.to_kg(80.0), 80.0);
    }

    #[test]
    fn height_unit_defaults_to_cm_and_is_settable() {
        let mut cfg = Config::default();
        assert_eq!(cfg.get("profile.height_unit").as_deref(), Some("cm"));
        cfg.set_value("profile.height_unit", "ft").unwrap();
        assert_eq!(cfg.profile.height_unit, HeightUnit::Ft);
        assert!(cfg.set_value("profile.height_unit", "in").is_err());

        let parsed: Config = toml::from_str("[profile]\nheight_cm = 180.0\n").unwrap();
        assert_eq!(parsed.profile.height_unit, HeightUnit::Cm);
    }

    #[test]
    fn height_unit_conversion() {
        assert!((HeightUnit::Ft.to_cm(6.0) - 182.88).abs() < 1e-9);
        assert!((HeightUnit::Ft.from_cm(182.88) - 6.0).abs() < 1e-9);
        assert_eq!(HeightUnit::Cm.to_cm(175.0), 175.0);
        assert_eq!(HeightUnit::Ft.format(175.0), "5'9\"");
        assert_eq!(HeightUnit::Cm.format(175.0), "175 cm");
    }
}
