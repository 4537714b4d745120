use clap::Subcommand;
use cheatmeter_core::Config;

use super::CmdResult;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "profile.weight_unit", "journey_defaults.reward_amount")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// Set height in the configured height unit (cm, or decimal feet)
    Height {
        value: f64,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> CmdResult {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            println!("ok");
        }
        ConfigAction::Height { value } => {
            let mut config = Config::load()?;
            let unit = config.profile.height_unit;
            let cm = unit.to_cm(value);
            if !cm.is_finite() || cm <= 0.0 {
                return Err(format!("height must be positive, got {value} {}", unit.as_str()).into());
            }
            config.profile.height_cm = cm;
            config.save()?;
            println!("height set to {}", unit.format(cm));
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
