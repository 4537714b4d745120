//! Weight log commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use cheatmeter_core::analytics::TimeRange;
use cheatmeter_core::tracker::record_weight;
use cheatmeter_core::CoreError;

use super::{fmt_weight, open_active, print_json, weight_unit, CmdResult};

#[derive(Subcommand)]
pub enum WeightAction {
    /// Record a weight and collect any rewards it earns
    Log {
        /// Weight, in the configured unit
        weight: f64,
        #[arg(long)]
        note: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// List weight entries, oldest first
    List {
        /// Time range: 1w, 1m, 3m or all
        #[arg(long, default_value = "all")]
        range: TimeRange,
        #[arg(long)]
        json: bool,
    },
    /// Delete a weight entry (earned rewards are kept)
    Delete {
        /// Entry ID
        id: String,
    },
}

pub fn run(action: WeightAction) -> CmdResult {
    let unit = weight_unit();
    let (db, journey) = open_active()?;

    match action {
        WeightAction::Log { weight, note, json } => {
            let outcome = record_weight(&db, &journey.id, unit.to_kg(weight), note, Utc::now())?;
            if json {
                return print_json(&outcome);
            }

            println!("Logged {}", fmt_weight(unit, outcome.entry.weight));
            if !outcome.delta.is_noop() {
                let reward_type = journey.config.reward_type;
                println!(
                    "Checkpoint {} reached! +{} {}",
                    outcome.delta.checkpoint_number,
                    outcome.delta.rewards_to_grant,
                    reward_type.unit_label(outcome.delta.rewards_to_grant)
                );
            }
            for badge in &outcome.unlocked_achievements {
                println!("Achievement unlocked: {} ({})", badge.name, badge.rarity);
            }
        }
        WeightAction::List { range, json } => {
            let entries = db.list_weight_entries(&journey.id)?;
            let in_range = range.filter(&entries, Utc::now());
            if json {
                return print_json(&in_range);
            }
            for e in in_range {
                println!(
                    "{}  {}  {}{}",
                    e.id,
                    e.recorded_at.format("%Y-%m-%d %H:%M"),
                    fmt_weight(unit, e.weight),
                    e.note.as_deref().map(|n| format!("  {n}")).unwrap_or_default()
                );
            }
        }
        WeightAction::Delete { id } => {
            if !db.delete_weight_entry(&journey.id, &id)? {
                return Err(CoreError::NotFound { kind: "weight entry", id }.into());
            }
            println!("deleted {id}");
        }
    }
    Ok(())
}
