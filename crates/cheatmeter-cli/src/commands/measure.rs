//! Body measurement commands for CLI.

use chrono::Utc;
use clap::{Args, Subcommand};
use cheatmeter_core::records::{MeasurementEntry, MeasurementField};
use cheatmeter_core::CoreError;
use serde_json::json;

use super::{fmt_weight, open_active, print_json, weight_unit, CmdResult};

/// Circumferences in centimetres; omitted fields are left empty.
#[derive(Args)]
pub struct BodyFields {
    #[arg(long)]
    chest: Option<f64>,
    #[arg(long)]
    waist: Option<f64>,
    #[arg(long)]
    hips: Option<f64>,
    #[arg(long)]
    shoulders: Option<f64>,
    #[arg(long)]
    thighs: Option<f64>,
    #[arg(long)]
    calves: Option<f64>,
    #[arg(long)]
    arms: Option<f64>,
    #[arg(long)]
    neck: Option<f64>,
}

impl BodyFields {
    fn values(&self) -> [(MeasurementField, Option<f64>); 8] {
        [
            (MeasurementField::Chest, self.chest),
            (MeasurementField::Waist, self.waist),
            (MeasurementField::Hips, self.hips),
            (MeasurementField::Shoulders, self.shoulders),
            (MeasurementField::Thighs, self.thighs),
            (MeasurementField::Calves, self.calves),
            (MeasurementField::Arms, self.arms),
            (MeasurementField::Neck, self.neck),
        ]
    }
}

#[derive(Subcommand)]
pub enum MeasureAction {
    /// Record body measurements
    Add {
        /// Weight at measurement time, in the configured unit
        weight: f64,
        #[command(flatten)]
        fields: BodyFields,
    },
    /// List measurements, newest first
    List {
        #[arg(long)]
        json: bool,
    },
    /// Compare two measurements (defaults: oldest against newest)
    Compare {
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Delete a measurement
    Delete {
        /// Measurement ID
        id: String,
    },
}

fn find(entries: &[MeasurementEntry], id: &str) -> Result<MeasurementEntry, CoreError> {
    entries
        .iter()
        .find(|m| m.id == id)
        .cloned()
        .ok_or_else(|| CoreError::NotFound {
            kind: "measurement",
            id: id.to_string(),
        })
}

pub fn run(action: MeasureAction) -> CmdResult {
    let unit = weight_unit();
    let (db, journey) = open_active()?;

    match action {
        MeasureAction::Add { weight, fields } => {
            let mut entry = MeasurementEntry::new(&journey.id, unit.to_kg(weight), Utc::now());
            for (field, value) in fields.values() {
                entry.set(field, value);
            }
            db.insert_measurement(&entry)?;
            println!("Measurement recorded: {}", entry.id);
        }
        MeasureAction::List { json } => {
            let entries = db.list_measurements(&journey.id)?;
            if json {
                return print_json(&entries);
            }
            for m in &entries {
                let recorded: Vec<String> = MeasurementField::ALL
                    .into_iter()
                    .filter_map(|f| m.get(f).map(|v| format!("{f} {v:.1}")))
                    .collect();
                println!(
                    "{}  {}  {}  {}",
                    m.id,
                    m.recorded_at.format("%Y-%m-%d"),
                    fmt_weight(unit, m.weight),
                    recorded.join(", ")
                );
            }
        }
        MeasureAction::Compare { from, to, json } => {
            // Newest first.
            let entries = db.list_measurements(&journey.id)?;
            let from = match from {
                Some(id) => find(&entries, &id)?,
                None => entries.last().cloned().ok_or("no measurements recorded")?,
            };
            let to = match to {
                Some(id) => find(&entries, &id)?,
                None => entries.first().cloned().ok_or("no measurements recorded")?,
            };
            let changes = from.compare(&to);
            let weight_change = to.weight - from.weight;

            if json {
                let fields: serde_json::Map<String, serde_json::Value> = changes
                    .iter()
                    .map(|(f, d)| (f.as_str().to_string(), json!(d)))
                    .collect();
                return print_json(&json!({
                    "from": from.id,
                    "to": to.id,
                    "weight": weight_change,
                    "fields": fields,
                }));
            }

            println!(
                "{} → {}",
                from.recorded_at.format("%Y-%m-%d"),
                to.recorded_at.format("%Y-%m-%d")
            );
            println!("  weight  {:+.1} {}", unit.from_kg(weight_change), unit.as_str());
            for (field, diff) in changes {
                println!("  {field}  {diff:+.1} cm");
            }
        }
        MeasureAction::Delete { id } => {
            if !db.delete_measurement(&journey.id, &id)? {
                return Err(CoreError::NotFound { kind: "measurement", id }.into());
            }
            println!("deleted {id}");
        }
    }
    Ok(())
}
