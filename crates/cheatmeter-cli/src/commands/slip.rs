use chrono::Utc;
use clap::Subcommand;
use cheatmeter_core::records::Slip;
use cheatmeter_core::CoreError;

use super::{open_active, print_json, CmdResult};

#[derive(Subcommand)]
pub enum SlipAction {
    /// Record off-plan eating
    Log {
        /// What was eaten
        food: String,
        #[arg(long)]
        note: Option<String>,
    },
    /// List slips, newest first
    List {
        #[arg(long)]
        json: bool,
    },
    /// Delete a slip
    Delete {
        /// Slip ID
        id: String,
    },
}

pub fn run(action: SlipAction) -> CmdResult {
    let (db, journey) = open_active()?;

    match action {
        SlipAction::Log { food, note } => {
            let mut slip = Slip::new(&journey.id, &food, Utc::now());
            slip.note = note;
            db.insert_slip(&slip)?;
            println!("Slip recorded: {}", slip.id);
        }
        SlipAction::List { json } => {
            let slips = db.list_slips(&journey.id)?;
            if json {
                return print_json(&slips);
            }
            for s in &slips {
                println!(
                    "{}  {}  {}{}",
                    s.id,
                    s.recorded_at.format("%Y-%m-%d %H:%M"),
                    s.food,
                    s.note.as_deref().map(|n| format!("  {n}")).unwrap_or_default()
                );
            }
        }
        SlipAction::Delete { id } => {
            if !db.delete_slip(&journey.id, &id)? {
                return Err(CoreError::NotFound { kind: "slip", id }.into());
            }
            println!("deleted {id}");
        }
    }
    Ok(())
}
