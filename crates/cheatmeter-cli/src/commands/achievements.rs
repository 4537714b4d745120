use chrono::Utc;
use clap::Subcommand;
use cheatmeter_core::storage::Database;
use cheatmeter_core::tracker::{refresh_achievements, require_active_journey};
use cheatmeter_core::AchievementCategory;

use super::{print_json, CmdResult};

#[derive(Subcommand)]
pub enum AchievementsAction {
    /// List badges and their progress
    List {
        /// Filter by category: weight, checkpoints, consistency or milestones
        #[arg(long)]
        category: Option<AchievementCategory>,
        #[arg(long)]
        json: bool,
    },
    /// Re-evaluate badges against the active journey
    Check,
}

pub fn run(action: AchievementsAction) -> CmdResult {
    let db = Database::open()?;

    match action {
        AchievementsAction::List { category, json } => {
            let achievements = db.list_achievements(category)?;
            if json {
                return print_json(&achievements);
            }
            let unlocked = achievements.iter().filter(|a| a.is_unlocked()).count();
            println!("{unlocked}/{} unlocked", achievements.len());
            for a in &achievements {
                let mark = if a.is_unlocked() { "x" } else { " " };
                println!(
                    "[{mark}] {:<18} {:<10} {:>3.0}%  {}",
                    a.name,
                    a.rarity.as_str(),
                    a.completion() * 100.0,
                    a.description
                );
            }
        }
        AchievementsAction::Check => {
            let journey = require_active_journey(&db)?;
            let unlocked = db.transaction(|db| refresh_achievements(db, &journey.id, Utc::now()))?;
            if unlocked.is_empty() {
                println!("no new achievements");
            }
            for a in &unlocked {
                println!("Achievement unlocked: {} ({})", a.name, a.rarity);
            }
        }
    }
    Ok(())
}
