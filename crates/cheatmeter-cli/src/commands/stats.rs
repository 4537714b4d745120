use chrono::Utc;
use clap::Subcommand;
use cheatmeter_core::analytics::{JourneySummary, TimeRange};
use cheatmeter_core::Config;

use super::{fmt_weight, open_active, print_json, CmdResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Progress summary for the active journey
    Summary {
        /// Time range: 1w, 1m, 3m or all
        #[arg(long, default_value = "1m")]
        range: TimeRange,
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: StatsAction) -> CmdResult {
    let config = Config::load_or_default();
    let unit = config.profile.weight_unit;
    let (db, journey) = open_active()?;

    match action {
        StatsAction::Summary { range, json } => {
            let entries = db.list_weight_entries(&journey.id)?;
            let slips = db.list_slips(&journey.id)?;
            let summary = JourneySummary::build(
                &journey,
                &entries,
                &slips,
                config.profile.height_cm,
                range,
                Utc::now(),
            )?;
            if json {
                return print_json(&summary);
            }

            println!("Current:      {}", fmt_weight(unit, summary.current_weight));
            println!("Lost:         {}", fmt_weight(unit, summary.total_lost));
            if let Some(bmi) = summary.bmi {
                let profile = &config.profile;
                println!(
                    "BMI:          {bmi:.1} (height {})",
                    profile.height_unit.format(profile.height_cm)
                );
            }
            println!(
                "Checkpoints:  {}/{} ({:.0}% to next at {})",
                summary.completed_checkpoints,
                summary.total_checkpoint_steps,
                summary.checkpoint_progress * 100.0,
                fmt_weight(unit, summary.next_checkpoint)
            );
            println!(
                "Rate:         {}/day, {} in 30 days",
                fmt_weight(unit, summary.average_daily_loss),
                fmt_weight(unit, summary.projected_weight_in_month)
            );
            match summary.estimated_goal_date {
                Some(date) => println!("Goal by:      {}", date.format("%Y-%m-%d")),
                None => println!("Goal by:      -"),
            }
            println!(
                "Slip-free:    {} days ({} slips total)",
                summary.days_without_slips, summary.slips_total
            );
            println!("Entries ({}): {}", summary.range, summary.entries_in_range);
        }
    }
    Ok(())
}
