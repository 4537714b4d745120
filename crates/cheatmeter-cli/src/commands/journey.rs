//! Journey lifecycle commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use cheatmeter_core::analytics::current_weight;
use cheatmeter_core::checkpoint::{next_checkpoint_target, plan_journey, progress_fraction};
use cheatmeter_core::storage::Database;
use cheatmeter_core::tracker::{end_journey, start_journey, update_journey_settings, JourneySettings};
use cheatmeter_core::{CheckpointMetric, Config, JourneyConfig, RewardSummary, RewardType};
use serde_json::json;

use super::{fmt_weight, open_active, print_json, weight_unit, CmdResult};

#[derive(Subcommand)]
pub enum JourneyAction {
    /// Start a new journey (ends the current one)
    Start {
        /// Starting weight, in the configured unit
        start_weight: f64,
        /// Goal weight, in the configured unit
        goal_weight: f64,
        /// Checkpoint metric: kg, percent or micro
        #[arg(long)]
        metric: Option<CheckpointMetric>,
        /// Kilograms or percent per checkpoint
        #[arg(long)]
        value: Option<f64>,
        /// Reward type: meals or days
        #[arg(long)]
        reward_type: Option<RewardType>,
        /// Reward units granted per checkpoint
        #[arg(long)]
        reward_amount: Option<u32>,
        /// Hours an activated reward stays active
        #[arg(long)]
        duration_hours: Option<u32>,
        /// Only print the planned checkpoints and rewards
        #[arg(long)]
        preview: bool,
        #[arg(long)]
        json: bool,
    },
    /// Show the active journey
    Show {
        #[arg(long)]
        json: bool,
    },
    /// List all journeys, newest first
    List {
        #[arg(long)]
        json: bool,
    },
    /// Change checkpoint and reward settings of the active journey
    Settings {
        /// Checkpoint metric: kg, percent or micro
        #[arg(long)]
        metric: Option<CheckpointMetric>,
        /// Kilograms or percent per checkpoint
        #[arg(long)]
        value: Option<f64>,
        /// Reward type: meals or days
        #[arg(long)]
        reward_type: Option<RewardType>,
        /// Reward units granted per checkpoint
        #[arg(long)]
        reward_amount: Option<u32>,
        /// Hours an activated reward stays active
        #[arg(long)]
        duration_hours: Option<u32>,
        /// New goal weight, in the configured unit
        #[arg(long)]
        goal: Option<f64>,
    },
    /// End the active journey
    End,
}

pub fn run(action: JourneyAction) -> CmdResult {
    let unit = weight_unit();

    match action {
        JourneyAction::Start {
            start_weight,
            goal_weight,
            metric,
            value,
            reward_type,
            reward_amount,
            duration_hours,
            preview,
            json,
        } => {
            let mut settings = Config::load_or_default();
            let defaults = &settings.journey_defaults;
            let config = JourneyConfig::new(
                unit.to_kg(start_weight),
                unit.to_kg(goal_weight),
                metric.unwrap_or(defaults.checkpoint_metric),
                value.unwrap_or(defaults.checkpoint_value),
            )
            .with_reward(
                reward_type.unwrap_or(defaults.reward_type),
                reward_amount.unwrap_or(defaults.reward_amount),
            );
            let hours = duration_hours.unwrap_or(defaults.reward_duration_hours);

            let plan = plan_journey(&config)?;
            if preview {
                if json {
                    return print_json(&plan);
                }
                println!(
                    "{} checkpoints, {} {}",
                    plan.planned_checkpoints,
                    plan.planned_rewards,
                    config.reward_type.unit_label(plan.planned_rewards)
                );
                return Ok(());
            }

            let db = Database::open()?;
            let journey = start_journey(&db, config, hours, Utc::now())?;
            if !settings.has_completed_onboarding {
                settings.has_completed_onboarding = true;
                settings.save()?;
            }

            if json {
                print_json(&journey)?;
            } else {
                println!("Journey started: {}", journey.id);
                println!(
                    "{} → {}, {} checkpoints, {} {} to earn",
                    fmt_weight(unit, journey.config.start_weight),
                    fmt_weight(unit, journey.config.goal_weight),
                    plan.planned_checkpoints,
                    plan.planned_rewards,
                    journey.config.reward_type.unit_label(plan.planned_rewards)
                );
            }
        }
        JourneyAction::Show { json } => {
            let (db, journey) = open_active()?;
            db.expire_due_rewards(&journey.id, Utc::now())?;
            let entries = db.list_weight_entries(&journey.id)?;
            let current = current_weight(&journey, &entries);
            let next = next_checkpoint_target(&journey.config)?;
            let progress = progress_fraction(&journey.config, current)?;
            let rewards = RewardSummary::from_grants(&db.list_reward_grants(&journey.id, None)?);

            if json {
                return print_json(&json!({
                    "journey": journey,
                    "current_weight": current,
                    "next_checkpoint": next,
                    "checkpoint_progress": progress,
                    "rewards": rewards,
                }));
            }

            let config = &journey.config;
            println!("Journey {}", journey.id);
            println!("  Started:     {}", journey.start_date.format("%Y-%m-%d"));
            println!(
                "  Weight:      {} (start {}, goal {})",
                fmt_weight(unit, current),
                fmt_weight(unit, config.start_weight),
                fmt_weight(unit, config.goal_weight)
            );
            println!(
                "  Checkpoints: {} completed, next at {} ({:.0}% there)",
                config.completed_checkpoints,
                fmt_weight(unit, next),
                progress * 100.0
            );
            println!(
                "  Rewards:     {} available, {} active, {} used ({} per checkpoint)",
                rewards.available,
                rewards.active,
                rewards.completed,
                config.reward_amount
            );
        }
        JourneyAction::List { json } => {
            let db = Database::open()?;
            let journeys = db.list_journeys()?;
            if json {
                return print_json(&journeys);
            }
            for j in &journeys {
                let status = if j.is_active { "active" } else { "ended" };
                println!(
                    "{}  {}  {} → {}  {}",
                    j.id,
                    j.start_date.format("%Y-%m-%d"),
                    fmt_weight(unit, j.config.start_weight),
                    fmt_weight(unit, j.config.goal_weight),
                    status
                );
            }
        }
        JourneyAction::Settings {
            metric,
            value,
            reward_type,
            reward_amount,
            duration_hours,
            goal,
        } => {
            let (db, journey) = open_active()?;
            let settings = JourneySettings {
                checkpoint_metric: metric,
                checkpoint_value: value,
                reward_type,
                reward_amount,
                reward_duration_hours: duration_hours,
                goal_weight: goal.map(|g| unit.to_kg(g)),
            };
            let updated = update_journey_settings(&db, &journey.id, &settings)?;
            println!(
                "Settings updated: {} {} per checkpoint, {} {}",
                updated.config.checkpoint_value,
                updated.config.checkpoint_metric,
                updated.config.reward_amount,
                updated.config.reward_type.unit_label(updated.config.reward_amount)
            );
        }
        JourneyAction::End => {
            let (db, journey) = open_active()?;
            end_journey(&db, &journey.id, Utc::now())?;
            println!("Journey ended: {}", journey.id);
        }
    }
    Ok(())
}
