//! Reward commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use cheatmeter_core::{RewardGrant, RewardStatus, RewardType};

use super::{open_active, print_json, CmdResult};

#[derive(Subcommand)]
pub enum RewardAction {
    /// List reward grants
    List {
        /// Filter by status: available, active or completed
        #[arg(long)]
        status: Option<RewardStatus>,
        #[arg(long)]
        json: bool,
    },
    /// Start using an available reward
    Activate {
        /// Reward ID
        id: String,
    },
    /// Finish the active reward early
    Complete {
        /// Reward ID
        id: String,
        /// What the reward was spent on
        #[arg(long)]
        note: Option<String>,
    },
}

fn describe(grant: &RewardGrant, reward_type: RewardType) -> String {
    let now = Utc::now();
    let detail = match grant.status {
        RewardStatus::Active => grant
            .remaining(now)
            .map(|left| format!(" ({}h {:02}m left)", left.num_hours(), left.num_minutes() % 60))
            .unwrap_or_default(),
        RewardStatus::Completed => {
            let used = grant
                .completed_at
                .map(|at| format!(" (used {})", at.format("%Y-%m-%d")))
                .unwrap_or_default();
            match &grant.note {
                Some(note) => format!("{used}  {note}"),
                None => used,
            }
        }
        RewardStatus::Available => String::new(),
    };
    format!(
        "{}  {}  checkpoint {}  {}{}",
        grant.id,
        reward_type.unit_label(1),
        grant.checkpoint_number,
        grant.status,
        detail
    )
}

pub fn run(action: RewardAction) -> CmdResult {
    let (db, journey) = open_active()?;
    let now = Utc::now();
    db.expire_due_rewards(&journey.id, now)?;

    match action {
        RewardAction::List { status, json } => {
            let grants = db.list_reward_grants(&journey.id, status)?;
            if json {
                return print_json(&grants);
            }
            for grant in &grants {
                println!("{}", describe(grant, journey.config.reward_type));
            }
        }
        RewardAction::Activate { id } => {
            let grant = db.activate_reward(&journey.id, &id, now)?;
            println!("{}", describe(&grant, journey.config.reward_type));
        }
        RewardAction::Complete { id, note } => {
            let grant = db.complete_reward(&journey.id, &id, now, note)?;
            println!("{}", describe(&grant, journey.config.reward_type));
        }
    }
    Ok(())
}
