//! Achievement badges.
//!
//! Each badge tracks a progress value derived from the journey and unlocks
//! once, the first time progress reaches its target. Unlocked badges are
//! frozen: later evaluations change neither progress nor `unlocked_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::journey::Journey;
use crate::records::{latest_entry, WeightEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    /// Weight lost, in kilograms or percent of goal
    Weight,
    /// Checkpoints completed
    Checkpoints,
    /// Distinct days with a weight entry
    Consistency,
    /// Days since the journey started
    Milestones,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementRarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

/// Unit of a weight badge's target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressBasis {
    /// Absolute value (kg, count, days)
    Absolute,
    /// Percent of the journey's total weight to lose
    PercentOfGoal,
}

macro_rules! str_enum {
    ($ty:ty { $($variant:ident => $s:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant),)+
                    _ => Err(format!("Unknown {}: {s}", stringify!($ty))),
                }
            }
        }
    };
}

str_enum!(AchievementCategory {
    Weight => "weight",
    Checkpoints => "checkpoints",
    Consistency => "consistency",
    Milestones => "milestones",
});

str_enum!(AchievementRarity {
    Common => "common",
    Rare => "rare",
    Epic => "epic",
    Legendary => "legendary",
});

str_enum!(ProgressBasis {
    Absolute => "absolute",
    PercentOfGoal => "percent_of_goal",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub category: AchievementCategory,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub rarity: AchievementRarity,
    pub basis: ProgressBasis,
    pub target_value: f64,
    pub current_progress: f64,
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl Achievement {
    pub fn is_unlocked(&self) -> bool {
        self.unlocked_at.is_some()
    }

    /// 0.0 .. 1.0 towards the target.
    pub fn completion(&self) -> f64 {
        if self.target_value <= 0.0 {
            return 1.0;
        }
        (self.current_progress / self.target_value).clamp(0.0, 1.0)
    }

    /// Refresh progress and unlock if the target is met.
    ///
    /// Returns `true` only on the evaluation that unlocks the badge.
    pub fn evaluate(&mut self, progress: &JourneyProgress, now: DateTime<Utc>) -> bool {
        if self.is_unlocked() {
            return false;
        }
        self.current_progress = progress.value_for(self.category, self.basis);
        if self.current_progress >= self.target_value {
            self.unlocked_at = Some(now);
            tracing::info!(achievement = %self.id, "achievement unlocked");
            return true;
        }
        false
    }
}

/// Journey facts every achievement category is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JourneyProgress {
    pub weight_lost: f64,
    pub total_to_lose: f64,
    pub completed_checkpoints: u32,
    pub logged_days: u32,
    pub days_on_journey: i64,
}

impl JourneyProgress {
    pub fn from_journey(journey: &Journey, entries: &[WeightEntry], now: DateTime<Utc>) -> Self {
        let current = latest_entry(entries)
            .map(|e| e.weight)
            .unwrap_or(journey.config.start_weight);
        let logged_days = entries
            .iter()
            .map(|e| e.recorded_at.date_naive())
            .collect::<BTreeSet<_>>()
            .len() as u32;

        Self {
            weight_lost: journey.config.start_weight - current,
            total_to_lose: journey.config.total_to_lose(),
            completed_checkpoints: journey.config.completed_checkpoints,
            logged_days,
            days_on_journey: journey.days_elapsed(now),
        }
    }

    pub fn percent_of_goal(&self) -> f64 {
        if self.total_to_lose <= 0.0 {
            return 0.0;
        }
        self.weight_lost / self.total_to_lose * 100.0
    }

    pub fn value_for(&self, category: AchievementCategory, basis: ProgressBasis) -> f64 {
        match category {
            AchievementCategory::Weight => match basis {
                ProgressBasis::Absolute => self.weight_lost,
                ProgressBasis::PercentOfGoal => self.percent_of_goal(),
            },
            AchievementCategory::Checkpoints => f64::from(self.completed_checkpoints),
            AchievementCategory::Consistency => f64::from(self.logged_days),
            AchievementCategory::Milestones => self.days_on_journey as f64,
        }
    }
}

/// Evaluate every badge, returning the ids unlocked by this pass.
pub fn evaluate_all(
    achievements: &mut [Achievement],
    progress: &JourneyProgress,
    now: DateTime<Utc>,
) -> Vec<String> {
    achievements
        .iter_mut()
        .filter_map(|a| a.evaluate(progress, now).then(|| a.id.clone()))
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn badge(
    id: &str,
    category: AchievementCategory,
    name: &str,
    description: &str,
    icon: &str,
    rarity: AchievementRarity,
    basis: ProgressBasis,
    target_value: f64,
) -> Achievement {
    Achievement {
        id: id.to_string(),
        category,
        name: name.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        rarity,
        basis,
        target_value,
        current_progress: 0.0,
        unlocked_at: None,
    }
}

/// The badges seeded into a fresh store.
pub fn default_catalog() -> Vec<Achievement> {
    use AchievementCategory::*;
    use AchievementRarity::*;
    use ProgressBasis::*;

    vec![
        badge("first_steps", Weight, "First Steps", "Lost 1 kg", "figure.walk", Common, Absolute, 1.0),
        badge("getting_started", Weight, "Getting Started", "Lost 5 kg", "figure.run", Rare, Absolute, 5.0),
        badge("halfway_hero", Weight, "Halfway Hero", "Reached 50% of your goal", "star.fill", Epic, PercentOfGoal, 50.0),
        badge("almost_there", Weight, "Almost There", "Reached 75% of your goal", "star.leadinghalf.filled", Epic, PercentOfGoal, 75.0),
        badge("goal_crusher", Weight, "Goal Crusher", "Reached 100% of your goal", "trophy.fill", Legendary, PercentOfGoal, 100.0),
        badge("first_milestone", Checkpoints, "First Milestone", "Reached your first checkpoint", "flag.fill", Common, Absolute, 1.0),
        badge("checkpoint_master", Checkpoints, "Checkpoint Master", "Reached 5 checkpoints", "flag.2.crossed.fill", Rare, Absolute, 5.0),
        badge("unstoppable", Checkpoints, "Unstoppable", "Reached 10 checkpoints", "flame.fill", Epic, Absolute, 10.0),
        badge("week_warrior", Consistency, "Week Warrior", "7 days of logging", "calendar.badge.checkmark", Common, Absolute, 7.0),
        badge("month_master", Consistency, "Month Master", "30 days of logging", "calendar", Rare, Absolute, 30.0),
        badge("journey_beginner", Milestones, "Journey Beginner", "7 days on the journey", "figure.walk.circle", Common, Absolute, 7.0),
        badge("journey_veteran", Milestones, "Journey Veteran", "30 days on the journey", "figure.run.circle", Rare, Absolute, 30.0),
        badge("journey_legend", Milestones, "Journey Legend", "100 days on the journey", "crown.fill", Legendary, Absolute, 100.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journey::{CheckpointMetric, JourneyConfig};
    use chrono::{Duration, TimeZone};

    fn progress(weight_lost: f64) -> JourneyProgress {
        JourneyProgress {
            weight_lost,
            total_to_lose: 20.0,
            completed_checkpoints: 0,
            logged_days: 0,
            days_on_journey: 0,
        }
    }

    fn find<'a>(catalog: &'a mut [Achievement], id: &str) -> &'a mut Achievement {
        catalog.iter_mut().find(|a| a.id == id).unwrap()
    }

    #[test]
    fn catalog_ids_are_unique() {
        let catalog = default_catalog();
        let ids: BTreeSet<_> = catalog.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids.len(), catalog.len());
        assert_eq!(catalog.len(), 13);
    }

    #[test]
    fn unlocks_once_and_freezes() {
        let mut catalog = default_catalog();
        let badge = find(&mut catalog, "first_steps");
        let t0 = Utc::now();

        assert!(!badge.evaluate(&progress(0.5), t0));
        assert_eq!(badge.current_progress, 0.5);

        assert!(badge.evaluate(&progress(1.0), t0));
        assert_eq!(badge.unlocked_at, Some(t0));

        // Regain afterwards does not relock or move the stamp.
        assert!(!badge.evaluate(&progress(-2.0), t0 + Duration::days(1)));
        assert_eq!(badge.unlocked_at, Some(t0));
        assert_eq!(badge.current_progress, 1.0);
    }

    #[test]
    fn percent_badges_use_goal_fraction() {
        let mut catalog = default_catalog();
        let halfway = find(&mut catalog, "halfway_hero");
        assert!(!halfway.evaluate(&progress(9.9), Utc::now()));
        assert!(halfway.evaluate(&progress(10.0), Utc::now()));
    }

    #[test]
    fn evaluate_all_reports_new_unlocks_only() {
        let mut catalog = default_catalog();
        let p = JourneyProgress {
            weight_lost: 5.0,
            total_to_lose: 20.0,
            completed_checkpoints: 5,
            logged_days: 7,
            days_on_journey: 3,
        };
        let now = Utc::now();
        let unlocked = evaluate_all(&mut catalog, &p, now);
        assert_eq!(
            unlocked,
            vec![
                "first_steps",
                "getting_started",
                "first_milestone",
                "checkpoint_master",
                "week_warrior",
            ]
        );
        assert!(evaluate_all(&mut catalog, &p, now).is_empty());
    }

    #[test]
    fn progress_counts_distinct_days() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let config = JourneyConfig::new(90.0, 80.0, CheckpointMetric::AbsoluteKg, 1.0);
        let journey = Journey::new(config, 2, start).unwrap();
        let entries = vec![
            WeightEntry::new(&journey.id, 90.0, start),
            WeightEntry::new(&journey.id, 89.5, start + Duration::minutes(5)),
            WeightEntry::new(&journey.id, 88.0, start + Duration::days(2)),
        ];
        let p = JourneyProgress::from_journey(&journey, &entries, start + Duration::days(10));
        assert_eq!(p.weight_lost, 2.0);
        assert_eq!(p.days_on_journey, 10);
        assert_eq!(p.logged_days, 2);
        assert!((p.percent_of_goal() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn category_names_roundtrip() {
        assert_eq!("consistency".parse::<AchievementCategory>(), Ok(AchievementCategory::Consistency));
        assert_eq!(ProgressBasis::PercentOfGoal.as_str(), "percent_of_goal");
        assert!("gold".parse::<AchievementRarity>().is_err());
    }
}
