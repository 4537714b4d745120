//! Journey operations that span the checkpoint engine and the record store.
//!
//! The engine never writes anything itself. Here each operation loads the
//! journey, evaluates, and persists the updated configuration together with
//! any new reward grants inside one store transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::achievement::{evaluate_all, Achievement, JourneyProgress};
use crate::checkpoint::{checkpoint_spacing_kg, evaluate_new_observation, CheckpointDelta};
use crate::error::{Result, ValidationError};
use crate::journey::{CheckpointMetric, Journey, JourneyConfig, RewardType};
use crate::records::WeightEntry;
use crate::reward::RewardGrant;
use crate::storage::Database;

/// What the checkpoint engine needs from persistence.
///
/// Each call is expected to be atomic on its own; callers that need the whole
/// load-evaluate-save sequence to be atomic wrap it in a store transaction.
pub trait JourneyStore {
    fn load_config(&self, journey_id: &str) -> Result<JourneyConfig>;

    fn save_config(&self, journey_id: &str, config: &JourneyConfig) -> Result<()>;

    /// Create `count` available grants stamped with the same checkpoint and weight.
    fn create_reward_grants(
        &self,
        journey_id: &str,
        count: u32,
        checkpoint_number: u32,
        weight: f64,
        at: DateTime<Utc>,
    ) -> Result<Vec<RewardGrant>>;
}

/// Evaluate one observation against a store and persist the result.
///
/// Nothing is written when no new checkpoint is crossed or when the stored
/// configuration is invalid.
pub fn apply_observation<S: JourneyStore + ?Sized>(
    store: &S,
    journey_id: &str,
    weight: f64,
    at: DateTime<Utc>,
) -> Result<(CheckpointDelta, Vec<RewardGrant>)> {
    let mut config = store.load_config(journey_id)?;
    let delta = evaluate_new_observation(&mut config, weight)?;
    if delta.is_noop() {
        return Ok((delta, Vec::new()));
    }

    store.save_config(journey_id, &config)?;
    let grants = store.create_reward_grants(
        journey_id,
        delta.rewards_to_grant,
        delta.checkpoint_number,
        weight,
        at,
    )?;
    Ok((delta, grants))
}

/// Result of [`record_weight`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightOutcome {
    pub entry: WeightEntry,
    pub delta: CheckpointDelta,
    pub grants: Vec<RewardGrant>,
    pub unlocked_achievements: Vec<Achievement>,
}

/// Record a weight observation for a journey.
///
/// Stores the entry, advances checkpoints, creates reward grants and
/// re-evaluates achievements as one transaction. An invalid journey
/// configuration aborts the whole operation and stores nothing.
pub fn record_weight(
    db: &Database,
    journey_id: &str,
    weight: f64,
    note: Option<String>,
    at: DateTime<Utc>,
) -> Result<WeightOutcome> {
    if !(weight.is_finite() && weight > 0.0) {
        return Err(ValidationError::InvalidValue {
            field: "weight".into(),
            message: format!("must be a positive number, got {weight}"),
        }
        .into());
    }

    db.transaction(|db| {
        let (delta, grants) = apply_observation(db, journey_id, weight, at)?;
        let entry = WeightEntry::new(journey_id, weight, at).with_note(note);
        db.insert_weight_entry(&entry)?;
        let unlocked_achievements = refresh_achievements(db, journey_id, at)?;
        Ok(WeightOutcome {
            entry,
            delta,
            grants,
            unlocked_achievements,
        })
    })
}

/// Re-evaluate every locked badge against a journey and persist progress.
///
/// Returns the badges unlocked by this call.
pub fn refresh_achievements(
    db: &Database,
    journey_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<Achievement>> {
    let journey = db.get_journey(journey_id)?;
    let entries = db.list_weight_entries(journey_id)?;
    let progress = JourneyProgress::from_journey(&journey, &entries, now);

    let mut achievements = db.list_achievements(None)?;
    let unlocked_ids = evaluate_all(&mut achievements, &progress, now);
    for a in achievements.iter().filter(|a| !a.is_unlocked() || unlocked_ids.contains(&a.id)) {
        db.save_achievement(a)?;
    }

    Ok(achievements
        .into_iter()
        .filter(|a| unlocked_ids.contains(&a.id))
        .collect())
}

/// Start a new journey, closing any active one.
///
/// The start weight is stored as the journey's first weight entry. Closing
/// the old journey and creating the new one commit together or not at all.
pub fn start_journey(
    db: &Database,
    config: JourneyConfig,
    reward_duration_hours: u32,
    at: DateTime<Utc>,
) -> Result<Journey> {
    let journey = Journey::new(config, reward_duration_hours, at)?;
    db.transaction(|db| {
        db.insert_journey_row(&journey)?;
        let first = WeightEntry::new(&journey.id, journey.config.start_weight, at)
            .with_note(Some("Starting weight".to_string()));
        db.insert_weight_entry(&first)
    })?;
    tracing::info!(journey = %journey.id, "journey started");
    Ok(journey)
}

/// Checkpoint and reward settings that may change mid-journey.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JourneySettings {
    pub checkpoint_metric: Option<CheckpointMetric>,
    pub checkpoint_value: Option<f64>,
    pub reward_type: Option<RewardType>,
    pub reward_amount: Option<u32>,
    pub reward_duration_hours: Option<u32>,
    pub goal_weight: Option<f64>,
}

/// Apply new settings to a journey.
///
/// Checkpoints already completed and grants already created are kept; the
/// new grid only affects observations recorded from now on.
pub fn update_journey_settings(
    db: &Database,
    journey_id: &str,
    settings: &JourneySettings,
) -> Result<Journey> {
    let mut journey = db.get_journey(journey_id)?;
    let config = &mut journey.config;
    if let Some(metric) = settings.checkpoint_metric {
        config.checkpoint_metric = metric;
    }
    if let Some(value) = settings.checkpoint_value {
        config.checkpoint_value = value;
    }
    if let Some(reward_type) = settings.reward_type {
        config.reward_type = reward_type;
    }
    if let Some(amount) = settings.reward_amount {
        config.reward_amount = amount;
    }
    if let Some(goal) = settings.goal_weight {
        config.goal_weight = goal;
    }
    if let Some(hours) = settings.reward_duration_hours {
        journey.reward_duration_hours = hours;
    }

    checkpoint_spacing_kg(&journey.config)?;
    db.update_journey(&journey)?;
    Ok(journey)
}

/// Close a journey without starting a new one.
pub fn end_journey(db: &Database, journey_id: &str, at: DateTime<Utc>) -> Result<Journey> {
    let mut journey = db.get_journey(journey_id)?;
    journey.is_active = false;
    journey.end_date = Some(at);
    db.update_journey(&journey)?;
    Ok(journey)
}

/// The active journey, or a `NoActiveJourney` error.
pub fn require_active_journey(db: &Database) -> Result<Journey> {
    db.active_journey()?
        .ok_or_else(|| ValidationError::NoActiveJourney.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CheckpointError, CoreError};
    use chrono::Duration;
    use std::cell::RefCell;

    /// Minimal store used to exercise `apply_observation` without SQLite.
    struct MemoryStore {
        config: RefCell<JourneyConfig>,
        grants: RefCell<Vec<RewardGrant>>,
        saves: RefCell<u32>,
    }

    impl MemoryStore {
        fn new(config: JourneyConfig) -> Self {
            Self {
                config: RefCell::new(config),
                grants: RefCell::new(Vec::new()),
                saves: RefCell::new(0),
            }
        }
    }

    impl JourneyStore for MemoryStore {
        fn load_config(&self, _journey_id: &str) -> Result<JourneyConfig> {
            Ok(self.config.borrow().clone())
        }

        fn save_config(&self, _journey_id: &str, config: &JourneyConfig) -> Result<()> {
            *self.config.borrow_mut() = config.clone();
            *self.saves.borrow_mut() += 1;
            Ok(())
        }

        fn create_reward_grants(
            &self,
            journey_id: &str,
            count: u32,
            checkpoint_number: u32,
            weight: f64,
            at: DateTime<Utc>,
        ) -> Result<Vec<RewardGrant>> {
            let grants = RewardGrant::batch(journey_id, count, checkpoint_number, weight, at);
            self.grants.borrow_mut().extend(grants.iter().cloned());
            Ok(grants)
        }
    }

    fn kg_config() -> JourneyConfig {
        JourneyConfig::new(85.0, 70.0, CheckpointMetric::AbsoluteKg, 2.5)
            .with_reward(RewardType::Meals, 2)
    }

    #[test]
    fn apply_observation_persists_crossings_only() {
        let store = MemoryStore::new(kg_config());
        let now = Utc::now();

        let (delta, grants) = apply_observation(&store, "j", 84.0, now).unwrap();
        assert!(delta.is_noop());
        assert!(grants.is_empty());
        assert_eq!(*store.saves.borrow(), 0);

        let (delta, grants) = apply_observation(&store, "j", 80.0, now).unwrap();
        assert_eq!(delta.crossed, 2);
        assert_eq!(grants.len(), 4);
        assert_eq!(store.config.borrow().completed_checkpoints, 2);

        apply_observation(&store, "j", 80.0, now).unwrap();
        assert_eq!(store.grants.borrow().len(), 4);
        assert_eq!(*store.saves.borrow(), 1);
    }

    #[test]
    fn apply_observation_surfaces_invalid_config() {
        let store = MemoryStore::new(JourneyConfig::new(
            70.0,
            85.0,
            CheckpointMetric::AbsoluteKg,
            2.5,
        ));
        let err = apply_observation(&store, "j", 60.0, Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Checkpoint(CheckpointError::InvalidConfig { .. })
        ));
        assert!(store.grants.borrow().is_empty());
    }

    #[test]
    fn record_weight_grants_and_unlocks() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        let journey = start_journey(&db, kg_config(), 2, now).unwrap();

        let outcome = record_weight(&db, &journey.id, 82.5, None, now + Duration::hours(1)).unwrap();
        assert_eq!(outcome.delta.crossed, 1);
        assert_eq!(outcome.grants.len(), 2);
        let unlocked: Vec<&str> = outcome
            .unlocked_achievements
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert!(unlocked.contains(&"first_steps"));
        assert!(unlocked.contains(&"first_milestone"));

        let again = record_weight(&db, &journey.id, 82.5, None, now + Duration::hours(2)).unwrap();
        assert!(again.delta.is_noop());
        assert!(again.unlocked_achievements.is_empty());
        assert_eq!(db.count_reward_grants(&journey.id).unwrap(), 2);
        assert_eq!(db.list_weight_entries(&journey.id).unwrap().len(), 3);
    }

    #[test]
    fn record_weight_rejects_non_positive_weight() {
        let db = Database::open_memory().unwrap();
        let journey = start_journey(&db, kg_config(), 2, Utc::now()).unwrap();
        assert!(matches!(
            record_weight(&db, &journey.id, 0.0, None, Utc::now()),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn settings_change_keeps_completed_checkpoints() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        let journey = start_journey(&db, kg_config(), 2, now).unwrap();
        record_weight(&db, &journey.id, 80.0, None, now + Duration::hours(1)).unwrap();

        let updated = update_journey_settings(
            &db,
            &journey.id,
            &JourneySettings {
                checkpoint_metric: Some(CheckpointMetric::FixedMicroStep),
                reward_amount: Some(1),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.config.completed_checkpoints, 2);
        assert_eq!(updated.config.checkpoint_metric, CheckpointMetric::FixedMicroStep);

        // 85 - 0.5 * n: 80.0 is already checkpoint 10 on the new grid.
        let outcome = record_weight(&db, &journey.id, 79.9, None, now + Duration::hours(2)).unwrap();
        assert_eq!(outcome.delta.checkpoint_number, 10);
        assert_eq!(outcome.delta.crossed, 8);
        assert_eq!(outcome.grants.len(), 8);
    }

    #[test]
    fn settings_reject_invalid_spacing() {
        let db = Database::open_memory().unwrap();
        let journey = start_journey(&db, kg_config(), 2, Utc::now()).unwrap();
        let result = update_journey_settings(
            &db,
            &journey.id,
            &JourneySettings {
                checkpoint_value: Some(0.0),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(CoreError::Checkpoint(_))));
        assert_eq!(db.get_journey(&journey.id).unwrap().config.checkpoint_value, 2.5);
    }

    #[test]
    fn end_journey_clears_active() {
        let db = Database::open_memory().unwrap();
        let journey = start_journey(&db, kg_config(), 2, Utc::now()).unwrap();
        end_journey(&db, &journey.id, Utc::now()).unwrap();
        assert!(matches!(
            require_active_journey(&db),
            Err(CoreError::Validation(ValidationError::NoActiveJourney))
        ));
    }

    #[test]
    fn failed_start_keeps_previous_journey_active() {
        let db = Database::open_memory().unwrap();
        let first = start_journey(&db, kg_config(), 2, Utc::now()).unwrap();
        db.conn()
            .execute_batch(
                "CREATE TEMP TRIGGER reject_weight BEFORE INSERT ON weight_entries
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
            )
            .unwrap();

        assert!(start_journey(&db, kg_config(), 2, Utc::now()).is_err());
        let active = require_active_journey(&db).unwrap();
        assert_eq!(active.id, first.id);
        assert!(active.end_date.is_none());
        assert_eq!(db.list_journeys().unwrap().len(), 1);
    }
}
