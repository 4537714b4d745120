//! Integration tests for the journey workflow against an on-disk database.
//!
//! These verify that logging weights, granting rewards, activating them and
//! unlocking achievements survive reopening the store.

use chrono::{Duration, TimeZone, Utc};
use tempfile::TempDir;

use cheatmeter_core::analytics::{JourneySummary, TimeRange};
use cheatmeter_core::records::Slip;
use cheatmeter_core::tracker::{record_weight, start_journey};
use cheatmeter_core::{
    CheckpointMetric, CoreError, Database, JourneyConfig, RewardStatus, RewardSummary, RewardType,
};

fn open(dir: &TempDir) -> Database {
    Database::open_at(&dir.path().join("cheatmeter.db")).unwrap()
}

#[test]
fn full_journey_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let start = Utc.with_ymd_and_hms(2026, 1, 5, 7, 0, 0).unwrap();

    let journey_id = {
        let db = open(&dir);
        let config = JourneyConfig::new(100.0, 80.0, CheckpointMetric::PercentOfGoal, 10.0)
            .with_reward(RewardType::Meals, 1);
        let journey = start_journey(&db, config, 2, start).unwrap();

        // 2 kg spacing: 96.0 reaches checkpoint 2.
        let first = record_weight(&db, &journey.id, 96.0, None, start + Duration::days(7)).unwrap();
        assert_eq!(first.delta.crossed, 2);
        assert_eq!(first.grants.len(), 2);

        // Regain then partial progress earns nothing.
        let regain = record_weight(&db, &journey.id, 97.5, None, start + Duration::days(8)).unwrap();
        assert!(regain.delta.is_noop());
        let partial = record_weight(&db, &journey.id, 94.1, None, start + Duration::days(9)).unwrap();
        assert!(partial.delta.is_noop());

        let third = record_weight(&db, &journey.id, 94.0, None, start + Duration::days(10)).unwrap();
        assert_eq!(third.delta.checkpoint_number, 3);
        journey.id
    };

    let db = open(&dir);
    let journey = db.get_journey(&journey_id).unwrap();
    assert_eq!(journey.config.completed_checkpoints, 3);
    assert_eq!(db.count_reward_grants(&journey_id).unwrap(), 3);
    assert_eq!(db.list_weight_entries(&journey_id).unwrap().len(), 5);

    let unlocked: Vec<String> = db
        .list_achievements(None)
        .unwrap()
        .into_iter()
        .filter(|a| a.is_unlocked())
        .map(|a| a.id)
        .collect();
    assert!(unlocked.contains(&"getting_started".to_string()));
    assert!(unlocked.contains(&"first_milestone".to_string()));
    assert!(unlocked.contains(&"journey_beginner".to_string()));
}

#[test]
fn reward_lifecycle_across_reopen() {
    let dir = TempDir::new().unwrap();
    let now = Utc::now();

    let (journey_id, grant_id) = {
        let db = open(&dir);
        let config = JourneyConfig::new(90.0, 80.0, CheckpointMetric::AbsoluteKg, 1.0)
            .with_reward(RewardType::Days, 2);
        let journey = start_journey(&db, config, 3, now - Duration::days(10)).unwrap();
        let outcome = record_weight(&db, &journey.id, 88.9, None, now - Duration::hours(5)).unwrap();
        assert_eq!(outcome.grants.len(), 2);
        let grant = db
            .activate_reward(&journey.id, &outcome.grants[0].id, now - Duration::hours(4))
            .unwrap();
        (journey.id, grant.id)
    };

    let db = open(&dir);
    let expired = db.expire_due_rewards(&journey_id, now).unwrap();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].id, grant_id);

    let grants = db.list_reward_grants(&journey_id, None).unwrap();
    let summary = RewardSummary::from_grants(&grants);
    assert_eq!(summary.available, 1);
    assert_eq!(summary.completed, 1);
    assert_eq!(summary.total(), 2);

    let completed = db.get_reward_grant(&journey_id, &grant_id).unwrap();
    assert_eq!(completed.status, RewardStatus::Completed);
    assert_eq!(completed.completed_at, completed.expires_at);
}

#[test]
fn invalid_stored_config_records_nothing() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);
    let config = JourneyConfig::new(90.0, 80.0, CheckpointMetric::AbsoluteKg, 1.0);
    let mut journey = start_journey(&db, config, 2, Utc::now()).unwrap();

    // Corrupt the stored spacing behind the engine's back.
    journey.config.checkpoint_value = -1.0;
    db.update_journey(&journey).unwrap();

    let err = record_weight(&db, &journey.id, 85.0, None, Utc::now()).unwrap_err();
    assert!(matches!(err, CoreError::Checkpoint(_)));
    assert_eq!(db.list_weight_entries(&journey.id).unwrap().len(), 1);
    assert_eq!(db.count_reward_grants(&journey.id).unwrap(), 0);
}

#[test]
fn summary_reflects_logged_records() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);
    let now = Utc::now();
    let config = JourneyConfig::new(90.0, 80.0, CheckpointMetric::AbsoluteKg, 2.0);
    let journey = start_journey(&db, config, 2, now - Duration::days(10)).unwrap();
    record_weight(&db, &journey.id, 86.0, None, now - Duration::days(1)).unwrap();
    db.insert_slip(&Slip::new(&journey.id, "burger", now - Duration::days(4)))
        .unwrap();

    let journey = db.get_journey(&journey.id).unwrap();
    let entries = db.list_weight_entries(&journey.id).unwrap();
    let slips = db.list_slips(&journey.id).unwrap();
    let summary =
        JourneySummary::build(&journey, &entries, &slips, 175.0, TimeRange::All, now).unwrap();

    assert_eq!(summary.current_weight, 86.0);
    assert_eq!(summary.completed_checkpoints, 2);
    assert_eq!(summary.days_without_slips, 4);
}
