//! # Cheat Meter Core Library
//!
//! This library provides the core logic for Cheat Meter, a weight-loss
//! tracker that turns progress into earned "cheat" rewards. All operations
//! are available through the standalone `cheatmeter` CLI binary, which is a
//! thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Checkpoint engine**: Pure functions that place evenly spaced
//!   checkpoints between start and goal weight and decide how many rewards a
//!   new weight observation earns
//! - **Rewards**: Grant lifecycle (available, active, completed) with timed
//!   activation windows
//! - **Achievements**: Global badges evaluated from journey progress
//! - **Recipes**: Searchable catalog of cheat-meal recipes with favorites
//! - **Storage**: SQLite record store and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`evaluate_new_observation`]: Checkpoint crossing and reward arithmetic
//! - [`record_weight`]: Atomic log-evaluate-grant unit of work
//! - [`Database`]: Journey, reward and log persistence
//! - [`Config`]: Application configuration management

pub mod achievement;
pub mod analytics;
pub mod checkpoint;
pub mod error;
pub mod journey;
pub mod recipe;
pub mod records;
pub mod reward;
pub mod storage;
pub mod tracker;

pub use achievement::{Achievement, AchievementCategory, AchievementRarity, JourneyProgress};
pub use analytics::{JourneySummary, TimeRange};
pub use checkpoint::{
    checkpoint_spacing_kg, checkpoints_reached, evaluate_new_observation, next_checkpoint_target,
    plan_journey, previous_checkpoint_target, progress_fraction, total_checkpoint_steps,
    CheckpointDelta, JourneyPlan,
};
pub use error::{CheckpointError, ConfigError, CoreError, DatabaseError, ValidationError};
pub use journey::{CheckpointMetric, Journey, JourneyConfig, RewardType};
pub use recipe::{filter_recipes, Nutrition, Recipe};
pub use records::{MeasurementEntry, MeasurementField, Slip, WeightEntry};
pub use reward::{RewardGrant, RewardStatus, RewardSummary};
pub use storage::{Config, Database, HeightUnit, WeightUnit};
pub use tracker::{record_weight, JourneySettings, JourneyStore, WeightOutcome};
