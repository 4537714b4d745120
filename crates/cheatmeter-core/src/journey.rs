//! Journey configuration and the persisted journey record.
//!
//! A journey is one weight-loss program: a start and goal weight, the rule
//! that spaces checkpoints between them, and the reward handed out each time
//! a checkpoint is crossed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CheckpointError;

/// Fixed spacing used by [`CheckpointMetric::FixedMicroStep`], in kilograms.
pub const MICRO_STEP_KG: f64 = 0.5;

/// Upper bound on reward units granted per checkpoint.
pub const MAX_REWARD_AMOUNT: u32 = 10;

/// How checkpoint spacing is derived from the journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckpointMetric {
    /// `checkpoint_value` kilograms per checkpoint.
    #[serde(rename = "kg")]
    AbsoluteKg,
    /// `checkpoint_value` percent of the total weight to lose per checkpoint.
    #[serde(rename = "percent")]
    PercentOfGoal,
    /// Half a kilogram per checkpoint; `checkpoint_value` is ignored.
    #[serde(rename = "micro")]
    FixedMicroStep,
}

impl CheckpointMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckpointMetric::AbsoluteKg => "kg",
            CheckpointMetric::PercentOfGoal => "percent",
            CheckpointMetric::FixedMicroStep => "micro",
        }
    }
}

impl fmt::Display for CheckpointMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckpointMetric {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kg" => Ok(Self::AbsoluteKg),
            "percent" => Ok(Self::PercentOfGoal),
            "micro" => Ok(Self::FixedMicroStep),
            _ => Err(format!("Unknown checkpoint metric: {s}")),
        }
    }
}

/// Kind of reward unit granted per checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardType {
    /// Cheat meals
    Meals,
    /// Free days
    Days,
}

impl RewardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardType::Meals => "meals",
            RewardType::Days => "days",
        }
    }

    /// Human-readable unit name, pluralised for `count`.
    pub fn unit_label(&self, count: u32) -> &'static str {
        match (self, count) {
            (RewardType::Meals, 1) => "cheat meal",
            (RewardType::Meals, _) => "cheat meals",
            (RewardType::Days, 1) => "free day",
            (RewardType::Days, _) => "free days",
        }
    }
}

impl fmt::Display for RewardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RewardType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "meals" => Ok(Self::Meals),
            "days" => Ok(Self::Days),
            _ => Err(format!("Unknown reward type: {s}")),
        }
    }
}

/// Value snapshot handed to the checkpoint engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JourneyConfig {
    pub start_weight: f64,
    pub goal_weight: f64,
    pub checkpoint_metric: CheckpointMetric,
    pub checkpoint_value: f64,
    pub reward_type: RewardType,
    pub reward_amount: u32,
    /// Never decreases, even when a later observation shows regain.
    #[serde(default)]
    pub completed_checkpoints: u32,
}

impl JourneyConfig {
    pub fn new(
        start_weight: f64,
        goal_weight: f64,
        checkpoint_metric: CheckpointMetric,
        checkpoint_value: f64,
    ) -> Self {
        Self {
            start_weight,
            goal_weight,
            checkpoint_metric,
            checkpoint_value,
            reward_type: RewardType::Meals,
            reward_amount: 1,
            completed_checkpoints: 0,
        }
    }

    pub fn with_reward(mut self, reward_type: RewardType, reward_amount: u32) -> Self {
        self.reward_type = reward_type;
        self.reward_amount = reward_amount;
        self
    }

    /// Total kilograms between start and goal.
    pub fn total_to_lose(&self) -> f64 {
        self.start_weight - self.goal_weight
    }

    /// Check the invariants that hold regardless of metric.
    ///
    /// Spacing itself is validated by
    /// [`checkpoint_spacing_kg`](crate::checkpoint::checkpoint_spacing_kg).
    pub fn validate(&self) -> Result<(), CheckpointError> {
        if !self.start_weight.is_finite() || !self.goal_weight.is_finite() {
            return Err(CheckpointError::invalid_config(
                "start and goal weights must be finite",
            ));
        }
        if self.start_weight <= self.goal_weight {
            return Err(CheckpointError::invalid_config(format!(
                "start weight ({}) must be greater than goal weight ({})",
                self.start_weight, self.goal_weight
            )));
        }
        if self.goal_weight <= 0.0 {
            return Err(CheckpointError::invalid_config(format!(
                "goal weight must be positive, got {}",
                self.goal_weight
            )));
        }
        if self.reward_amount == 0 || self.reward_amount > MAX_REWARD_AMOUNT {
            return Err(CheckpointError::invalid_config(format!(
                "reward amount must be between 1 and {MAX_REWARD_AMOUNT}, got {}",
                self.reward_amount
            )));
        }
        Ok(())
    }
}

/// A persisted journey.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Journey {
    pub id: String,
    #[serde(flatten)]
    pub config: JourneyConfig,
    /// How long an activated reward stays active.
    pub reward_duration_hours: u32,
    pub is_active: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl Journey {
    /// Create a new active journey starting at `start_date`.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the configuration cannot produce checkpoints.
    pub fn new(
        config: JourneyConfig,
        reward_duration_hours: u32,
        start_date: DateTime<Utc>,
    ) -> Result<Self, CheckpointError> {
        config.validate()?;
        crate::checkpoint::checkpoint_spacing_kg(&config)?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            config,
            reward_duration_hours,
            is_active: true,
            start_date,
            end_date: None,
        })
    }

    /// Whole days since the journey started, never negative.
    pub fn days_elapsed(&self, now: DateTime<Utc>) -> i64 {
        (now - self.start_date).num_days().max(0)
    }
}
