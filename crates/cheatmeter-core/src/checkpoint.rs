//! Checkpoint engine.
//!
//! Pure functions that turn a [`JourneyConfig`] and a weight into checkpoint
//! counts, reward counts and progress-bar targets. Nothing here performs I/O;
//! the only mutation is [`evaluate_new_observation`] advancing
//! `completed_checkpoints`, and persisting that is the caller's job.
//!
//! ## Grid
//!
//! ```text
//! start ──s── cp1 ──s── cp2 ──s── cp3 ... goal
//! ```
//!
//! The spacing `s` is computed once per call from the metric, so a percent
//! based journey keeps a fixed grid in kilograms.

use serde::{Deserialize, Serialize};

use crate::error::CheckpointError;
use crate::journey::{CheckpointMetric, JourneyConfig, MICRO_STEP_KG};

/// Slack applied to `lost / spacing` before flooring.
///
/// `85.0 - 82.5` and `100.0 - 96.0` divide cleanly on paper but not always in
/// binary floating point; an exact multiple must count as reached.
const BOUNDARY_EPSILON: f64 = 1e-9;

/// Largest grid a journey may define, counted from the start weight down to
/// zero. Keeps every count and reward product far inside `u32`.
pub const MAX_CHECKPOINTS: u32 = 10_000;

/// Result of evaluating one new weight observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckpointDelta {
    /// Checkpoints newly crossed by this observation.
    pub crossed: u32,
    /// Reward units the caller must materialise (`crossed * reward_amount`).
    pub rewards_to_grant: u32,
    /// Cumulative checkpoint count after the observation. Grants created for
    /// this delta are stamped with it.
    pub checkpoint_number: u32,
}

impl CheckpointDelta {
    pub fn is_noop(&self) -> bool {
        self.crossed == 0
    }
}

/// Weight delta in kilograms that makes up one checkpoint.
///
/// # Errors
/// `InvalidConfig` when the journey is inverted, the spacing is not positive,
/// or the grid would hold more than [`MAX_CHECKPOINTS`] steps.
pub fn checkpoint_spacing_kg(config: &JourneyConfig) -> Result<f64, CheckpointError> {
    config.validate()?;
    let spacing = match config.checkpoint_metric {
        CheckpointMetric::AbsoluteKg => config.checkpoint_value,
        CheckpointMetric::PercentOfGoal => {
            let total_to_lose = config.total_to_lose();
            if total_to_lose <= 0.0 {
                return Err(CheckpointError::invalid_config("nothing to lose"));
            }
            total_to_lose * (config.checkpoint_value / 100.0)
        }
        CheckpointMetric::FixedMicroStep => MICRO_STEP_KG,
    };

    if !spacing.is_finite() || spacing <= 0.0 {
        return Err(CheckpointError::invalid_config(format!(
            "checkpoint spacing must be positive, got {spacing} kg"
        )));
    }
    // Goal is positive, so the start weight bounds every reachable count.
    let steps = config.start_weight / spacing;
    if !steps.is_finite() || steps > f64::from(MAX_CHECKPOINTS) {
        return Err(CheckpointError::invalid_config(format!(
            "checkpoint spacing of {spacing} kg is too fine, at most {MAX_CHECKPOINTS} checkpoints are allowed"
        )));
    }
    Ok(spacing)
}

/// Cumulative checkpoints reached at `current_weight`.
///
/// Zero when nothing has been lost. An exact multiple of the spacing counts
/// as reached.
///
/// # Errors
/// `InvalidWeight` for non-finite or non-positive weights.
pub fn checkpoints_reached(
    config: &JourneyConfig,
    current_weight: f64,
) -> Result<u32, CheckpointError> {
    if !current_weight.is_finite() || current_weight <= 0.0 {
        return Err(CheckpointError::InvalidWeight(current_weight));
    }
    let spacing = checkpoint_spacing_kg(config)?;
    let lost = config.start_weight - current_weight;
    if lost <= 0.0 {
        return Ok(0);
    }
    let reached = (lost / spacing + BOUNDARY_EPSILON).floor();
    count_from_f64(reached)
}

fn count_from_f64(count: f64) -> Result<u32, CheckpointError> {
    if !(0.0..=f64::from(MAX_CHECKPOINTS)).contains(&count) {
        return Err(CheckpointError::invalid_config(format!(
            "checkpoint count {count} is out of range"
        )));
    }
    Ok(count as u32)
}

/// Reward units owed for `checkpoints` crossings.
fn rewards_for(config: &JourneyConfig, checkpoints: u32) -> Result<u32, CheckpointError> {
    checkpoints
        .checked_mul(config.reward_amount)
        .ok_or_else(|| CheckpointError::invalid_config("reward count overflows"))
}

/// Apply a newly recorded weight to the journey.
///
/// Advances `config.completed_checkpoints` when new checkpoints were crossed
/// and reports how many reward units are owed. Weights that cross nothing new
/// (equal, higher, or regained) leave `config` untouched, so re-evaluating the
/// same weight is idempotent.
///
/// # Errors
/// `InvalidConfig`/`InvalidWeight`; `config` is not modified in that case.
pub fn evaluate_new_observation(
    config: &mut JourneyConfig,
    new_weight: f64,
) -> Result<CheckpointDelta, CheckpointError> {
    let reached = match checkpoints_reached(config, new_weight) {
        Ok(reached) => reached,
        Err(e) => {
            tracing::warn!(error = %e, weight = new_weight, "checkpoint evaluation rejected");
            return Err(e);
        }
    };
    let completed = config.completed_checkpoints;
    if completed > MAX_CHECKPOINTS {
        return Err(CheckpointError::invalid_config(format!(
            "stored checkpoint count {completed} is out of range"
        )));
    }

    if reached <= completed {
        tracing::debug!(weight = new_weight, reached, completed, "no new checkpoint crossed");
        return Ok(CheckpointDelta {
            crossed: 0,
            rewards_to_grant: 0,
            checkpoint_number: completed,
        });
    }

    let crossed = reached - completed;
    let rewards_to_grant = rewards_for(config, crossed)?;
    config.completed_checkpoints = reached;

    tracing::info!(
        weight = new_weight,
        crossed,
        checkpoint = reached,
        rewards = rewards_to_grant,
        "checkpoint crossed"
    );

    Ok(CheckpointDelta {
        crossed,
        rewards_to_grant,
        checkpoint_number: reached,
    })
}

/// Target weight of the next checkpoint to reach.
pub fn next_checkpoint_target(config: &JourneyConfig) -> Result<f64, CheckpointError> {
    let spacing = checkpoint_spacing_kg(config)?;
    let next = config
        .completed_checkpoints
        .checked_add(1)
        .ok_or_else(|| CheckpointError::invalid_config("checkpoint count overflows"))?;
    Ok(config.start_weight - f64::from(next) * spacing)
}

/// Target weight of the most recently completed checkpoint, or the start
/// weight when none has been completed yet.
pub fn previous_checkpoint_target(config: &JourneyConfig) -> Result<f64, CheckpointError> {
    let spacing = checkpoint_spacing_kg(config)?;
    if config.completed_checkpoints == 0 {
        return Ok(config.start_weight);
    }
    Ok(config.start_weight - f64::from(config.completed_checkpoints) * spacing)
}

/// 0.0 .. 1.0 progress from the previous checkpoint towards the next one.
pub fn progress_fraction(
    config: &JourneyConfig,
    current_weight: f64,
) -> Result<f64, CheckpointError> {
    let previous = previous_checkpoint_target(config)?;
    let next = next_checkpoint_target(config)?;
    let span = previous - next;
    Ok(((previous - current_weight) / span).clamp(0.0, 1.0))
}

/// Number of checkpoints between start and goal, for step indicators.
///
/// Display only: rounds up so a final partial step still shows as a step.
/// Reward granting always goes through [`checkpoints_reached`].
pub fn total_checkpoint_steps(config: &JourneyConfig) -> Result<u32, CheckpointError> {
    let spacing = checkpoint_spacing_kg(config)?;
    count_from_f64((config.total_to_lose() / spacing - BOUNDARY_EPSILON).ceil().max(0.0))
}

/// Checkpoints and reward units a draft journey would produce if the goal
/// were reached exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JourneyPlan {
    pub planned_checkpoints: u32,
    pub planned_rewards: u32,
}

/// Preview shown before a journey is started.
pub fn plan_journey(config: &JourneyConfig) -> Result<JourneyPlan, CheckpointError> {
    let planned_checkpoints = checkpoints_reached(config, config.goal_weight)?;
    Ok(JourneyPlan {
        planned_checkpoints,
        planned_rewards: rewards_for(config, planned_checkpoints)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journey::RewardType;

    fn kg(start: f64, goal: f64, value: f64) -> JourneyConfig {
        JourneyConfig::new(start, goal, CheckpointMetric::AbsoluteKg, value)
    }

    #[test]
    fn spacing_per_metric() {
        assert_eq!(checkpoint_spacing_kg(&kg(85.0, 70.0, 2.5)).unwrap(), 2.5);

        let percent = JourneyConfig::new(100.0, 80.0, CheckpointMetric::PercentOfGoal, 10.0);
        assert!((checkpoint_spacing_kg(&percent).unwrap() - 2.0).abs() < 1e-12);

        let micro = JourneyConfig::new(100.0, 80.0, CheckpointMetric::FixedMicroStep, 42.0);
        assert_eq!(checkpoint_spacing_kg(&micro).unwrap(), 0.5);
    }

    #[test]
    fn spacing_rejects_non_positive_values() {
        assert!(checkpoint_spacing_kg(&kg(85.0, 70.0, 0.0)).is_err());
        assert!(checkpoint_spacing_kg(&kg(85.0, 70.0, -1.0)).is_err());
        let percent = JourneyConfig::new(100.0, 80.0, CheckpointMetric::PercentOfGoal, 0.0);
        assert!(checkpoint_spacing_kg(&percent).is_err());
    }

    #[test]
    fn exact_boundary_counts_as_reached() {
        let config = kg(85.0, 70.0, 2.5);
        assert_eq!(checkpoints_reached(&config, 82.5).unwrap(), 1);
        assert_eq!(checkpoints_reached(&config, 82.6).unwrap(), 0);
        assert_eq!(checkpoints_reached(&config, 80.0).unwrap(), 2);
    }

    #[test]
    fn percent_metric_uses_fixed_kg_grid() {
        let config = JourneyConfig::new(100.0, 80.0, CheckpointMetric::PercentOfGoal, 10.0);
        assert_eq!(checkpoints_reached(&config, 96.0).unwrap(), 2);
        assert_eq!(checkpoints_reached(&config, 96.1).unwrap(), 1);
    }

    #[test]
    fn weight_gain_reaches_nothing() {
        let config = kg(85.0, 70.0, 2.5);
        assert_eq!(checkpoints_reached(&config, 85.0).unwrap(), 0);
        assert_eq!(checkpoints_reached(&config, 90.0).unwrap(), 0);
    }

    #[test]
    fn inverted_config_fails_every_call() {
        let mut config = kg(70.0, 85.0, 1.0);
        assert!(checkpoints_reached(&config, 60.0).is_err());
        assert!(next_checkpoint_target(&config).is_err());
        assert!(previous_checkpoint_target(&config).is_err());
        assert!(evaluate_new_observation(&mut config, 60.0).is_err());
        assert_eq!(config.completed_checkpoints, 0);
    }

    #[test]
    fn non_finite_weight_is_rejected() {
        let mut config = kg(85.0, 70.0, 2.5);
        assert!(matches!(
            evaluate_new_observation(&mut config, f64::NAN),
            Err(CheckpointError::InvalidWeight(_))
        ));
        assert_eq!(config.completed_checkpoints, 0);
    }

    #[test]
    fn evaluate_grants_per_crossed_checkpoint() {
        let mut config = kg(85.0, 70.0, 2.5).with_reward(RewardType::Meals, 2);
        let delta = evaluate_new_observation(&mut config, 79.9).unwrap();
        assert_eq!(delta.crossed, 2);
        assert_eq!(delta.rewards_to_grant, 4);
        assert_eq!(delta.checkpoint_number, 2);
        assert_eq!(config.completed_checkpoints, 2);
    }

    #[test]
    fn evaluate_is_idempotent_for_same_weight() {
        let mut config = kg(85.0, 70.0, 2.5);
        let first = evaluate_new_observation(&mut config, 82.0).unwrap();
        assert_eq!(first.crossed, 1);
        let second = evaluate_new_observation(&mut config, 82.0).unwrap();
        assert!(second.is_noop());
        assert_eq!(second.rewards_to_grant, 0);
        assert_eq!(config.completed_checkpoints, 1);
    }

    #[test]
    fn regain_never_lowers_completed_checkpoints() {
        let mut config = kg(85.0, 70.0, 2.5);
        evaluate_new_observation(&mut config, 79.0).unwrap();
        assert_eq!(config.completed_checkpoints, 2);
        let delta = evaluate_new_observation(&mut config, 84.0).unwrap();
        assert!(delta.is_noop());
        assert_eq!(config.completed_checkpoints, 2);
        // Losing back down to an already-earned checkpoint grants nothing.
        let delta = evaluate_new_observation(&mut config, 80.0).unwrap();
        assert!(delta.is_noop());
    }

    #[test]
    fn targets_follow_completed_count() {
        let mut config = kg(85.0, 70.0, 2.5);
        assert_eq!(previous_checkpoint_target(&config).unwrap(), 85.0);
        assert_eq!(next_checkpoint_target(&config).unwrap(), 82.5);

        config.completed_checkpoints = 2;
        assert_eq!(previous_checkpoint_target(&config).unwrap(), 80.0);
        assert_eq!(next_checkpoint_target(&config).unwrap(), 77.5);
    }

    #[test]
    fn progress_fraction_is_clamped() {
        let mut config = kg(85.0, 70.0, 2.5);
        config.completed_checkpoints = 1;
        // previous 82.5, next 80.0
        assert!((progress_fraction(&config, 81.25).unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(progress_fraction(&config, 84.0).unwrap(), 0.0);
        assert_eq!(progress_fraction(&config, 79.0).unwrap(), 1.0);
    }

    #[test]
    fn total_steps_rounds_up_for_display() {
        assert_eq!(total_checkpoint_steps(&kg(85.0, 70.0, 2.5)).unwrap(), 6);
        assert_eq!(total_checkpoint_steps(&kg(85.0, 70.0, 4.0)).unwrap(), 4);
        let percent = JourneyConfig::new(100.0, 80.0, CheckpointMetric::PercentOfGoal, 30.0);
        assert_eq!(total_checkpoint_steps(&percent).unwrap(), 4);
    }

    #[test]
    fn too_fine_spacing_is_rejected_without_mutation() {
        let mut config = kg(100.0, 50.0, 1e-12);
        assert!(matches!(
            checkpoint_spacing_kg(&config),
            Err(CheckpointError::InvalidConfig { .. })
        ));
        assert!(matches!(
            evaluate_new_observation(&mut config, 10.0),
            Err(CheckpointError::InvalidConfig { .. })
        ));
        assert!(matches!(
            next_checkpoint_target(&config),
            Err(CheckpointError::InvalidConfig { .. })
        ));
        assert!(plan_journey(&config).is_err());
        assert!(total_checkpoint_steps(&config).is_err());
        assert_eq!(config.completed_checkpoints, 0);
    }

    #[test]
    fn grid_cap_counts_from_start_weight() {
        // 1 kg to lose but 100 kg of grid below the start.
        assert!(checkpoint_spacing_kg(&kg(100.0, 99.0, 0.02)).is_ok());
        assert!(checkpoint_spacing_kg(&kg(100.0, 99.0, 0.009)).is_err());
        let config = kg(100.0, 99.0, 0.02);
        assert!(checkpoints_reached(&config, 0.5).unwrap() <= MAX_CHECKPOINTS);
    }

    #[test]
    fn corrupt_completed_count_is_rejected() {
        let mut config = kg(85.0, 70.0, 2.5);
        config.completed_checkpoints = u32::MAX;
        assert!(next_checkpoint_target(&config).is_err());
        assert!(evaluate_new_observation(&mut config, 60.0).is_err());
        assert_eq!(config.completed_checkpoints, u32::MAX);
    }

    #[test]
    fn non_positive_weight_is_rejected() {
        let config = kg(85.0, 70.0, 2.5);
        assert!(matches!(
            checkpoints_reached(&config, 0.0),
            Err(CheckpointError::InvalidWeight(_))
        ));
    }

    #[test]
    fn plan_counts_full_checkpoints_only() {
        let config = kg(80.0, 70.0, 3.0).with_reward(RewardType::Meals, 2);
        let plan = plan_journey(&config).unwrap();
        assert_eq!(plan.planned_checkpoints, 3);
        assert_eq!(plan.planned_rewards, 6);
    }
}
