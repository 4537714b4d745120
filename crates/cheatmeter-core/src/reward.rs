//! Reward grants and their lifecycle.
//!
//! One grant is one cheat meal or free day. Grants are created `Available`
//! when a checkpoint is crossed and are never removed by re-evaluation.
//!
//! ```text
//! AVAILABLE ──activate──> ACTIVE ──complete/expire──> COMPLETED
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardStatus {
    /// Earned, not yet used
    Available,
    /// Timer running until `expires_at`
    Active,
    /// Used up (terminal state)
    Completed,
}

impl RewardStatus {
    /// Check if a transition is valid.
    pub fn can_transition_to(&self, to: &RewardStatus) -> bool {
        match self {
            RewardStatus::Available => matches!(to, RewardStatus::Active),
            RewardStatus::Active => matches!(to, RewardStatus::Completed),
            RewardStatus::Completed => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RewardStatus::Available => "available",
            RewardStatus::Active => "active",
            RewardStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for RewardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RewardStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Unknown reward status: {s}")),
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Invalid reward transition: {from} → {to}")]
pub struct RewardTransitionError {
    pub from: RewardStatus,
    pub to: RewardStatus,
}

/// One earned reward unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardGrant {
    pub id: String,
    pub journey_id: String,
    /// Cumulative checkpoint count at the time of the grant.
    pub checkpoint_number: u32,
    pub weight_at_grant: f64,
    pub status: RewardStatus,
    pub created_at: DateTime<Utc>,
    pub activated_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

impl RewardGrant {
    pub fn new(
        journey_id: &str,
        checkpoint_number: u32,
        weight_at_grant: f64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            journey_id: journey_id.to_string(),
            checkpoint_number,
            weight_at_grant,
            status: RewardStatus::Available,
            created_at,
            activated_at: None,
            expires_at: None,
            completed_at: None,
            note: None,
        }
    }

    /// Build `count` identical grants for one crossing event.
    pub fn batch(
        journey_id: &str,
        count: u32,
        checkpoint_number: u32,
        weight_at_grant: f64,
        created_at: DateTime<Utc>,
    ) -> Vec<Self> {
        (0..count)
            .map(|_| Self::new(journey_id, checkpoint_number, weight_at_grant, created_at))
            .collect()
    }

    fn transition_to(&mut self, to: RewardStatus) -> Result<(), RewardTransitionError> {
        if !self.status.can_transition_to(&to) {
            return Err(RewardTransitionError {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Start using the reward. It expires `duration_hours` after `now`.
    pub fn activate(
        &mut self,
        now: DateTime<Utc>,
        duration_hours: u32,
    ) -> Result<(), RewardTransitionError> {
        self.transition_to(RewardStatus::Active)?;
        self.activated_at = Some(now);
        self.expires_at = Some(now + Duration::hours(i64::from(duration_hours)));
        Ok(())
    }

    /// Close an active reward.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), RewardTransitionError> {
        self.transition_to(RewardStatus::Completed)?;
        self.completed_at = Some(now);
        Ok(())
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == RewardStatus::Active && self.expires_at.is_some_and(|at| now >= at)
    }

    /// Time left on an active reward, zero once expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        match (self.status, self.expires_at) {
            (RewardStatus::Active, Some(at)) => Some((at - now).max(Duration::zero())),
            _ => None,
        }
    }
}

/// Counts of grants by status, for dashboards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSummary {
    pub available: u32,
    pub active: u32,
    pub completed: u32,
}

impl RewardSummary {
    pub fn from_grants<'a>(grants: impl IntoIterator<Item = &'a RewardGrant>) -> Self {
        let mut summary = Self::default();
        for grant in grants {
            match grant.status {
                RewardStatus::Available => summary.available += 1,
                RewardStatus::Active => summary.active += 1,
                RewardStatus::Completed => summary.completed += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> u32 {
        self.available + self.active + self.completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activate_stamps_expiry() {
        let now = Utc::now();
        let mut grant = RewardGrant::new("j", 1, 82.0, now);
        grant.activate(now, 2).unwrap();
        assert_eq!(grant.status, RewardStatus::Active);
        assert_eq!(grant.activated_at, Some(now));
        assert_eq!(grant.expires_at, Some(now + Duration::hours(2)));
    }

    #[test]
    fn cannot_complete_available_grant() {
        let now = Utc::now();
        let mut grant = RewardGrant::new("j", 1, 82.0, now);
        let err = grant.complete(now).unwrap_err();
        assert_eq!(err.from, RewardStatus::Available);
        assert_eq!(err.to, RewardStatus::Completed);
        assert_eq!(grant.status, RewardStatus::Available);
    }

    #[test]
    fn completed_is_terminal() {
        let now = Utc::now();
        let mut grant = RewardGrant::new("j", 1, 82.0, now);
        grant.activate(now, 1).unwrap();
        grant.complete(now).unwrap();
        assert!(grant.activate(now, 1).is_err());
        assert!(grant.complete(now).is_err());
    }

    #[test]
    fn expiry_and_remaining() {
        let now = Utc::now();
        let mut grant = RewardGrant::new("j", 1, 82.0, now);
        assert!(!grant.is_expired(now));
        assert!(grant.remaining(now).is_none());

        grant.activate(now, 3).unwrap();
        assert_eq!(grant.remaining(now + Duration::hours(1)), Some(Duration::hours(2)));
        assert!(!grant.is_expired(now + Duration::minutes(179)));
        assert!(grant.is_expired(now + Duration::hours(3)));
        assert_eq!(grant.remaining(now + Duration::hours(5)), Some(Duration::zero()));
    }

    #[test]
    fn batch_shares_checkpoint_and_weight() {
        let grants = RewardGrant::batch("j", 3, 4, 78.5, Utc::now());
        assert_eq!(grants.len(), 3);
        assert!(grants.iter().all(|g| g.checkpoint_number == 4 && g.weight_at_grant == 78.5));
        assert_ne!(grants[0].id, grants[1].id);
    }

    #[test]
    fn summary_counts_by_status() {
        let now = Utc::now();
        let mut grants = RewardGrant::batch("j", 3, 1, 80.0, now);
        grants[0].activate(now, 1).unwrap();
        grants[1].activate(now, 1).unwrap();
        grants[1].complete(now).unwrap();
        let summary = RewardSummary::from_grants(&grants);
        assert_eq!(summary, RewardSummary { available: 1, active: 1, completed: 1 });
        assert_eq!(summary.total(), 3);
    }
}
