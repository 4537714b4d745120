//! Progress analytics over a journey's weight history.
//!
//! Everything here is derived on demand from records; nothing is persisted.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::checkpoint::{
    next_checkpoint_target, previous_checkpoint_target, progress_fraction, total_checkpoint_steps,
};
use crate::error::CheckpointError;
use crate::journey::Journey;
use crate::records::{latest_entry, Slip, WeightEntry};

/// Look-back window for charts and summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "1w")]
    Week,
    #[default]
    #[serde(rename = "1m")]
    Month,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "all")]
    All,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Week => "1w",
            TimeRange::Month => "1m",
            TimeRange::ThreeMonths => "3m",
            TimeRange::All => "all",
        }
    }

    /// Earliest timestamp inside the window, `None` for `All`.
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            TimeRange::Week => Some(now - Duration::days(7)),
            TimeRange::Month => now.checked_sub_months(Months::new(1)),
            TimeRange::ThreeMonths => now.checked_sub_months(Months::new(3)),
            TimeRange::All => None,
        }
    }

    /// Entries inside the window, oldest first.
    pub fn filter<'a>(&self, entries: &'a [WeightEntry], now: DateTime<Utc>) -> Vec<&'a WeightEntry> {
        let since = self.since(now);
        let mut out: Vec<&WeightEntry> = entries
            .iter()
            .filter(|e| since.map_or(true, |s| e.recorded_at >= s))
            .collect();
        out.sort_by_key(|e| e.recorded_at);
        out
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1w" | "week" => Ok(Self::Week),
            "1m" | "month" => Ok(Self::Month),
            "3m" => Ok(Self::ThreeMonths),
            "all" => Ok(Self::All),
            _ => Err(format!("Unknown time range: {s} (expected 1w, 1m, 3m or all)")),
        }
    }
}

/// Body mass index, `None` without a usable height.
pub fn bmi(weight_kg: f64, height_cm: f64) -> Option<f64> {
    if height_cm <= 0.0 {
        return None;
    }
    let height_m = height_cm / 100.0;
    Some(weight_kg / (height_m * height_m))
}

/// Latest recorded weight, falling back to the start weight.
pub fn current_weight(journey: &Journey, entries: &[WeightEntry]) -> f64 {
    latest_entry(entries)
        .map(|e| e.weight)
        .unwrap_or(journey.config.start_weight)
}

/// Average kilograms lost per day since the first entry, never negative.
pub fn average_daily_loss(journey: &Journey, entries: &[WeightEntry], now: DateTime<Utc>) -> f64 {
    let Some(first) = entries.iter().min_by_key(|e| e.recorded_at) else {
        return 0.0;
    };
    let days = (now - first.recorded_at).num_days().max(1);
    let total_lost = journey.config.start_weight - current_weight(journey, entries);
    (total_lost / days as f64).max(0.0)
}

/// Linear projection of the weight `days` from now.
pub fn projected_weight(current: f64, average_daily_loss: f64, days: u32) -> f64 {
    (current - average_daily_loss * f64::from(days)).max(0.0)
}

/// Date the goal is reached at the current loss rate.
///
/// `None` while the rate is not positive; `now` when the goal is already met.
pub fn estimated_goal_date(
    current: f64,
    goal: f64,
    average_daily_loss: f64,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if average_daily_loss <= 0.0 {
        return None;
    }
    let remaining = current - goal;
    if remaining <= 0.0 {
        return Some(now);
    }
    let days = (remaining / average_daily_loss).floor() as i64;
    Some(now + Duration::days(days))
}

/// Whole days since the last slip, or since the journey started without any.
pub fn days_without_slips(journey: &Journey, slips: &[Slip], now: DateTime<Utc>) -> i64 {
    let since = slips
        .iter()
        .map(|s| s.recorded_at)
        .max()
        .unwrap_or(journey.start_date);
    (now - since).num_days().max(0)
}

/// Everything the dashboard and `stats summary` display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JourneySummary {
    pub start_weight: f64,
    pub goal_weight: f64,
    pub current_weight: f64,
    pub total_lost: f64,
    pub bmi: Option<f64>,
    pub completed_checkpoints: u32,
    pub total_checkpoint_steps: u32,
    pub previous_checkpoint: f64,
    pub next_checkpoint: f64,
    pub checkpoint_progress: f64,
    pub average_daily_loss: f64,
    pub projected_weight_in_month: f64,
    pub estimated_goal_date: Option<DateTime<Utc>>,
    pub days_without_slips: i64,
    pub slips_total: usize,
    pub entries_in_range: usize,
    pub range: TimeRange,
}

impl JourneySummary {
    /// # Errors
    /// `InvalidConfig` if the stored journey configuration is malformed.
    pub fn build(
        journey: &Journey,
        entries: &[WeightEntry],
        slips: &[Slip],
        height_cm: f64,
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> Result<Self, CheckpointError> {
        let config = &journey.config;
        let current = current_weight(journey, entries);
        let avg = average_daily_loss(journey, entries, now);

        Ok(Self {
            start_weight: config.start_weight,
            goal_weight: config.goal_weight,
            current_weight: current,
            total_lost: config.start_weight - current,
            bmi: bmi(current, height_cm),
            completed_checkpoints: config.completed_checkpoints,
            total_checkpoint_steps: total_checkpoint_steps(config)?,
            previous_checkpoint: previous_checkpoint_target(config)?,
            next_checkpoint: next_checkpoint_target(config)?,
            checkpoint_progress: progress_fraction(config, current)?,
            average_daily_loss: avg,
            projected_weight_in_month: projected_weight(current, avg, 30),
            estimated_goal_date: estimated_goal_date(current, config.goal_weight, avg, now),
            days_without_slips: days_without_slips(journey, slips, now),
            slips_total: slips.len(),
            entries_in_range: range.filter(entries, now).len(),
            range,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journey::{CheckpointMetric, JourneyConfig};

    fn journey(start: DateTime<Utc>) -> Journey {
        let config = JourneyConfig::new(100.0, 80.0, CheckpointMetric::AbsoluteKg, 2.0);
        Journey::new(config, 2, start).unwrap()
    }

    #[test]
    fn bmi_uses_metres() {
        let value = bmi(80.0, 200.0).unwrap();
        assert!((value - 20.0).abs() < 1e-9);
        assert!(bmi(80.0, 0.0).is_none());
    }

    #[test]
    fn average_loss_and_projection() {
        let now = Utc::now();
        let start = now - Duration::days(10);
        let j = journey(start);
        let entries = vec![
            WeightEntry::new(&j.id, 100.0, start),
            WeightEntry::new(&j.id, 95.0, now),
        ];
        let avg = average_daily_loss(&j, &entries, now);
        assert!((avg - 0.5).abs() < 1e-9);
        assert!((projected_weight(95.0, avg, 30) - 80.0).abs() < 1e-9);

        let eta = estimated_goal_date(95.0, 80.0, avg, now).unwrap();
        assert_eq!((eta - now).num_days(), 30);
    }

    #[test]
    fn weight_gain_gives_zero_rate_and_no_eta() {
        let now = Utc::now();
        let j = journey(now - Duration::days(5));
        let entries = vec![WeightEntry::new(&j.id, 102.0, now - Duration::days(5))];
        let avg = average_daily_loss(&j, &entries, now);
        assert_eq!(avg, 0.0);
        assert!(estimated_goal_date(102.0, 80.0, avg, now).is_none());
        assert_eq!(average_daily_loss(&j, &[], now), 0.0);
    }

    #[test]
    fn goal_already_met_eta_is_now() {
        let now = Utc::now();
        assert_eq!(estimated_goal_date(79.0, 80.0, 0.2, now), Some(now));
    }

    #[test]
    fn slip_free_days() {
        let now = Utc::now();
        let j = journey(now - Duration::days(12));
        assert_eq!(days_without_slips(&j, &[], now), 12);
        let slips = vec![
            Slip::new(&j.id, "pizza", now - Duration::days(8)),
            Slip::new(&j.id, "cake", now - Duration::days(3)),
        ];
        assert_eq!(days_without_slips(&j, &slips, now), 3);
    }

    #[test]
    fn range_filter_sorts_ascending() {
        let now = Utc::now();
        let j = journey(now - Duration::days(60));
        let entries = vec![
            WeightEntry::new(&j.id, 97.0, now - Duration::days(2)),
            WeightEntry::new(&j.id, 99.0, now - Duration::days(40)),
            WeightEntry::new(&j.id, 98.0, now - Duration::days(5)),
        ];
        let week = TimeRange::Week.filter(&entries, now);
        assert_eq!(week.iter().map(|e| e.weight).collect::<Vec<_>>(), vec![98.0, 97.0]);
        assert_eq!(TimeRange::All.filter(&entries, now).len(), 3);
        assert_eq!(TimeRange::ThreeMonths.filter(&entries, now)[0].weight, 99.0);
    }

    #[test]
    fn summary_combines_checkpoint_targets() {
        let now = Utc::now();
        let mut j = journey(now - Duration::days(4));
        j.config.completed_checkpoints = 1;
        let entries = vec![WeightEntry::new(&j.id, 97.0, now)];
        let summary = JourneySummary::build(&j, &entries, &[], 180.0, TimeRange::Month, now).unwrap();
        assert_eq!(summary.previous_checkpoint, 98.0);
        assert_eq!(summary.next_checkpoint, 96.0);
        assert!((summary.checkpoint_progress - 0.5).abs() < 1e-9);
        assert_eq!(summary.total_checkpoint_steps, 10);
        assert_eq!(summary.total_lost, 3.0);
    }

    #[test]
    fn time_range_parses_aliases() {
        assert_eq!("week".parse::<TimeRange>(), Ok(TimeRange::Week));
        assert_eq!("3M".parse::<TimeRange>(), Ok(TimeRange::ThreeMonths));
        assert!("1y".parse::<TimeRange>().is_err());
    }
}
