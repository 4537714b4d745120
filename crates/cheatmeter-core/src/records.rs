//! Logbook records attached to a journey: weights, slips and body measurements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A single weight observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub id: String,
    pub journey_id: String,
    pub weight: f64,
    pub recorded_at: DateTime<Utc>,
    pub note: Option<String>,
}

impl WeightEntry {
    pub fn new(journey_id: &str, weight: f64, recorded_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            journey_id: journey_id.to_string(),
            weight,
            recorded_at,
            note: None,
        }
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }
}

/// Most recent entry by timestamp.
pub fn latest_entry(entries: &[WeightEntry]) -> Option<&WeightEntry> {
    entries.iter().max_by_key(|e| e.recorded_at)
}

/// An instance of off-plan eating. Recorded only, never used in checkpoint math.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slip {
    pub id: String,
    pub journey_id: String,
    pub food: String,
    pub recorded_at: DateTime<Utc>,
    pub note: Option<String>,
}

impl Slip {
    pub fn new(journey_id: &str, food: &str, recorded_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            journey_id: journey_id.to_string(),
            food: food.to_string(),
            recorded_at,
            note: None,
        }
    }
}

/// Body circumference fields, in centimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementField {
    Chest,
    Waist,
    Hips,
    Shoulders,
    Thighs,
    Calves,
    Arms,
    Neck,
}

impl MeasurementField {
    pub const ALL: [MeasurementField; 8] = [
        MeasurementField::Chest,
        MeasurementField::Waist,
        MeasurementField::Hips,
        MeasurementField::Shoulders,
        MeasurementField::Thighs,
        MeasurementField::Calves,
        MeasurementField::Arms,
        MeasurementField::Neck,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementField::Chest => "chest",
            MeasurementField::Waist => "waist",
            MeasurementField::Hips => "hips",
            MeasurementField::Shoulders => "shoulders",
            MeasurementField::Thighs => "thighs",
            MeasurementField::Calves => "calves",
            MeasurementField::Arms => "arms",
            MeasurementField::Neck => "neck",
        }
    }
}

impl fmt::Display for MeasurementField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeasurementField {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| format!("Unknown measurement field: {s}"))
    }
}

/// A set of body measurements taken at one time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementEntry {
    pub id: String,
    pub journey_id: String,
    pub recorded_at: DateTime<Utc>,
    pub weight: f64,
    pub chest: Option<f64>,
    pub waist: Option<f64>,
    pub hips: Option<f64>,
    pub shoulders: Option<f64>,
    pub thighs: Option<f64>,
    pub calves: Option<f64>,
    pub arms: Option<f64>,
    pub neck: Option<f64>,
}

impl MeasurementEntry {
    pub fn new(journey_id: &str, weight: f64, recorded_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            journey_id: journey_id.to_string(),
            recorded_at,
            weight,
            chest: None,
            waist: None,
            hips: None,
            shoulders: None,
            thighs: None,
            calves: None,
            arms: None,
            neck: None,
        }
    }

    pub fn get(&self, field: MeasurementField) -> Option<f64> {
        match field {
            MeasurementField::Chest => self.chest,
            MeasurementField::Waist => self.waist,
            MeasurementField::Hips => self.hips,
            MeasurementField::Shoulders => self.shoulders,
            MeasurementField::Thighs => self.thighs,
            MeasurementField::Calves => self.calves,
            MeasurementField::Arms => self.arms,
            MeasurementField::Neck => self.neck,
        }
    }

    pub fn set(&mut self, field: MeasurementField, value: Option<f64>) {
        let slot = match field {
            MeasurementField::Chest => &mut self.chest,
            MeasurementField::Waist => &mut self.waist,
            MeasurementField::Hips => &mut self.hips,
            MeasurementField::Shoulders => &mut self.shoulders,
            MeasurementField::Thighs => &mut self.thighs,
            MeasurementField::Calves => &mut self.calves,
            MeasurementField::Arms => &mut self.arms,
            MeasurementField::Neck => &mut self.neck,
        };
        *slot = value;
    }

    /// `to - self` for one field; `None` unless both entries recorded it.
    pub fn difference(&self, to: &MeasurementEntry, field: MeasurementField) -> Option<f64> {
        Some(to.get(field)? - self.get(field)?)
    }

    /// Every field recorded in both entries, with its change.
    pub fn compare(&self, to: &MeasurementEntry) -> Vec<(MeasurementField, f64)> {
        MeasurementField::ALL
            .into_iter()
            .filter_map(|field| self.difference(to, field).map(|d| (field, d)))
            .collect()
    }
}
