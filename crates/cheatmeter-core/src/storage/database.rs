//! SQLite-based record store.
//!
//! Provides persistent storage for:
//! - Journeys and their checkpoint configuration
//! - Weight entries
//! - Reward grants, slips, measurements and achievements (see sibling modules)
//! - Key-value store for application state

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::str::FromStr;

use super::{data_dir, migrations};
use crate::error::{CoreError, DatabaseError, Result};
use crate::journey::{CheckpointMetric, Journey, JourneyConfig, RewardType};
use crate::records::WeightEntry;
use crate::reward::RewardGrant;
use crate::tracker::JourneyStore;

/// SQLite database for journey records.
pub struct Database {
    conn: Connection,
}

pub(crate) fn parse_text<T>(idx: usize, value: String) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    value
        .parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

pub(crate) fn parse_ts(idx: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn parse_opt_ts(idx: usize, value: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    value.map(|v| parse_ts(idx, v)).transpose()
}

const JOURNEY_COLUMNS: &str = "id, start_weight, goal_weight, checkpoint_metric, checkpoint_value,
     reward_type, reward_amount, reward_duration_hours, completed_checkpoints,
     is_active, start_date, end_date";

fn journey_from_row(row: &Row<'_>) -> rusqlite::Result<Journey> {
    Ok(Journey {
        id: row.get(0)?,
        config: JourneyConfig {
            start_weight: row.get(1)?,
            goal_weight: row.get(2)?,
            checkpoint_metric: parse_text::<CheckpointMetric>(3, row.get(3)?)?,
            checkpoint_value: row.get(4)?,
            reward_type: parse_text::<RewardType>(5, row.get(5)?)?,
            reward_amount: row.get(6)?,
            completed_checkpoints: row.get(8)?,
        },
        reward_duration_hours: row.get(7)?,
        is_active: row.get(9)?,
        start_date: parse_ts(10, row.get(10)?)?,
        end_date: parse_opt_ts(11, row.get(11)?)?,
    })
}

fn weight_entry_from_row(row: &Row<'_>) -> rusqlite::Result<WeightEntry> {
    Ok(WeightEntry {
        id: row.get(0)?,
        journey_id: row.get(1)?,
        weight: row.get(2)?,
        recorded_at: parse_ts(3, row.get(3)?)?,
        note: row.get(4)?,
    })
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/cheatmeter.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("cheatmeter.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database file at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate(&self.conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        self.seed_achievements()?;
        Ok(())
    }

    /// Run `f` inside a transaction, committing only if it succeeds.
    pub fn transaction<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }

    // ── Journeys ─────────────────────────────────────────────────────

    /// Store a new journey and make it the only active one.
    ///
    /// Any previously active journey is closed with `end_date = journey.start_date`.
    pub fn insert_journey(&self, journey: &Journey) -> Result<()> {
        self.transaction(|db| db.insert_journey_row(journey))
    }

    /// Statements behind [`insert_journey`](Self::insert_journey), for callers
    /// that already hold a transaction.
    pub(crate) fn insert_journey_row(&self, journey: &Journey) -> Result<()> {
        self.conn.execute(
            "UPDATE journeys SET is_active = 0, end_date = ?1 WHERE is_active = 1",
            params![journey.start_date.to_rfc3339()],
        )?;
        self.conn.execute(
            "INSERT INTO journeys (id, start_weight, goal_weight, checkpoint_metric,
                checkpoint_value, reward_type, reward_amount, reward_duration_hours,
                completed_checkpoints, is_active, start_date, end_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                journey.id,
                journey.config.start_weight,
                journey.config.goal_weight,
                journey.config.checkpoint_metric.as_str(),
                journey.config.checkpoint_value,
                journey.config.reward_type.as_str(),
                journey.config.reward_amount,
                journey.reward_duration_hours,
                journey.config.completed_checkpoints,
                journey.is_active,
                journey.start_date.to_rfc3339(),
                journey.end_date.map(|d| d.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    pub fn get_journey(&self, id: &str) -> Result<Journey> {
        self.conn
            .query_row(
                &format!("SELECT {JOURNEY_COLUMNS} FROM journeys WHERE id = ?1"),
                params![id],
                journey_from_row,
            )
            .optional()?
            .ok_or_else(|| CoreError::NotFound {
                kind: "journey",
                id: id.to_string(),
            })
    }

    /// The journey currently in progress, if any.
    pub fn active_journey(&self) -> Result<Option<Journey>> {
        Ok(self
            .conn
            .query_row(
                &format!(
                    "SELECT {JOURNEY_COLUMNS} FROM journeys WHERE is_active = 1
                     ORDER BY start_date DESC LIMIT 1"
                ),
                [],
                journey_from_row,
            )
            .optional()?)
    }

    /// All journeys, newest first.
    pub fn list_journeys(&self) -> Result<Vec<Journey>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {JOURNEY_COLUMNS} FROM journeys ORDER BY start_date DESC"
        ))?;
        let rows = stmt.query_map([], journey_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Overwrite the mutable parts of a journey.
    ///
    /// `completed_checkpoints` is written as-is; callers only ever raise it.
    pub fn update_journey(&self, journey: &Journey) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE journeys SET start_weight = ?2, goal_weight = ?3, checkpoint_metric = ?4,
                checkpoint_value = ?5, reward_type = ?6, reward_amount = ?7,
                reward_duration_hours = ?8, completed_checkpoints = ?9, is_active = ?10,
                end_date = ?11
             WHERE id = ?1",
            params![
                journey.id,
                journey.config.start_weight,
                journey.config.goal_weight,
                journey.config.checkpoint_metric.as_str(),
                journey.config.checkpoint_value,
                journey.config.reward_type.as_str(),
                journey.config.reward_amount,
                journey.reward_duration_hours,
                journey.config.completed_checkpoints,
                journey.is_active,
                journey.end_date.map(|d| d.to_rfc3339()),
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::NotFound {
                kind: "journey",
                id: journey.id.clone(),
            });
        }
        Ok(())
    }

    // ── Weight entries ───────────────────────────────────────────────

    pub fn insert_weight_entry(&self, entry: &WeightEntry) -> Result<()> {
        self.conn.execute(
            "INSERT INTO weight_entries (id, journey_id, weight, recorded_at, note)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.id,
                entry.journey_id,
                entry.weight,
                entry.recorded_at.to_rfc3339(),
                entry.note,
            ],
        )?;
        Ok(())
    }

    /// Weight entries of a journey, oldest first.
    pub fn list_weight_entries(&self, journey_id: &str) -> Result<Vec<WeightEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, journey_id, weight, recorded_at, note
             FROM weight_entries WHERE journey_id = ?1
             ORDER BY recorded_at ASC",
        )?;
        let rows = stmt.query_map(params![journey_id], weight_entry_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Remove an entry of `journey_id`. Checkpoints and grants already earned
    /// are kept.
    pub fn delete_weight_entry(&self, journey_id: &str, id: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "DELETE FROM weight_entries WHERE id = ?1 AND journey_id = ?2",
            params![id, journey_id],
        )?;
        Ok(changed > 0)
    }

    // ── Key-value store ──────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl JourneyStore for Database {
    fn load_config(&self, journey_id: &str) -> Result<JourneyConfig> {
        Ok(self.get_journey(journey_id)?.config)
    }

    fn save_config(&self, journey_id: &str, config: &JourneyConfig) -> Result<()> {
        let mut journey = self.get_journey(journey_id)?;
        journey.config = config.clone();
        self.update_journey(&journey)
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
        for grant in &grants {
            self.insert_reward_grant(grant)?;
        }
        Ok(grants)
    }
}
