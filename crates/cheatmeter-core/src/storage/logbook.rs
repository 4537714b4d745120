//! Slip and body-measurement persistence.

use rusqlite::{params, Row};

use super::database::parse_ts;
use super::Database;
use crate::error::Result;
use crate::records::{MeasurementEntry, Slip};

fn slip_from_row(row: &Row<'_>) -> rusqlite::Result<Slip> {
    Ok(Slip {
        id: row.get(0)?,
        journey_id: row.get(1)?,
        food: row.get(2)?,
        recorded_at: parse_ts(3, row.get(3)?)?,
        note: row.get(4)?,
    })
}

fn measurement_from_row(row: &Row<'_>) -> rusqlite::Result<MeasurementEntry> {
    Ok(MeasurementEntry {
        id: row.get(0)?,
        journey_id: row.get(1)?,
        recorded_at: parse_ts(2, row.get(2)?)?,
        weight: row.get(3)?,
        chest: row.get(4)?,
        waist: row.get(5)?,
        hips: row.get(6)?,
        shoulders: row.get(7)?,
        thighs: row.get(8)?,
        calves: row.get(9)?,
        arms: row.get(10)?,
        neck: row.get(11)?,
    })
}

impl Database {
    pub fn insert_slip(&self, slip: &Slip) -> Result<()> {
        self.conn().execute(
            "INSERT INTO slips (id, journey_id, food, recorded_at, note)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                slip.id,
                slip.journey_id,
                slip.food,
                slip.recorded_at.to_rfc3339(),
                slip.note,
            ],
        )?;
        Ok(())
    }

    /// Slips of a journey, newest first.
    pub fn list_slips(&self, journey_id: &str) -> Result<Vec<Slip>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, journey_id, food, recorded_at, note
             FROM slips WHERE journey_id = ?1 ORDER BY recorded_at DESC",
        )?;
        let rows = stmt.query_map(params![journey_id], slip_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Remove a slip of `journey_id`. False when no such slip exists there.
    pub fn delete_slip(&self, journey_id: &str, id: &str) -> Result<bool> {
        let changed = self.conn().execute(
            "DELETE FROM slips WHERE id = ?1 AND journey_id = ?2",
            params![id, journey_id],
        )?;
        Ok(changed > 0)
    }

    pub fn insert_measurement(&self, m: &MeasurementEntry) -> Result<()> {
        self.conn().execute(
            "INSERT INTO measurements (id, journey_id, recorded_at, weight, chest, waist,
                hips, shoulders, thighs, calves, arms, neck)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                m.id,
                m.journey_id,
                m.recorded_at.to_rfc3339(),
                m.weight,
                m.chest,
                m.waist,
                m.hips,
                m.shoulders,
                m.thighs,
                m.calves,
                m.arms,
                m.neck,
            ],
        )?;
        Ok(())
    }

    /// Measurements of a journey, newest first.
    pub fn list_measurements(&self, journey_id: &str) -> Result<Vec<MeasurementEntry>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, journey_id, recorded_at, weight, chest, waist, hips, shoulders,
                thighs, calves, arms, neck
             FROM measurements WHERE journey_id = ?1 ORDER BY recorded_at DESC",
        )?;
        let rows = stmt.query_map(params![journey_id], measurement_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn delete_measurement(&self, journey_id: &str, id: &str) -> Result<bool> {
        let changed = self.conn().execute(
            "DELETE FROM measurements WHERE id = ?1 AND journey_id = ?2",
            params![id, journey_id],
        )?;
        Ok(changed > 0)
    }
}
