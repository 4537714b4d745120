//! Reward grant persistence and lifecycle commands.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::database::{parse_opt_ts, parse_text, parse_ts};
use super::Database;
use crate::error::{CoreError, Result, ValidationError};
use crate::reward::{RewardGrant, RewardStatus};

const GRANT_COLUMNS: &str = "id, journey_id, checkpoint_number, weight_at_grant, status,
     created_at, activated_at, expires_at, completed_at, note";

fn grant_from_row(row: &Row<'_>) -> rusqlite::Result<RewardGrant> {
    Ok(RewardGrant {
        id: row.get(0)?,
        journey_id: row.get(1)?,
        checkpoint_number: row.get(2)?,
        weight_at_grant: row.get(3)?,
        status: parse_text::<RewardStatus>(4, row.get(4)?)?,
        created_at: parse_ts(5, row.get(5)?)?,
        activated_at: parse_opt_ts(6, row.get(6)?)?,
        expires_at: parse_opt_ts(7, row.get(7)?)?,
        completed_at: parse_opt_ts(8, row.get(8)?)?,
        note: row.get(9)?,
    })
}

impl Database {
    pub fn insert_reward_grant(&self, grant: &RewardGrant) -> Result<()> {
        self.conn().execute(
            "INSERT INTO reward_grants (id, journey_id, checkpoint_number, weight_at_grant,
                status, created_at, activated_at, expires_at, completed_at, note)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                grant.id,
                grant.journey_id,
                grant.checkpoint_number,
                grant.weight_at_grant,
                grant.status.as_str(),
                grant.created_at.to_rfc3339(),
                grant.activated_at.map(|d| d.to_rfc3339()),
                grant.expires_at.map(|d| d.to_rfc3339()),
                grant.completed_at.map(|d| d.to_rfc3339()),
                grant.note,
            ],
        )?;
        Ok(())
    }

    fn update_reward_grant(&self, grant: &RewardGrant) -> Result<()> {
        self.conn().execute(
            "UPDATE reward_grants SET status = ?2, activated_at = ?3, expires_at = ?4,
                completed_at = ?5, note = ?6
             WHERE id = ?1",
            params![
                grant.id,
                grant.status.as_str(),
                grant.activated_at.map(|d| d.to_rfc3339()),
                grant.expires_at.map(|d| d.to_rfc3339()),
                grant.completed_at.map(|d| d.to_rfc3339()),
                grant.note,
            ],
        )?;
        Ok(())
    }

    /// A grant of `journey_id`; grants of other journeys are not found.
    pub fn get_reward_grant(&self, journey_id: &str, id: &str) -> Result<RewardGrant> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {GRANT_COLUMNS} FROM reward_grants WHERE id = ?1 AND journey_id = ?2"
                ),
                params![id, journey_id],
                grant_from_row,
            )
            .optional()?
            .ok_or_else(|| CoreError::NotFound {
                kind: "reward",
                id: id.to_string(),
            })
    }

    /// Grants of a journey in creation order, optionally filtered by status.
    pub fn list_reward_grants(
        &self,
        journey_id: &str,
        status: Option<RewardStatus>,
    ) -> Result<Vec<RewardGrant>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {GRANT_COLUMNS} FROM reward_grants
             WHERE journey_id = ?1 AND (?2 IS NULL OR status = ?2)
             ORDER BY created_at ASC, checkpoint_number ASC"
        ))?;
        let rows = stmt.query_map(
            params![journey_id, status.map(|s| s.as_str())],
            grant_from_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn count_reward_grants(&self, journey_id: &str) -> Result<u32> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM reward_grants WHERE journey_id = ?1",
            params![journey_id],
            |row| row.get(0),
        )?)
    }

    /// Start using an available grant of `journey_id`.
    ///
    /// Expired active grants are closed first; a journey may then hold at
    /// most one active grant.
    pub fn activate_reward(
        &self,
        journey_id: &str,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<RewardGrant> {
        self.transaction(|db| {
            let mut grant = db.get_reward_grant(journey_id, id)?;
            db.expire_due_rewards(journey_id, now)?;

            if let Some(active) = db
                .list_reward_grants(journey_id, Some(RewardStatus::Active))?
                .into_iter()
                .next()
            {
                return Err(ValidationError::RewardAlreadyActive(active.id).into());
            }

            let journey = db.get_journey(journey_id)?;
            grant.activate(now, journey.reward_duration_hours)?;
            db.update_reward_grant(&grant)?;
            tracing::info!(reward = %grant.id, expires_at = ?grant.expires_at, "reward activated");
            Ok(grant)
        })
    }

    /// Close an active grant of `journey_id` before its timer runs out.
    ///
    /// A `note` replaces whatever was stored on the grant.
    pub fn complete_reward(
        &self,
        journey_id: &str,
        id: &str,
        now: DateTime<Utc>,
        note: Option<String>,
    ) -> Result<RewardGrant> {
        let mut grant = self.get_reward_grant(journey_id, id)?;
        grant.complete(now)?;
        if note.is_some() {
            grant.note = note;
        }
        self.update_reward_grant(&grant)?;
        Ok(grant)
    }

    /// Complete every active grant whose timer has run out.
    ///
    /// The completion time is the expiry time, not `now`.
    pub fn expire_due_rewards(&self, journey_id: &str, now: DateTime<Utc>) -> Result<Vec<RewardGrant>> {
        let mut expired = Vec::new();
        for mut grant in self.list_reward_grants(journey_id, Some(RewardStatus::Active))? {
            if !grant.is_expired(now) {
                continue;
            }
            let at = grant.expires_at.unwrap_or(now);
            grant.complete(at)?;
            self.update_reward_grant(&grant)?;
            tracing::debug!(reward = %grant.id, "reward expired");
            expired.push(grant);
        }
        Ok(expired)
    }
}
