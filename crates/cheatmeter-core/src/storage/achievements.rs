//! Achievement persistence.
//!
//! Badges are global rather than per journey: once unlocked they stay
//! unlocked across journeys.

use rusqlite::{params, Row};

use super::database::{parse_opt_ts, parse_text};
use super::Database;
use crate::achievement::{default_catalog, Achievement, AchievementCategory, AchievementRarity, ProgressBasis};
use crate::error::Result;

fn achievement_from_row(row: &Row<'_>) -> rusqlite::Result<Achievement> {
    Ok(Achievement {
        id: row.get(0)?,
        category: parse_text::<AchievementCategory>(1, row.get(1)?)?,
        name: row.get(2)?,
        description: row.get(3)?,
        icon: row.get(4)?,
        rarity: parse_text::<AchievementRarity>(5, row.get(5)?)?,
        basis: parse_text::<ProgressBasis>(6, row.get(6)?)?,
        target_value: row.get(7)?,
        current_progress: row.get(8)?,
        unlocked_at: parse_opt_ts(9, row.get(9)?)?,
    })
}

impl Database {
    /// Insert the default catalog into an empty table.
    pub(crate) fn seed_achievements(&self) -> Result<()> {
        let existing: u32 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM achievements", [], |row| row.get(0))?;
        if existing > 0 {
            return Ok(());
        }
        for a in default_catalog() {
            self.conn().execute(
                "INSERT INTO achievements (id, category, name, description, icon, rarity,
                    basis, target_value, current_progress, unlocked_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL)",
                params![
                    a.id,
                    a.category.as_str(),
                    a.name,
                    a.description,
                    a.icon,
                    a.rarity.as_str(),
                    a.basis.as_str(),
                    a.target_value,
                    a.current_progress,
                ],
            )?;
        }
        Ok(())
    }

    /// Badges ordered by target, optionally for one category.
    pub fn list_achievements(&self, category: Option<AchievementCategory>) -> Result<Vec<Achievement>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, category, name, description, icon, rarity, basis, target_value,
                current_progress, unlocked_at
             FROM achievements
             WHERE ?1 IS NULL OR category = ?1
             ORDER BY target_value ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![category.map(|c| c.as_str())], achievement_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Persist progress and unlock state.
    ///
    /// `unlocked_at` is only ever set here, never cleared.
    pub fn save_achievement(&self, a: &Achievement) -> Result<()> {
        self.conn().execute(
            "UPDATE achievements
             SET current_progress = ?2,
                 unlocked_at = COALESCE(unlocked_at, ?3)
             WHERE id = ?1",
            params![a.id, a.current_progress, a.unlocked_at.map(|d| d.to_rfc3339())],
        )?;
        Ok(())
    }
}
