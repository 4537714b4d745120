//! Database schema migrations for cheatmeter.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 4;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }
    if current_version < 3 {
        migrate_v3(conn)?;
    }
    if current_version < 4 {
        migrate_v4(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: journeys, weight entries, reward grants and the kv store.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS journeys (
            id                    TEXT PRIMARY KEY,
            start_weight          REAL NOT NULL,
            goal_weight           REAL NOT NULL,
            checkpoint_metric     TEXT NOT NULL,
            checkpoint_value      REAL NOT NULL,
            reward_type           TEXT NOT NULL,
            reward_amount         INTEGER NOT NULL DEFAULT 1,
            reward_duration_hours INTEGER NOT NULL DEFAULT 2,
            completed_checkpoints INTEGER NOT NULL DEFAULT 0,
            is_active             INTEGER NOT NULL DEFAULT 1,
            start_date            TEXT NOT NULL,
            end_date              TEXT
        );

        CREATE TABLE IF NOT EXISTS weight_entries (
            id          TEXT PRIMARY KEY,
            journey_id  TEXT NOT NULL REFERENCES journeys(id) ON DELETE CASCADE,
            weight      REAL NOT NULL,
            recorded_at TEXT NOT NULL,
            note        TEXT
        );

        CREATE TABLE IF NOT EXISTS reward_grants (
            id                TEXT PRIMARY KEY,
            journey_id        TEXT NOT NULL REFERENCES journeys(id) ON DELETE CASCADE,
            checkpoint_number INTEGER NOT NULL,
            weight_at_grant   REAL NOT NULL,
            status            TEXT NOT NULL DEFAULT 'available',
            created_at        TEXT NOT NULL,
            activated_at      TEXT,
            expires_at        TEXT,
            completed_at      TEXT
        );

        CREATE TABLE IF NOT EXISTS kv (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_weight_entries_journey ON weight_entries(journey_id, recorded_at);
        CREATE INDEX IF NOT EXISTS idx_reward_grants_journey ON reward_grants(journey_id, status);",
    )?;
    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: slips and body measurements.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS slips (
            id          TEXT PRIMARY KEY,
            journey_id  TEXT NOT NULL REFERENCES journeys(id) ON DELETE CASCADE,
            food        TEXT NOT NULL,
            recorded_at TEXT NOT NULL,
            note        TEXT
        );

        CREATE TABLE IF NOT EXISTS measurements (
            id          TEXT PRIMARY KEY,
            journey_id  TEXT NOT NULL REFERENCES journeys(id) ON DELETE CASCADE,
            recorded_at TEXT NOT NULL,
            weight      REAL NOT NULL,
            chest       REAL,
            waist       REAL,
            hips        REAL,
            shoulders   REAL,
            thighs      REAL,
            calves      REAL,
            arms        REAL,
            neck        REAL
        );

        CREATE INDEX IF NOT EXISTS idx_slips_journey ON slips(journey_id, recorded_at);
        CREATE INDEX IF NOT EXISTS idx_measurements_journey ON measurements(journey_id, recorded_at);",
    )?;
    set_schema_version(&tx, 2)?;
    tx.commit()
}

/// Migration v3: achievements, and a free-text note on reward grants.
fn migrate_v3(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS achievements (
            id               TEXT PRIMARY KEY,
            category         TEXT NOT NULL,
            name             TEXT NOT NULL,
            description      TEXT NOT NULL,
            icon             TEXT NOT NULL,
            rarity           TEXT NOT NULL,
            basis            TEXT NOT NULL DEFAULT 'absolute',
            target_value     REAL NOT NULL,
            current_progress REAL NOT NULL DEFAULT 0,
            unlocked_at      TEXT
        );

        ALTER TABLE reward_grants ADD COLUMN note TEXT;",
    )?;
    set_schema_version(&tx, 3)?;
    tx.commit()
}

/// Migration v4: recipe catalog.
fn migrate_v4(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS recipes (
            id              TEXT PRIMARY KEY,
            name            TEXT NOT NULL,
            description     TEXT NOT NULL DEFAULT '',
            category        TEXT NOT NULL DEFAULT '',
            calories        INTEGER NOT NULL DEFAULT 0,
            protein         INTEGER NOT NULL DEFAULT 0,
            carbs           INTEGER NOT NULL DEFAULT 0,
            fat             INTEGER NOT NULL DEFAULT 0,
            ingredients     TEXT NOT NULL DEFAULT '',
            instructions    TEXT NOT NULL DEFAULT '',
            image_url       TEXT,
            is_favorite     INTEGER NOT NULL DEFAULT 0,
            is_user_created INTEGER NOT NULL DEFAULT 1,
            created_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_recipes_name ON recipes(name);",
    )?;
    set_schema_version(&tx, 4)?;
    tx.commit()
}
