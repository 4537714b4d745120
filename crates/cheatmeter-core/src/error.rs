//! Core error types for cheatmeter-core.
//!
//! This module defines the error hierarchy using thiserror so that the CLI
//! (or any other caller) can surface configuration problems, storage failures
//! and invalid reward transitions with a readable message.

use std::path::PathBuf;
use thiserror::Error;

use crate::reward::RewardTransitionError;

/// Core error type for cheatmeter-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Checkpoint engine rejected the journey configuration
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    /// Reward grant lifecycle violation
    #[error(transparent)]
    RewardTransition(#[from] RewardTransitionError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A record lookup by id found nothing
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the checkpoint engine.
///
/// Every variant is fatal to the evaluation call and guarantees that the
/// journey configuration was left untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CheckpointError {
    /// Non-positive spacing, inverted start/goal weights, or a zero reward amount.
    #[error("Invalid checkpoint configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The observed weight is NaN or infinite.
    #[error("Invalid weight observation: {0}")]
    InvalidWeight(f64),
}

impl CheckpointError {
    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        CheckpointError::InvalidConfig {
            reason: reason.into(),
        }
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the settings tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Could not resolve the data directory
    #[error("Cannot determine data directory: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// No journey is marked active
    #[error("No active journey; start one with `journey start`")]
    NoActiveJourney,

    /// A second grant cannot be activated while one is running
    #[error("Reward {0} is already active")]
    RewardAlreadyActive(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(DatabaseError::from(err))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_error_message_names_reason() {
        let err = CheckpointError::invalid_config("start weight must exceed goal weight");
        assert_eq!(
            err.to_string(),
            "Invalid checkpoint configuration: start weight must exceed goal weight"
        );
    }

    #[test]
    fn core_error_wraps_checkpoint_error_transparently() {
        let err: CoreError = CheckpointError::invalid_config("spacing is zero").into();
        assert_eq!(
            err.to_string(),
            "Invalid checkpoint configuration: spacing is zero"
        );
    }

    #[test]
    fn rusqlite_no_rows_maps_to_query_failed() {
        let err = DatabaseError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(err, DatabaseError::QueryFailed(_)));
    }
}
