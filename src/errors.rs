//! Unified application error type.
//! All modules (storage, core, db, cli) return AppError so failures travel
//! with `?` up to the CLI, where they are printed once.

use std::io;
use thiserror::Error;

/// Failures reported by the external collaborators (sensor, remote store).
/// They never abort the control loop on their own.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("sensor error: {0}")]
    Sensor(String),

    #[error("operation timed out after {0} ms")]
    Timeout(u64),

    #[error("remote rejected the request: {0}")]
    Rejected(String),

    #[error("device unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    // ---------------------------
    // Serialization
    // ---------------------------
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ---------------------------
    // Parsing errors
    // ---------------------------
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    #[error("Invalid time window: {0}")]
    InvalidWindow(String),

    #[error("Unknown shift: {0}")]
    InvalidShift(String),

    #[error("Employee id {id} outside the allowed range 1..={max}")]
    InvalidEmployeeId { id: u32, max: u16 },

    #[error("Employee name is empty once cleaned: {0:?}")]
    InvalidName(String),

    #[error("Corrupt buffered record: {0}")]
    Parse(String),

    // ---------------------------
    // Attendance pipeline
    // ---------------------------
    #[error("Scan rejected: {0} is outside every window of the shift")]
    RejectedScan(String),

    #[error("Storage full: record needs {needed} bytes, {free} bytes free")]
    StorageFull { needed: usize, free: usize },

    #[error("Delivery unreachable: {0}")]
    DeliveryUnreachable(String),

    #[error("Partial drain: {delivered} of {total} buffered records delivered, buffer kept")]
    PartialDrainFailure { delivered: usize, total: usize },

    #[error("Roster fetch failed: {0}")]
    RosterFetch(String),

    #[error(transparent)]
    Device(#[from] DeviceError),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration")]
    ConfigLoad,

    #[error("Failed to save configuration")]
    ConfigSave,

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

impl AppError {
    /// Failures that lose the current event for good and must be shown to
    /// the user where they happen.
    pub fn is_final_for_event(&self) -> bool {
        matches!(
            self,
            AppError::RejectedScan(_) | AppError::StorageFull { .. }
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
