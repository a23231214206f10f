//! Collaborators the attendance pipeline talks to: fingerprint sensor,
//! clock, remote store, connectivity probe and the user feedback channel.
//!
//! Every call that can block takes the caller's timeout and reports
//! `DeviceError::Timeout` instead of stalling the loop.

pub mod sim;

use crate::errors::DeviceError;
use chrono::NaiveDateTime;
use serde_json::Value;
use std::time::Duration;

/// What the sensor saw during one capture attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// No finger on the sensor.
    Idle,
    /// Finger matched a stored template in this slot.
    Matched(u16),
    /// Finger present but not recognised.
    NoMatch,
}

pub trait BiometricReader {
    fn capture_and_identify(&mut self, timeout: Duration) -> Result<ScanOutcome, DeviceError>;

    /// Capture a finger twice and store the resulting template in `slot`.
    fn enroll(&mut self, slot: u16, timeout: Duration) -> Result<(), DeviceError>;
}

pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Hierarchical key/value store holding attendance, roster and leave data.
pub trait RemoteStore {
    /// Backend session is up (credentials accepted, client initialised).
    fn is_ready(&self) -> bool;

    /// Create or replace the record at `path`.
    fn write(&mut self, path: &str, record: &Value, timeout: Duration) -> Result<(), DeviceError>;

    /// All records directly under `path`; empty when there is nothing.
    fn read_bulk(&mut self, path: &str, timeout: Duration) -> Result<Vec<Value>, DeviceError>;
}

pub trait Connectivity {
    fn is_online(&mut self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Success,
    Failure,
}

/// Buzzer/display. Fire and forget.
pub trait Notifier {
    fn signal(&mut self, signal: Signal, message: &str);
}

/// Split a node path `/a/b/key` into its collection (`/a/b`) and key.
pub fn split_node_path(path: &str) -> (&str, &str) {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some((dir, key)) if !dir.is_empty() => (dir, key),
        _ => (trimmed, ""),
    }
}

/// The set of collaborators a controller is wired to.
pub struct Devices {
    pub reader: Box<dyn BiometricReader>,
    pub clock: Box<dyn Clock>,
    pub remote: Box<dyn RemoteStore>,
    pub link: Box<dyn Connectivity>,
    pub notifier: Box<dyn Notifier>,
}
