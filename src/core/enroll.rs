//! Remote-initiated fingerprint enrollment.
//!
//! The back office drops a `pending` request under `/fingerprint/register`;
//! the terminal captures the finger into the requested sensor slot and
//! writes the request back as `success` or `failed`.

use super::roster::EMPLOYEES_PATH;
use crate::device::{BiometricReader, RemoteStore};
use crate::errors::{AppError, AppResult};
use crate::models::enrollment::{ENROLL_DIR, ENROLL_PATH, EnrollmentRequest};
use crate::models::roster::{RemoteEmployeeRecord, checked_name, sanitize_name};
use crate::models::shift::ShiftKind;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollOutcome {
    Enrolled(EnrollmentRequest),
    Failed(EnrollmentRequest, String),
}

/// The pending request, if the back office has posted one.
pub fn poll_request(
    remote: &mut dyn RemoteStore,
    timeout: Duration,
) -> AppResult<Option<EnrollmentRequest>> {
    let records = remote.read_bulk(ENROLL_DIR, timeout)?;

    for raw in records {
        match serde_json::from_value::<EnrollmentRequest>(raw) {
            Ok(req) if req.is_pending() => return Ok(Some(req)),
            Ok(_) => {}
            Err(e) => log::warn!("[ENROLL] ignoring malformed request: {}", e),
        }
    }

    Ok(None)
}

/// Post a request (back office side; used by the CLI).
pub fn submit_request(
    remote: &mut dyn RemoteStore,
    request: &EnrollmentRequest,
    timeout: Duration,
) -> AppResult<()> {
    remote.write(ENROLL_PATH, &serde_json::to_value(request)?, timeout)?;
    Ok(())
}

/// Make sure the enrolled employee is on the remote roster, keeping any
/// shift already assigned there.
fn upsert_employee(
    remote: &mut dyn RemoteStore,
    request: &EnrollmentRequest,
    default_shift: ShiftKind,
    timeout: Duration,
) -> AppResult<()> {
    let existing = remote
        .read_bulk(EMPLOYEES_PATH, timeout)?
        .into_iter()
        .filter_map(|v| serde_json::from_value::<RemoteEmployeeRecord>(v).ok())
        .find(|r| r.id == request.id);

    let name = sanitize_name(&request.name);
    let shift = match existing {
        Some(ref r) if r.name == name => return Ok(()),
        Some(r) => r.shift.unwrap_or_else(|| default_shift.to_string()),
        None => default_shift.to_string(),
    };

    let record = RemoteEmployeeRecord {
        id: request.id,
        name,
        shift: Some(shift),
    };
    remote.write(
        &format!("{}/{}", EMPLOYEES_PATH, request.id),
        &serde_json::to_value(record)?,
        timeout,
    )?;
    Ok(())
}

/// Run a pending request against the sensor and report the result back.
pub fn process(
    reader: &mut dyn BiometricReader,
    remote: &mut dyn RemoteStore,
    request: &EnrollmentRequest,
    max_id: u16,
    default_shift: ShiftKind,
    sensor_timeout: Duration,
    remote_timeout: Duration,
) -> AppResult<EnrollOutcome> {
    let slot = match u16::try_from(request.id) {
        Ok(s) if (1..=max_id).contains(&s) => Ok(s),
        _ => Err(AppError::InvalidEmployeeId {
            id: request.id,
            max: max_id,
        }),
    };

    let slot = slot.and_then(|s| checked_name(&request.name).map(|_| s));

    let result = slot.map_err(|e| e.to_string()).and_then(|slot| {
        reader
            .enroll(slot, sensor_timeout)
            .map_err(|e| e.to_string())
    });

    let done = request.completed(result.is_ok());
    submit_request(remote, &done, remote_timeout)?;

    match result {
        Ok(()) => {
            upsert_employee(remote, &done, default_shift, remote_timeout)?;
            log::info!("[ENROLL] slot {} enrolled for '{}'", done.id, done.name);
            Ok(EnrollOutcome::Enrolled(done))
        }
        Err(reason) => {
            log::warn!("[ENROLL] slot {} failed: {}", done.id, reason);
            Ok(EnrollOutcome::Failed(done, reason))
        }
    }
}
