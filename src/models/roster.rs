use super::shift::ShiftKind;
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Employee known to the terminal, keyed by fingerprint slot id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub employee_id: u16,
    pub name: String,
    pub assigned_shift: ShiftKind,
}

/// Shape of an `/employees` record on the remote store. `shift` is free text
/// there and is resolved to a `ShiftKind` on ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteEmployeeRecord {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub shift: Option<String>,
}

impl RosterEntry {
    pub fn new(employee_id: u16, name: &str, assigned_shift: ShiftKind) -> Self {
        Self {
            employee_id,
            name: sanitize_name(name),
            assigned_shift,
        }
    }

    /// Name used for ids the roster does not know (e.g. "Employee7").
    pub fn placeholder(employee_id: u16, prefix: &str, shift: ShiftKind) -> Self {
        Self::new(employee_id, &format!("{prefix}{employee_id}"), shift)
    }
}

/// Names end up inside comma/newline delimited records on a zero-terminated
/// region: commas and control characters (NUL included) become spaces.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c == ',' || c.is_control() { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Cleaned name, or `InvalidName` when nothing printable is left.
pub fn checked_name(name: &str) -> AppResult<String> {
    let clean = sanitize_name(name);
    if clean.is_empty() {
        return Err(AppError::InvalidName(name.to_string()));
    }
    Ok(clean)
}
