use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome recorded for an attendance event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Verdict {
    CheckIn,
    CheckOut,
    Absent,
}

impl Verdict {
    /// Convert enum → record string (local buffer and remote `status`)
    pub fn as_record_str(&self) -> &'static str {
        match self {
            Verdict::CheckIn => "CheckIn",
            Verdict::CheckOut => "CheckOut",
            Verdict::Absent => "Absent",
        }
    }

    /// Convert record string → enum
    pub fn from_record_str(s: &str) -> Option<Self> {
        match s {
            "CheckIn" => Some(Verdict::CheckIn),
            "CheckOut" => Some(Verdict::CheckOut),
            "Absent" => Some(Verdict::Absent),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Verdict::Absent)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_record_str())
    }
}
