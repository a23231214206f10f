//! Shift window classification: a pure function of (window, minute of day).

use crate::errors::AppError;
use crate::models::shift::ShiftWindow;
use crate::models::verdict::Verdict;
use crate::utils::time::format_minutes;
use std::fmt;

/// The scan happened outside every window of the shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfWindow {
    pub minutes_of_day: u16,
}

impl fmt::Display for OutOfWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_minutes(self.minutes_of_day))
    }
}

impl From<OutOfWindow> for AppError {
    fn from(e: OutOfWindow) -> Self {
        AppError::RejectedScan(e.to_string())
    }
}

/// Inclusive range test; `start > end` means the range wraps past midnight
/// and covers `[start, 23:59] ∪ [00:00, end]`.
fn within(minutes: u16, start: u16, end: u16) -> bool {
    if start <= end {
        (start..=end).contains(&minutes)
    } else {
        minutes >= start || minutes <= end
    }
}

/// Check-in wins when the two windows overlap.
pub fn classify(shift: &ShiftWindow, minutes_of_day: u16) -> Result<Verdict, OutOfWindow> {
    if within(minutes_of_day, shift.check_in_start, shift.check_in_end) {
        return Ok(Verdict::CheckIn);
    }

    if within(minutes_of_day, shift.check_out_start, shift.check_out_end) {
        return Ok(Verdict::CheckOut);
    }

    Err(OutOfWindow { minutes_of_day })
}
