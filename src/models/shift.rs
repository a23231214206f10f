use crate::errors::{AppError, AppResult};
use crate::utils::time::{format_window, parse_window};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of shifts a roster entry can be assigned to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShiftKind {
    #[default]
    Morning,
    Afternoon,
    Night,
}

impl ShiftKind {
    pub const ALL: [ShiftKind; 3] = [ShiftKind::Morning, ShiftKind::Afternoon, ShiftKind::Night];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftKind::Morning => "morning",
            ShiftKind::Afternoon => "afternoon",
            ShiftKind::Night => "night",
        }
    }

    /// Parse a shift name coming from the remote roster or the CLI
    /// (case-insensitive). Only used at the boundary; everything past it
    /// dispatches on the enum.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "morning" => Some(ShiftKind::Morning),
            "afternoon" => Some(ShiftKind::Afternoon),
            "night" => Some(ShiftKind::Night),
            _ => None,
        }
    }
}

impl fmt::Display for ShiftKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check-in and check-out periods of one shift, in minutes since midnight.
/// A window with `start > end` wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftWindow {
    pub check_in_start: u16,
    pub check_in_end: u16,
    pub check_out_start: u16,
    pub check_out_end: u16,
}

impl ShiftWindow {
    pub fn new(check_in: (u16, u16), check_out: (u16, u16)) -> Self {
        Self {
            check_in_start: check_in.0,
            check_in_end: check_in.1,
            check_out_start: check_out.0,
            check_out_end: check_out.1,
        }
    }

    /// Build from the config notation ("HH:MM-HH:MM" for each window).
    pub fn parse(check_in: &str, check_out: &str) -> AppResult<Self> {
        Ok(Self::new(parse_window(check_in)?, parse_window(check_out)?))
    }

    pub fn check_out_wraps(&self) -> bool {
        self.check_out_start > self.check_out_end
    }

    pub fn describe(&self) -> String {
        format!(
            "in {} / out {}",
            format_window(self.check_in_start, self.check_in_end),
            format_window(self.check_out_start, self.check_out_end)
        )
    }
}

/// Shift → window lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftTable {
    pub morning: ShiftWindow,
    pub afternoon: ShiftWindow,
    pub night: ShiftWindow,
}

impl ShiftTable {
    pub fn window(&self, kind: ShiftKind) -> &ShiftWindow {
        match kind {
            ShiftKind::Morning => &self.morning,
            ShiftKind::Afternoon => &self.afternoon,
            ShiftKind::Night => &self.night,
        }
    }

    pub fn from_config(cfg: &crate::config::ShiftsConfig) -> AppResult<Self> {
        let build = |kind: ShiftKind, w: &crate::config::WindowConfig| {
            ShiftWindow::parse(&w.check_in, &w.check_out).map_err(|e| {
                AppError::Config(format!("shift '{}': {}", kind, e))
            })
        };

        Ok(Self {
            morning: build(ShiftKind::Morning, &cfg.morning)?,
            afternoon: build(ShiftKind::Afternoon, &cfg.afternoon)?,
            night: build(ShiftKind::Night, &cfg.night)?,
        })
    }
}
