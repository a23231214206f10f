//! Time utilities: parsing HH:MM, time windows, minutes-of-day conversions.

use crate::errors::{AppError, AppResult};
use chrono::{NaiveTime, Timelike};

pub const MINUTES_PER_DAY: u16 = 24 * 60;

pub fn parse_time(t: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(t.trim(), "%H:%M").ok()
}

/// Minutes elapsed since midnight (0..=1439).
pub fn minutes_of_day(t: NaiveTime) -> u16 {
    (t.hour() * 60 + t.minute()) as u16
}

pub fn time_from_minutes(mins: u16) -> Option<NaiveTime> {
    if mins >= MINUTES_PER_DAY {
        return None;
    }
    NaiveTime::from_hms_opt(u32::from(mins / 60), u32::from(mins % 60), 0)
}

/// Parse a window written as "HH:MM-HH:MM" into minutes-of-day bounds.
/// A start later than the end is allowed: it denotes a window that wraps
/// past midnight.
pub fn parse_window(s: &str) -> AppResult<(u16, u16)> {
    let (start, end) = s
        .split_once('-')
        .ok_or_else(|| AppError::InvalidWindow(s.to_string()))?;

    let start = parse_time(start).ok_or_else(|| AppError::InvalidWindow(s.to_string()))?;
    let end = parse_time(end).ok_or_else(|| AppError::InvalidWindow(s.to_string()))?;

    Ok((minutes_of_day(start), minutes_of_day(end)))
}

pub fn format_minutes(mins: u16) -> String {
    format!("{:02}:{:02}", mins / 60, mins % 60)
}

pub fn format_window(start: u16, end: u16) -> String {
    format!("{}-{}", format_minutes(start), format_minutes(end))
}

pub fn parse_optional_time(input: Option<&String>) -> AppResult<Option<NaiveTime>> {
    if let Some(s) = input {
        let t = parse_time(s).ok_or_else(|| AppError::InvalidTime(s.to_string()))?;
        Ok(Some(t))
    } else {
        Ok(None)
    }
}
