use super::roster::sanitize_name;
use super::verdict::Verdict;
use crate::errors::{AppError, AppResult};
use crate::utils::date::{format_dmy, format_iso, parse_dmy};
use crate::utils::time::parse_time;
use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Time stamped on Absent events produced by the daily sweep.
pub const ABSENT_SENTINEL_TIME: NaiveTime = NaiveTime::MIN;

/// One attendance record. Built once by the controller and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceEvent {
    employee_name: String,
    verdict: Verdict,
    time: NaiveTime, // HH:MM, seconds dropped
    date: NaiveDate,
}

/// Shape written to the remote store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteEventRecord {
    pub name: String,
    pub status: Verdict,
    pub time: String, // "HH:MM"
    pub date: String, // "DD-MM-YYYY"
}

impl AttendanceEvent {
    pub fn new(employee_name: impl Into<String>, verdict: Verdict, time: NaiveTime, date: NaiveDate) -> Self {
        let time = time
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(time);

        Self {
            employee_name: sanitize_name(&Into::<String>::into(employee_name)),
            verdict,
            time,
            date,
        }
    }

    /// Synthetic absence produced by reconciliation.
    pub fn absent(employee_name: impl Into<String>, date: NaiveDate) -> Self {
        Self::new(employee_name, Verdict::Absent, ABSENT_SENTINEL_TIME, date)
    }

    pub fn employee_name(&self) -> &str {
        &self.employee_name
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn time(&self) -> NaiveTime {
        self.time
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn time_str(&self) -> String {
        self.time.format("%H:%M").to_string()
    }

    /// Local buffer form: `name,verdict,HH:MM,DD-MM-YYYY` (no trailing newline).
    pub fn to_record(&self) -> String {
        format!(
            "{},{},{},{}",
            self.employee_name,
            self.verdict.as_record_str(),
            self.time_str(),
            format_dmy(self.date)
        )
    }

    pub fn from_record(line: &str) -> AppResult<Self> {
        let corrupt = || AppError::Parse(line.to_string());

        let mut fields = line.split(',');
        let (Some(name), Some(verdict), Some(time), Some(date), None) = (
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
        ) else {
            return Err(corrupt());
        };

        let verdict = Verdict::from_record_str(verdict).ok_or_else(corrupt)?;
        let time = parse_time(time).ok_or_else(corrupt)?;
        let date = parse_dmy(date).ok_or_else(corrupt)?;

        let event = Self::new(name, verdict, time, date);
        if event.employee_name.is_empty() {
            return Err(corrupt());
        }
        Ok(event)
    }

    pub fn to_remote(&self) -> RemoteEventRecord {
        RemoteEventRecord {
            name: self.employee_name.clone(),
            status: self.verdict,
            time: self.time_str(),
            date: format_dmy(self.date),
        }
    }

    pub fn from_remote(rec: &RemoteEventRecord) -> AppResult<Self> {
        let time = parse_time(&rec.time).ok_or_else(|| AppError::InvalidTime(rec.time.clone()))?;
        let date = parse_dmy(&rec.date).ok_or_else(|| AppError::InvalidDate(rec.date.clone()))?;
        Ok(Self::new(rec.name.clone(), rec.status, time, date))
    }

    /// Remote collection holding the events of this event's day.
    pub fn remote_dir(&self) -> String {
        remote_day_path(self.date)
    }

    /// Content-derived key: replaying the same event overwrites the same
    /// remote node instead of creating a duplicate.
    pub fn remote_key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.employee_name.replace('/', "_"),
            self.verdict.as_record_str(),
            self.time.format("%H%M")
        )
    }

    /// Full node path: `/attendance/<YYYY-MM-DD>/<key>`.
    pub fn remote_path(&self) -> String {
        format!("{}/{}", self.remote_dir(), self.remote_key())
    }
}

/// `/attendance/<YYYY-MM-DD>`
pub fn remote_day_path(date: NaiveDate) -> String {
    format!("/attendance/{}", format_iso(date))
}
