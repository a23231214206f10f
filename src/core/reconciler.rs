//! Daily absence sweep: roster minus (today's events ∪ today's leave).

use crate::models::event::AttendanceEvent;
use crate::models::leave::LeaveSet;
use crate::models::roster::RosterEntry;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashSet;

/// One Absent event, dated `today`, for every roster entry that has no
/// event today and is not on leave today.
///
/// Employees are matched to events by name, so two employees sharing a
/// name are indistinguishable here.
pub fn sweep<'a, I>(
    today: NaiveDate,
    roster: I,
    todays_events: &[AttendanceEvent],
    leave: &LeaveSet,
) -> Vec<AttendanceEvent>
where
    I: IntoIterator<Item = &'a RosterEntry>,
{
    let seen: HashSet<&str> = todays_events
        .iter()
        .filter(|ev| ev.date() == today)
        .map(|ev| ev.employee_name())
        .collect();

    roster
        .into_iter()
        .filter(|entry| !seen.contains(entry.name.as_str()))
        .filter(|entry| !leave.excuses(&entry.name, today))
        .map(|entry| AttendanceEvent::absent(entry.name.clone(), today))
        .collect()
}

/// Once-per-day trigger. The sweep is due from `trigger` onwards on any
/// day it has not run yet; keying on the date clears the flag at midnight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyGate {
    trigger: NaiveTime,
    last_run: Option<NaiveDate>,
}

impl DailyGate {
    pub fn new(trigger: NaiveTime, last_run: Option<NaiveDate>) -> Self {
        Self { trigger, last_run }
    }

    pub fn trigger(&self) -> NaiveTime {
        self.trigger
    }

    pub fn last_run(&self) -> Option<NaiveDate> {
        self.last_run
    }

    pub fn ran_on(&self, date: NaiveDate) -> bool {
        self.last_run == Some(date)
    }

    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        now.time() >= self.trigger && !self.ran_on(now.date())
    }

    /// Record a completed sweep. An earlier date (a manual re-run of a past
    /// day) leaves the latest one in place.
    pub fn mark_done(&mut self, date: NaiveDate) {
        if self.last_run.is_none_or(|last| date > last) {
            self.last_run = Some(date);
        }
    }
}
