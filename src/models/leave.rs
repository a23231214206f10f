use super::roster::sanitize_name;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Employees excused on one date. Only consulted by the daily sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveSet {
    pub date: NaiveDate,
    names: HashSet<String>,
}

/// Shape of a `/leave/<YYYY-MM-DD>` record on the remote store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteLeaveRecord {
    pub name: String,
}

impl LeaveSet {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            names: HashSet::new(),
        }
    }

    pub fn new<I, S>(date: NaiveDate, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            date,
            names: names
                .into_iter()
                .map(|n| sanitize_name(&Into::<String>::into(n)))
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    /// True when `name` is excused on `date`. A set for another day excuses
    /// nobody. Names compare in their cleaned form, as stored in the roster.
    pub fn excuses(&self, name: &str, date: NaiveDate) -> bool {
        self.date == date && self.names.contains(&sanitize_name(name))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
