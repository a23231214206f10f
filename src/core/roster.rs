//! Local mirror of the employee roster (slot id → name and shift).

use crate::device::RemoteStore;
use crate::errors::{AppError, AppResult};
use crate::models::roster::{RemoteEmployeeRecord, RosterEntry, checked_name};
use crate::models::shift::ShiftKind;
use std::collections::BTreeMap;
use std::time::Duration;

/// Remote collection holding one record per employee.
pub const EMPLOYEES_PATH: &str = "/employees";

#[derive(Debug, Clone)]
pub struct RosterCache {
    entries: BTreeMap<u16, RosterEntry>,
    max_id: u16,
    default_shift: ShiftKind,
    placeholder_prefix: String,
}

impl RosterCache {
    pub fn new(max_id: u16, default_shift: ShiftKind, placeholder_prefix: &str) -> Self {
        Self {
            entries: BTreeMap::new(),
            max_id,
            default_shift,
            placeholder_prefix: placeholder_prefix.to_string(),
        }
    }

    /// Seed the cache from a persisted snapshot (entries out of range or
    /// without a name are dropped).
    pub fn with_entries(mut self, entries: Vec<RosterEntry>) -> Self {
        self.entries = entries
            .into_iter()
            .filter(|e| self.in_range(e.employee_id) && !e.name.is_empty())
            .map(|e| (e.employee_id, e))
            .collect();
        self
    }

    pub fn in_range(&self, id: u16) -> bool {
        (1..=self.max_id).contains(&id)
    }

    pub fn max_id(&self) -> u16 {
        self.max_id
    }

    pub fn default_shift(&self) -> ShiftKind {
        self.default_shift
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &RosterEntry> {
        self.entries.values()
    }

    /// Owned copy of the current roster, ordered by id.
    pub fn snapshot(&self) -> Vec<RosterEntry> {
        self.entries.values().cloned().collect()
    }

    pub fn lookup(&self, id: u16) -> Option<&RosterEntry> {
        self.entries.get(&id)
    }

    /// Entry for `id`, or a placeholder on the default shift so an
    /// unknown id still gets its scan recorded.
    pub fn resolve(&self, id: u16) -> RosterEntry {
        self.lookup(id).filter(|e| !e.name.is_empty()).cloned().unwrap_or_else(|| {
            log::warn!("[ROSTER] id {} not in roster, using placeholder", id);
            RosterEntry::placeholder(id, &self.placeholder_prefix, self.default_shift)
        })
    }

    /// Turn raw remote records into roster entries, skipping invalid ones.
    fn ingest(&self, records: Vec<serde_json::Value>) -> BTreeMap<u16, RosterEntry> {
        let mut out = BTreeMap::new();

        for raw in records {
            let rec: RemoteEmployeeRecord = match serde_json::from_value(raw) {
                Ok(r) => r,
                Err(e) => {
                    log::warn!("[ROSTER] skipping malformed employee record: {}", e);
                    continue;
                }
            };

            let id = match u16::try_from(rec.id) {
                Ok(id) if self.in_range(id) => id,
                _ => {
                    log::warn!(
                        "[ROSTER] skipping employee '{}': id {} outside 1..={}",
                        rec.name,
                        rec.id,
                        self.max_id
                    );
                    continue;
                }
            };

            let name = match checked_name(&rec.name) {
                Ok(name) => name,
                Err(e) => {
                    log::warn!("[ROSTER] skipping employee {}: {}", id, e);
                    continue;
                }
            };

            let shift = match rec.shift.as_deref() {
                None => self.default_shift,
                Some(name) => ShiftKind::from_name(name).unwrap_or_else(|| {
                    log::warn!(
                        "[ROSTER] unknown shift '{}' for id {}, using {}",
                        name,
                        id,
                        self.default_shift
                    );
                    self.default_shift
                }),
            };

            out.insert(id, RosterEntry::new(id, &name, shift));
        }

        out
    }

    /// Replace the cache with the remote roster. A failed or empty fetch
    /// leaves the current cache untouched and reports `RosterFetch`.
    pub fn refresh(&mut self, remote: &mut dyn RemoteStore, timeout: Duration) -> AppResult<usize> {
        let records = remote
            .read_bulk(EMPLOYEES_PATH, timeout)
            .map_err(|e| AppError::RosterFetch(e.to_string()))?;

        let fresh = self.ingest(records);
        if fresh.is_empty() {
            return Err(AppError::RosterFetch(
                "remote roster is empty, keeping cached roster".into(),
            ));
        }

        self.entries = fresh;
        log::info!("[ROSTER] refreshed, {} employees", self.entries.len());
        Ok(self.entries.len())
    }
}
