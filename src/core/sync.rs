//! Delivery of attendance events to the remote store, live and from the
//! offline buffer.

use crate::device::{Connectivity, RemoteStore};
use crate::errors::{AppError, AppResult};
use crate::models::event::AttendanceEvent;
use crate::storage::{DrainReport, DurableEventLog};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// Link down, backend not ready, or the write failed. The caller
    /// buffers the event.
    Unreachable(String),
}

pub struct SyncEngine {
    remote: Box<dyn RemoteStore>,
    link: Box<dyn Connectivity>,
    timeout: Duration,
}

impl SyncEngine {
    pub fn new(remote: Box<dyn RemoteStore>, link: Box<dyn Connectivity>, timeout: Duration) -> Self {
        Self {
            remote,
            link,
            timeout,
        }
    }

    pub fn is_online(&mut self) -> bool {
        self.link.is_online()
    }

    /// Link up and backend session ready.
    pub fn can_deliver(&mut self) -> bool {
        self.link.is_online() && self.remote.is_ready()
    }

    pub fn remote_mut(&mut self) -> &mut dyn RemoteStore {
        self.remote.as_mut()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Deliver one live event.
    pub fn try_send(&mut self, event: &AttendanceEvent) -> Delivery {
        if !self.link.is_online() {
            return Delivery::Unreachable("offline".into());
        }
        if !self.remote.is_ready() {
            return Delivery::Unreachable("backend not ready".into());
        }
        self.deliver(event)
    }

    /// Remote write only; connectivity is the caller's concern.
    fn deliver(&mut self, event: &AttendanceEvent) -> Delivery {
        let record = match serde_json::to_value(event.to_remote()) {
            Ok(v) => v,
            Err(e) => return Delivery::Unreachable(e.to_string()),
        };

        match self.remote.write(&event.remote_path(), &record, self.timeout) {
            Ok(()) => {
                log::debug!("[SYNC] delivered {}", event.to_record());
                Delivery::Delivered
            }
            Err(e) => {
                log::warn!("[SYNC] delivery of {} failed: {}", event.to_record(), e);
                Delivery::Unreachable(e.to_string())
            }
        }
    }

    /// Drain the offline buffer. Connectivity is checked once up front; the
    /// drain then runs as a single all-or-nothing pass over the buffer.
    /// Replayed records may reach the remote store more than once.
    pub fn sync_all(&mut self, buffer: &mut DurableEventLog) -> AppResult<DrainReport> {
        if !self.can_deliver() {
            return Err(AppError::DeliveryUnreachable(
                "link down or backend not ready".into(),
            ));
        }

        if buffer.is_empty() {
            return Ok(DrainReport::default());
        }

        let report = buffer.drain(|ev| self.deliver(ev) == Delivery::Delivered)?;

        if !report.cleared {
            return Err(AppError::PartialDrainFailure {
                delivered: report.delivered,
                total: report.total,
            });
        }

        log::info!(
            "[SYNC] buffer drained: {} delivered, {} corrupt skipped",
            report.delivered,
            report.corrupt.len()
        );
        Ok(report)
    }
}
