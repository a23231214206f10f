//! The terminal's control loop.
//!
//! One `tick()` is one pass of the loop: poll the sensor and record the
//! scan, react to the link coming back, serve enrollment requests and run
//! the daily absence sweep when it is due. Everything runs to completion on
//! the caller's thread; blocking collaborator calls carry the configured
//! timeouts.

use super::classifier::classify;
use super::enroll::{self, EnrollOutcome};
use super::reconciler::{self, DailyGate};
use super::roster::RosterCache;
use super::sync::{Delivery, SyncEngine};
use crate::config::Config;
use crate::device::{BiometricReader, Clock, Devices, Notifier, ScanOutcome, Signal};
use crate::errors::{AppError, AppResult, DeviceError};
use crate::models::event::{AttendanceEvent, RemoteEventRecord, remote_day_path};
use crate::models::leave::{LeaveSet, RemoteLeaveRecord};
use crate::models::roster::RosterEntry;
use crate::models::shift::ShiftTable;
use crate::storage::{DrainReport, DurableEventLog};
use crate::utils::date::format_iso;
use crate::utils::time::minutes_of_day;
use chrono::{NaiveDate, NaiveDateTime};
use std::time::Duration;

/// `/leave/<YYYY-MM-DD>`
pub fn leave_path(date: NaiveDate) -> String {
    format!("/leave/{}", format_iso(date))
}

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub sensor_timeout: Duration,
    pub remote_timeout: Duration,
}

impl ControllerSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            sensor_timeout: cfg.sensor_timeout(),
            remote_timeout: cfg.remote_timeout(),
        }
    }
}

/// Where a scan is in its handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    ScanDetected,
    Classified,
    Routed,
}

/// Where an event ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Delivered,
    Buffered,
    /// Buffer full: the event is lost.
    Dropped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanResult {
    Recorded(AttendanceEvent, Route),
    /// Outside every window of the employee's shift.
    Rejected { employee_id: u16, minutes_of_day: u16 },
    /// Slot id outside the configured range.
    InvalidId(u16),
    /// Finger not recognised by the sensor.
    Unrecognised,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub date: NaiveDate,
    pub absent: Vec<AttendanceEvent>,
    pub delivered: usize,
    pub buffered: usize,
    pub dropped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Drained(DrainReport),
    Partial { delivered: usize, total: usize },
    Unreachable(String),
}

/// What happened during one loop iteration.
#[derive(Debug, Default)]
pub struct TickReport {
    pub now: Option<NaiveDateTime>,
    pub scan: Option<ScanResult>,
    pub sensor_error: Option<DeviceError>,
    pub roster_refreshed: Option<usize>,
    pub sync: Option<SyncOutcome>,
    pub enrollment: Option<EnrollOutcome>,
    pub reconcile: Option<ReconcileReport>,
}

/// State handed back on shutdown so the caller can persist it.
#[derive(Debug, Clone)]
pub struct ShutdownState {
    pub last_reconciled: Option<NaiveDate>,
    pub roster: Vec<RosterEntry>,
    pub buffered_bytes: usize,
}

pub struct AttendanceController {
    settings: ControllerSettings,
    shifts: ShiftTable,
    roster: RosterCache,
    buffer: DurableEventLog,
    sync: SyncEngine,
    gate: DailyGate,
    reader: Box<dyn BiometricReader>,
    clock: Box<dyn Clock>,
    notifier: Box<dyn Notifier>,
    phase: Phase,
    was_online: bool,
    journal_date: Option<NaiveDate>,
    journal: Vec<AttendanceEvent>, // events recorded today, delivered or buffered
}

impl AttendanceController {
    pub fn new(
        settings: ControllerSettings,
        shifts: ShiftTable,
        roster: RosterCache,
        buffer: DurableEventLog,
        gate: DailyGate,
        devices: Devices,
    ) -> Self {
        let sync = SyncEngine::new(devices.remote, devices.link, settings.remote_timeout);

        Self {
            settings,
            shifts,
            roster,
            buffer,
            sync,
            gate,
            reader: devices.reader,
            clock: devices.clock,
            notifier: devices.notifier,
            phase: Phase::Idle,
            was_online: false,
            journal_date: None,
            journal: Vec::new(),
        }
    }

    pub fn roster(&self) -> &RosterCache {
        &self.roster
    }

    pub fn buffer(&self) -> &DurableEventLog {
        &self.buffer
    }

    pub fn gate(&self) -> &DailyGate {
        &self.gate
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn is_online(&mut self) -> bool {
        self.sync.is_online()
    }

    fn enter(&mut self, phase: Phase) {
        log::trace!("[CTRL] {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Forget the day journal when the date changes.
    fn roll_day(&mut self, today: NaiveDate) {
        if self.journal_date != Some(today) {
            self.journal.clear();
            self.journal_date = Some(today);
        }
    }

    /// One pass of the control loop.
    pub fn tick(&mut self) -> AppResult<TickReport> {
        let now = self.clock.now();
        self.roll_day(now.date());

        let mut report = TickReport {
            now: Some(now),
            ..Default::default()
        };

        // 1. Sensor
        match self.reader.capture_and_identify(self.settings.sensor_timeout) {
            Ok(ScanOutcome::Idle) => {}
            Ok(ScanOutcome::Matched(id)) => report.scan = Some(self.handle_scan(id, now)?),
            Ok(ScanOutcome::NoMatch) => {
                self.notifier.signal(Signal::Failure, "Fingerprint not recognised");
                report.scan = Some(ScanResult::Unrecognised);
            }
            Err(e) => {
                log::warn!("[CTRL] sensor: {}", e);
                report.sensor_error = Some(e);
            }
        }

        // 2. Link just came back: refresh the roster, then replay the buffer.
        let online = self.sync.is_online();
        if online && !self.was_online {
            log::info!("[CTRL] link up");
            report.roster_refreshed = self.refresh_roster();
            report.sync = Some(self.sync_all()?);
        } else if !online && self.was_online {
            log::info!("[CTRL] link down, buffering events");
        }
        self.was_online = online;

        // 3. Back-office enrollment requests
        if online && self.sync.can_deliver() {
            report.enrollment = self.serve_enrollment()?;
        }

        // 4. Daily sweep
        if self.gate.is_due(now) {
            report.reconcile = Some(self.reconcile(now.date())?);
        }

        Ok(report)
    }

    /// Classify a recognised slot id at `now` and record the result.
    pub fn handle_scan(&mut self, employee_id: u16, now: NaiveDateTime) -> AppResult<ScanResult> {
        self.enter(Phase::ScanDetected);
        self.roll_day(now.date());

        if !self.roster.in_range(employee_id) {
            self.notifier.signal(Signal::Failure, "Unknown fingerprint slot");
            self.enter(Phase::Idle);
            return Ok(ScanResult::InvalidId(employee_id));
        }

        let entry = self.roster.resolve(employee_id);
        let window = self.shifts.window(entry.assigned_shift);
        let minutes = minutes_of_day(now.time());

        let verdict = match classify(window, minutes) {
            Ok(v) => v,
            Err(out) => {
                log::info!("[CTRL] slot {}: {}", employee_id, AppError::from(out));
                self.notifier.signal(Signal::Failure, "Scan outside shift hours");
                self.enter(Phase::Idle);
                return Ok(ScanResult::Rejected {
                    employee_id,
                    minutes_of_day: minutes,
                });
            }
        };
        self.enter(Phase::Classified);

        let event = AttendanceEvent::new(entry.name, verdict, now.time(), now.date());
        let route = self.route(&event, true)?;
        self.enter(Phase::Routed);

        if route == Route::Delivered && !self.buffer.is_empty() {
            // A live delivery just worked: replay what is waiting.
            let _ = self.sync_all()?;
        }

        self.enter(Phase::Idle);
        Ok(ScanResult::Recorded(event, route))
    }

    /// Send live, fall back to the buffer. `announce` drives the success
    /// signal; a full buffer is always signalled.
    fn route(&mut self, event: &AttendanceEvent, announce: bool) -> AppResult<Route> {
        let route = match self.sync.try_send(event) {
            Delivery::Delivered => Route::Delivered,
            Delivery::Unreachable(reason) => {
                log::info!("[CTRL] buffering {} ({})", event.to_record(), reason);
                match self.buffer.append(event) {
                    Ok(_) => Route::Buffered,
                    Err(AppError::StorageFull { .. }) => Route::Dropped,
                    Err(e) => return Err(e),
                }
            }
        };

        match route {
            Route::Dropped => {
                self.notifier.signal(Signal::Failure, "Storage full");
            }
            _ => {
                self.journal.push(event.clone());
                if announce {
                    self.notifier.signal(Signal::Success, "Attendance recorded");
                }
            }
        }

        Ok(route)
    }

    /// Best-effort roster refresh; a failure keeps the cached roster.
    pub fn refresh_roster(&mut self) -> Option<usize> {
        let timeout = self.settings.remote_timeout;
        match self.roster.refresh(self.sync.remote_mut(), timeout) {
            Ok(n) => Some(n),
            Err(e) => {
                log::warn!("[CTRL] {}", e);
                None
            }
        }
    }

    /// Drain the buffer once. Failures are reported, never fatal.
    pub fn sync_all(&mut self) -> AppResult<SyncOutcome> {
        match self.sync.sync_all(&mut self.buffer) {
            Ok(report) => {
                if report.delivered > 0 {
                    self.notifier.signal(
                        Signal::Success,
                        &format!("Sync complete ({} records)", report.delivered),
                    );
                }
                Ok(SyncOutcome::Drained(report))
            }
            Err(AppError::PartialDrainFailure { delivered, total }) => {
                log::warn!(
                    "[CTRL] partial drain ({}/{}), buffer kept for retry",
                    delivered,
                    total
                );
                Ok(SyncOutcome::Partial { delivered, total })
            }
            Err(AppError::DeliveryUnreachable(reason)) => Ok(SyncOutcome::Unreachable(reason)),
            Err(e) => Err(e),
        }
    }

    fn serve_enrollment(&mut self) -> AppResult<Option<EnrollOutcome>> {
        let remote_timeout = self.settings.remote_timeout;

        let request = match enroll::poll_request(self.sync.remote_mut(), remote_timeout) {
            Ok(Some(r)) => r,
            Ok(None) => return Ok(None),
            Err(e) => {
                log::debug!("[CTRL] enrollment poll failed: {}", e);
                return Ok(None);
            }
        };

        log::info!("[CTRL] enrollment requested for slot {}", request.id);
        let outcome = enroll::process(
            self.reader.as_mut(),
            self.sync.remote_mut(),
            &request,
            self.roster.max_id(),
            self.roster.default_shift(),
            self.settings.sensor_timeout,
            remote_timeout,
        );

        let outcome = match outcome {
            Ok(o) => o,
            Err(e) => {
                log::warn!("[CTRL] enrollment could not be completed: {}", e);
                return Ok(None);
            }
        };

        match &outcome {
            EnrollOutcome::Enrolled(_) => {
                self.notifier.signal(Signal::Success, "Enrollment succeeded");
                self.refresh_roster();
            }
            EnrollOutcome::Failed(_, _) => {
                self.notifier.signal(Signal::Failure, "Enrollment failed");
            }
        }

        Ok(Some(outcome))
    }

    /// Everything known to have been recorded on `date`: the day journal,
    /// buffered records and, when reachable, the remote collection.
    fn events_on(&mut self, date: NaiveDate) -> Vec<AttendanceEvent> {
        let mut events: Vec<AttendanceEvent> = if self.journal_date == Some(date) {
            self.journal.clone()
        } else {
            Vec::new()
        };

        events.extend(self.buffer.events().into_iter().filter(|e| e.date() == date));

        if self.sync.can_deliver() {
            let timeout = self.settings.remote_timeout;
            match self.sync.remote_mut().read_bulk(&remote_day_path(date), timeout) {
                Ok(records) => events.extend(
                    records
                        .into_iter()
                        .filter_map(|v| serde_json::from_value::<RemoteEventRecord>(v).ok())
                        .filter_map(|r| AttendanceEvent::from_remote(&r).ok()),
                ),
                Err(e) => log::warn!("[CTRL] could not read remote events for {}: {}", date, e),
            }
        }

        events
    }

    fn leave_on(&mut self, date: NaiveDate) -> LeaveSet {
        if !self.sync.can_deliver() {
            log::warn!("[CTRL] offline: reconciling {} without leave records", date);
            return LeaveSet::empty(date);
        }

        let timeout = self.settings.remote_timeout;
        match self.sync.remote_mut().read_bulk(&leave_path(date), timeout) {
            Ok(records) => LeaveSet::new(
                date,
                records
                    .into_iter()
                    .filter_map(|v| serde_json::from_value::<RemoteLeaveRecord>(v).ok())
                    .map(|r| r.name),
            ),
            Err(e) => {
                log::warn!("[CTRL] could not read leave for {}: {}", date, e);
                LeaveSet::empty(date)
            }
        }
    }

    /// Run the absence sweep for `date` and route its events. Marks the day
    /// as done whether or not the gate was due; a past date never moves the
    /// gate backwards.
    pub fn reconcile(&mut self, date: NaiveDate) -> AppResult<ReconcileReport> {
        let events = self.events_on(date);
        let leave = self.leave_on(date);
        let absent = reconciler::sweep(date, self.roster.snapshot().iter(), &events, &leave);

        let mut report = ReconcileReport {
            date,
            absent: absent.clone(),
            delivered: 0,
            buffered: 0,
            dropped: 0,
        };

        for ev in &absent {
            match self.route(ev, false)? {
                Route::Delivered => report.delivered += 1,
                Route::Buffered => report.buffered += 1,
                Route::Dropped => report.dropped += 1,
            }
        }

        self.gate.mark_done(date);
        log::info!(
            "[CTRL] reconciled {}: {} absent ({} delivered, {} buffered, {} dropped)",
            date,
            absent.len(),
            report.delivered,
            report.buffered,
            report.dropped
        );
        Ok(report)
    }

    /// Push buffered bytes to stable storage.
    pub fn flush(&mut self) -> AppResult<()> {
        self.buffer.flush()
    }

    pub fn shutdown(mut self) -> AppResult<ShutdownState> {
        self.flush()?;
        Ok(ShutdownState {
            last_reconciled: self.gate.last_run(),
            roster: self.roster.snapshot(),
            buffered_bytes: self.buffer.cursor(),
        })
    }
}
