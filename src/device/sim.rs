//! Software stand-ins for the terminal hardware: used by the CLI (stdin as
//! the fingerprint sensor, a marker file as the link state) and by tests
//! (scripted sensor, settable clock, in-memory remote store).
//!
//! Handles are `Clone` and share their state, so a test can keep one copy
//! and hand the other to the controller.

use super::{
    BiometricReader, Clock, Connectivity, Notifier, RemoteStore, ScanOutcome, Signal, split_node_path,
};
use crate::errors::DeviceError;
use crate::ui::messages::{error, success};
use chrono::{Duration as ChronoDuration, NaiveDateTime};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// Sensor fed by text lines: a number is a matched slot, `x` or `?` is an
/// unrecognised finger. Enrollment consumes one line: `x` fails it, anything
/// else succeeds.
pub struct ChannelReader {
    rx: Receiver<String>,
}

impl ChannelReader {
    pub fn new(rx: Receiver<String>) -> Self {
        Self { rx }
    }

    fn next_line(&mut self, timeout: Duration) -> Result<Option<String>, DeviceError> {
        match self.rx.recv_timeout(timeout) {
            Ok(line) => Ok(Some(line.trim().to_string())),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                Err(DeviceError::Unavailable("sensor input closed".into()))
            }
        }
    }
}

impl BiometricReader for ChannelReader {
    fn capture_and_identify(&mut self, timeout: Duration) -> Result<ScanOutcome, DeviceError> {
        let Some(line) = self.next_line(timeout)? else {
            return Ok(ScanOutcome::Idle);
        };

        if line.is_empty() {
            return Ok(ScanOutcome::Idle);
        }
        if line == "x" || line == "?" {
            return Ok(ScanOutcome::NoMatch);
        }

        line.parse::<u16>()
            .map(ScanOutcome::Matched)
            .map_err(|_| DeviceError::Sensor(format!("unreadable sensor frame '{line}'")))
    }

    fn enroll(&mut self, slot: u16, timeout: Duration) -> Result<(), DeviceError> {
        match self.next_line(timeout)? {
            None => Err(DeviceError::Timeout(timeout.as_millis() as u64)),
            Some(l) if l == "x" => Err(DeviceError::Sensor(format!(
                "could not build a template for slot {slot}"
            ))),
            Some(_) => Ok(()),
        }
    }
}

#[derive(Default)]
struct ScriptState {
    scans: VecDeque<Result<ScanOutcome, DeviceError>>,
    enrollments: VecDeque<Result<(), DeviceError>>,
    enrolled: Vec<u16>,
}

/// Sensor replaying a queue of outcomes; `Idle` once the queue is empty.
/// Enrollment succeeds unless a failure was queued.
#[derive(Clone, Default)]
pub struct ScriptedReader {
    state: Rc<RefCell<ScriptState>>,
}

impl ScriptedReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, outcome: Result<ScanOutcome, DeviceError>) {
        self.state.borrow_mut().scans.push_back(outcome);
    }

    pub fn push_match(&self, slot: u16) {
        self.push(Ok(ScanOutcome::Matched(slot)));
    }

    pub fn push_enrollment(&self, result: Result<(), DeviceError>) {
        self.state.borrow_mut().enrollments.push_back(result);
    }

    /// Slots successfully enrolled so far.
    pub fn enrolled(&self) -> Vec<u16> {
        self.state.borrow().enrolled.clone()
    }
}

impl BiometricReader for ScriptedReader {
    fn capture_and_identify(&mut self, _timeout: Duration) -> Result<ScanOutcome, DeviceError> {
        self.state
            .borrow_mut()
            .scans
            .pop_front()
            .unwrap_or(Ok(ScanOutcome::Idle))
    }

    fn enroll(&mut self, slot: u16, _timeout: Duration) -> Result<(), DeviceError> {
        let mut state = self.state.borrow_mut();
        let result = state.enrollments.pop_front().unwrap_or(Ok(()));
        if result.is_ok() {
            state.enrolled.push(slot);
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Clocks
// ---------------------------------------------------------------------------

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        crate::utils::date::now()
    }
}

/// Clock that only moves when told to.
#[derive(Clone)]
pub struct FixedClock {
    now: Rc<Cell<NaiveDateTime>>,
}

impl FixedClock {
    pub fn new(at: NaiveDateTime) -> Self {
        Self {
            now: Rc::new(Cell::new(at)),
        }
    }

    pub fn set(&self, at: NaiveDateTime) {
        self.now.set(at);
    }

    pub fn advance_minutes(&self, minutes: i64) {
        self.now.set(self.now.get() + ChronoDuration::minutes(minutes));
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.now.get()
    }
}

// ---------------------------------------------------------------------------
// Connectivity
// ---------------------------------------------------------------------------

/// Link state toggled by hand.
#[derive(Clone)]
pub struct SwitchLink {
    online: Rc<Cell<bool>>,
}

impl SwitchLink {
    pub fn new(online: bool) -> Self {
        Self {
            online: Rc::new(Cell::new(online)),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.set(online);
    }
}

impl Connectivity for SwitchLink {
    fn is_online(&mut self) -> bool {
        self.online.get()
    }
}

/// Link is down while the marker file exists (or when forced offline).
pub struct MarkerFileLink {
    marker: PathBuf,
    forced_offline: bool,
}

impl MarkerFileLink {
    pub fn new(marker: PathBuf, forced_offline: bool) -> Self {
        Self {
            marker,
            forced_offline,
        }
    }
}

impl Connectivity for MarkerFileLink {
    fn is_online(&mut self) -> bool {
        !self.forced_offline && !self.marker.exists()
    }
}

// ---------------------------------------------------------------------------
// Notifiers
// ---------------------------------------------------------------------------

/// Prints the feedback the buzzer/display would give.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn signal(&mut self, signal: Signal, message: &str) {
        match signal {
            Signal::Success => success(message),
            Signal::Failure => error(message),
        }
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    signals: Rc<RefCell<Vec<(Signal, String)>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signals(&self) -> Vec<(Signal, String)> {
        self.signals.borrow().clone()
    }

    pub fn last(&self) -> Option<(Signal, String)> {
        self.signals.borrow().last().cloned()
    }

    pub fn count(&self, signal: Signal) -> usize {
        self.signals
            .borrow()
            .iter()
            .filter(|(s, _)| *s == signal)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn signal(&mut self, signal: Signal, message: &str) {
        self.signals.borrow_mut().push((signal, message.to_string()));
    }
}

// ---------------------------------------------------------------------------
// Remote store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryRemoteState {
    nodes: BTreeMap<String, BTreeMap<String, Value>>,
    writes: usize,
    fail_after: Option<usize>,
    fail_reads: bool,
    not_ready: bool,
}

/// In-memory remote store. Can be told to reject writes after a number of
/// successful ones, to fail reads, or to report a backend that is not ready.
#[derive(Clone, Default)]
pub struct MemoryRemote {
    state: Rc<RefCell<MemoryRemoteState>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Successful writes so far (overwrites included).
    pub fn writes(&self) -> usize {
        self.state.borrow().writes
    }

    /// Reject every write once `n` more writes have succeeded.
    pub fn fail_after(&self, n: Option<usize>) {
        let mut state = self.state.borrow_mut();
        state.fail_after = n.map(|n| state.writes + n);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.state.borrow_mut().fail_reads = fail;
    }

    pub fn set_ready(&self, ready: bool) {
        self.state.borrow_mut().not_ready = !ready;
    }

    /// Records stored directly under `dir`.
    pub fn records(&self, dir: &str) -> Vec<Value> {
        self.state
            .borrow()
            .nodes
            .get(dir.trim_end_matches('/'))
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Seed a record without counting it as a delivery.
    pub fn insert(&self, path: &str, record: Value) {
        let (dir, key) = split_node_path(path);
        self.state
            .borrow_mut()
            .nodes
            .entry(dir.to_string())
            .or_default()
            .insert(key.to_string(), record);
    }
}

impl RemoteStore for MemoryRemote {
    fn is_ready(&self) -> bool {
        !self.state.borrow().not_ready
    }

    fn write(&mut self, path: &str, record: &Value, _timeout: Duration) -> Result<(), DeviceError> {
        {
            let state = self.state.borrow();
            if let Some(limit) = state.fail_after
                && state.writes >= limit
            {
                return Err(DeviceError::Rejected(format!("write to {path} refused")));
            }
        }

        self.insert(path, record.clone());
        self.state.borrow_mut().writes += 1;
        Ok(())
    }

    fn read_bulk(&mut self, path: &str, timeout: Duration) -> Result<Vec<Value>, DeviceError> {
        if self.state.borrow().fail_reads {
            return Err(DeviceError::Timeout(timeout.as_millis() as u64));
        }
        Ok(self.records(path))
    }
}
