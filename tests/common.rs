#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use chrono::{NaiveDate, NaiveDateTime};
use rattendance::config::Config;
use rattendance::core::controller::{AttendanceController, ControllerSettings};
use rattendance::core::reconciler::DailyGate;
use rattendance::core::roster::RosterCache;
use rattendance::device::Devices;
use rattendance::device::sim::{FixedClock, MemoryRemote, RecordingNotifier, ScriptedReader, SwitchLink};
use rattendance::models::roster::RosterEntry;
use rattendance::models::shift::ShiftKind;
use rattendance::storage::DurableEventLog;
use rattendance::utils::date::parse_datetime;
use rattendance::utils::time::parse_time;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Binary under test, with HOME pointed at a private directory so the
/// user's real configuration is never read or written.
pub fn rat(name: &str) -> Command {
    let mut cmd = cargo_bin_cmd!("rattendance");
    cmd.env("HOME", test_home(name));
    cmd.env("NO_COLOR", "1");
    cmd
}

pub fn test_home(name: &str) -> PathBuf {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_rattendance_home", name));
    fs::create_dir_all(&path).ok();
    path
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_rattendance.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Same for the offline buffer file
pub fn setup_test_buffer(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_rattendance.buf", name));
    let buf_path = path.to_string_lossy().to_string();
    fs::remove_file(&buf_path).ok();
    buf_path
}

/// Fresh home, database and buffer, initialised through the CLI.
pub fn init_terminal(name: &str) -> (String, String) {
    fs::remove_dir_all(test_home(name)).ok();
    let db = setup_test_db(name);
    let buf = setup_test_buffer(name);

    rat(name)
        .args(["--db", &db, "--buffer", &buf, "--test", "init"])
        .assert()
        .success();

    (db, buf)
}

pub fn at(s: &str) -> NaiveDateTime {
    parse_datetime(s).expect("valid datetime")
}

pub fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
}

pub fn staff() -> Vec<RosterEntry> {
    vec![
        RosterEntry::new(1, "Alice", ShiftKind::Morning),
        RosterEntry::new(2, "Bob", ShiftKind::Afternoon),
        RosterEntry::new(3, "Cara", ShiftKind::Night),
    ]
}

/// A controller wired to in-memory collaborators, plus the handles used
/// to steer them.
pub struct Rig {
    pub ctrl: AttendanceController,
    pub reader: ScriptedReader,
    pub clock: FixedClock,
    pub link: SwitchLink,
    pub remote: MemoryRemote,
    pub notifier: RecordingNotifier,
}

pub fn rig_with(start: &str, online: bool, roster: Vec<RosterEntry>, capacity: usize) -> Rig {
    let reader = ScriptedReader::new();
    let clock = FixedClock::new(at(start));
    let link = SwitchLink::new(online);
    let remote = MemoryRemote::new();
    let notifier = RecordingNotifier::new();

    let settings = ControllerSettings {
        sensor_timeout: Duration::from_millis(10),
        remote_timeout: Duration::from_millis(10),
    };
    let shifts = Config::default().shift_table().expect("default shifts");
    let cache = RosterCache::new(127, ShiftKind::Morning, "Employee").with_entries(roster);
    let gate = DailyGate::new(parse_time("17:00").expect("time"), None);

    let devices = Devices {
        reader: Box::new(reader.clone()),
        clock: Box::new(clock.clone()),
        remote: Box::new(remote.clone()),
        link: Box::new(link.clone()),
        notifier: Box::new(notifier.clone()),
    };

    let ctrl = AttendanceController::new(
        settings,
        shifts,
        cache,
        DurableEventLog::in_memory(capacity),
        gate,
        devices,
    );

    Rig {
        ctrl,
        reader,
        clock,
        link,
        remote,
        notifier,
    }
}

pub fn rig(start: &str, online: bool) -> Rig {
    rig_with(start, online, staff(), 4096)
}
