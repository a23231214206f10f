use chrono::NaiveTime;
use rattendance::errors::AppError;
use rattendance::models::event::AttendanceEvent;
use rattendance::models::verdict::Verdict;
use rattendance::storage::{DurableEventLog, FileRegion, MemRegion};
use std::env;
use std::fs;

mod common;
use common::day;

fn ev(name: &str, verdict: Verdict, hh: u32, mm: u32) -> AttendanceEvent {
    AttendanceEvent::new(
        name,
        verdict,
        NaiveTime::from_hms_opt(hh, mm, 0).expect("time"),
        day("2024-03-01"),
    )
}

#[test]
fn records_use_the_comma_line_format() {
    let e = ev("Alice", Verdict::CheckIn, 7, 30);
    assert_eq!(e.to_record(), "Alice,CheckIn,07:30,01-03-2024");
    assert_eq!(AttendanceEvent::from_record(&e.to_record()).expect("parse"), e);

    assert!(AttendanceEvent::from_record("Alice,CheckIn,07:30").is_err());
    assert!(AttendanceEvent::from_record("Alice,CheckIn,07:30,01-03-2024,x").is_err());
    assert!(AttendanceEvent::from_record("Alice,Late,07:30,01-03-2024").is_err());
    assert!(AttendanceEvent::from_record(",CheckIn,07:30,01-03-2024").is_err());
}

#[test]
fn seconds_are_dropped_and_absent_uses_midnight() {
    let e = AttendanceEvent::new(
        "Bob",
        Verdict::CheckOut,
        NaiveTime::from_hms_opt(15, 42, 59).expect("time"),
        day("2024-03-01"),
    );
    assert_eq!(e.time_str(), "15:42");

    let a = AttendanceEvent::absent("Cara", day("2024-03-01"));
    assert_eq!(a.to_record(), "Cara,Absent,00:00,01-03-2024");
    assert_eq!(a.remote_path(), "/attendance/2024-03-01/Cara|Absent|0000");
}

#[test]
fn append_keeps_insertion_order_and_cursor() {
    let mut log = DurableEventLog::in_memory(256);
    assert!(log.is_empty());

    let a = ev("Alice", Verdict::CheckIn, 7, 30);
    let b = ev("Bob", Verdict::CheckOut, 19, 5);

    let n1 = log.append(&a).expect("append a");
    let n2 = log.append(&b).expect("append b");

    assert_eq!(n1, a.to_record().len() + 1);
    assert_eq!(log.cursor(), n1 + n2);
    assert_eq!(log.events(), vec![a, b]);
}

#[test]
fn full_buffer_rejects_the_whole_record() {
    // "Alice,CheckIn,07:30,01-03-2024\n" is 31 bytes
    let e = ev("Alice", Verdict::CheckIn, 7, 30);

    let mut exact = DurableEventLog::in_memory(31);
    let err = exact.append(&e).expect_err("cursor + len + 1 == capacity");
    assert!(matches!(err, AppError::StorageFull { needed: 31, free: 31 }));
    assert_eq!(exact.cursor(), 0);

    let mut roomy = DurableEventLog::in_memory(32);
    roomy.append(&e).expect("fits with one byte to spare");
    assert_eq!(roomy.cursor(), 31);

    let before = roomy.cursor();
    assert!(roomy.append(&e).is_err());
    assert_eq!(roomy.cursor(), before);
    assert_eq!(roomy.events().len(), 1);
}

#[test]
fn drain_clears_only_when_everything_was_accepted() {
    let mut log = DurableEventLog::in_memory(512);
    for (h, name) in [(7, "Alice"), (11, "Bob"), (15, "Cara")] {
        log.append(&ev(name, Verdict::CheckIn, h, 45)).expect("append");
    }
    let cursor = log.cursor();

    let mut seen = Vec::new();
    let report = log
        .drain(|e| {
            seen.push(e.employee_name().to_string());
            seen.len() < 2
        })
        .expect("drain");

    assert_eq!(report.total, 3);
    assert_eq!(report.delivered, 1);
    assert!(!report.cleared);
    assert!(!report.is_complete());
    assert_eq!(log.cursor(), cursor);

    // the retry starts again from the first record
    let mut replayed = Vec::new();
    let report = log
        .drain(|e| {
            replayed.push(e.employee_name().to_string());
            true
        })
        .expect("drain");

    assert_eq!(replayed, vec!["Alice", "Bob", "Cara"]);
    assert!(report.cleared);
    assert!(log.is_empty());
}

#[test]
fn drain_of_empty_buffer_is_a_no_op() {
    let mut log = DurableEventLog::in_memory(128);
    let mut calls = 0;
    let report = log
        .drain(|_| {
            calls += 1;
            true
        })
        .expect("drain");

    assert_eq!(calls, 0);
    assert_eq!(report.total, 0);
    assert!(!report.cleared);
}

#[test]
fn corrupt_lines_are_skipped_and_reported() {
    let mut bytes = b"Alice,CheckIn,07:30,01-03-2024\nnot a record\nBob,CheckOut,19:10,01-03-2024\n".to_vec();
    bytes.resize(256, 0);

    let mut log = DurableEventLog::open(Box::new(MemRegion::from_bytes(bytes))).expect("open");
    assert_eq!(log.records().len(), 3);
    assert_eq!(log.events().len(), 2);

    let mut delivered = Vec::new();
    let report = log
        .drain(|e| {
            delivered.push(e.clone());
            true
        })
        .expect("drain");

    assert_eq!(report.corrupt, vec!["not a record".to_string()]);
    assert_eq!(report.delivered, 2);
    assert!(report.cleared);
    assert!(log.is_empty());
}

#[test]
fn cursor_is_recovered_after_power_cycle() {
    let mut path = env::temp_dir();
    path.push("power_cycle_rattendance.buf");
    fs::remove_file(&path).ok();

    {
        let region = FileRegion::open(&path, 128).expect("region");
        let mut log = DurableEventLog::open(Box::new(region)).expect("open");
        log.append(&ev("Alice", Verdict::CheckIn, 7, 30)).expect("append");
        log.append(&ev("Bob", Verdict::CheckIn, 11, 0)).expect("append");
        // dropped without an explicit flush: append already wrote through
    }

    assert_eq!(fs::metadata(&path).expect("meta").len(), 128);

    let region = FileRegion::open(&path, 128).expect("region");
    let mut log = DurableEventLog::open(Box::new(region)).expect("reopen");
    assert_eq!(log.cursor(), 60);
    assert_eq!(log.events()[1].employee_name(), "Bob");

    log.append(&ev("Cara", Verdict::CheckOut, 20, 15)).expect("append after reboot");
    assert_eq!(log.events().len(), 3);

    log.clear().expect("clear");
    let region = FileRegion::open(&path, 128).expect("region");
    let log = DurableEventLog::open(Box::new(region)).expect("reopen");
    assert!(log.is_empty());
}

#[test]
fn larger_existing_file_keeps_its_records() {
    let mut path = env::temp_dir();
    path.push("shrunk_rattendance.buf");
    fs::remove_file(&path).ok();

    {
        let region = FileRegion::open(&path, 256).expect("region");
        let mut log = DurableEventLog::open(Box::new(region)).expect("open");
        log.append(&ev("Alice", Verdict::CheckIn, 7, 30)).expect("append");
    }

    let region = FileRegion::open(&path, 64).expect("region");
    let log = DurableEventLog::open(Box::new(region)).expect("reopen");
    assert_eq!(log.capacity(), 256);
    assert_eq!(log.events().len(), 1);
}

#[test]
fn control_bytes_in_a_name_survive_a_power_cycle() {
    let mut path = env::temp_dir();
    path.push("nul_name_rattendance.buf");
    fs::remove_file(&path).ok();

    let cursor = {
        let region = FileRegion::open(&path, 128).expect("region");
        let mut log = DurableEventLog::open(Box::new(region)).expect("open");
        log.append(&ev("Al\0ice", Verdict::CheckIn, 7, 30)).expect("append");
        log.append(&ev("Bob", Verdict::CheckIn, 11, 0)).expect("append");
        log.cursor()
    };

    let region = FileRegion::open(&path, 128).expect("region");
    let log = DurableEventLog::open(Box::new(region)).expect("reopen");

    assert_eq!(log.cursor(), cursor);
    let names: Vec<String> = log
        .events()
        .iter()
        .map(|e| e.employee_name().to_string())
        .collect();
    assert_eq!(names, vec!["Al ice", "Bob"]);
    assert!(log.records().iter().all(|r| r.is_ok()));
}

#[test]
fn record_without_a_name_is_never_written() {
    let mut log = DurableEventLog::in_memory(256);

    for name in [",", "   ", "\r\n\t"] {
        let err = log
            .append(&ev(name, Verdict::CheckIn, 7, 5))
            .expect_err("nameless record");
        assert!(matches!(err, AppError::Parse(_)));
    }

    assert!(log.is_empty());
    assert_eq!(log.cursor(), 0);
}
