use rattendance::core::controller::{Phase, Route, ScanResult, SyncOutcome};
use rattendance::core::enroll::EnrollOutcome;
use rattendance::device::ScanOutcome;
use rattendance::device::Signal;
use rattendance::errors::DeviceError;
use rattendance::models::enrollment::{EnrollmentRequest, EnrollmentStatus};
use rattendance::models::event::RemoteEventRecord;
use rattendance::models::roster::RosterEntry;
use rattendance::models::shift::ShiftKind;
use rattendance::models::verdict::Verdict;
use serde_json::json;

mod common;
use common::{at, day, rig, rig_with, staff};

const DAY: &str = "/attendance/2024-03-01";

fn remote_events(remote: &rattendance::device::sim::MemoryRemote) -> Vec<RemoteEventRecord> {
    remote
        .records(DAY)
        .into_iter()
        .map(|v| serde_json::from_value(v).expect("event record"))
        .collect()
}

#[test]
fn online_scan_is_delivered_live() {
    let mut r = rig("2024-03-01 07:30", true);
    r.reader.push_match(1);

    let report = r.ctrl.tick().expect("tick");

    match report.scan {
        Some(ScanResult::Recorded(ev, Route::Delivered)) => {
            assert_eq!(ev.employee_name(), "Alice");
            assert_eq!(ev.verdict(), Verdict::CheckIn);
        }
        other => panic!("unexpected scan result {:?}", other),
    }
    assert_eq!(r.ctrl.phase(), Phase::Idle);
    assert!(r.ctrl.buffer().is_empty());

    let events = remote_events(&r.remote);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].time, "07:30");
    assert_eq!(
        r.notifier.last(),
        Some((Signal::Success, "Attendance recorded".to_string()))
    );
}

#[test]
fn offline_scans_are_buffered_and_drained_when_the_link_returns() {
    let mut r = rig("2024-03-01 07:05", false);

    r.reader.push_match(1);
    r.ctrl.tick().expect("tick");
    assert_eq!(
        r.ctrl.buffer().cursor(),
        "Alice,CheckIn,07:05,01-03-2024\n".len()
    );
    r.clock.set(at("2024-03-01 11:10"));
    r.reader.push_match(2);
    r.ctrl.tick().expect("tick");

    assert_eq!(r.ctrl.buffer().events().len(), 2);
    assert_eq!(r.remote.writes(), 0);

    r.link.set_online(true);
    let report = r.ctrl.tick().expect("tick");

    match report.sync {
        Some(SyncOutcome::Drained(d)) => {
            assert_eq!(d.delivered, 2);
            assert!(d.cleared);
        }
        other => panic!("expected a drain, got {:?}", other),
    }
    assert!(r.ctrl.buffer().is_empty());

    let names: Vec<String> = remote_events(&r.remote).into_iter().map(|e| e.name).collect();
    assert!(names.contains(&"Alice".to_string()));
    assert!(names.contains(&"Bob".to_string()));
    assert_eq!(
        r.notifier.last(),
        Some((Signal::Success, "Sync complete (2 records)".to_string()))
    );
}

#[test]
fn live_delivery_replays_a_waiting_buffer() {
    let mut r = rig("2024-03-01 07:10", false);
    r.reader.push_match(1);
    r.ctrl.tick().expect("tick");
    assert!(!r.ctrl.buffer().is_empty());

    // no tick while online, so only the live delivery can trigger the replay
    r.link.set_online(true);
    let now = at("2024-03-01 11:20");
    let result = r.ctrl.handle_scan(2, now).expect("scan");

    assert!(matches!(result, ScanResult::Recorded(_, Route::Delivered)));
    assert!(r.ctrl.buffer().is_empty());
    assert_eq!(r.remote.records(DAY).len(), 2);
}

#[test]
fn scan_outside_every_window_is_rejected() {
    let mut r = rig("2024-03-01 10:00", true);
    r.reader.push_match(1);

    let report = r.ctrl.tick().expect("tick");

    assert_eq!(
        report.scan,
        Some(ScanResult::Rejected {
            employee_id: 1,
            minutes_of_day: 600
        })
    );
    assert!(r.ctrl.buffer().is_empty());
    assert!(r.remote.records(DAY).is_empty());
    assert_eq!(r.notifier.count(Signal::Failure), 1);
}

#[test]
fn out_of_range_and_unrecognised_fingers() {
    let mut r = rig("2024-03-01 07:30", true);

    r.reader.push_match(0);
    assert_eq!(r.ctrl.tick().expect("tick").scan, Some(ScanResult::InvalidId(0)));

    r.reader.push_match(128);
    assert_eq!(r.ctrl.tick().expect("tick").scan, Some(ScanResult::InvalidId(128)));

    r.reader.push(Ok(ScanOutcome::NoMatch));
    assert_eq!(r.ctrl.tick().expect("tick").scan, Some(ScanResult::Unrecognised));

    assert_eq!(r.notifier.count(Signal::Failure), 3);
    assert!(r.remote.records(DAY).is_empty());
}

#[test]
fn unknown_slot_is_recorded_under_a_placeholder() {
    let mut r = rig("2024-03-01 07:45", true);
    r.reader.push_match(42);

    match r.ctrl.tick().expect("tick").scan {
        Some(ScanResult::Recorded(ev, _)) => assert_eq!(ev.employee_name(), "Employee42"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn sensor_errors_do_not_stop_the_loop() {
    let mut r = rig("2024-03-01 07:30", true);
    r.reader.push(Err(DeviceError::Timeout(10)));
    r.reader.push_match(1);

    let first = r.ctrl.tick().expect("tick");
    assert_eq!(first.sensor_error, Some(DeviceError::Timeout(10)));
    assert!(first.scan.is_none());

    let second = r.ctrl.tick().expect("tick");
    assert!(matches!(second.scan, Some(ScanResult::Recorded(_, _))));
}

#[test]
fn full_buffer_drops_the_event() {
    let mut r = rig_with("2024-03-01 07:30", false, staff(), 40);

    r.reader.push_match(1);
    r.reader.push_match(1);
    r.ctrl.tick().expect("tick");
    let report = r.ctrl.tick().expect("tick");

    assert!(matches!(report.scan, Some(ScanResult::Recorded(_, Route::Dropped))));
    assert_eq!(r.ctrl.buffer().events().len(), 1);
    assert_eq!(
        r.notifier.last(),
        Some((Signal::Failure, "Storage full".to_string()))
    );
}

#[test]
fn daily_sweep_marks_the_missing_as_absent_once() {
    let mut r = rig("2024-03-01 07:30", true);
    r.remote
        .insert("/leave/2024-03-01/Bob", json!({"name": "Bob"}));

    r.reader.push_match(1);
    r.ctrl.tick().expect("morning tick");

    r.clock.set(at("2024-03-01 17:00"));
    let report = r.ctrl.tick().expect("evening tick");
    let sweep = report.reconcile.expect("sweep due at 17:00");

    assert_eq!(sweep.date, day("2024-03-01"));
    let absent: Vec<&str> = sweep.absent.iter().map(|e| e.employee_name()).collect();
    assert_eq!(absent, vec!["Cara"]);
    assert_eq!(sweep.delivered, 1);

    let cara = remote_events(&r.remote)
        .into_iter()
        .find(|e| e.name == "Cara")
        .expect("absence delivered");
    assert_eq!(cara.status, Verdict::Absent);
    assert_eq!(cara.time, "00:00");

    r.clock.advance_minutes(30);
    assert!(r.ctrl.tick().expect("tick").reconcile.is_none());
    assert_eq!(r.ctrl.gate().last_run(), Some(day("2024-03-01")));

    r.clock.set(at("2024-03-02 17:00"));
    let next = r.ctrl.tick().expect("next day").reconcile.expect("due again");
    assert_eq!(next.absent.len(), 3);
}

#[test]
fn offline_sweep_buffers_absences_without_leave() {
    let mut r = rig("2024-03-01 07:30", false);
    r.remote
        .insert("/leave/2024-03-01/Bob", json!({"name": "Bob"}));
    r.reader.push_match(1);
    r.ctrl.tick().expect("tick");

    let sweep = r.ctrl.reconcile(day("2024-03-01")).expect("sweep");

    let absent: Vec<&str> = sweep.absent.iter().map(|e| e.employee_name()).collect();
    assert_eq!(absent, vec!["Bob", "Cara"]);
    assert_eq!(sweep.buffered, 2);
    assert_eq!(r.ctrl.buffer().events().len(), 3);
}

#[test]
fn partial_drain_on_reconnect_keeps_the_buffer() {
    let mut r = rig("2024-03-01 07:30", false);
    for id in [1, 1, 1] {
        r.reader.push_match(id);
    }
    for _ in 0..3 {
        r.ctrl.tick().expect("tick");
        r.clock.advance_minutes(1);
    }
    let cursor = r.ctrl.buffer().cursor();

    r.remote.fail_after(Some(1));
    r.link.set_online(true);
    let report = r.ctrl.tick().expect("tick");

    assert_eq!(
        report.sync,
        Some(SyncOutcome::Partial {
            delivered: 1,
            total: 3
        })
    );
    assert_eq!(r.ctrl.buffer().cursor(), cursor);

    r.remote.fail_after(None);
    match r.ctrl.sync_all().expect("sync") {
        SyncOutcome::Drained(d) => assert_eq!(d.delivered, 3),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(r.remote.records(DAY).len(), 3);
}

#[test]
fn reconnect_refreshes_the_roster() {
    let mut r = rig("2024-03-01 07:30", false);
    r.remote
        .insert("/employees/7", json!({"id": 7, "name": "Gus", "shift": "afternoon"}));

    r.ctrl.tick().expect("offline tick");
    assert!(r.ctrl.roster().lookup(7).is_none());

    r.link.set_online(true);
    let report = r.ctrl.tick().expect("online tick");

    assert_eq!(report.roster_refreshed, Some(1));
    assert_eq!(r.ctrl.roster().lookup(7).map(|e| e.name.as_str()), Some("Gus"));
}

#[test]
fn remote_enrollment_request_is_served() {
    let mut r = rig("2024-03-01 09:00", true);
    r.remote.insert(
        "/fingerprint/register/request",
        json!({"id": 9, "name": "Ivy", "status": "pending"}),
    );

    let report = r.ctrl.tick().expect("tick");

    match report.enrollment {
        Some(EnrollOutcome::Enrolled(req)) => assert_eq!(req.id, 9),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(r.reader.enrolled(), vec![9]);

    let request: EnrollmentRequest =
        serde_json::from_value(r.remote.records("/fingerprint/register")[0].clone())
            .expect("request");
    assert_eq!(request.status, EnrollmentStatus::Success);
    assert_eq!(r.ctrl.roster().lookup(9).map(|e| e.name.as_str()), Some("Ivy"));

    // a served request is not picked up again
    assert!(r.ctrl.tick().expect("tick").enrollment.is_none());
}

#[test]
fn failed_enrollment_is_reported_back() {
    let mut r = rig("2024-03-01 09:00", true);
    r.remote.insert(
        "/fingerprint/register/request",
        json!({"id": 9, "name": "Ivy", "status": "pending"}),
    );
    r.reader
        .push_enrollment(Err(DeviceError::Sensor("finger moved".into())));

    let report = r.ctrl.tick().expect("tick");

    assert!(matches!(report.enrollment, Some(EnrollOutcome::Failed(_, _))));
    assert!(r.reader.enrolled().is_empty());
    let request: EnrollmentRequest =
        serde_json::from_value(r.remote.records("/fingerprint/register")[0].clone())
            .expect("request");
    assert_eq!(request.status, EnrollmentStatus::Failed);
    assert!(r.remote.records("/employees").is_empty());
    assert_eq!(
        r.notifier.last(),
        Some((Signal::Failure, "Enrollment failed".to_string()))
    );
}

#[test]
fn shutdown_hands_back_what_must_be_persisted() {
    let mut r = rig("2024-03-01 17:05", false);
    r.ctrl.tick().expect("tick");

    let state = r.ctrl.shutdown().expect("shutdown");

    assert_eq!(state.last_reconciled, Some(day("2024-03-01")));
    assert_eq!(state.roster, staff());
    assert!(state.buffered_bytes > 0);
}

#[test]
fn nameless_roster_entry_is_buffered_under_a_placeholder() {
    let roster = vec![RosterEntry::new(4, ",", ShiftKind::Morning)];
    let mut r = rig_with("2024-03-01 07:05", false, roster, 4096);

    r.reader.push_match(4);
    match r.ctrl.tick().expect("tick").scan {
        Some(ScanResult::Recorded(ev, Route::Buffered)) => {
            assert_eq!(ev.employee_name(), "Employee4")
        }
        other => panic!("unexpected {:?}", other),
    }

    r.link.set_online(true);
    match r.ctrl.tick().expect("tick").sync {
        Some(SyncOutcome::Drained(d)) => {
            assert_eq!(d.delivered, 1);
            assert!(d.corrupt.is_empty());
        }
        other => panic!("expected a drain, got {:?}", other),
    }
    assert_eq!(r.remote.writes(), 1);
}

#[test]
fn leave_and_remote_names_with_commas_match_the_roster() {
    let roster = vec![
        RosterEntry::new(4, "Doe, John", ShiftKind::Morning),
        RosterEntry::new(5, "Roe, Jane", ShiftKind::Morning),
    ];
    let mut r = rig_with("2024-03-01 17:30", true, roster, 4096);
    r.remote
        .insert("/leave/2024-03-01/Doe", json!({"name": "Doe, John"}));
    r.remote.insert(
        "/attendance/2024-03-01/x",
        json!({"name": "Roe, Jane", "status": "CheckIn", "time": "07:10", "date": "01-03-2024"}),
    );

    let sweep = r.ctrl.reconcile(day("2024-03-01")).expect("sweep");

    assert!(sweep.absent.is_empty());
}

#[test]
fn reconciling_a_past_day_keeps_today_done() {
    let mut r = rig("2024-03-02 17:30", true);
    r.ctrl.tick().expect("tick");
    assert_eq!(r.ctrl.gate().last_run(), Some(day("2024-03-02")));

    r.ctrl.reconcile(day("2024-03-01")).expect("past day");

    assert_eq!(r.ctrl.gate().last_run(), Some(day("2024-03-02")));
    r.clock.advance_minutes(5);
    assert!(r.ctrl.tick().expect("tick").reconcile.is_none());
}

#[test]
fn enrollment_without_a_name_fails() {
    let mut r = rig("2024-03-01 09:00", true);
    r.remote.insert(
        "/fingerprint/register/request",
        json!({"id": 9, "name": " , ", "status": "pending"}),
    );

    let report = r.ctrl.tick().expect("tick");

    assert!(matches!(report.enrollment, Some(EnrollOutcome::Failed(_, _))));
    assert!(r.reader.enrolled().is_empty());
    assert!(r.remote.records("/employees").is_empty());
}
