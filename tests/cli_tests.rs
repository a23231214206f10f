use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

mod common;
use common::{init_terminal, rat};

#[test]
fn test_init_creates_database_and_buffer() {
    let (db, buf) = init_terminal("cli_init");

    assert!(std::path::Path::new(&db).exists());
    assert_eq!(std::fs::metadata(&buf).expect("buffer file").len(), 4096);

    rat("cli_init")
        .args(["--db", &db, "log", "--print"])
        .assert()
        .success()
        .stdout(contains("migration_applied").and(contains("init")));
}

#[test]
fn test_offline_scan_is_buffered_then_synced() {
    let name = "cli_offline_sync";
    let (db, buf) = init_terminal(name);

    rat(name)
        .args([
            "--db",
            &db,
            "--buffer",
            &buf,
            "scan",
            "3",
            "--at",
            "2024-03-01 07:30",
            "--offline",
        ])
        .assert()
        .success()
        .stdout(contains("Employee3 CheckIn at 07:30").and(contains("buffered offline")));

    rat(name)
        .args(["--db", &db, "--buffer", &buf, "buffer", "--print"])
        .assert()
        .success()
        .stdout(contains("1 record(s)").and(contains("Employee3")));

    rat(name)
        .args(["--db", &db, "--buffer", &buf, "sync"])
        .assert()
        .success()
        .stdout(contains("1 buffered record(s) delivered"));

    rat(name)
        .args(["--db", &db, "--buffer", &buf, "buffer"])
        .assert()
        .success()
        .stdout(contains("0 record(s)"));

    rat(name)
        .args(["--db", &db, "remote", "show", "/attendance"])
        .assert()
        .success()
        .stdout(contains("/attendance/2024-03-01/Employee3|CheckIn|0730"));
}

#[test]
fn test_sync_offline_sends_nothing() {
    let name = "cli_sync_offline";
    let (db, buf) = init_terminal(name);

    rat(name)
        .args([
            "--db", &db, "--buffer", &buf, "scan", "1", "--at", "2024-03-01 07:40", "--offline",
        ])
        .assert()
        .success();

    rat(name)
        .args(["--db", &db, "--buffer", &buf, "sync", "--offline"])
        .assert()
        .success()
        .stdout(contains("unreachable"));

    rat(name)
        .args(["--db", &db, "--buffer", &buf, "buffer"])
        .assert()
        .success()
        .stdout(contains("1 record(s)"));
}

#[test]
fn test_scan_outside_shift_is_rejected() {
    let name = "cli_rejected";
    let (db, buf) = init_terminal(name);

    rat(name)
        .args([
            "--db", &db, "--buffer", &buf, "scan", "1", "--at", "2024-03-01 10:00", "--offline",
        ])
        .assert()
        .success()
        .stdout(contains("rejected").and(contains("10:00")));

    rat(name)
        .args(["--db", &db, "--buffer", &buf, "buffer"])
        .assert()
        .success()
        .stdout(contains("0 record(s)"));
}

#[test]
fn test_invalid_at_fails() {
    let name = "cli_bad_at";
    let (db, buf) = init_terminal(name);

    rat(name)
        .args(["--db", &db, "--buffer", &buf, "scan", "1", "--at", "tomorrow"])
        .assert()
        .failure()
        .stderr(contains("Invalid date"));
}

#[test]
fn test_remote_roster_and_named_scan() {
    let name = "cli_roster";
    let (db, buf) = init_terminal(name);

    rat(name)
        .args(["--db", &db, "remote", "employee", "1", "Alice", "--shift", "afternoon"])
        .assert()
        .success()
        .stdout(contains("afternoon"));

    rat(name)
        .args(["--db", &db, "remote", "employee", "2", "Bob", "--shift", "weekend"])
        .assert()
        .failure()
        .stderr(contains("Unknown shift"));

    rat(name)
        .args(["--db", &db, "roster", "--refresh", "--list"])
        .assert()
        .success()
        .stdout(contains("Roster refreshed: 1").and(contains("Alice")));

    // cached roster is used offline
    rat(name)
        .args([
            "--db", &db, "--buffer", &buf, "scan", "1", "--at", "2024-03-01 11:15", "--offline",
        ])
        .assert()
        .success()
        .stdout(contains("Alice CheckIn at 11:15"));
}

#[test]
fn test_reconcile_marks_absences_and_respects_leave() {
    let name = "cli_reconcile";
    let (db, buf) = init_terminal(name);

    for (id, who) in [("1", "Alice"), ("2", "Bob"), ("3", "Cara")] {
        rat(name)
            .args(["--db", &db, "remote", "employee", id, who])
            .assert()
            .success();
    }
    rat(name)
        .args(["--db", &db, "remote", "leave", "2024-03-01", "Bob"])
        .assert()
        .success();

    rat(name)
        .args(["--db", &db, "--buffer", &buf, "scan", "1", "--at", "2024-03-01 07:20"])
        .assert()
        .success()
        .stdout(contains("Alice CheckIn").and(contains("delivered")));

    rat(name)
        .args(["--db", &db, "--buffer", &buf, "reconcile", "--date", "2024-03-01"])
        .assert()
        .success()
        .stdout(
            contains("ABSENT  Cara")
                .and(contains("ABSENT  Bob").not())
                .and(contains("ABSENT  Alice").not()),
        );

    rat(name)
        .args(["--db", &db, "remote", "show", "/attendance/2024-03-01"])
        .assert()
        .success()
        .stdout(contains("Cara|Absent|0000"));
}

#[test]
fn test_remote_enroll_request_is_stored() {
    let name = "cli_enroll";
    let (db, _) = init_terminal(name);

    rat(name)
        .args(["--db", &db, "remote", "enroll", "9", "Ivy"])
        .assert()
        .success();

    rat(name)
        .args(["--db", &db, "remote", "show", "/fingerprint"])
        .assert()
        .success()
        .stdout(contains("/fingerprint/register/request").and(contains("pending")));
}

#[test]
fn test_run_reads_scans_from_stdin() {
    let name = "cli_run";
    let (db, buf) = init_terminal(name);

    rat(name)
        .args([
            "--db",
            &db,
            "--buffer",
            &buf,
            "run",
            "--at",
            "2024-03-01 07:30",
            "--offline",
            "--iterations",
            "5",
        ])
        .write_stdin("4\nx\n")
        .assert()
        .success()
        .stdout(
            contains("Employee4 CheckIn")
                .and(contains("fingerprint not recognised"))
                .and(contains("Sensor input closed")),
        );

    rat(name)
        .args(["--db", &db, "--buffer", &buf, "buffer"])
        .assert()
        .success()
        .stdout(contains("1 record(s)"));
}

#[test]
fn test_config_print_shows_defaults() {
    rat("cli_config")
        .args(["config", "--print"])
        .assert()
        .success()
        .stdout(contains("buffer_capacity: 4096").and(contains("reconcile_at")));
}
