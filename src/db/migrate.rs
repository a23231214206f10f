use crate::ui::messages::success;
use rusqlite::{Connection, OptionalExtension, Result};

/// Ensure that the `log` table exists; it also records applied migrations.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn is_applied(conn: &Connection, version: &str) -> Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

/// Run `sql` once, recording `version` in the log table.
fn apply(conn: &Connection, version: &str, message: &str, sql: &str) -> Result<bool> {
    if is_applied(conn, version)? {
        return Ok(false);
    }

    conn.execute_batch(sql)?;

    conn.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
        [version, message],
    )?;

    success(format!("Migration applied: {} → {}", version, message));
    Ok(true)
}

const MIGRATIONS: &[(&str, &str, &str)] = &[
    (
        "20251019_0001_create_remote_nodes",
        "created remote_nodes table",
        r#"
        CREATE TABLE IF NOT EXISTS remote_nodes (
            path       TEXT NOT NULL,
            key        TEXT NOT NULL,
            payload    TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (path, key)
        );
        "#,
    ),
    (
        "20251019_0002_create_roster_cache",
        "created roster_cache table",
        r#"
        CREATE TABLE IF NOT EXISTS roster_cache (
            id    INTEGER PRIMARY KEY,
            name  TEXT NOT NULL,
            shift TEXT NOT NULL CHECK(shift IN ('morning','afternoon','night'))
        );
        "#,
    ),
    (
        "20251019_0003_create_device_state",
        "created device_state table",
        r#"
        CREATE TABLE IF NOT EXISTS device_state (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        "#,
    ),
];

/// Public entry point: run all pending migrations. Returns how many ran.
pub fn run_pending_migrations(conn: &Connection) -> Result<usize> {
    ensure_log_table(conn)?;

    let mut applied = 0;
    for (version, message, sql) in MIGRATIONS {
        if apply(conn, version, message, sql)? {
            applied += 1;
        }
    }

    Ok(applied)
}
