//! Small key/value table for device state that must survive a restart.

use crate::errors::AppResult;
use crate::utils::date::{format_iso, parse_date};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};

const LAST_RECONCILED: &str = "last_reconciled";

pub fn get_state(conn: &Connection, key: &str) -> AppResult<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM device_state WHERE key = ?1",
            [key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

pub fn set_state(conn: &Connection, key: &str, value: &str) -> AppResult<()> {
    conn.execute(
        "INSERT INTO device_state (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

/// Date of the last absence sweep, if any.
pub fn last_reconciled(conn: &Connection) -> AppResult<Option<NaiveDate>> {
    Ok(get_state(conn, LAST_RECONCILED)?.and_then(|s| parse_date(&s)))
}

pub fn set_last_reconciled(conn: &Connection, date: NaiveDate) -> AppResult<()> {
    set_state(conn, LAST_RECONCILED, &format_iso(date))
}
