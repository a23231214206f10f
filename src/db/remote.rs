//! Remote store backed by a SQLite table of JSON nodes.
//!
//! A node path `/a/b/key` is stored as (`/a/b`, `key`); `read_bulk("/a/b")`
//! returns every payload stored under `/a/b`. Writes are upserts, so
//! replaying a record with the same path overwrites it.

use crate::device::{RemoteStore, split_node_path};
use crate::errors::DeviceError;
use chrono::Local;
use rusqlite::{Connection, ErrorCode, params};
use serde_json::Value;
use std::time::Duration;

pub struct SqliteRemote {
    conn: Connection,
}

fn to_device_error(e: rusqlite::Error, timeout: Duration) -> DeviceError {
    match e.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
            DeviceError::Timeout(timeout.as_millis() as u64)
        }
        _ => DeviceError::Rejected(e.to_string()),
    }
}

impl SqliteRemote {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Every node path and payload, ordered by path (used by `remote show`).
    pub fn dump(&self, prefix: &str) -> rusqlite::Result<Vec<(String, Value)>> {
        let mut stmt = self.conn.prepare(
            "SELECT path, key, payload FROM remote_nodes
             WHERE path = ?1 OR path LIKE ?1 || '/%'
             ORDER BY path ASC, key ASC",
        )?;

        let rows = stmt.query_map([prefix.trim_end_matches('/')], |row| {
            let path: String = row.get(0)?;
            let key: String = row.get(1)?;
            let payload: String = row.get(2)?;
            Ok((format!("{path}/{key}"), payload))
        })?;

        let mut out = Vec::new();
        for r in rows {
            let (path, payload) = r?;
            let value = serde_json::from_str(&payload).unwrap_or(Value::String(payload));
            out.push((path, value));
        }
        Ok(out)
    }
}

impl RemoteStore for SqliteRemote {
    /// A local file is ready as soon as it is open.
    fn is_ready(&self) -> bool {
        true
    }

    fn write(&mut self, path: &str, record: &Value, timeout: Duration) -> Result<(), DeviceError> {
        let (dir, key) = split_node_path(path);
        if key.is_empty() {
            return Err(DeviceError::Rejected(format!("'{path}' is not a node path")));
        }

        self.conn
            .busy_timeout(timeout)
            .map_err(|e| to_device_error(e, timeout))?;

        self.conn
            .execute(
                "INSERT INTO remote_nodes (path, key, payload, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(path, key) DO UPDATE
                 SET payload = excluded.payload, updated_at = excluded.updated_at",
                params![dir, key, record.to_string(), Local::now().to_rfc3339()],
            )
            .map_err(|e| to_device_error(e, timeout))?;

        Ok(())
    }

    fn read_bulk(&mut self, path: &str, timeout: Duration) -> Result<Vec<Value>, DeviceError> {
        self.conn
            .busy_timeout(timeout)
            .map_err(|e| to_device_error(e, timeout))?;

        let mut stmt = self
            .conn
            .prepare_cached("SELECT payload FROM remote_nodes WHERE path = ?1 ORDER BY key ASC")
            .map_err(|e| to_device_error(e, timeout))?;

        let rows = stmt
            .query_map([path.trim_end_matches('/')], |row| row.get::<_, String>(0))
            .map_err(|e| to_device_error(e, timeout))?;

        let mut out = Vec::new();
        for r in rows {
            let payload = r.map_err(|e| to_device_error(e, timeout))?;
            match serde_json::from_str(&payload) {
                Ok(v) => out.push(v),
                Err(e) => log::warn!("[REMOTE] skipping unreadable node under {}: {}", path, e),
            }
        }
        Ok(out)
    }
}
