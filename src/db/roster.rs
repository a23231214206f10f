//! Persisted copy of the roster cache, so an offline boot still knows
//! names and shifts.

use crate::errors::{AppError, AppResult};
use crate::models::roster::RosterEntry;
use crate::models::shift::ShiftKind;
use rusqlite::{Connection, params};

pub fn load_roster(conn: &Connection) -> AppResult<Vec<RosterEntry>> {
    let mut stmt = conn.prepare("SELECT id, name, shift FROM roster_cache ORDER BY id ASC")?;

    let rows = stmt.query_map([], |row| {
        let id: u16 = row.get(0)?;
        let name: String = row.get(1)?;
        let shift: String = row.get(2)?;
        Ok((id, name, shift))
    })?;

    let mut out = Vec::new();
    for r in rows {
        let (id, name, shift) = r?;
        let shift = ShiftKind::from_name(&shift).ok_or(AppError::InvalidShift(shift))?;
        out.push(RosterEntry::new(id, &name, shift));
    }
    Ok(out)
}

/// Replace the stored roster wholesale.
pub fn save_roster(conn: &mut Connection, entries: &[RosterEntry]) -> AppResult<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM roster_cache", [])?;
    {
        let mut stmt =
            tx.prepare("INSERT INTO roster_cache (id, name, shift) VALUES (?1, ?2, ?3)")?;
        for e in entries {
            stmt.execute(params![e.employee_id, e.name, e.assigned_shift.as_str()])?;
        }
    }
    tx.commit()?;
    Ok(())
}
