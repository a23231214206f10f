//! Append-only offline buffer of attendance records.
//!
//! Records are stored as `name,verdict,HH:MM,DD-MM-YYYY\n` one after the
//! other from offset 0; the first zero byte marks the append cursor. The
//! buffer is only ever emptied as a whole, after every record in it has
//! been delivered.

use super::region::{MemRegion, Region};
use crate::errors::{AppError, AppResult};
use crate::models::event::AttendanceEvent;

const DELIMITER: u8 = b'\n';

/// Result of one drain attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Well-formed records found in the buffer.
    pub total: usize,
    /// Records the sink accepted before the drain stopped.
    pub delivered: usize,
    /// Raw lines that could not be parsed; skipped and reported.
    pub corrupt: Vec<String>,
    /// True when the buffer was wiped at the end of the drain.
    pub cleared: bool,
}

impl DrainReport {
    pub fn is_complete(&self) -> bool {
        self.delivered == self.total
    }
}

pub struct DurableEventLog {
    region: Box<dyn Region>,
    data: Vec<u8>, // used prefix of the region, mirrors region[..cursor]
}

impl DurableEventLog {
    /// Open a log over `region`, recovering the cursor by scanning to the
    /// first unused (zero) byte.
    pub fn open(mut region: Box<dyn Region>) -> AppResult<Self> {
        let mut bytes = region.load()?;
        let cursor = bytes
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(bytes.len());
        bytes.truncate(cursor);

        log::debug!(
            "[LOG] opened buffer: {} / {} bytes used",
            cursor,
            region.capacity()
        );

        Ok(Self {
            region,
            data: bytes,
        })
    }

    pub fn in_memory(capacity: usize) -> Self {
        Self {
            region: Box::new(MemRegion::new(capacity)),
            data: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.region.capacity()
    }

    /// Append cursor: bytes in use.
    pub fn cursor(&self) -> usize {
        self.data.len()
    }

    pub fn free(&self) -> usize {
        self.capacity() - self.cursor()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append one record. Rejected without writing anything when
    /// `cursor + len(record) + 1` would reach the capacity, or when the
    /// record would not read back as the same event.
    pub fn append(&mut self, event: &AttendanceEvent) -> AppResult<usize> {
        let line = event.to_record();
        let replayable = !line.bytes().any(|b| b == 0 || b == DELIMITER)
            && AttendanceEvent::from_record(&line).is_ok_and(|parsed| &parsed == event);
        if !replayable {
            log::warn!("[LOG] refusing unreplayable record '{}'", line.escape_debug());
            return Err(AppError::Parse(line));
        }

        let mut record = line.into_bytes();
        let needed = record.len() + 1;

        if self.cursor() + needed >= self.capacity() {
            log::warn!(
                "[LOG] buffer full, dropping '{}' ({} bytes needed, {} free)",
                String::from_utf8_lossy(&record),
                needed,
                self.free()
            );
            return Err(AppError::StorageFull {
                needed,
                free: self.free(),
            });
        }

        record.push(DELIMITER);
        self.region.write_at(self.cursor(), &record)?;
        self.region.flush()?;
        self.data.extend_from_slice(&record);

        log::debug!("[LOG] appended {} bytes, cursor at {}", needed, self.cursor());
        Ok(needed)
    }

    /// Raw lines currently buffered, in insertion order.
    fn lines(&self) -> impl Iterator<Item = &str> {
        self.data
            .split(|b| *b == DELIMITER)
            .filter(|l| !l.is_empty())
            .map(|l| std::str::from_utf8(l).unwrap_or("\u{fffd}"))
    }

    /// Buffered records, parsed. Corrupt lines come back as `AppError::Parse`.
    pub fn records(&self) -> Vec<AppResult<AttendanceEvent>> {
        self.lines().map(AttendanceEvent::from_record).collect()
    }

    /// Well-formed buffered records only.
    pub fn events(&self) -> Vec<AttendanceEvent> {
        self.records().into_iter().filter_map(Result::ok).collect()
    }

    /// Offer every buffered record to `sink`, oldest first. The buffer is
    /// cleared only if the sink accepted all of them; on the first refusal
    /// the drain stops and the buffer stays exactly as it was, so the next
    /// drain starts again from the first record.
    ///
    /// Corrupt lines are skipped and reported; they do not hold back the
    /// clear.
    pub fn drain<F>(&mut self, mut sink: F) -> AppResult<DrainReport>
    where
        F: FnMut(&AttendanceEvent) -> bool,
    {
        let mut report = DrainReport::default();
        let mut events = Vec::new();

        for line in self.lines() {
            match AttendanceEvent::from_record(line) {
                Ok(ev) => events.push(ev),
                Err(_) => {
                    log::warn!("[LOG] skipping corrupt record '{}'", line);
                    report.corrupt.push(line.to_string());
                }
            }
        }
        report.total = events.len();

        if self.is_empty() {
            return Ok(report);
        }

        for ev in &events {
            if !sink(ev) {
                log::info!(
                    "[LOG] drain stopped at record {} of {}, buffer kept",
                    report.delivered + 1,
                    report.total
                );
                return Ok(report);
            }
            report.delivered += 1;
        }

        self.clear()?;
        report.cleared = true;
        log::info!("[LOG] drain complete, {} records delivered", report.delivered);
        Ok(report)
    }

    /// Reset the cursor and zero the region.
    pub fn clear(&mut self) -> AppResult<()> {
        self.region.zero()?;
        self.region.flush()?;
        self.data.clear();
        Ok(())
    }

    pub fn flush(&mut self) -> AppResult<()> {
        self.region.flush()
    }
}
