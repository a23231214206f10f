//! Wires a controller from the configuration: database, offline buffer
//! file, SQLite remote store and the software device stand-ins.

use crate::config::Config;
use crate::core::controller::{AttendanceController, ControllerSettings, ShutdownState};
use crate::core::reconciler::DailyGate;
use crate::core::roster::RosterCache;
use crate::db::pool::DbPool;
use crate::db::remote::SqliteRemote;
use crate::db::{roster, state};
use crate::device::sim::{ConsoleNotifier, FixedClock, MarkerFileLink, SystemClock};
use crate::device::{BiometricReader, Clock, Devices};
use crate::errors::{AppError, AppResult};
use crate::storage::{DurableEventLog, FileRegion};
use crate::utils::date::parse_datetime;

/// Wall clock, or a frozen one for `--at "YYYY-MM-DD HH:MM"`.
pub fn clock_at(at: Option<&str>) -> AppResult<Box<dyn Clock>> {
    match at {
        None => Ok(Box::new(SystemClock)),
        Some(s) => parse_datetime(s)
            .map(|dt| Box::new(FixedClock::new(dt)) as Box<dyn Clock>)
            .ok_or_else(|| AppError::InvalidDate(s.to_string())),
    }
}

pub struct Terminal {
    pub cfg: Config,
    pub pool: DbPool,
}

impl Terminal {
    pub fn open(cfg: &Config) -> AppResult<Self> {
        cfg.validate()?;
        let pool = DbPool::new(&cfg.database_path())?;
        Ok(Self {
            cfg: cfg.clone(),
            pool,
        })
    }

    pub fn open_buffer(&self) -> AppResult<DurableEventLog> {
        let region = FileRegion::open(&self.cfg.buffer_path(), self.cfg.buffer_capacity)?;
        DurableEventLog::open(Box::new(region))
    }

    pub fn remote(&self) -> AppResult<SqliteRemote> {
        Ok(SqliteRemote::new(self.pool.reopen()?))
    }

    /// Roster cache seeded from the persisted snapshot.
    pub fn roster_cache(&self) -> AppResult<RosterCache> {
        let cache = RosterCache::new(
            self.cfg.max_employee_id,
            self.cfg.default_shift,
            &self.cfg.placeholder_prefix,
        );
        Ok(cache.with_entries(roster::load_roster(&self.pool.conn)?))
    }

    pub fn link(&self, offline: bool) -> MarkerFileLink {
        MarkerFileLink::new(self.cfg.offline_marker_path(), offline)
    }

    pub fn controller(
        &self,
        reader: Box<dyn BiometricReader>,
        clock: Box<dyn Clock>,
        offline: bool,
    ) -> AppResult<AttendanceController> {
        let gate = DailyGate::new(
            self.cfg.reconcile_time()?,
            state::last_reconciled(&self.pool.conn)?,
        );

        let devices = Devices {
            reader,
            clock,
            remote: Box::new(self.remote()?),
            link: Box::new(self.link(offline)),
            notifier: Box::new(ConsoleNotifier),
        };

        Ok(AttendanceController::new(
            ControllerSettings::from_config(&self.cfg),
            self.cfg.shift_table()?,
            self.roster_cache()?,
            self.open_buffer()?,
            gate,
            devices,
        ))
    }

    /// Store what the controller hands back on shutdown.
    pub fn persist(&mut self, snapshot: &ShutdownState) -> AppResult<()> {
        if !snapshot.roster.is_empty() {
            roster::save_roster(&mut self.pool.conn, &snapshot.roster)?;
        }
        if let Some(date) = snapshot.last_reconciled {
            state::set_last_reconciled(&self.pool.conn, date)?;
        }
        Ok(())
    }
}
