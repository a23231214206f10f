use crate::cli::parser::Commands;
use crate::cli::terminal::{Terminal, clock_at};
use crate::config::Config;
use crate::core::controller::{Route, ScanResult};
use crate::db::log::ttlog_soft;
use crate::device::sim::ScriptedReader;
use crate::errors::AppResult;
use crate::ui::messages::{info, warning};
use crate::utils::time::format_minutes;

/// One line describing what happened to a scan.
pub fn describe(result: &ScanResult) -> String {
    match result {
        ScanResult::Recorded(ev, route) => {
            let where_to = match route {
                Route::Delivered => "delivered",
                Route::Buffered => "buffered offline",
                Route::Dropped => "DROPPED (buffer full)",
            };
            format!(
                "{} {} at {} on {} ({})",
                ev.employee_name(),
                ev.verdict(),
                ev.time_str(),
                ev.date(),
                where_to
            )
        }
        ScanResult::Rejected {
            employee_id,
            minutes_of_day,
        } => format!(
            "slot {} rejected: {} is outside the shift windows",
            employee_id,
            format_minutes(*minutes_of_day)
        ),
        ScanResult::InvalidId(id) => format!("slot {} is outside the configured id range", id),
        ScanResult::Unrecognised => "fingerprint not recognised".to_string(),
    }
}

/// Handle the `scan` command: feed one recognised slot id through the
/// controller, as if it came from the sensor.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Scan { id, at, offline } = cmd {
        let mut terminal = Terminal::open(cfg)?;
        let clock = clock_at(at.as_deref())?;

        let reader = ScriptedReader::new();
        reader.push_match(*id);

        let mut ctrl = terminal.controller(Box::new(reader), clock, *offline)?;

        if ctrl.is_online() && ctrl.refresh_roster().is_none() {
            warning("Roster refresh failed, using the cached roster");
        }

        let now = ctrl.now();
        let result = ctrl.handle_scan(*id, now)?;
        let line = describe(&result);
        info(&line);

        let snapshot = ctrl.shutdown()?;
        terminal.persist(&snapshot)?;

        ttlog_soft(&terminal.pool.conn, "scan", &id.to_string(), &line);
    }

    Ok(())
}
