use crate::cli::parser::Commands;
use crate::cli::terminal::{Terminal, clock_at};
use crate::config::Config;
use crate::db::log::ttlog_soft;
use crate::device::sim::ScriptedReader;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success, warning};
use crate::utils::date::{parse_date, today};

/// Handle the `reconcile` command: run the absence sweep for one day now,
/// regardless of the configured trigger time.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Reconcile { date, offline } = cmd {
        let day = match date {
            Some(s) => parse_date(s).ok_or_else(|| AppError::InvalidDate(s.clone()))?,
            None => today(),
        };

        let mut terminal = Terminal::open(cfg)?;
        let mut ctrl =
            terminal.controller(Box::new(ScriptedReader::new()), clock_at(None)?, *offline)?;

        if ctrl.gate().ran_on(day) {
            info(format!("{} was already reconciled; running again.", day));
        }
        if ctrl.is_online() {
            ctrl.refresh_roster();
        }

        let report = ctrl.reconcile(day)?;

        if report.absent.is_empty() {
            success(format!("{}: nobody absent.", day));
        } else {
            for ev in &report.absent {
                println!("  ABSENT  {}", ev.employee_name());
            }
            success(format!(
                "{}: {} absent ({} delivered, {} buffered)",
                day,
                report.absent.len(),
                report.delivered,
                report.buffered
            ));
        }
        if report.dropped > 0 {
            warning(format!(
                "{} absence record(s) lost: buffer full",
                report.dropped
            ));
        }

        let snapshot = ctrl.shutdown()?;
        terminal.persist(&snapshot)?;
        ttlog_soft(
            &terminal.pool.conn,
            "reconcile",
            &day.to_string(),
            &format!("{} absent", report.absent.len()),
        );
    }

    Ok(())
}
