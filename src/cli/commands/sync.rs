use crate::cli::parser::Commands;
use crate::cli::terminal::{Terminal, clock_at};
use crate::config::Config;
use crate::core::controller::SyncOutcome;
use crate::db::log::ttlog_soft;
use crate::device::sim::ScriptedReader;
use crate::errors::AppResult;
use crate::ui::messages::{info, success, warning};

/// Handle the `sync` command: drain the offline buffer once.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Sync { offline } = cmd {
        let mut terminal = Terminal::open(cfg)?;
        let mut ctrl =
            terminal.controller(Box::new(ScriptedReader::new()), clock_at(None)?, *offline)?;

        let message = match ctrl.sync_all()? {
            SyncOutcome::Drained(report) if report.total == 0 && report.corrupt.is_empty() => {
                info("Nothing to sync: the buffer is empty.");
                "buffer empty".to_string()
            }
            SyncOutcome::Drained(report) => {
                success(format!(
                    "{} buffered record(s) delivered, buffer cleared.",
                    report.delivered
                ));
                for line in &report.corrupt {
                    warning(format!("Discarded unreadable record: {:?}", line));
                }
                format!(
                    "{} delivered, {} corrupt",
                    report.delivered,
                    report.corrupt.len()
                )
            }
            SyncOutcome::Partial { delivered, total } => {
                warning(format!(
                    "Only {} of {} records delivered; the buffer is kept for retry.",
                    delivered, total
                ));
                format!("partial {}/{}", delivered, total)
            }
            SyncOutcome::Unreachable(reason) => {
                warning(format!("Remote store unreachable ({}); nothing sent.", reason));
                format!("unreachable: {}", reason)
            }
        };

        let snapshot = ctrl.shutdown()?;
        terminal.persist(&snapshot)?;
        ttlog_soft(&terminal.pool.conn, "sync", "", &message);
    }

    Ok(())
}
