use crate::cli::commands::scan::describe;
use crate::cli::parser::Commands;
use crate::cli::terminal::{Terminal, clock_at};
use crate::config::Config;
use crate::core::controller::{SyncOutcome, TickReport};
use crate::core::enroll::EnrollOutcome;
use crate::db::log::ttlog_soft;
use crate::device::sim::ChannelReader;
use crate::errors::{AppResult, DeviceError};
use crate::ui::messages::{info, success, warning};
use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;

fn print_tick(report: &TickReport) {
    if let Some(scan) = &report.scan {
        info(describe(scan));
    }
    if let Some(n) = report.roster_refreshed {
        info(format!("Roster refreshed ({} employees)", n));
    }
    match &report.sync {
        Some(SyncOutcome::Drained(r)) if r.total > 0 => {
            success(format!("Buffer drained: {} / {} delivered", r.delivered, r.total))
        }
        Some(SyncOutcome::Partial { delivered, total }) => warning(format!(
            "Partial sync: {} / {} delivered, buffer kept",
            delivered, total
        )),
        Some(SyncOutcome::Unreachable(reason)) => warning(format!("Sync skipped: {}", reason)),
        _ => {}
    }
    match &report.enrollment {
        Some(EnrollOutcome::Enrolled(req)) => {
            success(format!("Slot {} enrolled for {}", req.id, req.name))
        }
        Some(EnrollOutcome::Failed(req, reason)) => {
            warning(format!("Enrollment of slot {} failed: {}", req.id, reason))
        }
        None => {}
    }
    if let Some(r) = &report.reconcile {
        info(format!(
            "Reconciled {}: {} absent ({} delivered, {} buffered, {} dropped)",
            r.date,
            r.absent.len(),
            r.delivered,
            r.buffered,
            r.dropped
        ));
    }
}

/// Handle the `run` command: the terminal loop, with stdin as the sensor.
/// Each input line is a slot id (`x` for an unrecognised finger). The loop
/// ends when stdin closes or after `--iterations` passes.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Run {
        iterations,
        at,
        offline,
    } = cmd
    {
        let mut terminal = Terminal::open(cfg)?;
        let clock = clock_at(at.as_deref())?;

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        let mut ctrl = terminal.controller(Box::new(ChannelReader::new(rx)), clock, *offline)?;
        info("Terminal running, waiting for scans…");

        let mut passes: u64 = 0;
        loop {
            let report = ctrl.tick()?;
            print_tick(&report);
            passes += 1;

            if let Some(e) = &report.sensor_error {
                if matches!(e, DeviceError::Unavailable(_)) {
                    info("Sensor input closed, stopping");
                    break;
                }
                warning(e);
            }
            if iterations.is_some_and(|max| passes >= max) {
                break;
            }

            thread::sleep(terminal.cfg.poll_interval());
        }

        let snapshot = ctrl.shutdown()?;
        terminal.persist(&snapshot)?;

        ttlog_soft(
            &terminal.pool.conn,
            "run",
            "",
            &format!(
                "{} loop passes, {} bytes left in the buffer",
                passes, snapshot.buffered_bytes
            ),
        );
    }

    Ok(())
}
