use crate::cli::parser::{Commands, RemoteAction};
use crate::cli::terminal::Terminal;
use crate::config::Config;
use crate::core::controller::leave_path;
use crate::core::enroll::submit_request;
use crate::core::roster::EMPLOYEES_PATH;
use crate::db::log::ttlog_soft;
use crate::device::RemoteStore;
use crate::errors::{AppError, AppResult};
use crate::models::enrollment::EnrollmentRequest;
use crate::models::leave::RemoteLeaveRecord;
use crate::models::roster::{RemoteEmployeeRecord, checked_name};
use crate::models::shift::ShiftKind;
use crate::ui::messages::{info, success, warning};
use crate::utils::date::parse_date;

/// Handle the `remote` command: back-office edits on the SQLite remote store.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Remote { action } = cmd else {
        return Ok(());
    };

    let terminal = Terminal::open(cfg)?;
    let mut remote = terminal.remote()?;
    let timeout = terminal.cfg.remote_timeout();

    match action {
        RemoteAction::Employee { id, name, shift } => {
            let kind =
                ShiftKind::from_name(shift).ok_or_else(|| AppError::InvalidShift(shift.clone()))?;
            if *id == 0 || *id > u32::from(terminal.cfg.max_employee_id) {
                warning(format!(
                    "Id {} is outside 1..={}; the terminal will ignore it.",
                    id, terminal.cfg.max_employee_id
                ));
            }

            let record = RemoteEmployeeRecord {
                id: *id,
                name: checked_name(name)?,
                shift: Some(kind.to_string()),
            };
            remote.write(
                &format!("{}/{}", EMPLOYEES_PATH, id),
                &serde_json::to_value(&record)?,
                timeout,
            )?;

            success(format!("Employee {} ({}) on the {} shift.", id, record.name, kind));
            ttlog_soft(&terminal.pool.conn, "remote", "employee", &format!("{} {}", id, record.name));
        }

        RemoteAction::Leave { date, name } => {
            let day = parse_date(date).ok_or_else(|| AppError::InvalidDate(date.clone()))?;
            let name = checked_name(name)?;
            let record = RemoteLeaveRecord { name: name.clone() };

            remote.write(
                &format!("{}/{}", leave_path(day), name.replace('/', "_")),
                &serde_json::to_value(&record)?,
                timeout,
            )?;

            success(format!("{} excused on {}.", name, day));
            ttlog_soft(&terminal.pool.conn, "remote", "leave", &format!("{} {}", day, name));
        }

        RemoteAction::Enroll { id, name } => {
            let request = EnrollmentRequest::pending(*id, &checked_name(name)?);
            submit_request(&mut remote, &request, timeout)?;

            success(format!(
                "Enrollment of slot {} for {} requested; it runs on the next `run` pass.",
                id, request.name
            ));
            ttlog_soft(&terminal.pool.conn, "remote", "enroll", &format!("{} {}", id, request.name));
        }

        RemoteAction::Show { path } => {
            let nodes = remote.dump(path)?;
            if nodes.is_empty() {
                info(format!("Nothing stored under {}", path));
            }
            for (node, value) in nodes {
                println!("{}  {}", node, value);
            }
        }
    }

    Ok(())
}
