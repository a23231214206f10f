use crate::cli::parser::Commands;
use crate::cli::terminal::Terminal;
use crate::config::Config;
use crate::db::log::ttlog_soft;
use crate::db::roster::save_roster;
use crate::device::Connectivity;
use crate::errors::AppResult;
use crate::ui::messages::{info, success, warning};

/// Handle the `roster` command
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Roster { refresh, list } = cmd {
        let mut terminal = Terminal::open(cfg)?;
        let mut cache = terminal.roster_cache()?;

        if *refresh {
            if !terminal.link(false).is_online() {
                warning("Link is down, keeping the cached roster.");
            } else {
                let mut remote = terminal.remote()?;
                let n = cache.refresh(&mut remote, terminal.cfg.remote_timeout())?;
                save_roster(&mut terminal.pool.conn, &cache.snapshot())?;
                success(format!("Roster refreshed: {} employee(s).", n));
                ttlog_soft(
                    &terminal.pool.conn,
                    "roster",
                    "",
                    &format!("Roster refreshed with {} employees", n),
                );
            }
        }

        if *list || !*refresh {
            if cache.is_empty() {
                info("The cached roster is empty.");
            }
            for e in cache.entries() {
                println!(
                    "{:>4}  {:<24} {}",
                    e.employee_id,
                    e.name,
                    e.assigned_shift
                );
            }
        }
    }

    Ok(())
}
