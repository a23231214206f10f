use crate::cli::parser::Commands;
use crate::cli::terminal::Terminal;
use crate::config::Config;
use crate::errors::AppResult;
use crate::ui::messages::{info, warning};

/// Handle the `buffer` command
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Buffer { print } = cmd {
        let terminal = Terminal::open(cfg)?;
        let buffer = terminal.open_buffer()?;
        let records = buffer.records();

        info(format!(
            "Offline buffer {}: {} record(s), {} / {} bytes used",
            terminal.cfg.buffer_path().display(),
            records.len(),
            buffer.cursor(),
            buffer.capacity()
        ));

        if *print {
            for (i, r) in records.iter().enumerate() {
                match r {
                    Ok(ev) => println!(
                        "{:>4}: {:<24} {:<9} {} {}",
                        i + 1,
                        ev.employee_name(),
                        ev.verdict().as_record_str(),
                        ev.time_str(),
                        ev.date()
                    ),
                    Err(e) => warning(format!("{:>4}: {}", i + 1, e)),
                }
            }
        }
    }

    Ok(())
}
