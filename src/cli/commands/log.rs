use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::log::load_log;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use ansi_term::Colour;

const OP_WIDTH: usize = 40;

/// Colour of an operation in the printed log
fn color_for_operation(op: &str) -> Colour {
    match op {
        "scan" => Colour::Green,
        "sync" => Colour::Cyan,
        "reconcile" => Colour::Yellow,
        "roster" | "remote" => Colour::Blue,
        "migration_applied" => Colour::Purple,
        "init" => Colour::RGB(255, 153, 51),
        _ => Colour::White,
    }
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if matches!(cmd, Commands::Log { print: true }) {
        let pool = DbPool::new(&cfg.database_path())?;
        let entries = load_log(&pool.conn)?;

        if entries.is_empty() {
            println!("📜 Internal log is empty.");
            return Ok(());
        }

        let id_w = entries
            .iter()
            .map(|e| e.id.to_string().len())
            .max()
            .unwrap_or(1);

        println!("📜 Internal log:\n");

        for e in entries {
            let date = chrono::DateTime::parse_from_rfc3339(&e.date)
                .map(|dt| dt.format("%FT%T%:z").to_string())
                .unwrap_or(e.date);

            let mut op_target = if e.target.is_empty() {
                e.operation.clone()
            } else {
                format!("{} ({})", e.operation, e.target)
            };
            if op_target.chars().count() > OP_WIDTH {
                op_target = op_target.chars().take(OP_WIDTH - 3).collect::<String>() + "...";
            }

            // pad on the visible text, then colour only the operation word
            let padding = " ".repeat(OP_WIDTH.saturating_sub(op_target.chars().count()));
            let coloured = match op_target.split_once(' ') {
                Some((op, rest)) => format!("{} {}", color_for_operation(&e.operation).paint(op), rest),
                None => color_for_operation(&e.operation)
                    .paint(op_target.as_str())
                    .to_string(),
            };

            println!(
                "{:>id_w$}: {} | {}{} => {}",
                e.id,
                date,
                coloured,
                padding,
                e.message,
                id_w = id_w
            );
        }
    }

    Ok(())
}
