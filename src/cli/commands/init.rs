use crate::cli::parser::Cli;
use crate::cli::terminal::Terminal;
use crate::config::Config;
use crate::db::log;
use crate::errors::AppResult;

/// Handle the `init` command
///
/// This initializes:
///  - the config directory and file (skipped in test mode)
///  - the SQLite database with all pending migrations
///  - the offline buffer file, pre-sized to its capacity
pub fn handle(cli: &Cli) -> AppResult<()> {
    let cfg = Config::init_all(cli.db.clone(), cli.buffer.clone(), cli.test)?;

    println!("⚙️  Initializing rAttendance…");
    println!("📄 Config file : {}", Config::config_file().display());
    println!("🗄️  Database   : {}", cfg.database_path().display());
    println!("💾 Buffer     : {}", cfg.buffer_path().display());

    let terminal = Terminal::open(&cfg)?;
    let buffer = terminal.open_buffer()?;

    println!(
        "✅ Offline buffer ready ({} / {} bytes used)",
        buffer.cursor(),
        buffer.capacity()
    );

    log::ttlog_soft(
        &terminal.pool.conn,
        "init",
        "Terminal initialized",
        &format!(
            "Database {} / buffer {}",
            cfg.database_path().display(),
            cfg.buffer_path().display()
        ),
    );

    println!("🎉 rAttendance initialization completed!");
    Ok(())
}
