use clap::{Parser, Subcommand};

/// Command-line interface definition for rAttendance
/// Fingerprint attendance terminal with an offline buffer
#[derive(Parser)]
#[command(
    name = "rattendance",
    version = env!("CARGO_PKG_VERSION"),
    about = "An offline-resilient attendance terminal: classify scans against shift windows, buffer offline, sync and reconcile absences",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Override the offline buffer file
    #[arg(global = true, long = "buffer")]
    pub buffer: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the configuration, database and offline buffer
    Init,

    /// Manage the configuration file (view or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,

        #[arg(long = "check", help = "Check configuration file for missing fields")]
        check: bool,

        #[arg(long = "migrate", help = "Add missing fields to the configuration file")]
        migrate: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(
            long = "editor",
            help = "Specify the editor to use (vim, nano, or custom path)"
        )]
        editor: Option<String>,
    },

    /// Record one fingerprint scan
    Scan {
        /// Sensor slot id of the recognised finger
        id: u16,

        #[arg(long = "at", help = "Scan time as \"YYYY-MM-DD HH:MM\" (default: now)")]
        at: Option<String>,

        #[arg(long = "offline", help = "Treat the link as down")]
        offline: bool,
    },

    /// Run the terminal loop, reading sensor slot ids from stdin
    Run {
        #[arg(long = "iterations", help = "Stop after this many loop iterations")]
        iterations: Option<u64>,

        #[arg(long = "at", help = "Freeze the clock at \"YYYY-MM-DD HH:MM\"")]
        at: Option<String>,

        #[arg(long = "offline", help = "Treat the link as down")]
        offline: bool,
    },

    /// Deliver buffered events to the remote store
    Sync {
        #[arg(long = "offline", help = "Treat the link as down")]
        offline: bool,
    },

    /// Show the offline buffer
    Buffer {
        #[arg(long = "print", help = "List every buffered record")]
        print: bool,
    },

    /// Inspect or refresh the local roster
    Roster {
        #[arg(long = "refresh", help = "Fetch the roster from the remote store")]
        refresh: bool,

        #[arg(long = "list", help = "List the cached roster")]
        list: bool,
    },

    /// Run the absence sweep now
    Reconcile {
        #[arg(long = "date", help = "Day to reconcile (YYYY-MM-DD, default: today)")]
        date: Option<String>,

        #[arg(long = "offline", help = "Treat the link as down")]
        offline: bool,
    },

    /// Administer the SQLite remote store
    Remote {
        #[command(subcommand)]
        action: RemoteAction,
    },

    /// Print or manage the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },
}

#[derive(Subcommand)]
pub enum RemoteAction {
    /// Add or replace an employee on the remote roster
    Employee {
        id: u32,
        name: String,
        #[arg(long = "shift", default_value = "morning", help = "morning, afternoon or night")]
        shift: String,
    },

    /// Excuse an employee for one day
    Leave {
        /// Day of leave (YYYY-MM-DD)
        date: String,
        name: String,
    },

    /// Ask the terminal to enroll a finger into a sensor slot
    Enroll { id: u32, name: String },

    /// Dump remote nodes under a path
    Show {
        #[arg(default_value = "/")]
        path: String,
    },
}
