use crate::errors::{AppError, AppResult};
use crate::models::shift::{ShiftKind, ShiftTable};
use crate::utils::path::expand_tilde;
use crate::utils::time::parse_time;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

pub mod migrate; // use submodule at src/config/migrate.rs

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    pub check_in: String,
    pub check_out: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftsConfig {
    #[serde(default = "default_morning")]
    pub morning: WindowConfig,
    #[serde(default = "default_afternoon")]
    pub afternoon: WindowConfig,
    #[serde(default = "default_night")]
    pub night: WindowConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_buffer_file")]
    pub buffer_file: String,
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
    #[serde(default = "default_reconcile_at")]
    pub reconcile_at: String,
    #[serde(default = "default_shifts")]
    pub shifts: ShiftsConfig,
    #[serde(default)]
    pub default_shift: ShiftKind,
    #[serde(default = "default_max_employee_id")]
    pub max_employee_id: u16,
    #[serde(default = "default_placeholder_prefix")]
    pub placeholder_prefix: String,
    #[serde(default = "default_sensor_timeout")]
    pub sensor_timeout_ms: u64,
    #[serde(default = "default_remote_timeout")]
    pub remote_timeout_ms: u64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_offline_marker")]
    pub offline_marker: String,
}

fn default_database() -> String {
    Config::database_file().to_string_lossy().to_string()
}
fn default_buffer_file() -> String {
    Config::config_dir()
        .join("offline.buf")
        .to_string_lossy()
        .to_string()
}
fn default_buffer_capacity() -> usize {
    4096
}
fn default_reconcile_at() -> String {
    "17:00".to_string()
}
fn default_morning() -> WindowConfig {
    WindowConfig {
        check_in: "07:00-08:00".into(),
        check_out: "15:00-16:00".into(),
    }
}
fn default_afternoon() -> WindowConfig {
    WindowConfig {
        check_in: "11:00-12:00".into(),
        check_out: "19:00-20:00".into(),
    }
}
fn default_night() -> WindowConfig {
    WindowConfig {
        check_in: "15:30-16:30".into(),
        check_out: "20:00-00:40".into(),
    }
}
fn default_shifts() -> ShiftsConfig {
    ShiftsConfig {
        morning: default_morning(),
        afternoon: default_afternoon(),
        night: default_night(),
    }
}
fn default_max_employee_id() -> u16 {
    127
}
fn default_placeholder_prefix() -> String {
    "Employee".to_string()
}
fn default_sensor_timeout() -> u64 {
    2000
}
fn default_remote_timeout() -> u64 {
    5000
}
fn default_poll_interval() -> u64 {
    1000
}
fn default_offline_marker() -> String {
    Config::config_dir()
        .join("offline")
        .to_string_lossy()
        .to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            buffer_file: default_buffer_file(),
            buffer_capacity: default_buffer_capacity(),
            reconcile_at: default_reconcile_at(),
            shifts: default_shifts(),
            default_shift: ShiftKind::default(),
            max_employee_id: default_max_employee_id(),
            placeholder_prefix: default_placeholder_prefix(),
            sensor_timeout_ms: default_sensor_timeout(),
            remote_timeout_ms: default_remote_timeout(),
            poll_interval_ms: default_poll_interval(),
            offline_marker: default_offline_marker(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("rattendance")
        } else {
            let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".rattendance")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("rattendance.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("rattendance.sqlite")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        let path = Self::config_file();

        if path.exists() {
            let content = fs::read_to_string(&path).map_err(|_| AppError::ConfigLoad)?;
            let cfg: Config = serde_yaml::from_str(&content)?;
            Ok(cfg)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> AppResult<()> {
        let yaml = serde_yaml::to_string(self)?;
        fs::create_dir_all(Self::config_dir()).map_err(|_| AppError::ConfigSave)?;
        let mut file = fs::File::create(Self::config_file()).map_err(|_| AppError::ConfigSave)?;
        file.write_all(yaml.as_bytes())
            .map_err(|_| AppError::ConfigSave)?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        expand_tilde(&self.database)
    }

    pub fn buffer_path(&self) -> PathBuf {
        expand_tilde(&self.buffer_file)
    }

    pub fn offline_marker_path(&self) -> PathBuf {
        expand_tilde(&self.offline_marker)
    }

    pub fn shift_table(&self) -> AppResult<ShiftTable> {
        ShiftTable::from_config(&self.shifts)
    }

    pub fn reconcile_time(&self) -> AppResult<NaiveTime> {
        parse_time(&self.reconcile_at).ok_or_else(|| {
            AppError::Config(format!("invalid reconcile_at '{}'", self.reconcile_at))
        })
    }

    pub fn sensor_timeout(&self) -> Duration {
        Duration::from_millis(self.sensor_timeout_ms)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Validate the values that are only strings in the file.
    pub fn validate(&self) -> AppResult<()> {
        self.shift_table()?;
        self.reconcile_time()?;
        if self.buffer_capacity < 64 {
            return Err(AppError::Config(format!(
                "buffer_capacity {} is too small (minimum 64 bytes)",
                self.buffer_capacity
            )));
        }
        if self.max_employee_id == 0 {
            return Err(AppError::Config("max_employee_id must be at least 1".into()));
        }
        Ok(())
    }

    /// Initialize the configuration file and return the effective config.
    /// In test mode nothing is written to the user's config directory.
    pub fn init_all(
        db_override: Option<String>,
        buffer_override: Option<String>,
        is_test: bool,
    ) -> AppResult<Self> {
        let dir = Self::config_dir();

        let mut config = Config::default();
        if let Some(db) = db_override {
            config.database = db;
        }
        if let Some(buf) = buffer_override {
            config.buffer_file = buf;
        }

        if !is_test {
            fs::create_dir_all(&dir)?;
            config.save()?;
            println!("✅ Config file: {:?}", Self::config_file());
        }

        Ok(config)
    }
}
