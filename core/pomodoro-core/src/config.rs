//! Data directory layout and `config.toml` loading.
//!
//! Everything lives under one directory (default `~/.pomodoro`):
//!
//! ```text
//! ~/.pomodoro/
//! ├── pomodoro.db      # intervals + events
//! ├── worker.json      # identity of the running worker
//! ├── pomodoro.log     # tracing output
//! └── config.toml      # optional settings
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{PomodoroError, Result};
use crate::notification::{CommandNotifier, Notifier, SilentNotifier};
use crate::store::DEFAULT_BUSY_TIMEOUT_MS;
use crate::worker::PollerSettings;

pub const DATA_DIR_ENV: &str = "POMODORO_DATA_DIR";
const DEFAULT_DATA_DIR_NAME: &str = ".pomodoro";

/// Settings read from `config.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Duration used by `start` without an argument, in duration syntax.
    pub default_duration: String,
    pub poll_interval_ms: u64,
    pub heartbeat_interval_sec: i64,
    pub busy_timeout_ms: u32,
    /// Completion prompt command (argv). Absent means no prompt.
    pub notify_command: Option<Vec<String>>,
    pub notify_timeout_sec: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_duration: "25".to_string(),
            poll_interval_ms: 1000,
            heartbeat_interval_sec: 10,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            notify_command: None,
            notify_timeout_sec: 300,
        }
    }
}

impl Config {
    pub fn poller_settings(&self) -> PollerSettings {
        PollerSettings {
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            heartbeat_interval_sec: self.heartbeat_interval_sec.max(1),
        }
    }

    pub fn notifier(&self) -> Box<dyn Notifier> {
        match &self.notify_command {
            Some(argv) if !argv.is_empty() => Box::new(
                CommandNotifier::new(argv.clone())
                    .with_timeout(Duration::from_secs(self.notify_timeout_sec)),
            ),
            _ => Box::new(SilentNotifier),
        }
    }
}

/// Loads `config.toml`, returning defaults when the file does not exist.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs_err::read_to_string(path).map_err(|source| PomodoroError::Io {
        context: format!("Failed to read config {}", path.display()),
        source,
    })?;
    toml::from_str::<Config>(&content).map_err(|err| PomodoroError::ConfigMalformed {
        path: path.to_path_buf(),
        details: err.to_string(),
    })
}

/// Files under the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    data_dir: PathBuf,
}

impl Paths {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// `explicit`, else `$POMODORO_DATA_DIR`, else `~/.pomodoro`.
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self> {
        if let Some(dir) = explicit {
            return Ok(Self::new(dir));
        }
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|value| !value.is_empty()) {
            return Ok(Self::new(PathBuf::from(dir)));
        }
        let home = dirs::home_dir().ok_or(PomodoroError::HomeDirNotFound)?;
        Ok(Self::new(home.join(DEFAULT_DATA_DIR_NAME)))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("pomodoro.db")
    }

    pub fn worker_record_path(&self) -> PathBuf {
        self.data_dir.join("worker.json")
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("pomodoro.log")
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.toml")
    }
}
