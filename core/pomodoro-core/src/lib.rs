//! # pomodoro-core
//!
//! Interval lifecycle, storage and crash recovery for the `pomodoro` CLI.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime. Each command is a short-lived process.
//! - **The database is the only shared state**: the command process and the
//!   background worker coordinate through SQLite alone. Every status change
//!   is a conditional write; losers of a race get `ConcurrentModification`.
//! - **Derived time**: worked time is computed from `worked_sec` and the open
//!   segment's start, never ticked into the database.
//! - **Recovery before action**: externally triggered operations first check
//!   that a running interval still has a live worker.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pomodoro_core::{load_config, Engine, Paths};
//!
//! let paths = Paths::resolve(None)?;
//! let config = load_config(&paths.config_path())?;
//! let engine = Engine::open(&paths, &config)?;
//! let interval = engine.create(25 * 60)?;
//! ```

pub mod accounting;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod notification;
pub mod recovery;
pub mod store;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;
pub mod timefmt;
pub mod types;
pub mod worker;

pub use clock::{Clock, SystemClock};
pub use config::{load_config, Config, Paths};
pub use engine::Engine;
pub use error::{PomodoroError, Result};
pub use notification::{CommandNotifier, Notifier, SilentNotifier};
pub use recovery::RecoveryOutcome;
pub use store::Store;
pub use timefmt::{format_datetime, format_mmss, parse_duration};
pub use types::*;
pub use worker::{run_worker, PollOutcome, PollerSettings, Supervisor, WorkerStatus};
