//! Background completion worker.
//!
//! One worker process watches one running segment. The command process
//! launches it after `create`/`resume` and records its identity; the worker
//! polls the store, heartbeats, and calls `auto_finish` once the duration has
//! elapsed. Recovery uses the recorded identity to decide whether a running
//! interval still has a live worker.
//!
//! # Module Structure
//!
//! - [`liveness`]: the `worker.json` record and PID identity checks
//! - [`poller`]: the loop executed inside the worker process

pub mod liveness;
pub mod poller;

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;

use crate::error::{PomodoroError, Result};
use crate::types::Interval;

pub use liveness::{
    get_process_start_time, LivenessOracle, LivenessRegistry, ProcessLiveness, WorkerHandle,
    WorkerRecord,
};
pub use poller::{run_worker, PollOutcome, Poller, PollerSettings};

/// A running interval without a worker record of its own is given this long
/// before recovery calls it dead. Covers the gap between the row insert and
/// the record write in the command that started it.
pub const SPAWN_GRACE_SECS: i64 = 5;

/// Heartbeats missed before an untracked interval counts as dead.
const MISSED_HEARTBEATS: i64 = 2;

/// Starts a worker process for an interval.
pub trait WorkerLauncher: Send + Sync {
    fn launch(&self, interval_id: i64) -> Result<WorkerHandle>;
}

/// Launches `<program> --data-dir <dir> worker --interval-id <id>` detached
/// from the caller's terminal session.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    program: PathBuf,
    data_dir: PathBuf,
}

impl ProcessLauncher {
    pub fn new(program: PathBuf, data_dir: PathBuf) -> Self {
        Self { program, data_dir }
    }

    /// Re-executes the running binary as the worker.
    pub fn current_exe(data_dir: PathBuf) -> Result<Self> {
        let program = std::env::current_exe().map_err(|source| PomodoroError::Io {
            context: "Failed to resolve current executable".to_string(),
            source,
        })?;
        Ok(Self::new(program, data_dir))
    }
}

impl WorkerLauncher for ProcessLauncher {
    fn launch(&self, interval_id: i64) -> Result<WorkerHandle> {
        let mut command = Command::new(&self.program);
        command
            .arg("--data-dir")
            .arg(&self.data_dir)
            .arg("worker")
            .arg("--interval-id")
            .arg(interval_id.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // New session: the worker must survive the terminal closing.
        #[cfg(unix)]
        unsafe {
            use std::os::unix::process::CommandExt;
            command.pre_exec(|| {
                if libc::setsid() == -1 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }

        let child = command.spawn().map_err(|err| PomodoroError::Spawn {
            details: format!("{}: {}", self.program.display(), err),
        })?;

        let pid = child.id();
        Ok(WorkerHandle {
            pid,
            proc_started: get_process_start_time(pid),
        })
    }
}

/// What the supervisor knows about the worker of a running interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    Alive,
    Gone,
    /// Liveness could not be determined. Treated as alive.
    Unknown,
}

/// Owns the worker record and the process-facing collaborators.
pub struct Supervisor {
    registry: LivenessRegistry,
    oracle: Arc<dyn LivenessOracle>,
    launcher: Arc<dyn WorkerLauncher>,
    heartbeat_grace_secs: i64,
}

impl Supervisor {
    pub fn new(
        registry: LivenessRegistry,
        oracle: Arc<dyn LivenessOracle>,
        launcher: Arc<dyn WorkerLauncher>,
    ) -> Self {
        Self {
            registry,
            oracle,
            launcher,
            heartbeat_grace_secs: MISSED_HEARTBEATS
                * PollerSettings::default().heartbeat_interval_sec,
        }
    }

    /// Matches the untracked-worker grace to the workers' heartbeat cadence.
    pub fn with_heartbeat_interval(mut self, heartbeat_interval_sec: i64) -> Self {
        self.heartbeat_grace_secs = MISSED_HEARTBEATS * heartbeat_interval_sec.max(1);
        self
    }

    pub fn registry(&self) -> &LivenessRegistry {
        &self.registry
    }

    /// Launches a worker for `interval` and records its identity.
    pub fn spawn(&self, interval: &Interval, now: i64) -> Result<WorkerHandle> {
        let handle = self.launcher.launch(interval.id)?;
        self.registry
            .write(&WorkerRecord::new(handle, interval.id, now))?;
        tracing::debug!(
            interval_id = interval.id,
            pid = handle.pid,
            proc_started = ?handle.proc_started,
            "Worker recorded"
        );
        Ok(handle)
    }

    /// Liveness of the worker tracking `interval`.
    pub fn check(&self, interval: &Interval, now: i64) -> WorkerStatus {
        let record = match self.registry.read() {
            Ok(Some(record)) if record.interval_id == interval.id => record,
            Ok(Some(record)) => {
                tracing::debug!(
                    interval_id = interval.id,
                    recorded_interval_id = record.interval_id,
                    "Worker record belongs to another interval"
                );
                return self.check_untracked(interval, now);
            }
            Ok(None) => return self.check_untracked(interval, now),
            Err(err) => {
                tracing::warn!(error = %err, "Failed to read worker record; assuming alive");
                return WorkerStatus::Unknown;
            }
        };

        match self.oracle.is_alive(&record.handle()) {
            Ok(true) => WorkerStatus::Alive,
            Ok(false) => WorkerStatus::Gone,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    pid = record.pid,
                    "Failed to determine worker liveness; assuming alive"
                );
                WorkerStatus::Unknown
            }
        }
    }

    /// No record names `interval`: its worker may not have recorded itself
    /// yet, or a stale record of an earlier interval is still in place. A
    /// segment that just started or heartbeated recently is not declared dead.
    fn check_untracked(&self, interval: &Interval, now: i64) -> WorkerStatus {
        let starting = interval
            .run_started_at
            .is_some_and(|run_started_at| now - run_started_at < SPAWN_GRACE_SECS);
        let heartbeating = interval
            .heartbeat_at
            .is_some_and(|heartbeat_at| now - heartbeat_at < self.heartbeat_grace_secs);
        if starting || heartbeating {
            WorkerStatus::Unknown
        } else {
            WorkerStatus::Gone
        }
    }

    /// Drops the record of `interval`'s worker once the worker is confirmed
    /// dead. A record a live worker wrote since, or one naming another
    /// interval, stays.
    pub fn discard(&self, interval: &Interval) -> Result<bool> {
        self.registry.remove_if(|record| {
            record.interval_id == interval.id
                && matches!(self.oracle.is_alive(&record.handle()), Ok(false))
        })
    }
}
