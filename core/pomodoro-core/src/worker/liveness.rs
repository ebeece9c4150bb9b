//! Worker liveness tracking.
//!
//! The supervisor records the worker it spawned in `worker.json`, next to
//! the database but outside it, so a crashed worker leaves the interval row
//! untouched and recovery can tell "still running" from "gone".
//!
//! # PID Verification
//!
//! Operating systems reuse PIDs. A record naming PID 4242 may outlive the
//! worker, and an unrelated process may now hold that PID. The record
//! therefore stores the process start time as well:
//!
//! 1. **Records with `proc_started`**: the live process must have the same
//!    start time (±2 seconds). A different start time means the PID was
//!    recycled and the worker is gone.
//!
//! 2. **Records without `proc_started`** (start time unavailable at spawn):
//!    the process name or command line must mention `pomodoro`.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};

use sysinfo::{Pid, ProcessRefreshKind, System, UpdateKind};
use tempfile::NamedTempFile;

use crate::error::{io, json, PomodoroError, Result};

const START_TIME_TOLERANCE_SECS: u64 = 2;
const PROCESS_MARKER: &str = "pomodoro";

// Per-thread sysinfo cache with per-PID refresh instead of a full scan.
thread_local! {
    static SYSTEM_CACHE: RefCell<Option<System>> = const { RefCell::new(None) };
}

/// Identity of a spawned worker process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerHandle {
    pub pid: u32,
    pub proc_started: Option<u64>,
}

/// The liveness-tracking record persisted by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRecord {
    pub pid: u32,
    #[serde(default)]
    pub proc_started: Option<u64>,
    pub interval_id: i64,
    pub spawned_at: i64,
}

impl WorkerRecord {
    pub fn new(handle: WorkerHandle, interval_id: i64, spawned_at: i64) -> Self {
        Self {
            pid: handle.pid,
            proc_started: handle.proc_started,
            interval_id,
            spawned_at,
        }
    }

    pub fn handle(&self) -> WorkerHandle {
        WorkerHandle {
            pid: self.pid,
            proc_started: self.proc_started,
        }
    }
}

/// Answers "is this tracked worker still executing?".
///
/// `Err` means the question could not be answered; recovery treats that as
/// alive.
pub trait LivenessOracle: Send + Sync {
    fn is_alive(&self, handle: &WorkerHandle) -> Result<bool>;
}

/// Liveness oracle backed by the operating system's process table.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLiveness;

impl LivenessOracle for ProcessLiveness {
    fn is_alive(&self, handle: &WorkerHandle) -> Result<bool> {
        if !pid_exists(handle.pid)? {
            return Ok(false);
        }

        match handle.proc_started {
            Some(expected) => Ok(get_process_start_time(handle.pid)
                .map(|actual| actual.abs_diff(expected) <= START_TIME_TOLERANCE_SECS)
                .unwrap_or(false)),
            None => Ok(process_mentions_marker(handle.pid)),
        }
    }
}

#[cfg(unix)]
fn pid_exists(pid: u32) -> Result<bool> {
    let Ok(raw_pid) = i32::try_from(pid) else {
        return Ok(false);
    };
    if raw_pid <= 0 {
        return Ok(false);
    }
    if unsafe { libc::kill(raw_pid, 0) } == 0 {
        return Ok(true);
    }
    let err = std::io::Error::last_os_error();
    match err.raw_os_error() {
        Some(code) if code == libc::ESRCH => Ok(false),
        // Exists, owned by someone else.
        Some(code) if code == libc::EPERM => Ok(true),
        _ => Err(PomodoroError::Io {
            context: format!("Failed to probe pid {}", pid),
            source: err,
        }),
    }
}

#[cfg(not(unix))]
fn pid_exists(pid: u32) -> Result<bool> {
    Ok(get_process_start_time(pid).is_some())
}

/// Start time of a process (unix seconds), or `None` if it does not exist.
pub fn get_process_start_time(pid: u32) -> Option<u64> {
    SYSTEM_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        let sys = cache.get_or_insert_with(System::new);

        let sysinfo_pid = Pid::from(pid as usize);
        sys.refresh_process_specifics(sysinfo_pid, ProcessRefreshKind::new());
        sys.process(sysinfo_pid).map(|process| process.start_time())
    })
}

fn process_mentions_marker(pid: u32) -> bool {
    SYSTEM_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        let sys = cache.get_or_insert_with(System::new);

        let sysinfo_pid = Pid::from(pid as usize);
        sys.refresh_process_specifics(
            sysinfo_pid,
            ProcessRefreshKind::new().with_cmd(UpdateKind::Always),
        );

        let Some(process) = sys.process(sysinfo_pid) else {
            return false;
        };
        if process.name().to_lowercase().contains(PROCESS_MARKER) {
            return true;
        }
        process
            .cmd()
            .iter()
            .any(|arg| arg.to_lowercase().contains(PROCESS_MARKER))
    })
}

/// File-backed home of the single [`WorkerRecord`].
///
/// Writes and conditional removals run under an exclusive `flock` on a
/// sibling `.lock` file. An exiting worker therefore never unlinks a record
/// its successor wrote between the exiting worker's read and its unlink.
#[derive(Debug, Clone)]
pub struct LivenessRegistry {
    path: PathBuf,
    lock_path: PathBuf,
}

impl LivenessRegistry {
    pub fn new(path: PathBuf) -> Self {
        let lock_path = path.with_extension("lock");
        Self { path, lock_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<Option<WorkerRecord>> {
        let content = match fs_err::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io("Failed to read worker record")(err)),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(json("Failed to parse worker record"))
    }

    /// Replaces the record atomically (temp file + rename).
    pub fn write(&self, record: &WorkerRecord) -> Result<()> {
        let parent = self.path.parent().ok_or_else(|| PomodoroError::Io {
            context: "Worker record path has no parent directory".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::InvalidInput),
        })?;
        fs_err::create_dir_all(parent).map_err(io("Failed to create data dir"))?;

        let content =
            serde_json::to_vec(record).map_err(json("Failed to serialize worker record"))?;
        let _lock = RecordLock::acquire(&self.lock_path)?;
        let mut temp_file =
            NamedTempFile::new_in(parent).map_err(io("Failed to create temp worker record"))?;
        temp_file
            .write_all(&content)
            .map_err(io("Failed to write temp worker record"))?;
        temp_file
            .flush()
            .map_err(io("Failed to flush temp worker record"))?;
        temp_file
            .persist(&self.path)
            .map_err(|err| io("Failed to commit worker record")(err.error))?;
        Ok(())
    }

    /// Removes the record if `stale` holds for its current content. The read
    /// and the unlink happen under the lock. Returns whether it was removed.
    pub fn remove_if(&self, stale: impl FnOnce(&WorkerRecord) -> bool) -> Result<bool> {
        if self.read()?.is_none() {
            return Ok(false);
        }

        let _lock = RecordLock::acquire(&self.lock_path)?;
        match self.read()? {
            Some(record) if stale(&record) => {
                match fs_err::remove_file(&self.path) {
                    Ok(()) => {}
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                    Err(err) => return Err(io("Failed to remove worker record")(err)),
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Removes the record only if it still names `pid`. A worker spawned
    /// later (after a pause/resume) owns the file by then.
    pub fn release(&self, pid: u32) -> Result<bool> {
        match self.remove_if(|record| record.pid == pid) {
            Ok(removed) => Ok(removed),
            Err(err) => {
                tracing::warn!(error = %err, "Failed to release worker record; leaving it for recovery");
                Ok(false)
            }
        }
    }
}

/// Exclusive advisory lock, released when dropped.
struct RecordLock {
    _file: fs_err::File,
}

impl RecordLock {
    fn acquire(path: &Path) -> Result<Self> {
        let file = fs_err::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(io("Failed to open worker record lock"))?;
        lock_exclusive(file.file()).map_err(io("Failed to lock worker record"))?;
        Ok(Self { _file: file })
    }
}

#[cfg(unix)]
fn lock_exclusive(file: &std::fs::File) -> std::io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let fd = file.as_raw_fd();
    loop {
        // SAFETY: `fd` is owned by `file`, which outlives the call.
        if unsafe { libc::flock(fd, libc::LOCK_EX) } == 0 {
            return Ok(());
        }
        let err = std::io::Error::last_os_error();
        if err.kind() != std::io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

#[cfg(not(unix))]
fn lock_exclusive(_file: &std::fs::File) -> std::io::Result<()> {
    Ok(())
}
