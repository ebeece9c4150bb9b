//! Test doubles for the engine's collaborators.
//!
//! Compiled for this crate's unit tests and, behind the `test-helpers`
//! feature, for integration tests and dependent crates' tests. Nothing here
//! touches real worker processes or the wall clock.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use crate::clock::Clock;
use crate::engine::Engine;
use crate::error::{PomodoroError, Result};
use crate::notification::Notifier;
use crate::store::Store;
use crate::types::{Confirmation, EventType, Interval};
use crate::worker::{LivenessOracle, LivenessRegistry, Supervisor, WorkerHandle, WorkerLauncher};

/// Settable clock. With a non-zero step every read advances time, which
/// lets a poll loop with no sleep reach its deadline.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
    step: AtomicI64,
}

impl ManualClock {
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
            step: AtomicI64::new(0),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    pub fn set_step(&self, step: i64) {
        self.step.store(step, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now
            .fetch_add(self.step.load(Ordering::SeqCst), Ordering::SeqCst)
    }
}

/// Liveness oracle with a scripted answer.
#[derive(Debug, Default)]
pub struct StubLiveness {
    alive: AtomicBool,
    failing: AtomicBool,
}

impl StubLiveness {
    pub fn alive() -> Self {
        Self {
            alive: AtomicBool::new(true),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_alive(&self, alive: bool) {
        self.failing.store(false, Ordering::SeqCst);
        self.alive.store(alive, Ordering::SeqCst);
    }

    /// Every check errors until `set_alive` is called again.
    pub fn fail_checks(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

impl LivenessOracle for StubLiveness {
    fn is_alive(&self, handle: &WorkerHandle) -> Result<bool> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PomodoroError::Io {
                context: format!("Failed to probe pid {}", handle.pid),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            });
        }
        Ok(self.alive.load(Ordering::SeqCst))
    }
}

/// Launcher that records requests and hands out fake PIDs.
#[derive(Debug)]
pub struct RecordingLauncher {
    launched: Mutex<Vec<i64>>,
    next_pid: AtomicU32,
    failing: AtomicBool,
}

impl Default for RecordingLauncher {
    fn default() -> Self {
        Self {
            launched: Mutex::new(Vec::new()),
            next_pid: AtomicU32::new(40_000),
            failing: AtomicBool::new(false),
        }
    }
}

impl RecordingLauncher {
    /// Interval ids a worker was launched for, in order.
    pub fn launched(&self) -> Vec<i64> {
        self.launched
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn fail_launches(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn allow_launches(&self) {
        self.failing.store(false, Ordering::SeqCst);
    }
}

impl WorkerLauncher for RecordingLauncher {
    fn launch(&self, interval_id: i64) -> Result<WorkerHandle> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PomodoroError::Spawn {
                details: "launches disabled".to_string(),
            });
        }
        self.launched
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(interval_id);
        Ok(WorkerHandle {
            pid: self.next_pid.fetch_add(1, Ordering::SeqCst),
            proc_started: Some(0),
        })
    }
}

/// Notifier that always gives the same answer and counts prompts.
#[derive(Debug)]
pub struct ScriptedNotifier {
    answer: Confirmation,
    prompts: AtomicUsize,
}

impl ScriptedNotifier {
    pub fn new(answer: Confirmation) -> Self {
        Self {
            answer,
            prompts: AtomicUsize::new(0),
        }
    }

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

impl Notifier for ScriptedNotifier {
    fn confirm(&self, _interval: &Interval) -> Confirmation {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        self.answer
    }
}

/// An engine over a temporary data directory with every collaborator
/// replaced by a double.
pub struct TestHarness {
    pub engine: Engine,
    pub clock: Arc<ManualClock>,
    pub liveness: Arc<StubLiveness>,
    pub launcher: Arc<RecordingLauncher>,
    temp_dir: TempDir,
}

impl TestHarness {
    /// Panics if the temporary directory or database cannot be created.
    pub fn new(now: i64) -> Self {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let clock = Arc::new(ManualClock::new(now));
        let liveness = Arc::new(StubLiveness::alive());
        let launcher = Arc::new(RecordingLauncher::default());
        let engine = build_engine(&temp_dir, &clock, &liveness, &launcher);
        Self {
            engine,
            clock,
            liveness,
            launcher,
            temp_dir,
        }
    }

    /// A second engine over the same files and doubles, standing in for
    /// another process.
    pub fn another_engine(&self) -> Engine {
        build_engine(&self.temp_dir, &self.clock, &self.liveness, &self.launcher)
    }

    pub fn data_dir(&self) -> &std::path::Path {
        self.temp_dir.path()
    }

    pub fn event_types(&self, interval_id: i64) -> Vec<EventType> {
        self.engine
            .events(interval_id)
            .expect("list events")
            .into_iter()
            .map(|event| event.event_type)
            .collect()
    }
}

fn build_engine(
    temp_dir: &TempDir,
    clock: &Arc<ManualClock>,
    liveness: &Arc<StubLiveness>,
    launcher: &Arc<RecordingLauncher>,
) -> Engine {
    let store = Store::open(temp_dir.path().join("pomodoro.db")).expect("open store");
    let supervisor = Supervisor::new(
        LivenessRegistry::new(temp_dir.path().join("worker.json")),
        liveness.clone(),
        launcher.clone(),
    );
    Engine::new(store, clock.clone(), supervisor)
}
