//! Crash recovery.
//!
//! A running interval is only trustworthy while its worker lives. Before
//! every externally triggered operation the engine checks the worker record;
//! a dead worker turns the interval `interrupted`, crediting work up to the
//! last heartbeat. When liveness cannot be determined the interval is left
//! alone.

use tracing::{debug, info, warn};

use crate::engine::Engine;
use crate::error::{PomodoroError, Result};
use crate::types::{Interval, IntervalStatus};
use crate::worker::WorkerStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// No running interval.
    Idle,
    /// The running interval still has a live (or possibly live) worker.
    WorkerAlive,
    Interrupted(Interval),
    /// Another actor changed the interval while recovery was deciding.
    Superseded,
}

impl Engine {
    /// Detects a running interval whose worker is gone and marks it
    /// interrupted. Safe to call repeatedly and from several processes.
    pub fn recover(&self) -> Result<RecoveryOutcome> {
        let running = match self.store().fetch_active()? {
            Some(active) if active.status == IntervalStatus::Running => active,
            _ => return Ok(RecoveryOutcome::Idle),
        };

        match self.supervisor().check(&running, self.now()) {
            WorkerStatus::Alive => return Ok(RecoveryOutcome::WorkerAlive),
            WorkerStatus::Unknown => {
                debug!(interval_id = running.id, "Worker liveness unknown; leaving interval running");
                return Ok(RecoveryOutcome::WorkerAlive);
            }
            WorkerStatus::Gone => {}
        }

        match self.mark_interrupted(&running) {
            Ok(interrupted) => {
                if let Err(err) = self.supervisor().discard(&running) {
                    warn!(error = %err, "Failed to remove stale worker record");
                }
                Ok(RecoveryOutcome::Interrupted(interrupted))
            }
            Err(PomodoroError::ConcurrentModification { interval_id }) => {
                info!(interval_id, "Recovery superseded by a concurrent change");
                Ok(RecoveryOutcome::Superseded)
            }
            Err(err) => Err(err),
        }
    }
}
