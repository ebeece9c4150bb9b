//! The worker's poll loop.
//!
//! Runs inside the detached worker process. Each tick reads the interval,
//! heartbeats on the running segment, and finishes the interval once the
//! requested duration has elapsed. The loop exits as soon as the row is no
//! longer the running segment it was launched for.

use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::engine::Engine;
use crate::error::{PomodoroError, Result};
use crate::notification::Notifier;
use crate::types::{Confirmation, Interval, IntervalStatus};

use super::LivenessRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerSettings {
    pub poll_interval: Duration,
    pub heartbeat_interval_sec: i64,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            heartbeat_interval_sec: 10,
        }
    }
}

/// Why the poll loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The interval left `running` (paused, cancelled, interrupted) or no
    /// longer exists.
    Stopped { status: Option<IntervalStatus> },
    /// The interval was paused and resumed; a newer worker owns it.
    Superseded,
    /// This worker finished the interval.
    Finished { confirmation: Confirmation },
    /// Another actor changed the interval between the poll and the finish.
    RaceLost,
}

pub struct Poller<'a> {
    engine: &'a Engine,
    notifier: &'a dyn Notifier,
    settings: PollerSettings,
}

impl<'a> Poller<'a> {
    pub fn new(engine: &'a Engine, notifier: &'a dyn Notifier, settings: PollerSettings) -> Self {
        Self {
            engine,
            notifier,
            settings,
        }
    }

    pub fn run(&self, interval_id: i64) -> Result<PollOutcome> {
        let mut segment: Option<i64> = None;
        let mut last_heartbeat: Option<i64> = None;

        loop {
            let Some(interval) = self.engine.store().fetch_interval(interval_id)? else {
                warn!(interval_id, "Interval disappeared; worker exiting");
                return Ok(PollOutcome::Stopped { status: None });
            };

            let run_started_at = match (interval.status, interval.run_started_at) {
                (IntervalStatus::Running, Some(run_started_at)) => run_started_at,
                (status, _) => {
                    info!(interval_id, status = %status, "Interval no longer running; worker exiting");
                    return Ok(PollOutcome::Stopped {
                        status: Some(status),
                    });
                }
            };

            match segment {
                None => segment = Some(run_started_at),
                Some(own) if own != run_started_at => {
                    info!(interval_id, "Interval resumed by a newer worker; exiting");
                    return Ok(PollOutcome::Superseded);
                }
                Some(_) => {}
            }

            let now = self.engine.now();
            let heartbeat_due = last_heartbeat
                .map_or(true, |at| now - at >= self.settings.heartbeat_interval_sec);
            if heartbeat_due {
                if !self
                    .engine
                    .store()
                    .record_heartbeat(interval_id, run_started_at, now)?
                {
                    debug!(interval_id, "Heartbeat missed the segment; re-reading");
                    continue;
                }
                last_heartbeat = Some(now);
            }

            if interval.is_due(now) {
                return self.finish(&interval);
            }

            thread::sleep(self.settings.poll_interval);
        }
    }

    fn finish(&self, observed: &Interval) -> Result<PollOutcome> {
        let finished = match self.engine.auto_finish(observed) {
            Ok(finished) => finished,
            Err(PomodoroError::ConcurrentModification { interval_id }) => {
                info!(interval_id, "Finish lost a race; worker exiting");
                return Ok(PollOutcome::RaceLost);
            }
            Err(err) => return Err(err),
        };

        let confirmation = self.notifier.confirm(&finished);
        match confirmation {
            Confirmation::Resolved(resolution) => {
                match self.engine.resolve_target(Some(finished.id), resolution) {
                    Ok(_) => {}
                    // Resolved by hand while the prompt was open.
                    Err(err) if err.is_domain() => {
                        info!(interval_id = finished.id, error = %err, "Prompt answer ignored")
                    }
                    Err(err) => return Err(err),
                }
            }
            Confirmation::TimedOut => {
                info!(interval_id = finished.id, "No answer; interval left finished")
            }
        }

        Ok(PollOutcome::Finished { confirmation })
    }
}

/// Releases the worker record when the worker exits, including by panic.
/// A killed worker leaves the record behind; recovery sees a dead PID.
struct RecordRelease<'a> {
    registry: &'a LivenessRegistry,
    pid: u32,
}

impl Drop for RecordRelease<'_> {
    fn drop(&mut self) {
        match self.registry.release(self.pid) {
            Ok(true) => debug!(pid = self.pid, "Worker record released"),
            Ok(false) => {}
            Err(err) => warn!(pid = self.pid, error = %err, "Failed to release worker record"),
        }
    }
}

/// Worker process entry point.
pub fn run_worker(
    engine: &Engine,
    notifier: &dyn Notifier,
    settings: PollerSettings,
    interval_id: i64,
) -> Result<PollOutcome> {
    let _release = RecordRelease {
        registry: engine.supervisor().registry(),
        pid: std::process::id(),
    };

    info!(interval_id, pid = std::process::id(), "Worker started");
    let outcome = Poller::new(engine, notifier, settings).run(interval_id);
    match &outcome {
        Ok(outcome) => info!(interval_id, ?outcome, "Worker finished"),
        Err(err) => tracing::error!(interval_id, error = %err, "Worker failed"),
    }
    outcome
}
