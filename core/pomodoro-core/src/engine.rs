//! Interval lifecycle engine.
//!
//! Every state change is a conditional write against the status (and running
//! segment) the engine just observed. When another actor got there first the
//! write affects no row and the operation reports `ConcurrentModification`
//! instead of overwriting. Externally triggered operations run crash recovery
//! before looking at the active interval.
//!
//! ```text
//!              pause                      resume
//!   running ──────────▶ paused ─────────────────────▶ running
//!     │  ▲                 │
//!     │  └─── resume ── interrupted ◀── (worker died) ── running
//!     │                    │
//!     ├─ auto_finish ─▶ finished ── resolve ─▶ completed | abandoned
//!     └─ cancel (also from paused/interrupted) ─▶ cancelled
//! ```

use std::sync::Arc;

use tracing::{info, warn};

use crate::accounting;
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, Paths};
use crate::error::{snapshot, PomodoroError, Result};
use crate::store::{Store, Transition};
use crate::timefmt::start_of_day;
use crate::types::{DailyCount, EventType, Interval, IntervalEvent, IntervalStatus, Resolution};
use crate::worker::{LivenessRegistry, ProcessLauncher, ProcessLiveness, Supervisor};

pub struct Engine {
    store: Store,
    clock: Arc<dyn Clock>,
    supervisor: Supervisor,
}

impl Engine {
    pub fn new(store: Store, clock: Arc<dyn Clock>, supervisor: Supervisor) -> Self {
        Self {
            store,
            clock,
            supervisor,
        }
    }

    /// Production wiring: database and worker record under the data dir,
    /// wall clock, OS process table, and this binary as the worker.
    pub fn open(paths: &Paths, config: &Config) -> Result<Self> {
        let store = Store::open_with_busy_timeout(paths.db_path(), config.busy_timeout_ms)?;
        let supervisor = Supervisor::new(
            LivenessRegistry::new(paths.worker_record_path()),
            Arc::new(ProcessLiveness),
            Arc::new(ProcessLauncher::current_exe(paths.data_dir().to_path_buf())?),
        )
        .with_heartbeat_interval(config.poller_settings().heartbeat_interval_sec);
        Ok(Self::new(store, Arc::new(SystemClock), supervisor))
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Commands
    // ─────────────────────────────────────────────────────────────────────

    /// Starts a new running interval and launches its worker.
    pub fn create(&self, duration_sec: i64) -> Result<Interval> {
        self.recover()?;

        if duration_sec <= 0 {
            return Err(PomodoroError::InvalidDuration {
                input: duration_sec.to_string(),
            });
        }
        if let Some(active) = self.store.fetch_active()? {
            return Err(PomodoroError::ActiveIntervalExists {
                current: snapshot(Some(active)),
            });
        }

        let now = self.now();
        let interval = match self.store.insert_interval(duration_sec, now) {
            Ok(interval) => interval,
            Err(PomodoroError::ActiveIntervalExists { .. }) => {
                warn!(duration_sec, "Start lost a race with another actor");
                return Err(PomodoroError::ActiveIntervalExists {
                    current: snapshot(self.store.fetch_active()?),
                });
            }
            Err(err) => return Err(err),
        };

        info!(interval_id = interval.id, duration_sec, "Interval started");
        self.launch_worker(&interval, now);
        Ok(interval)
    }

    /// Closes the running segment and confirms its worked time.
    pub fn pause(&self) -> Result<Interval> {
        self.recover()?;

        let running = match self.store.fetch_active()? {
            Some(active) if active.status == IntervalStatus::Running => active,
            other => {
                return Err(PomodoroError::NotRunning {
                    current: snapshot(other),
                })
            }
        };

        let now = self.now();
        let worked = accounting::close_segment(&running, now);
        let paused = self.apply(
            Transition::from(&running, IntervalStatus::Paused, EventType::Paused, now)
                .worked(worked),
        )?;

        info!(
            interval_id = paused.id,
            worked_sec = paused.worked_sec,
            remaining_sec = paused.remaining_sec(now),
            "Interval paused"
        );
        Ok(paused)
    }

    /// Opens a new running segment on a paused or interrupted interval.
    pub fn resume(&self) -> Result<Interval> {
        self.recover()?;

        let resumable = match self.store.fetch_active()? {
            Some(active)
                if matches!(
                    active.status,
                    IntervalStatus::Paused | IntervalStatus::Interrupted
                ) =>
            {
                active
            }
            other => {
                return Err(PomodoroError::NotResumable {
                    current: snapshot(other),
                })
            }
        };

        let now = self.now();
        let resumed = self.apply(
            Transition::from(&resumable, IntervalStatus::Running, EventType::Resumed, now)
                .running_since(now),
        )?;

        info!(
            interval_id = resumed.id,
            from = %resumable.status,
            worked_sec = resumed.worked_sec,
            "Interval resumed"
        );
        self.launch_worker(&resumed, now);
        Ok(resumed)
    }

    /// Cancels the active interval unless it is waiting for a resolution.
    pub fn cancel(&self) -> Result<Interval> {
        self.recover()?;

        let cancellable = match self.store.fetch_active()? {
            Some(active) if active.status != IntervalStatus::Finished => active,
            other => {
                return Err(PomodoroError::NoActiveInterval {
                    current: snapshot(other),
                })
            }
        };

        let now = self.now();
        let worked = accounting::close_segment(&cancellable, now);
        let cancelled = self.apply(
            Transition::from(
                &cancellable,
                IntervalStatus::Cancelled,
                EventType::Cancelled,
                now,
            )
            .worked(worked)
            .ending(now),
        )?;

        info!(
            interval_id = cancelled.id,
            from = %cancellable.status,
            worked_sec = cancelled.worked_sec,
            "Interval cancelled"
        );
        Ok(cancelled)
    }

    /// Resolves the finished interval from a user-supplied word.
    pub fn resolve_outcome(&self, outcome: &str) -> Result<Interval> {
        let resolution = outcome.parse::<Resolution>()?;
        self.resolve(resolution)
    }

    pub fn resolve(&self, resolution: Resolution) -> Result<Interval> {
        self.resolve_target(None, resolution)
    }

    /// Resolves the finished interval. With `expected_id`, only that interval
    /// qualifies; a different finished interval reports `NotFinished`.
    pub fn resolve_target(&self, expected_id: Option<i64>, resolution: Resolution) -> Result<Interval> {
        self.recover()?;

        let finished = match self.store.fetch_active()? {
            Some(active)
                if active.status == IntervalStatus::Finished
                    && expected_id.map_or(true, |id| id == active.id) =>
            {
                active
            }
            other => {
                return Err(PomodoroError::NotFinished {
                    current: snapshot(other),
                })
            }
        };

        let now = self.now();
        let resolved = self.apply(Transition::from(
            &finished,
            resolution.status(),
            resolution.event(),
            now,
        ))?;

        info!(
            interval_id = resolved.id,
            resolution = %resolution,
            worked_sec = resolved.worked_sec,
            "Interval resolved"
        );
        Ok(resolved)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internal transitions
    // ─────────────────────────────────────────────────────────────────────

    /// Marks a running interval finished once its duration has elapsed.
    ///
    /// Called by the worker with the snapshot it just polled. An interval
    /// that is not due yet reports `NotFinished`.
    pub fn auto_finish(&self, observed: &Interval) -> Result<Interval> {
        if observed.status != IntervalStatus::Running {
            return Err(PomodoroError::NotRunning {
                current: snapshot(Some(observed.clone())),
            });
        }

        let now = self.now();
        if !observed.is_due(now) {
            return Err(PomodoroError::NotFinished {
                current: snapshot(Some(observed.clone())),
            });
        }

        let finished = self.apply(
            Transition::from(observed, IntervalStatus::Finished, EventType::Finished, now)
                .worked(observed.duration_sec)
                .ending(now),
        )?;

        info!(
            interval_id = finished.id,
            duration_sec = finished.duration_sec,
            "Interval finished"
        );
        Ok(finished)
    }

    /// Marks a running interval whose worker died. Work is credited up to
    /// the last heartbeat only.
    pub fn mark_interrupted(&self, observed: &Interval) -> Result<Interval> {
        if observed.status != IntervalStatus::Running {
            return Err(PomodoroError::NotRunning {
                current: snapshot(Some(observed.clone())),
            });
        }

        let now = self.now();
        let worked = accounting::recovered_worked(observed);
        let interrupted = self.apply(
            Transition::from(
                observed,
                IntervalStatus::Interrupted,
                EventType::Interrupted,
                now,
            )
            .worked(worked),
        )?;

        warn!(
            interval_id = interrupted.id,
            worked_sec = interrupted.worked_sec,
            heartbeat_at = ?observed.heartbeat_at,
            "Interval interrupted; worker is gone"
        );
        Ok(interrupted)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    /// The active interval, if any, after recovery.
    pub fn current_status(&self) -> Result<Option<Interval>> {
        self.recover()?;
        self.store.fetch_active()
    }

    /// Most recent intervals, newest first.
    pub fn history(&self, limit: usize) -> Result<Vec<Interval>> {
        self.recover()?;
        self.store.fetch_history(limit)
    }

    /// Completed intervals per local day, newest day first.
    pub fn daily_completed(&self, limit: usize) -> Result<Vec<DailyCount>> {
        self.recover()?;
        self.store.fetch_daily_completed(limit)
    }

    /// Completed intervals started since local midnight.
    pub fn today_completed(&self) -> Result<i64> {
        self.store.count_completed_since(start_of_day(self.now()))
    }

    pub fn events(&self, interval_id: i64) -> Result<Vec<IntervalEvent>> {
        self.store.list_events(interval_id)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────

    fn apply(&self, transition: Transition) -> Result<Interval> {
        self.store.apply(&transition).map_err(|err| {
            if let PomodoroError::ConcurrentModification { interval_id } = &err {
                warn!(
                    interval_id,
                    expected = %transition.expected_status,
                    target = %transition.status,
                    "Transition lost a race; interval changed underneath"
                );
            }
            err
        })
    }

    /// The interval is committed either way. Without a worker, the next
    /// command's recovery marks it interrupted.
    fn launch_worker(&self, interval: &Interval, now: i64) {
        match self.supervisor.spawn(interval, now) {
            Ok(handle) => info!(interval_id = interval.id, pid = handle.pid, "Worker launched"),
            Err(err) => tracing::error!(
                interval_id = interval.id,
                error = %err,
                "Failed to launch worker"
            ),
        }
    }
}
