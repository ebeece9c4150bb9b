//! Time accounting.
//!
//! Worked time is never written per second. The store keeps the confirmed
//! total (`worked_sec`) plus the start of the open running segment
//! (`run_started_at`); everything else is derived here from those fields and
//! the current clock. Status, history and the poller's finish check all call
//! into this module rather than caching a value.

use crate::types::{Interval, IntervalStatus};

/// Confirmed work plus the open running segment. Not clamped to the
/// duration; never negative.
pub fn effective_worked(interval: &Interval, now: i64) -> i64 {
    let confirmed = interval.worked_sec.max(0);
    match (interval.status, interval.run_started_at) {
        (IntervalStatus::Running, Some(run_started_at)) => {
            confirmed + now.saturating_sub(run_started_at).max(0)
        }
        _ => confirmed,
    }
}

/// Clamps a derived value to `[0, duration_sec]`.
pub fn clamp_to_duration(interval: &Interval, worked: i64) -> i64 {
    worked.clamp(0, interval.duration_sec.max(0))
}

/// Work to confirm when a running segment is closed at `now` (pause, cancel).
pub fn close_segment(interval: &Interval, now: i64) -> i64 {
    clamp_to_duration(interval, effective_worked(interval, now))
}

/// Work to credit when the worker is found dead.
///
/// Only time up to the last heartbeat counts; a segment that never
/// heartbeated contributes nothing.
pub fn recovered_worked(interval: &Interval) -> i64 {
    let credited = match (interval.run_started_at, interval.heartbeat_at) {
        (Some(run_started_at), Some(heartbeat_at)) => {
            interval.worked_sec + heartbeat_at.saturating_sub(run_started_at).max(0)
        }
        _ => interval.worked_sec,
    };
    clamp_to_duration(interval, credited)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(worked_sec: i64, run_started_at: i64, heartbeat_at: Option<i64>) -> Interval {
        Interval {
            id: 1,
            duration_sec: 1500,
            status: IntervalStatus::Running,
            started_at: 0,
            ended_at: None,
            worked_sec,
            run_started_at: Some(run_started_at),
            heartbeat_at,
        }
    }

    #[test]
    fn running_interval_adds_open_segment() {
        let interval = running(100, 1_000, None);
        assert_eq!(effective_worked(&interval, 1_250), 350);
    }

    #[test]
    fn paused_interval_ignores_clock() {
        let mut interval = running(300, 1_000, None);
        interval.status = IntervalStatus::Paused;
        interval.run_started_at = None;
        assert_eq!(effective_worked(&interval, 99_999), 300);
    }

    #[test]
    fn clock_skew_never_goes_negative() {
        let interval = running(0, 1_000, None);
        assert_eq!(effective_worked(&interval, 900), 0);
    }

    #[test]
    fn close_segment_clamps_to_duration() {
        let interval = running(1_400, 1_000, None);
        assert_eq!(close_segment(&interval, 1_500), 1_500);
    }

    #[test]
    fn recovery_credits_up_to_heartbeat_only() {
        let interval = running(0, 1_000, Some(1_395));
        assert_eq!(recovered_worked(&interval), 395);
    }

    #[test]
    fn recovery_without_heartbeat_credits_nothing() {
        let interval = running(120, 1_000, None);
        assert_eq!(recovered_worked(&interval), 120);
    }

    #[test]
    fn recovery_never_exceeds_duration() {
        let interval = running(1_000, 1_000, Some(3_000));
        assert_eq!(recovered_worked(&interval), 1_500);
    }
}
