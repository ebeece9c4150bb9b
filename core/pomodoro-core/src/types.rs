//! Core data types shared by the store, engine and front ends.
//!
//! Timestamps are unix seconds (`i64`), matching the integer columns of the
//! `intervals` and `interval_events` tables.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::accounting;
use crate::error::PomodoroError;

/// Lifecycle status of an interval.
///
/// ```text
/// create ──► running ──pause──► paused ──resume──► running
///               │  ╲                 ╲
///               │   ╲ (worker died)   ╲ cancel ──► cancelled
///               │    ► interrupted ──resume──► running
///               │
///               └─ auto_finish ──► finished ──resolve──► completed | abandoned
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalStatus {
    Running,
    Paused,
    Interrupted,
    Finished,
    Completed,
    Abandoned,
    Cancelled,
}

impl IntervalStatus {
    /// Statuses covered by the single-active-interval index.
    pub const ACTIVE: [IntervalStatus; 4] = [
        IntervalStatus::Running,
        IntervalStatus::Paused,
        IntervalStatus::Finished,
        IntervalStatus::Interrupted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntervalStatus::Running => "running",
            IntervalStatus::Paused => "paused",
            IntervalStatus::Interrupted => "interrupted",
            IntervalStatus::Finished => "finished",
            IntervalStatus::Completed => "completed",
            IntervalStatus::Abandoned => "abandoned",
            IntervalStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "running" => Some(IntervalStatus::Running),
            "paused" => Some(IntervalStatus::Paused),
            "interrupted" => Some(IntervalStatus::Interrupted),
            "finished" => Some(IntervalStatus::Finished),
            "completed" => Some(IntervalStatus::Completed),
            "abandoned" => Some(IntervalStatus::Abandoned),
            "cancelled" => Some(IntervalStatus::Cancelled),
            _ => None,
        }
    }

    /// True until the interval is resolved or cancelled.
    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

impl fmt::Display for IntervalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit log entry type. One per transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Started,
    Paused,
    Resumed,
    Finished,
    Completed,
    Abandoned,
    Cancelled,
    Interrupted,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Started => "started",
            EventType::Paused => "paused",
            EventType::Resumed => "resumed",
            EventType::Finished => "finished",
            EventType::Completed => "completed",
            EventType::Abandoned => "abandoned",
            EventType::Cancelled => "cancelled",
            EventType::Interrupted => "interrupted",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "started" => Some(EventType::Started),
            "paused" => Some(EventType::Paused),
            "resumed" => Some(EventType::Resumed),
            "finished" => Some(EventType::Finished),
            "completed" => Some(EventType::Completed),
            "abandoned" => Some(EventType::Abandoned),
            "cancelled" => Some(EventType::Cancelled),
            "interrupted" => Some(EventType::Interrupted),
            _ => None,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome chosen for a finished interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    /// The time was honestly worked.
    Completed,
    /// The timer ran but the work did not happen.
    Abandoned,
}

impl Resolution {
    pub fn status(&self) -> IntervalStatus {
        match self {
            Resolution::Completed => IntervalStatus::Completed,
            Resolution::Abandoned => IntervalStatus::Abandoned,
        }
    }

    pub fn event(&self) -> EventType {
        match self {
            Resolution::Completed => EventType::Completed,
            Resolution::Abandoned => EventType::Abandoned,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.status().as_str()
    }
}

impl FromStr for Resolution {
    type Err = PomodoroError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "completed" => Ok(Resolution::Completed),
            "abandoned" => Ok(Resolution::Abandoned),
            other => Err(PomodoroError::InvalidResolution {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answer from the completion prompt shown when an interval finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Resolved(Resolution),
    /// No answer (dismissed, failed, or timed out). The interval stays
    /// `finished` until resolved by hand.
    TimedOut,
}

/// One logical work session, as stored in the `intervals` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub id: i64,
    pub duration_sec: i64,
    pub status: IntervalStatus,
    pub started_at: i64,
    pub ended_at: Option<i64>,
    pub worked_sec: i64,
    pub run_started_at: Option<i64>,
    pub heartbeat_at: Option<i64>,
}

impl Interval {
    /// Worked time including the open running segment, clamped to
    /// `[0, duration_sec]`.
    pub fn effective_worked_sec(&self, now: i64) -> i64 {
        accounting::clamp_to_duration(self, accounting::effective_worked(self, now))
    }

    pub fn remaining_sec(&self, now: i64) -> i64 {
        (self.duration_sec - self.effective_worked_sec(now)).max(0)
    }

    /// True once the running segment has covered the requested duration.
    pub fn is_due(&self, now: i64) -> bool {
        self.status == IntervalStatus::Running
            && accounting::effective_worked(self, now) >= self.duration_sec
    }
}

/// Append-only audit record from `interval_events`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalEvent {
    pub id: i64,
    pub interval_id: i64,
    pub event_type: EventType,
    pub event_at: i64,
}

/// Number of completed intervals started on one local calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    /// Local date, `YYYY-MM-DD`.
    pub date: String,
    pub completed: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_round_trip_for_every_variant() {
        for status in [
            IntervalStatus::Running,
            IntervalStatus::Paused,
            IntervalStatus::Interrupted,
            IntervalStatus::Finished,
            IntervalStatus::Completed,
            IntervalStatus::Abandoned,
            IntervalStatus::Cancelled,
        ] {
            assert_eq!(IntervalStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(IntervalStatus::from_str("done"), None);
    }

    #[test]
    fn only_resolved_and_cancelled_are_terminal() {
        assert!(IntervalStatus::Finished.is_active());
        assert!(IntervalStatus::Interrupted.is_active());
        assert!(IntervalStatus::Completed.is_terminal());
        assert!(IntervalStatus::Abandoned.is_terminal());
        assert!(IntervalStatus::Cancelled.is_terminal());
    }

    #[test]
    fn resolution_parses_only_completed_or_abandoned() {
        assert_eq!(
            "completed".parse::<Resolution>().unwrap(),
            Resolution::Completed
        );
        assert_eq!(
            "abandoned".parse::<Resolution>().unwrap(),
            Resolution::Abandoned
        );

        let err = "cancelled".parse::<Resolution>().unwrap_err();
        assert_eq!(err.code(), "INVALID_RESOLUTION");
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&IntervalStatus::Interrupted).unwrap();
        assert_eq!(json, "\"interrupted\"");
    }
}
