//! Wire types for `pomodoro --json`.
//!
//! Every command prints exactly one [`Response`]. On success `data` holds the
//! command's result struct; on failure `error` carries a stable code and
//! `data` may hold the interval that blocked the command.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl Response {
    pub fn ok(data: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: &str, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            ok: false,
            data,
            error: Some(ErrorInfo::new(code, message)),
        }
    }
}

/// An interval as reported to callers. `effective_worked_sec` includes the
/// open running segment and is clamped to the duration.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct IntervalSummary {
    pub interval_id: i64,
    pub status: String,
    pub duration_sec: i64,
    pub worked_sec: i64,
    pub effective_worked_sec: i64,
    pub remaining_sec: i64,
    pub started_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StartResult {
    pub interval_id: i64,
    pub duration_sec: i64,
    pub started_at: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PauseResult {
    pub interval_id: i64,
    pub worked_sec: i64,
    pub remaining_sec: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ResumeResult {
    pub interval_id: i64,
    pub worked_sec: i64,
    pub remaining_sec: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CancelResult {
    pub interval_id: i64,
    pub worked_sec: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FinishResult {
    pub interval_id: i64,
    pub resolution: String,
    pub worked_sec: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StatusResult {
    pub active: bool,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub interval: Option<IntervalSummary>,
    pub today_completed: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HistoryResult {
    pub intervals: Vec<IntervalSummary>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DayCount {
    pub date: String,
    pub completed: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DailyHistoryResult {
    pub days: Vec<DayCount>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub event_id: i64,
    pub event_type: String,
    pub event_at: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct EventsResult {
    pub interval_id: i64,
    pub events: Vec<EventRecord>,
}
