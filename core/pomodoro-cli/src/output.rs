//! Human and JSON rendering of command results.

use pomodoro_core::{format_datetime, format_mmss, Interval, IntervalStatus, PomodoroError};
use pomodoro_protocol::{
    CancelResult, DailyHistoryResult, EventsResult, FinishResult, HistoryResult,
    IntervalSummary, PauseResult, Response, ResumeResult, StartResult, StatusResult,
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Result of a successful command, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Started(StartResult),
    Paused(PauseResult),
    Resumed(ResumeResult),
    Cancelled(CancelResult),
    Finished(FinishResult),
    Status { result: StatusResult, short: bool },
    History(HistoryResult),
    DailyHistory(DailyHistoryResult),
    Events(EventsResult),
}

pub fn summarize(interval: &Interval, now: i64) -> IntervalSummary {
    IntervalSummary {
        interval_id: interval.id,
        status: interval.status.as_str().to_string(),
        duration_sec: interval.duration_sec,
        worked_sec: interval.worked_sec,
        effective_worked_sec: interval.effective_worked_sec(now),
        remaining_sec: interval.remaining_sec(now),
        started_at: interval.started_at,
        ended_at: interval.ended_at,
    }
}

pub fn render(mode: OutputMode, outcome: &Outcome) -> String {
    match mode {
        OutputMode::Json => render_json(outcome),
        OutputMode::Human => render_human(outcome),
    }
}

pub fn render_error(mode: OutputMode, err: &PomodoroError, now: i64) -> String {
    match mode {
        OutputMode::Json => {
            let data = err
                .interval()
                .and_then(|interval| serde_json::to_value(summarize(interval, now)).ok());
            envelope(&Response::error(err.code(), err.to_string(), data))
        }
        OutputMode::Human => format!("Error: {}", err),
    }
}

fn render_json(outcome: &Outcome) -> String {
    let data = match outcome {
        Outcome::Started(result) => to_data(result),
        Outcome::Paused(result) => to_data(result),
        Outcome::Resumed(result) => to_data(result),
        Outcome::Cancelled(result) => to_data(result),
        Outcome::Finished(result) => to_data(result),
        Outcome::Status { result, .. } => to_data(result),
        Outcome::History(result) => to_data(result),
        Outcome::DailyHistory(result) => to_data(result),
        Outcome::Events(result) => to_data(result),
    };
    match data {
        Ok(value) => envelope(&Response::ok(value)),
        Err(err) => envelope(&Response::error("JSON_ERROR", err.to_string(), None)),
    }
}

fn to_data<T: Serialize>(result: &T) -> serde_json::Result<serde_json::Value> {
    serde_json::to_value(result)
}

fn envelope(response: &Response) -> String {
    serde_json::to_string(response).unwrap_or_else(|err| {
        format!(
            r#"{{"ok":false,"error":{{"code":"JSON_ERROR","message":"{}"}}}}"#,
            err.to_string().replace('"', "'")
        )
    })
}

fn render_human(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Started(result) => {
            format!("Pomodoro started: {}.", format_mmss(result.duration_sec))
        }
        Outcome::Paused(result) => format!(
            "Paused. Worked: {}, left: {}.",
            format_mmss(result.worked_sec),
            format_mmss(result.remaining_sec)
        ),
        Outcome::Resumed(result) => format!(
            "Resumed. Worked: {}, left: {}.",
            format_mmss(result.worked_sec),
            format_mmss(result.remaining_sec)
        ),
        Outcome::Cancelled(result) => {
            format!("Cancelled. Worked: {}.", format_mmss(result.worked_sec))
        }
        Outcome::Finished(result) => format!(
            "Interval marked as {}. Worked: {}.",
            result.resolution,
            format_mmss(result.worked_sec)
        ),
        Outcome::Status { result, short } => render_status(result, *short),
        Outcome::History(result) => render_history(result),
        Outcome::DailyHistory(result) => render_daily(result),
        Outcome::Events(result) => render_events(result),
    }
}

fn render_status(result: &StatusResult, short: bool) -> String {
    let Some(interval) = &result.interval else {
        return if short {
            format!("No active interval · {} today", result.today_completed)
        } else {
            format!(
                "No active interval. Today: {} completed.",
                result.today_completed
            )
        };
    };

    if short {
        let prefix = if interval.status == IntervalStatus::Running.as_str() {
            String::new()
        } else {
            format!("{} · ", capitalize(&interval.status))
        };
        return format!(
            "{}{} left · {} worked · {} today",
            prefix,
            format_mmss(interval.remaining_sec),
            format_mmss(interval.effective_worked_sec),
            result.today_completed
        );
    }

    format!(
        "Status:   {}\nDuration: {}\nWorked:   {}\nLeft:     {}\nToday:    {} completed",
        interval.status,
        format_mmss(interval.duration_sec),
        format_mmss(interval.effective_worked_sec),
        format_mmss(interval.remaining_sec),
        result.today_completed
    )
}

fn render_history(result: &HistoryResult) -> String {
    if result.intervals.is_empty() {
        return "No intervals found.".to_string();
    }

    let mut lines = vec![format!(
        "{:<5} {:<17} {:>8} {:>8}  {}",
        "ID", "Date", "Duration", "Worked", "Status"
    )];
    for interval in &result.intervals {
        lines.push(format!(
            "{:<5} {:<17} {:>8} {:>8}  {}",
            interval.interval_id,
            format_datetime(interval.started_at),
            format_mmss(interval.duration_sec),
            format_mmss(interval.effective_worked_sec),
            interval.status
        ));
    }
    lines.join("\n")
}

fn render_daily(result: &DailyHistoryResult) -> String {
    if result.days.is_empty() {
        return "No completed intervals found.".to_string();
    }

    let mut lines = vec![format!("{:<10}  {}", "Date", "Completed")];
    for day in &result.days {
        lines.push(format!("{:<10}  {}", day.date, day.completed));
    }
    lines.join("\n")
}

fn render_events(result: &EventsResult) -> String {
    if result.events.is_empty() {
        return format!("No events for interval {}.", result.interval_id);
    }

    result
        .events
        .iter()
        .map(|event| format!("{}  {}", format_datetime(event.event_at), event.event_type))
        .collect::<Vec<_>>()
        .join("\n")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pomodoro_protocol::DayCount;

    fn paused_interval() -> Interval {
        Interval {
            id: 3,
            duration_sec: 1500,
            status: IntervalStatus::Paused,
            started_at: 1_700_000_000,
            ended_at: None,
            worked_sec: 300,
            run_started_at: None,
            heartbeat_at: None,
        }
    }

    #[test]
    fn human_pause_line_uses_mmss() {
        let outcome = Outcome::Paused(PauseResult {
            interval_id: 3,
            worked_sec: 300,
            remaining_sec: 1200,
        });
        assert_eq!(
            render(OutputMode::Human, &outcome),
            "Paused. Worked: 05:00, left: 20:00."
        );
    }

    #[test]
    fn json_success_is_wrapped_in_envelope() {
        let outcome = Outcome::Cancelled(CancelResult {
            interval_id: 3,
            worked_sec: 500,
        });
        let value: serde_json::Value =
            serde_json::from_str(&render(OutputMode::Json, &outcome)).unwrap();
        assert_eq!(value["ok"], serde_json::json!(true));
        assert_eq!(value["data"]["worked_sec"], serde_json::json!(500));
    }

    #[test]
    fn json_error_includes_blocking_interval() {
        let err = PomodoroError::NotRunning {
            current: Some(Box::new(paused_interval())),
        };
        let value: serde_json::Value =
            serde_json::from_str(&render_error(OutputMode::Json, &err, 1_700_000_900)).unwrap();

        assert_eq!(value["ok"], serde_json::json!(false));
        assert_eq!(value["error"]["code"], serde_json::json!("NOT_RUNNING"));
        assert_eq!(value["data"]["status"], serde_json::json!("paused"));
        assert_eq!(value["data"]["effective_worked_sec"], serde_json::json!(300));
    }

    #[test]
    fn short_status_prefixes_non_running_state() {
        let result = StatusResult {
            active: true,
            interval: Some(summarize(&paused_interval(), 1_700_000_900)),
            today_completed: 2,
        };
        assert_eq!(
            render_status(&result, true),
            "Paused · 20:00 left · 05:00 worked · 2 today"
        );
    }

    #[test]
    fn empty_listings_have_friendly_messages() {
        assert_eq!(
            render_history(&HistoryResult {
                intervals: Vec::new()
            }),
            "No intervals found."
        );
        assert_eq!(
            render_daily(&DailyHistoryResult { days: Vec::new() }),
            "No completed intervals found."
        );
        let daily = render_daily(&DailyHistoryResult {
            days: vec![DayCount {
                date: "2024-05-01".to_string(),
                completed: 4,
            }],
        });
        assert!(daily.ends_with("2024-05-01  4"));
    }
}
