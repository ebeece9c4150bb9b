//! One function per user-facing subcommand.

use pomodoro_core::{parse_duration, Config, Engine, PomodoroError, Result};
use pomodoro_protocol::{
    CancelResult, DailyHistoryResult, DayCount, EventRecord, EventsResult, FinishResult,
    HistoryResult, PauseResult, ResumeResult, StartResult, StatusResult,
};

use crate::output::{summarize, Outcome};

pub fn start(engine: &Engine, config: &Config, duration: Option<&str>) -> Result<Outcome> {
    let raw = duration.unwrap_or(&config.default_duration);
    let duration_sec = parse_duration(raw)
        .filter(|secs| *secs > 0)
        .ok_or_else(|| PomodoroError::InvalidDuration {
            input: raw.to_string(),
        })?;

    let interval = engine.create(duration_sec)?;
    Ok(Outcome::Started(StartResult {
        interval_id: interval.id,
        duration_sec: interval.duration_sec,
        started_at: interval.started_at,
    }))
}

pub fn pause(engine: &Engine) -> Result<Outcome> {
    let interval = engine.pause()?;
    let now = engine.now();
    Ok(Outcome::Paused(PauseResult {
        interval_id: interval.id,
        worked_sec: interval.worked_sec,
        remaining_sec: interval.remaining_sec(now),
    }))
}

pub fn resume(engine: &Engine) -> Result<Outcome> {
    let interval = engine.resume()?;
    let now = engine.now();
    Ok(Outcome::Resumed(ResumeResult {
        interval_id: interval.id,
        worked_sec: interval.worked_sec,
        remaining_sec: interval.remaining_sec(now),
    }))
}

pub fn cancel(engine: &Engine) -> Result<Outcome> {
    let interval = engine.cancel()?;
    Ok(Outcome::Cancelled(CancelResult {
        interval_id: interval.id,
        worked_sec: interval.worked_sec,
    }))
}

pub fn finish(engine: &Engine, resolution: &str) -> Result<Outcome> {
    let interval = engine.resolve_outcome(resolution)?;
    Ok(Outcome::Finished(FinishResult {
        interval_id: interval.id,
        resolution: interval.status.as_str().to_string(),
        worked_sec: interval.worked_sec,
    }))
}

pub fn status(engine: &Engine, short: bool) -> Result<Outcome> {
    let active = engine.current_status()?;
    let today_completed = engine.today_completed()?;
    let now = engine.now();
    Ok(Outcome::Status {
        result: StatusResult {
            active: active.is_some(),
            interval: active.map(|interval| summarize(&interval, now)),
            today_completed,
        },
        short,
    })
}

pub fn history(engine: &Engine, limit: usize, daily: bool) -> Result<Outcome> {
    if daily {
        let days = engine
            .daily_completed(limit)?
            .into_iter()
            .map(|day| DayCount {
                date: day.date,
                completed: day.completed,
            })
            .collect();
        return Ok(Outcome::DailyHistory(DailyHistoryResult { days }));
    }

    let now = engine.now();
    let intervals = engine
        .history(limit)?
        .iter()
        .map(|interval| summarize(interval, now))
        .collect();
    Ok(Outcome::History(HistoryResult { intervals }))
}

pub fn events(engine: &Engine, interval_id: i64) -> Result<Outcome> {
    let events = engine
        .events(interval_id)?
        .into_iter()
        .map(|event| EventRecord {
            event_id: event.id,
            event_type: event.event_type.as_str().to_string(),
            event_at: event.event_at,
        })
        .collect();
    Ok(Outcome::Events(EventsResult {
        interval_id,
        events,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pomodoro_core::testing::TestHarness;

    #[test]
    fn start_uses_configured_default_duration() {
        let harness = TestHarness::new(1_700_000_000);
        let config = Config {
            default_duration: "50m".to_string(),
            ..Config::default()
        };

        let Outcome::Started(result) = start(&harness.engine, &config, None).unwrap() else {
            panic!("expected start result");
        };
        assert_eq!(result.duration_sec, 3_000);
    }

    #[test]
    fn start_rejects_unparseable_and_zero_durations() {
        let harness = TestHarness::new(1_700_000_000);
        let config = Config::default();

        for raw in ["soon", "0", "0m0s", "-5"] {
            let err = start(&harness.engine, &config, Some(raw)).unwrap_err();
            assert_eq!(err.code(), "INVALID_DURATION");
            assert!(err.to_string().contains(raw));
        }
    }

    #[test]
    fn status_reports_remaining_time_and_today_count() {
        let harness = TestHarness::new(1_700_000_000);
        start(&harness.engine, &Config::default(), Some("10m")).unwrap();
        harness.clock.advance(90);

        let Outcome::Status { result, .. } = status(&harness.engine, false).unwrap() else {
            panic!("expected status result");
        };
        let interval = result.interval.expect("active interval");
        assert!(result.active);
        assert_eq!(interval.effective_worked_sec, 90);
        assert_eq!(interval.remaining_sec, 510);
        assert_eq!(result.today_completed, 0);
    }

    #[test]
    fn events_lists_transitions_oldest_first() {
        let harness = TestHarness::new(1_700_000_000);
        start(&harness.engine, &Config::default(), Some("25")).unwrap();
        harness.clock.advance(10);
        pause(&harness.engine).unwrap();
        let Outcome::Events(result) = events(&harness.engine, 1).unwrap() else {
            panic!("expected events result");
        };

        let kinds: Vec<&str> = result
            .events
            .iter()
            .map(|event| event.event_type.as_str())
            .collect();
        assert_eq!(kinds, vec!["started", "paused"]);
    }
}
