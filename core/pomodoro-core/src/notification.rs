//! Completion prompt shown by the worker once an interval finishes.
//!
//! The prompt is an external command configured as `notify_command`. It
//! receives the interval through environment variables and answers on
//! stdout with `completed` or `abandoned`. Anything else, a failure, or no
//! answer within the timeout leaves the interval `finished`.

use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crate::types::{Confirmation, Interval, Resolution};

pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(300);

const WAIT_STEP: Duration = Duration::from_millis(200);

/// Asks the user how a finished interval went.
pub trait Notifier: Send + Sync {
    fn confirm(&self, interval: &Interval) -> Confirmation;
}

/// Never prompts. Finished intervals wait for `finish` from the CLI.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn confirm(&self, interval: &Interval) -> Confirmation {
        tracing::debug!(interval_id = interval.id, "No notify command configured");
        Confirmation::TimedOut
    }
}

/// Runs a user-supplied command and reads the resolution from its stdout.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    argv: Vec<String>,
    timeout: Duration,
}

impl CommandNotifier {
    pub fn new(argv: Vec<String>) -> Self {
        Self {
            argv,
            timeout: DEFAULT_CONFIRM_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn run(&self, interval: &Interval) -> Result<Option<String>, String> {
        let (program, args) = self
            .argv
            .split_first()
            .ok_or_else(|| "notify_command is empty".to_string())?;

        let mut child = Command::new(program)
            .args(args)
            .env("POMODORO_INTERVAL_ID", interval.id.to_string())
            .env("POMODORO_DURATION_SEC", interval.duration_sec.to_string())
            .env("POMODORO_WORKED_SEC", interval.worked_sec.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| format!("failed to spawn {}: {}", program, err))?;

        // Drained concurrently so a chatty prompt cannot fill the pipe and
        // stall until the timeout.
        let (answer_tx, answer_rx) = mpsc::channel();
        if let Some(mut stdout) = child.stdout.take() {
            thread::spawn(move || {
                let mut answer = String::new();
                let read = stdout.read_to_string(&mut answer).map(|_| answer);
                let _ = answer_tx.send(read);
            });
        }

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Ok(None);
                }
                Ok(None) => thread::sleep(WAIT_STEP),
                Err(err) => return Err(format!("failed to wait for {}: {}", program, err)),
            }
        };

        if !status.success() {
            return Err(format!("{} exited with {}", program, status));
        }

        // A background child of the prompt may still hold stdout open.
        let remaining = deadline.saturating_duration_since(Instant::now());
        match answer_rx.recv_timeout(remaining) {
            Ok(Ok(answer)) => Ok(Some(answer)),
            Ok(Err(err)) => Err(format!("failed to read answer: {}", err)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Ok(Some(String::new())),
        }
    }
}

impl Notifier for CommandNotifier {
    fn confirm(&self, interval: &Interval) -> Confirmation {
        match self.run(interval) {
            Ok(Some(answer)) => parse_answer(&answer),
            Ok(None) => {
                tracing::info!(
                    interval_id = interval.id,
                    timeout_secs = self.timeout.as_secs(),
                    "Completion prompt timed out"
                );
                Confirmation::TimedOut
            }
            Err(details) => {
                tracing::warn!(interval_id = interval.id, %details, "Completion prompt failed");
                Confirmation::TimedOut
            }
        }
    }
}

fn parse_answer(answer: &str) -> Confirmation {
    match answer.trim().to_lowercase().parse::<Resolution>() {
        Ok(resolution) => Confirmation::Resolved(resolution),
        Err(_) => Confirmation::TimedOut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IntervalStatus;

    fn finished() -> Interval {
        Interval {
            id: 9,
            duration_sec: 60,
            status: IntervalStatus::Finished,
            started_at: 0,
            ended_at: Some(60),
            worked_sec: 60,
            run_started_at: None,
            heartbeat_at: None,
        }
    }

    #[test]
    fn parses_answers() {
        assert_eq!(
            parse_answer("completed\n"),
            Confirmation::Resolved(Resolution::Completed)
        );
        assert_eq!(
            parse_answer(" Abandoned "),
            Confirmation::Resolved(Resolution::Abandoned)
        );
        assert_eq!(parse_answer(""), Confirmation::TimedOut);
        assert_eq!(parse_answer("later"), Confirmation::TimedOut);
    }

    #[test]
    fn silent_notifier_never_resolves() {
        assert_eq!(SilentNotifier.confirm(&finished()), Confirmation::TimedOut);
    }

    #[test]
    fn empty_command_is_treated_as_no_answer() {
        let notifier = CommandNotifier::new(Vec::new());
        assert_eq!(notifier.confirm(&finished()), Confirmation::TimedOut);
    }

    #[cfg(unix)]
    #[test]
    fn command_answer_resolves_interval() {
        let notifier = CommandNotifier::new(vec![
            "sh".to_string(),
            "-c".to_string(),
            "test \"$POMODORO_INTERVAL_ID\" = 9 && echo completed".to_string(),
        ]);
        assert_eq!(
            notifier.confirm(&finished()),
            Confirmation::Resolved(Resolution::Completed)
        );
    }

    #[cfg(unix)]
    #[test]
    fn slow_command_times_out() {
        let notifier = CommandNotifier::new(vec!["sleep".to_string(), "5".to_string()])
            .with_timeout(Duration::from_millis(300));
        assert_eq!(notifier.confirm(&finished()), Confirmation::TimedOut);
    }

    #[cfg(unix)]
    #[test]
    fn failing_command_is_treated_as_no_answer() {
        let notifier = CommandNotifier::new(vec![
            "sh".to_string(),
            "-c".to_string(),
            "echo completed; exit 3".to_string(),
        ]);
        assert_eq!(notifier.confirm(&finished()), Confirmation::TimedOut);
    }

    #[cfg(unix)]
    #[test]
    fn large_output_before_answer_is_drained() {
        let notifier = CommandNotifier::new(vec![
            "sh".to_string(),
            "-c".to_string(),
            "head -c 200000 /dev/zero | tr '\\0' ' '; echo completed".to_string(),
        ])
        .with_timeout(Duration::from_secs(10));
        let started = Instant::now();

        assert_eq!(
            notifier.confirm(&finished()),
            Confirmation::Resolved(Resolution::Completed)
        );
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
