//! File logging for command and worker processes.
//!
//! Stdout belongs to command output (and JSON consumers), so tracing goes
//! to `<data_dir>/pomodoro.log`. Level comes from `POMODORO_LOG`, then
//! `RUST_LOG`, default `info`; `POMODORO_DEBUG_LOG=1` forces `debug`.

use std::env;

use pomodoro_core::Paths;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "POMODORO_LOG";
const DEBUG_ENV: &str = "POMODORO_DEBUG_LOG";

fn filter() -> EnvFilter {
    let debug_enabled = env::var(DEBUG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    if debug_enabled {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber. Keep the guard alive until exit so
/// buffered lines are flushed. Logging is best-effort: without a writable
/// data dir the command still runs, unlogged.
pub fn init(paths: &Paths) -> Option<WorkerGuard> {
    if fs_err::create_dir_all(paths.data_dir()).is_err() {
        return None;
    }

    let log_path = paths.log_path();
    let file_name = log_path.file_name()?;
    let appender = tracing_appender::rolling::never(paths.data_dir(), file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .ok()?;

    Some(guard)
}
