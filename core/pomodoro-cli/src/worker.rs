//! Hidden `worker` subcommand: the detached completion poller.

use pomodoro_core::{run_worker, Config, Engine};

/// Exit code for the worker process. Output goes to the log only; the
/// worker's stdio is detached.
pub fn run(engine: &Engine, config: &Config, interval_id: i64) -> i32 {
    let notifier = config.notifier();
    match run_worker(
        engine,
        notifier.as_ref(),
        config.poller_settings(),
        interval_id,
    ) {
        Ok(_) => 0,
        Err(err) => {
            tracing::error!(interval_id, error = %err, "pomodoro worker failed");
            1
        }
    }
}
