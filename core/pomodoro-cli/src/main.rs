//! pomodoro: crash-safe Pomodoro timer for the terminal.
//!
//! ## Subcommands
//!
//! - `start [DURATION]`: begin an interval (default from `config.toml`)
//! - `pause` / `resume` / `cancel`: control the active interval
//! - `finish <completed|abandoned>`: resolve a finished interval
//! - `status`, `history`, `events <ID>`: inspect state
//! - `worker`: background completion poller (spawned internally)

mod commands;
mod logging;
mod output;
mod worker;

use clap::{Parser, Subcommand};
use pomodoro_core::{load_config, Clock, Engine, Paths, PomodoroError, SystemClock};
use std::path::PathBuf;

use crate::output::{OutputMode, Outcome};

#[derive(Parser)]
#[command(name = "pomodoro")]
#[command(about = "Pomodoro timer with crash-safe interval tracking")]
#[command(version)]
struct Cli {
    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Data directory (default: $POMODORO_DATA_DIR or ~/.pomodoro)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new interval
    Start {
        /// Duration: 25 (minutes), 25m, 90s or 10m30s
        #[arg(value_name = "DURATION")]
        duration: Option<String>,
    },

    /// Pause the running interval
    Pause,

    /// Resume a paused or interrupted interval
    Resume,

    /// Cancel the active interval
    Cancel,

    /// Resolve a finished interval
    Finish {
        /// completed or abandoned
        #[arg(value_name = "RESOLUTION")]
        resolution: String,
    },

    /// Show the active interval and today's count
    Status {
        /// Single line, for status bars
        #[arg(long)]
        short: bool,
    },

    /// Show recent intervals
    History {
        /// Maximum number of entries
        #[arg(short = 'n', long = "limit", default_value_t = 10,
              value_parser = clap::value_parser!(u32).range(1..))]
        limit: u32,

        /// Completed counts per day instead of intervals
        #[arg(long)]
        daily: bool,
    },

    /// Show the event log of an interval
    Events {
        #[arg(value_name = "ID")]
        interval_id: i64,
    },

    /// Completion poller (spawned by start/resume)
    #[command(hide = true)]
    Worker {
        #[arg(long)]
        interval_id: i64,
    },
}

fn main() {
    let code = run(Cli::parse());
    std::process::exit(code);
}

fn run(cli: Cli) -> i32 {
    let mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let paths = match Paths::resolve(cli.data_dir) {
        Ok(paths) => paths,
        Err(err) => return fail(mode, &err),
    };
    let _logging_guard = logging::init(&paths);

    let config = match load_config(&paths.config_path()) {
        Ok(config) => config,
        Err(err) => return fail(mode, &err),
    };
    let engine = match Engine::open(&paths, &config) {
        Ok(engine) => engine,
        Err(err) => return fail(mode, &err),
    };

    let result: Result<Outcome, PomodoroError> = match cli.command {
        Commands::Start { duration } => commands::start(&engine, &config, duration.as_deref()),
        Commands::Pause => commands::pause(&engine),
        Commands::Resume => commands::resume(&engine),
        Commands::Cancel => commands::cancel(&engine),
        Commands::Finish { resolution } => commands::finish(&engine, &resolution),
        Commands::Status { short } => commands::status(&engine, short),
        Commands::History { limit, daily } => commands::history(&engine, limit as usize, daily),
        Commands::Events { interval_id } => commands::events(&engine, interval_id),
        Commands::Worker { interval_id } => return worker::run(&engine, &config, interval_id),
    };

    match result {
        Ok(outcome) => {
            println!("{}", output::render(mode, &outcome));
            0
        }
        Err(err) => {
            if err.is_domain() {
                tracing::info!(code = err.code(), error = %err, "Command rejected");
            } else {
                tracing::error!(code = err.code(), error = %err, "Command failed");
            }
            report(mode, &err, engine.now())
        }
    }
}

fn fail(mode: OutputMode, err: &PomodoroError) -> i32 {
    tracing::error!(code = err.code(), error = %err, "pomodoro failed to initialize");
    report(mode, err, SystemClock.now())
}

fn report(mode: OutputMode, err: &PomodoroError, now: i64) -> i32 {
    let rendered = output::render_error(mode, err, now);
    match mode {
        OutputMode::Json => println!("{}", rendered),
        OutputMode::Human => eprintln!("{}", rendered),
    }
    1
}
