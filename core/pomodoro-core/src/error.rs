//! Error types for pomodoro-core operations.
//!
//! Lifecycle errors are expected outcomes of racing or mistimed commands and
//! are reported to the caller with a stable code. Infrastructure errors
//! (storage, I/O, config) end the command but never panic.

use std::path::PathBuf;

use crate::types::Interval;

/// All errors that can occur in pomodoro-core operations.
#[derive(Debug, thiserror::Error)]
pub enum PomodoroError {
    // ─────────────────────────────────────────────────────────────────────
    // Lifecycle Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Invalid duration: {input}. Examples: 25, 25m, 90s, 10m30s.")]
    InvalidDuration { input: String },

    #[error("An active interval already exists.")]
    ActiveIntervalExists { current: Option<Box<Interval>> },

    #[error("No running interval to pause.")]
    NotRunning { current: Option<Box<Interval>> },

    #[error("No paused or interrupted interval to resume.")]
    NotResumable { current: Option<Box<Interval>> },

    #[error("No active interval to cancel.")]
    NoActiveInterval { current: Option<Box<Interval>> },

    #[error("No finished interval to resolve.")]
    NotFinished { current: Option<Box<Interval>> },

    #[error("Resolution must be 'completed' or 'abandoned', got '{value}'.")]
    InvalidResolution { value: String },

    #[error("Interval {interval_id} was modified concurrently.")]
    ConcurrentModification { interval_id: i64 },

    // ─────────────────────────────────────────────────────────────────────
    // Infrastructure Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Storage error: {context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    #[error("Failed to launch worker: {details}")]
    Spawn { details: String },

    #[error("Home directory not found")]
    HomeDirNotFound,
}

impl PomodoroError {
    /// Stable machine-readable code, used in JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            PomodoroError::InvalidDuration { .. } => "INVALID_DURATION",
            PomodoroError::ActiveIntervalExists { .. } => "ACTIVE_INTERVAL_EXISTS",
            PomodoroError::NotRunning { .. } => "NOT_RUNNING",
            PomodoroError::NotResumable { .. } => "NOT_RESUMABLE",
            PomodoroError::NoActiveInterval { .. } => "NO_ACTIVE_INTERVAL",
            PomodoroError::NotFinished { .. } => "NOT_FINISHED",
            PomodoroError::InvalidResolution { .. } => "INVALID_RESOLUTION",
            PomodoroError::ConcurrentModification { .. } => "CONCURRENT_MODIFICATION",
            PomodoroError::Storage { .. } => "STORAGE_ERROR",
            PomodoroError::Io { .. } => "IO_ERROR",
            PomodoroError::Json { .. } => "JSON_ERROR",
            PomodoroError::ConfigMalformed { .. } => "CONFIG_ERROR",
            PomodoroError::Spawn { .. } => "SPAWN_ERROR",
            PomodoroError::HomeDirNotFound => "HOME_DIR_NOT_FOUND",
        }
    }

    /// True for lifecycle outcomes the caller is expected to handle.
    pub fn is_domain(&self) -> bool {
        !matches!(
            self,
            PomodoroError::Storage { .. }
                | PomodoroError::Io { .. }
                | PomodoroError::Json { .. }
                | PomodoroError::ConfigMalformed { .. }
                | PomodoroError::Spawn { .. }
                | PomodoroError::HomeDirNotFound
        )
    }

    /// The interval that blocked the operation, when there was one.
    pub fn interval(&self) -> Option<&Interval> {
        match self {
            PomodoroError::ActiveIntervalExists { current }
            | PomodoroError::NotRunning { current }
            | PomodoroError::NotResumable { current }
            | PomodoroError::NoActiveInterval { current }
            | PomodoroError::NotFinished { current } => current.as_deref(),
            _ => None,
        }
    }
}

/// Convenience type alias for Results using PomodoroError.
pub type Result<T> = std::result::Result<T, PomodoroError>;

pub(crate) fn storage(context: &str) -> impl FnOnce(rusqlite::Error) -> PomodoroError + '_ {
    move |source| PomodoroError::Storage {
        context: context.to_string(),
        source,
    }
}

pub(crate) fn io(context: &str) -> impl FnOnce(std::io::Error) -> PomodoroError + '_ {
    move |source| PomodoroError::Io {
        context: context.to_string(),
        source,
    }
}

pub(crate) fn json(context: &str) -> impl FnOnce(serde_json::Error) -> PomodoroError + '_ {
    move |source| PomodoroError::Json {
        context: context.to_string(),
        source,
    }
}

pub(crate) fn snapshot(interval: Option<Interval>) -> Option<Box<Interval>> {
    interval.map(Box::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_errors_are_domain_errors() {
        let err = PomodoroError::ConcurrentModification { interval_id: 7 };
        assert!(err.is_domain());
        assert_eq!(err.code(), "CONCURRENT_MODIFICATION");
        assert_eq!(err.to_string(), "Interval 7 was modified concurrently.");
    }

    #[test]
    fn storage_errors_are_not_domain_errors() {
        let err = storage("Failed to open")(rusqlite::Error::InvalidQuery);
        assert!(!err.is_domain());
        assert_eq!(err.code(), "STORAGE_ERROR");
    }
}
