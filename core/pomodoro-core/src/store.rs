//! SQLite persistence for intervals and their event log.
//!
//! The store is the only state shared between the command process and the
//! background worker. Two tables: `intervals` (one row per work session) and
//! the append-only `interval_events`. A unique partial index over the active
//! statuses enforces "at most one active interval" in the database itself.
//!
//! Every status change goes through [`Store::apply`], a conditional UPDATE
//! guarded on the status and running segment the caller observed, executed
//! in an IMMEDIATE transaction together with the event insert. When two
//! processes race, SQLite serializes the writers and the loser sees zero
//! affected rows.

use rusqlite::{params, Connection, ErrorCode, OpenFlags, OptionalExtension, TransactionBehavior};
use std::path::{Path, PathBuf};

use crate::error::{io, storage, PomodoroError, Result};
use crate::types::{DailyCount, EventType, Interval, IntervalEvent, IntervalStatus};

pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5000;

const SELECT_INTERVAL: &str = "SELECT id, duration_sec, status, started_at, ended_at, \
                                      worked_sec, run_started_at, heartbeat_at \
                               FROM intervals";

const ACTIVE_FILTER: &str = "status IN ('running','paused','finished','interrupted')";

/// Schema migrations indexed by position; `PRAGMA user_version` records how
/// many have been applied.
const MIGRATIONS: &[(&str, &str)] = &[(
    "create intervals and interval_events",
    "CREATE TABLE IF NOT EXISTS intervals (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        duration_sec INTEGER NOT NULL,
        status TEXT NOT NULL
            CHECK(status IN ('running','paused','finished','completed','abandoned','cancelled','interrupted')),
        started_at INTEGER NOT NULL,
        ended_at INTEGER,
        worked_sec INTEGER NOT NULL DEFAULT 0,
        run_started_at INTEGER,
        heartbeat_at INTEGER
     ) STRICT;

     CREATE TABLE IF NOT EXISTS interval_events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        interval_id INTEGER NOT NULL REFERENCES intervals(id),
        event_type TEXT NOT NULL
            CHECK(event_type IN ('started','paused','resumed','finished','completed','abandoned','cancelled','interrupted')),
        event_at INTEGER NOT NULL
     ) STRICT;

     CREATE UNIQUE INDEX IF NOT EXISTS idx_one_active
        ON intervals((1)) WHERE status IN ('running','paused','finished','interrupted');
     CREATE INDEX IF NOT EXISTS idx_events_interval_at
        ON interval_events(interval_id, event_at);
     CREATE INDEX IF NOT EXISTS idx_intervals_started_desc
        ON intervals(started_at DESC);",
)];

/// How a transition treats `ended_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndedAt {
    Keep,
    Set(i64),
}

/// A conditional state change plus the event that records it.
///
/// The guard is the observed `(status, run_started_at)` pair: a row that was
/// paused and resumed in between carries a new `run_started_at`, so a stale
/// snapshot cannot overwrite the newer segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub interval_id: i64,
    pub expected_status: IntervalStatus,
    pub expected_run_started_at: Option<i64>,
    pub status: IntervalStatus,
    pub worked_sec: i64,
    pub run_started_at: Option<i64>,
    pub ended_at: EndedAt,
    pub event: EventType,
    pub at: i64,
}

impl Transition {
    /// Starts a transition guarded on the given snapshot.
    pub fn from(observed: &Interval, status: IntervalStatus, event: EventType, at: i64) -> Self {
        Self {
            interval_id: observed.id,
            expected_status: observed.status,
            expected_run_started_at: observed.run_started_at,
            status,
            worked_sec: observed.worked_sec,
            run_started_at: None,
            ended_at: EndedAt::Keep,
            event,
            at,
        }
    }

    pub fn worked(mut self, worked_sec: i64) -> Self {
        self.worked_sec = worked_sec;
        self
    }

    pub fn running_since(mut self, run_started_at: i64) -> Self {
        self.run_started_at = Some(run_started_at);
        self
    }

    pub fn ending(mut self, ended_at: i64) -> Self {
        self.ended_at = EndedAt::Set(ended_at);
        self
    }
}

pub struct Store {
    path: PathBuf,
    busy_timeout_ms: u32,
}

impl Store {
    pub fn open(path: PathBuf) -> Result<Self> {
        Self::open_with_busy_timeout(path, DEFAULT_BUSY_TIMEOUT_MS)
    }

    pub fn open_with_busy_timeout(path: PathBuf, busy_timeout_ms: u32) -> Result<Self> {
        let store = Self {
            path,
            busy_timeout_ms,
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    pub fn fetch_interval(&self, interval_id: i64) -> Result<Option<Interval>> {
        self.with_connection(|conn| {
            conn.query_row(
                &format!("{SELECT_INTERVAL} WHERE id = ?1"),
                params![interval_id],
                read_interval,
            )
            .optional()
            .map_err(storage("Failed to query interval"))
        })
    }

    /// The interval covered by the single-active index, if any.
    pub fn fetch_active(&self) -> Result<Option<Interval>> {
        self.with_connection(|conn| {
            conn.query_row(
                &format!("{SELECT_INTERVAL} WHERE {ACTIVE_FILTER} LIMIT 1"),
                [],
                read_interval,
            )
            .optional()
            .map_err(storage("Failed to query active interval"))
        })
    }

    pub fn fetch_latest(&self) -> Result<Option<Interval>> {
        self.with_connection(|conn| {
            conn.query_row(
                &format!("{SELECT_INTERVAL} ORDER BY started_at DESC, id DESC LIMIT 1"),
                [],
                read_interval,
            )
            .optional()
            .map_err(storage("Failed to query latest interval"))
        })
    }

    /// Most recent intervals first.
    pub fn fetch_history(&self, limit: usize) -> Result<Vec<Interval>> {
        self.with_connection(|conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "{SELECT_INTERVAL} ORDER BY started_at DESC, id DESC LIMIT ?1"
                ))
                .map_err(storage("Failed to prepare history query"))?;
            let rows = stmt
                .query_map(params![limit as i64], read_interval)
                .map_err(storage("Failed to query history"))?;

            let mut intervals = Vec::new();
            for row in rows {
                intervals.push(row.map_err(storage("Failed to decode interval row"))?);
            }
            Ok(intervals)
        })
    }

    /// Completed counts per local day, newest day first, days with at least
    /// one completed interval only.
    pub fn fetch_daily_completed(&self, limit: usize) -> Result<Vec<DailyCount>> {
        self.with_connection(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT date(started_at, 'unixepoch', 'localtime') AS day, COUNT(*) \
                     FROM intervals WHERE status = 'completed' \
                     GROUP BY day ORDER BY day DESC LIMIT ?1",
                )
                .map_err(storage("Failed to prepare daily history query"))?;
            let rows = stmt
                .query_map(params![limit as i64], |row| {
                    Ok(DailyCount {
                        date: row.get(0)?,
                        completed: row.get(1)?,
                    })
                })
                .map_err(storage("Failed to query daily history"))?;

            let mut days = Vec::new();
            for row in rows {
                days.push(row.map_err(storage("Failed to decode daily history row"))?);
            }
            Ok(days)
        })
    }

    /// Completed intervals started at or after `since`.
    pub fn count_completed_since(&self, since: i64) -> Result<i64> {
        self.with_connection(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM intervals WHERE started_at >= ?1 AND status = 'completed'",
                params![since],
                |row| row.get(0),
            )
            .map_err(storage("Failed to count completed intervals"))
        })
    }

    /// Events for one interval, oldest first.
    pub fn list_events(&self, interval_id: i64) -> Result<Vec<IntervalEvent>> {
        self.with_connection(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, interval_id, event_type, event_at FROM interval_events \
                     WHERE interval_id = ?1 ORDER BY event_at ASC, id ASC",
                )
                .map_err(storage("Failed to prepare events query"))?;
            let rows = stmt
                .query_map(params![interval_id], |row| {
                    let raw: String = row.get(2)?;
                    let event_type = EventType::from_str(&raw)
                        .ok_or_else(|| invalid_text(&raw, "event type"))?;
                    Ok(IntervalEvent {
                        id: row.get(0)?,
                        interval_id: row.get(1)?,
                        event_type,
                        event_at: row.get(3)?,
                    })
                })
                .map_err(storage("Failed to query events"))?;

            let mut events = Vec::new();
            for row in rows {
                events.push(row.map_err(storage("Failed to decode event row"))?);
            }
            Ok(events)
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────

    /// Inserts a new running interval and its `started` event.
    ///
    /// Fails with `ActiveIntervalExists` when the unique active index rejects
    /// the row, i.e. another actor created or still holds an active interval.
    pub fn insert_interval(&self, duration_sec: i64, now: i64) -> Result<Interval> {
        self.with_connection(|conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(storage("Failed to begin insert transaction"))?;

            let inserted = tx.execute(
                "INSERT INTO intervals (duration_sec, status, started_at, worked_sec, run_started_at) \
                 VALUES (?1, 'running', ?2, 0, ?2)",
                params![duration_sec, now],
            );
            match inserted {
                Ok(_) => {}
                Err(err) if is_constraint_violation(&err) => {
                    return Err(PomodoroError::ActiveIntervalExists { current: None });
                }
                Err(err) => return Err(storage("Failed to insert interval")(err)),
            }

            let interval_id = tx.last_insert_rowid();
            insert_event(&tx, interval_id, EventType::Started, now)?;
            let interval = tx
                .query_row(
                    &format!("{SELECT_INTERVAL} WHERE id = ?1"),
                    params![interval_id],
                    read_interval,
                )
                .map_err(storage("Failed to read inserted interval"))?;

            tx.commit()
                .map_err(storage("Failed to commit interval insert"))?;
            Ok(interval)
        })
    }

    /// Applies a conditional transition and appends its event atomically.
    ///
    /// Returns `ConcurrentModification` when the row no longer matches the
    /// observed status and running segment. Nothing is written in that case.
    pub fn apply(&self, transition: &Transition) -> Result<Interval> {
        self.with_connection(|conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(storage("Failed to begin transition"))?;

            let ended_at = match transition.ended_at {
                EndedAt::Keep => None,
                EndedAt::Set(value) => Some(value),
            };
            let updated = tx
                .execute(
                    "UPDATE intervals SET \
                        status = ?1, \
                        worked_sec = ?2, \
                        run_started_at = ?3, \
                        heartbeat_at = NULL, \
                        ended_at = COALESCE(?4, ended_at) \
                     WHERE id = ?5 AND status = ?6 AND run_started_at IS ?7",
                    params![
                        transition.status.as_str(),
                        transition.worked_sec,
                        transition.run_started_at,
                        ended_at,
                        transition.interval_id,
                        transition.expected_status.as_str(),
                        transition.expected_run_started_at,
                    ],
                )
                .map_err(storage("Failed to update interval"))?;

            if updated == 0 {
                // Dropping the transaction rolls it back.
                return Err(PomodoroError::ConcurrentModification {
                    interval_id: transition.interval_id,
                });
            }

            insert_event(&tx, transition.interval_id, transition.event, transition.at)?;
            let interval = tx
                .query_row(
                    &format!("{SELECT_INTERVAL} WHERE id = ?1"),
                    params![transition.interval_id],
                    read_interval,
                )
                .map_err(storage("Failed to read updated interval"))?;

            tx.commit().map_err(storage("Failed to commit transition"))?;
            Ok(interval)
        })
    }

    /// Records worker liveness for the running segment that began at
    /// `run_started_at`. Returns false when that segment is no longer open.
    pub fn record_heartbeat(&self, interval_id: i64, run_started_at: i64, now: i64) -> Result<bool> {
        self.with_connection(|conn| {
            let updated = conn
                .execute(
                    "UPDATE intervals SET heartbeat_at = ?1 \
                     WHERE id = ?2 AND status = 'running' AND run_started_at = ?3",
                    params![now, interval_id, run_started_at],
                )
                .map_err(storage("Failed to record heartbeat"))?;
            Ok(updated > 0)
        })
    }

    pub fn schema_version(&self) -> Result<i64> {
        self.with_connection(|conn| {
            conn.query_row("PRAGMA user_version", [], |row| row.get(0))
                .map_err(storage("Failed to read schema version"))
        })
    }

    fn run_migrations(&self) -> Result<()> {
        self.with_connection(|conn| {
            let current: i64 = conn
                .query_row("PRAGMA user_version", [], |row| row.get(0))
                .map_err(storage("Failed to read schema version"))?;

            for (index, (name, sql)) in MIGRATIONS.iter().enumerate() {
                let target = index as i64 + 1;
                if current >= target {
                    continue;
                }
                let tx = conn
                    .transaction_with_behavior(TransactionBehavior::Immediate)
                    .map_err(storage("Failed to begin migration"))?;
                tx.execute_batch(sql)
                    .map_err(storage("Failed to apply migration"))?;
                tx.pragma_update(None, "user_version", target)
                    .map_err(storage("Failed to bump schema version"))?;
                tx.commit().map_err(storage("Failed to commit migration"))?;
                tracing::info!(version = target, migration = *name, "Applied schema migration");
            }
            Ok(())
        })
    }

    fn with_connection<T>(&self, op: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut conn = self.open_connection()?;
        op(&mut conn)
    }

    fn open_connection(&self) -> Result<Connection> {
        if let Some(parent) = self.path.parent() {
            fs_err::create_dir_all(parent).map_err(io("Failed to create data dir"))?;
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;

        let conn = Connection::open_with_flags(&self.path, flags)
            .map_err(storage("Failed to open sqlite db"))?;

        // busy_timeout first so that the WAL switch itself waits on a
        // concurrent writer instead of failing.
        conn.pragma_update(None, "busy_timeout", self.busy_timeout_ms)
            .map_err(storage("Failed to set busy_timeout"))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(storage("Failed to enable WAL"))?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(storage("Failed to set synchronous"))?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(storage("Failed to enable foreign keys"))?;

        Ok(conn)
    }
}

fn insert_event(
    conn: &Connection,
    interval_id: i64,
    event_type: EventType,
    event_at: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO interval_events (interval_id, event_type, event_at) VALUES (?1, ?2, ?3)",
        params![interval_id, event_type.as_str(), event_at],
    )
    .map_err(storage("Failed to insert interval event"))?;
    Ok(())
}

fn read_interval(row: &rusqlite::Row<'_>) -> rusqlite::Result<Interval> {
    let raw: String = row.get(2)?;
    let status = IntervalStatus::from_str(&raw).ok_or_else(|| invalid_text(&raw, "interval status"))?;
    Ok(Interval {
        id: row.get(0)?,
        duration_sec: row.get(1)?,
        status,
        started_at: row.get(3)?,
        ended_at: row.get(4)?,
        worked_sec: row.get(5)?,
        run_started_at: row.get(6)?,
        heartbeat_at: row.get(7)?,
    })
}

fn invalid_text(raw: &str, what: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        raw.len(),
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Unknown {}: {}", what, raw),
        )),
    )
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _) if failure.code == ErrorCode::ConstraintViolation
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, Store) {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let store = Store::open(temp_dir.path().join("pomodoro.db")).expect("store init");
        (temp_dir, store)
    }

    fn raw_connection(store: &Store) -> Connection {
        Connection::open(store.path()).expect("raw connection")
    }

    #[test]
    fn migrations_set_user_version_and_are_idempotent() {
        let (temp_dir, store) = temp_store();
        assert_eq!(store.schema_version().unwrap(), 1);

        let reopened = Store::open(temp_dir.path().join("pomodoro.db")).expect("reopen");
        assert_eq!(reopened.schema_version().unwrap(), 1);
    }

    #[test]
    fn schema_includes_tables_and_indexes() {
        let (_temp_dir, store) = temp_store();
        let conn = raw_connection(&store);
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type IN ('table', 'index') ORDER BY name")
            .unwrap();
        let names: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .map(|row| row.unwrap())
            .collect();

        for expected in [
            "intervals",
            "interval_events",
            "idx_one_active",
            "idx_events_interval_at",
            "idx_intervals_started_desc",
        ] {
            assert!(names.iter().any(|name| name == expected), "missing {expected}");
        }
    }

    #[test]
    fn connection_uses_wal_journal() {
        let (_temp_dir, store) = temp_store();
        let mode: String = store
            .with_connection(|conn| {
                conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))
                    .map_err(storage("journal_mode"))
            })
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn inserts_running_interval_with_started_event() {
        let (_temp_dir, store) = temp_store();
        let interval = store.insert_interval(1500, 1_000).expect("insert");

        assert_eq!(interval.status, IntervalStatus::Running);
        assert_eq!(interval.started_at, 1_000);
        assert_eq!(interval.run_started_at, Some(1_000));
        assert_eq!(interval.worked_sec, 0);
        assert_eq!(interval.ended_at, None);

        let events = store.list_events(interval.id).expect("events");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::Started);
        assert_eq!(events[0].event_at, 1_000);
    }

    #[test]
    fn unique_index_rejects_second_active_interval() {
        let (_temp_dir, store) = temp_store();
        store.insert_interval(1500, 1_000).expect("first insert");

        let err = store.insert_interval(600, 1_010).unwrap_err();
        assert_eq!(err.code(), "ACTIVE_INTERVAL_EXISTS");
        assert_eq!(store.fetch_history(10).unwrap().len(), 1);
    }

    #[test]
    fn status_check_constraint_rejects_unknown_values() {
        let (_temp_dir, store) = temp_store();
        let conn = raw_connection(&store);
        let result = conn.execute(
            "INSERT INTO intervals (duration_sec, status, started_at) VALUES (60, 'sleeping', 1)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn events_require_existing_interval() {
        let (_temp_dir, store) = temp_store();
        let err = store
            .with_connection(|conn| insert_event(conn, 999, EventType::Started, 1))
            .unwrap_err();
        assert_eq!(err.code(), "STORAGE_ERROR");
    }

    #[test]
    fn apply_updates_row_and_appends_event() {
        let (_temp_dir, store) = temp_store();
        let running = store.insert_interval(1500, 1_000).unwrap();

        let paused = store
            .apply(
                &Transition::from(&running, IntervalStatus::Paused, EventType::Paused, 1_300)
                    .worked(300),
            )
            .expect("pause");

        assert_eq!(paused.status, IntervalStatus::Paused);
        assert_eq!(paused.worked_sec, 300);
        assert_eq!(paused.run_started_at, None);
        assert_eq!(paused.heartbeat_at, None);
        assert_eq!(store.list_events(running.id).unwrap().len(), 2);
    }

    #[test]
    fn apply_with_stale_snapshot_changes_nothing() {
        let (_temp_dir, store) = temp_store();
        let running = store.insert_interval(1500, 1_000).unwrap();
        store
            .apply(
                &Transition::from(&running, IntervalStatus::Paused, EventType::Paused, 1_300)
                    .worked(300),
            )
            .unwrap();

        let err = store
            .apply(
                &Transition::from(&running, IntervalStatus::Finished, EventType::Finished, 2_500)
                    .worked(1500)
                    .ending(2_500),
            )
            .unwrap_err();

        assert_eq!(err.code(), "CONCURRENT_MODIFICATION");
        let current = store.fetch_interval(running.id).unwrap().unwrap();
        assert_eq!(current.status, IntervalStatus::Paused);
        assert_eq!(current.ended_at, None);
        assert_eq!(store.list_events(running.id).unwrap().len(), 2);
    }

    #[test]
    fn apply_rejects_snapshot_from_an_earlier_segment() {
        let (_temp_dir, store) = temp_store();
        let first_segment = store.insert_interval(1500, 1_000).unwrap();
        let paused = store
            .apply(
                &Transition::from(&first_segment, IntervalStatus::Paused, EventType::Paused, 1_100)
                    .worked(100),
            )
            .unwrap();
        store
            .apply(
                &Transition::from(&paused, IntervalStatus::Running, EventType::Resumed, 1_100)
                    .worked(100)
                    .running_since(1_100),
            )
            .unwrap();

        // Same status as the stale snapshot, different segment.
        let err = store
            .apply(
                &Transition::from(&first_segment, IntervalStatus::Paused, EventType::Paused, 1_200)
                    .worked(200),
            )
            .unwrap_err();
        assert_eq!(err.code(), "CONCURRENT_MODIFICATION");
    }

    #[test]
    fn ended_at_keep_preserves_existing_value() {
        let (_temp_dir, store) = temp_store();
        let running = store.insert_interval(60, 1_000).unwrap();
        let finished = store
            .apply(
                &Transition::from(&running, IntervalStatus::Finished, EventType::Finished, 1_060)
                    .worked(60)
                    .ending(1_060),
            )
            .unwrap();
        let completed = store
            .apply(
                &Transition::from(&finished, IntervalStatus::Completed, EventType::Completed, 1_200)
                    .worked(60),
            )
            .unwrap();

        assert_eq!(completed.ended_at, Some(1_060));
    }

    #[test]
    fn heartbeat_only_touches_the_open_segment() {
        let (_temp_dir, store) = temp_store();
        let running = store.insert_interval(1500, 1_000).unwrap();

        assert!(store.record_heartbeat(running.id, 1_000, 1_010).unwrap());
        assert!(!store.record_heartbeat(running.id, 999, 1_020).unwrap());
        assert_eq!(
            store.fetch_interval(running.id).unwrap().unwrap().heartbeat_at,
            Some(1_010)
        );
    }

    #[test]
    fn history_is_newest_first_and_limited() {
        let (_temp_dir, store) = temp_store();
        for (index, started_at) in [1_000, 2_000, 3_000].into_iter().enumerate() {
            let interval = store.insert_interval(60, started_at).unwrap();
            store
                .apply(
                    &Transition::from(
                        &interval,
                        IntervalStatus::Cancelled,
                        EventType::Cancelled,
                        started_at + 10,
                    )
                    .worked(index as i64)
                    .ending(started_at + 10),
                )
                .unwrap();
        }

        let history = store.fetch_history(2).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].started_at, 3_000);
        assert_eq!(history[1].started_at, 2_000);
        assert_eq!(store.fetch_active().unwrap(), None);
        assert_eq!(store.fetch_latest().unwrap().unwrap().started_at, 3_000);
    }

    #[test]
    fn counts_completed_intervals_since_timestamp() {
        let (_temp_dir, store) = temp_store();
        for started_at in [1_000, 5_000] {
            let running = store.insert_interval(60, started_at).unwrap();
            let finished = store
                .apply(
                    &Transition::from(
                        &running,
                        IntervalStatus::Finished,
                        EventType::Finished,
                        started_at + 60,
                    )
                    .worked(60)
                    .ending(started_at + 60),
                )
                .unwrap();
            store
                .apply(
                    &Transition::from(
                        &finished,
                        IntervalStatus::Completed,
                        EventType::Completed,
                        started_at + 61,
                    )
                    .worked(60),
                )
                .unwrap();
        }

        assert_eq!(store.count_completed_since(0).unwrap(), 2);
        assert_eq!(store.count_completed_since(4_000).unwrap(), 1);

        let days = store.fetch_daily_completed(10).unwrap();
        let total: i64 = days.iter().map(|day| day.completed).sum();
        assert_eq!(total, 2);
    }
}
