use pomodoro_core::testing::{ScriptedNotifier, TestHarness};
use pomodoro_core::worker::{Poller, PollerSettings};
use pomodoro_core::{
    Confirmation, EventType, IntervalStatus, PollOutcome, RecoveryOutcome, Resolution,
};
use std::time::Duration;

fn instant_poll() -> PollerSettings {
    PollerSettings {
        poll_interval: Duration::ZERO,
        heartbeat_interval_sec: 10,
    }
}

#[test]
fn full_interval_finishes_then_completes() {
    let harness = TestHarness::new(1_700_000_000);
    let interval = harness.engine.create(1_500).expect("create");

    harness.clock.set_step(25);
    let notifier = ScriptedNotifier::new(Confirmation::TimedOut);
    let outcome = Poller::new(&harness.engine, &notifier, instant_poll())
        .run(interval.id)
        .expect("poll");
    harness.clock.set_step(0);

    assert_eq!(
        outcome,
        PollOutcome::Finished {
            confirmation: Confirmation::TimedOut
        }
    );
    let finished = harness.engine.current_status().unwrap().expect("finished");
    assert_eq!(finished.status, IntervalStatus::Finished);
    assert_eq!(finished.effective_worked_sec(harness.engine.now()), 1_500);

    let completed = harness.engine.resolve(Resolution::Completed).expect("resolve");
    assert_eq!(completed.status, IntervalStatus::Completed);
    assert_eq!(completed.worked_sec, 1_500);
    assert!(completed.ended_at.is_some());
    assert!(harness.engine.current_status().unwrap().is_none());
}

#[test]
fn pause_resume_cancel_accumulates_segments() {
    let harness = TestHarness::new(1_700_000_000);
    harness.engine.create(1_500).unwrap();

    harness.clock.advance(300);
    let paused = harness.engine.pause().unwrap();
    assert_eq!(paused.worked_sec, 300);
    assert_eq!(paused.run_started_at, None);

    harness.engine.resume().unwrap();
    harness.clock.advance(200);
    let cancelled = harness.engine.cancel().unwrap();
    assert_eq!(cancelled.worked_sec, 500);
    assert_eq!(cancelled.status, IntervalStatus::Cancelled);
}

#[test]
fn worker_death_credits_up_to_last_heartbeat() {
    let start = 1_700_000_000;
    let harness = TestHarness::new(start);
    let interval = harness.engine.create(1_500).unwrap();
    harness
        .engine
        .store()
        .record_heartbeat(interval.id, start, start + 395)
        .unwrap();

    harness.clock.set(start + 400);
    harness.liveness.set_alive(false);

    let status = harness.engine.current_status().unwrap().expect("active");
    assert_eq!(status.status, IntervalStatus::Interrupted);
    assert_eq!(status.worked_sec, 395);
}

#[test]
fn pause_then_resume_keeps_effective_worked() {
    let harness = TestHarness::new(1_700_000_000);
    harness.engine.create(1_500).unwrap();
    harness.clock.advance(420);

    let now = harness.engine.now();
    let before = harness
        .engine
        .current_status()
        .unwrap()
        .unwrap()
        .effective_worked_sec(now);
    harness.engine.pause().unwrap();
    let resumed = harness.engine.resume().unwrap();

    assert_eq!(before, 420);
    assert_eq!(resumed.effective_worked_sec(now), before);
}

#[test]
fn effective_worked_is_monotonic_and_bounded() {
    let harness = TestHarness::new(1_700_000_000);
    let duration = 600;
    let interval = harness.engine.create(duration).unwrap();
    let mut last = 0;

    let mut observe = |harness: &TestHarness| {
        let now = harness.engine.now();
        let current = harness
            .engine
            .store()
            .fetch_interval(interval.id)
            .unwrap()
            .unwrap();
        let worked = current.effective_worked_sec(now);
        assert!(worked >= last, "worked time went backwards: {} < {}", worked, last);
        assert!(worked <= duration);
        last = worked;
    };

    observe(&harness);
    harness.clock.advance(120);
    observe(&harness);
    harness.engine.pause().unwrap();
    observe(&harness);
    harness.clock.advance(5_000);
    observe(&harness);
    harness.engine.resume().unwrap();
    observe(&harness);
    harness.clock.advance(1_000);
    observe(&harness);

    let running = harness
        .engine
        .store()
        .fetch_interval(interval.id)
        .unwrap()
        .unwrap();
    harness.engine.auto_finish(&running).unwrap();
    observe(&harness);
    harness.clock.advance(10_000);
    observe(&harness);
    assert_eq!(last, duration);
}

#[test]
fn recovery_never_credits_more_than_duration() {
    let start = 1_700_000_000;
    let harness = TestHarness::new(start);
    let interval = harness.engine.create(300).unwrap();
    harness
        .engine
        .store()
        .record_heartbeat(interval.id, start, start + 900)
        .unwrap();
    harness.liveness.set_alive(false);
    harness.clock.set(start + 1_000);

    let outcome = harness.engine.recover().unwrap();
    let RecoveryOutcome::Interrupted(interrupted) = outcome else {
        panic!("expected interruption, got {:?}", outcome);
    };
    assert_eq!(interrupted.worked_sec, 300);
}

#[test]
fn worker_answer_resolves_through_same_path_as_manual_finish() {
    let harness = TestHarness::new(1_700_000_000);
    let interval = harness.engine.create(90).unwrap();
    harness.clock.set_step(10);
    let notifier = ScriptedNotifier::new(Confirmation::Resolved(Resolution::Abandoned));

    Poller::new(&harness.engine, &notifier, instant_poll())
        .run(interval.id)
        .unwrap();

    let stored = harness
        .engine
        .store()
        .fetch_interval(interval.id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, IntervalStatus::Abandoned);
    assert_eq!(
        harness.event_types(interval.id),
        vec![
            EventType::Started,
            EventType::Finished,
            EventType::Abandoned
        ]
    );
}
