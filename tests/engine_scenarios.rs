//! End-to-end engine scenarios against a deterministic host

use std::sync::{Arc, Mutex};

use focus_timer::{
    engine::{ManualHost, TICK_THROTTLE_MS},
    EventKind, Phase, SessionModeConfig, SessionModeId, TimerEngine, TimerError, TimerEvent,
};

type Log = Arc<Mutex<Vec<TimerEvent>>>;

fn engine_with(config: SessionModeConfig, start_ms: i64) -> (TimerEngine<ManualHost>, ManualHost, Log) {
    let host = ManualHost::new(start_ms);
    let mut engine = TimerEngine::new(host.clone());
    engine.initialize_timer(config.id(), config).unwrap();

    let log: Log = Arc::new(Mutex::new(Vec::new()));
    for kind in EventKind::ALL {
        let log = Arc::clone(&log);
        engine.on(kind, move |event| {
            log.lock().unwrap().push(event.clone());
            Ok(())
        });
    }
    (engine, host, log)
}

fn preset(mode: SessionModeId, start_ms: i64) -> (TimerEngine<ManualHost>, ManualHost, Log) {
    engine_with(SessionModeConfig::preset(mode), start_ms)
}

fn frame(engine: &mut TimerEngine<ManualHost>, host: &ManualHost) {
    let id = host.take_frame().expect("a frame should be pending");
    engine.run_frame(id);
}

fn kinds(log: &Log) -> Vec<EventKind> {
    log.lock().unwrap().iter().map(TimerEvent::kind).collect()
}

#[test]
fn remaining_time_is_absolute_not_accumulated() {
    let (mut engine, host, _) = preset(SessionModeId::Pomodoro, 10_000);
    engine.start().unwrap();

    // no time passed
    frame(&mut engine, &host);
    assert_eq!(engine.current_state().unwrap().time_remaining, 1500);

    // partial seconds floor
    host.set_now(10_999);
    frame(&mut engine, &host);
    assert_eq!(engine.current_state().unwrap().time_remaining, 1500);

    host.set_now(12_500);
    frame(&mut engine, &host);
    assert_eq!(engine.current_state().unwrap().time_remaining, 1498);

    // a hundred minutes late clamps to zero and completes
    host.set_now(10_000 + 100 * 60 * 1000);
    frame(&mut engine, &host);
    let state = engine.current_state().unwrap();
    assert_eq!(state.phase, Phase::Break);
    assert_eq!(state.time_remaining, 300);
    assert_eq!(state.total_elapsed, 1500);
}

#[test]
fn ticks_are_throttled() {
    let (mut engine, host, log) = preset(SessionModeId::Pomodoro, 0);
    engine.start().unwrap();

    for _ in 0..20 {
        frame(&mut engine, &host);
        host.advance(4);
    }
    let ticks = kinds(&log).iter().filter(|k| **k == EventKind::Tick).count();
    assert_eq!(ticks, 1);

    host.advance(TICK_THROTTLE_MS);
    frame(&mut engine, &host);
    let ticks = kinds(&log).iter().filter(|k| **k == EventKind::Tick).count();
    assert_eq!(ticks, 2);
}

#[test]
fn work_break_cycle_sequencing() {
    let config = SessionModeConfig::new(
        SessionModeId::DeepWork,
        "Deep Work",
        "",
        50,
        10,
        None,
        None,
        true,
    )
    .unwrap();
    let (mut engine, host, log) = engine_with(config, 0);

    engine.start().unwrap();
    host.advance(3_000_000);
    frame(&mut engine, &host);

    let state = engine.current_state().unwrap();
    assert_eq!(state.phase, Phase::Break);
    assert_eq!(state.time_remaining, 600);
    assert!(!state.is_active);
    assert_eq!(state.current_cycle, 1);
    assert!(!engine.has_pending_frame(), "next phase must not auto-start");

    engine.start().unwrap();
    host.advance(600_000);
    frame(&mut engine, &host);

    let state = engine.current_state().unwrap();
    assert_eq!(state.phase, Phase::Work);
    assert_eq!(state.time_remaining, 3000);
    assert_eq!(state.current_cycle, 2);
    assert_eq!(engine.completed_cycles(), 1);

    let events = log.lock().unwrap().clone();
    let lifecycle: Vec<_> = events
        .into_iter()
        .filter(|e| e.kind() != EventKind::Tick)
        .collect();
    assert_eq!(
        lifecycle[1..],
        [
            TimerEvent::Complete { phase: Phase::Work, cycle_completed: false },
            TimerEvent::PhaseChange { from: Phase::Work, to: Phase::Break, cycle: 1 },
            lifecycle[3].clone(),
            TimerEvent::Complete { phase: Phase::Break, cycle_completed: false },
            TimerEvent::PhaseChange { from: Phase::Break, to: Phase::Work, cycle: 2 },
            TimerEvent::CycleComplete { cycle: 1, total_cycles: 1 },
        ]
    );
    assert_eq!(lifecycle[0].kind(), EventKind::Start);
    assert_eq!(lifecycle[3].kind(), EventKind::Start);
}

#[test]
fn break_less_mode_completes_cycles_without_phase_changes() {
    let (mut engine, host, log) = preset(SessionModeId::Zen, 0);
    engine.start().unwrap();
    host.advance(15 * 60 * 1000);
    frame(&mut engine, &host);

    let state = engine.current_state().unwrap();
    assert_eq!(state.phase, Phase::Work);
    assert_eq!(state.current_cycle, 2);
    assert_eq!(state.time_remaining, 900);
    assert_eq!(state.total_elapsed, 900);
    assert!(!state.is_active && !state.is_paused);

    let events = log.lock().unwrap().clone();
    assert!(events.iter().all(|e| e.kind() != EventKind::PhaseChange));
    let complete = events
        .iter()
        .position(|e| *e == TimerEvent::Complete { phase: Phase::Work, cycle_completed: true })
        .expect("complete emitted");
    let cycle = events
        .iter()
        .position(|e| *e == TimerEvent::CycleComplete { cycle: 1, total_cycles: 1 })
        .expect("cycleComplete emitted");
    assert!(complete < cycle);
}

#[test]
fn hidden_host_resynchronizes_on_return() {
    let (mut engine, host, _) = preset(SessionModeId::Pomodoro, 1_000);
    engine.start().unwrap();

    engine.handle_visibility_change(false);
    assert!(!engine.has_pending_frame());
    assert_eq!(host.pending_frame(), None);

    host.set_now(6_000);
    engine.handle_visibility_change(true);
    assert_eq!(engine.current_state().unwrap().time_remaining, 1500 - 5);
    assert!(engine.has_pending_frame());
}

#[test]
fn long_absence_completes_on_return() {
    let (mut engine, host, log) = preset(SessionModeId::Pomodoro, 0);
    engine.start().unwrap();
    engine.handle_visibility_change(false);
    host.advance(2 * 60 * 60 * 1000);
    engine.handle_visibility_change(true);

    assert_eq!(engine.current_state().unwrap().phase, Phase::Break);
    assert!(kinds(&log).contains(&EventKind::Complete));
}

#[test]
fn export_restore_accounts_for_time_in_between() {
    let (mut engine, host, _) = preset(SessionModeId::Pomodoro, 50_000);
    engine.start().unwrap();
    host.advance(20_000);
    frame(&mut engine, &host);

    let before = engine.current_state().unwrap();
    let export = engine.export_state().unwrap();
    assert_eq!(before.time_remaining, 1480);

    // same instant: identical state
    engine.restore_state(export.clone()).unwrap();
    assert_eq!(engine.current_state().unwrap(), before);

    // a fresh engine elsewhere, 30s later
    let other_host = ManualHost::new(50_000 + 20_000 + 30_000);
    let mut other = TimerEngine::new(other_host.clone());
    other.restore_state(export).unwrap();
    let restored = other.current_state().unwrap();
    assert!(restored.is_running());
    assert_eq!(restored.time_remaining, before.time_remaining - 30);
    assert!(other.has_pending_frame());
}

#[test]
fn restore_of_paused_snapshot_does_not_schedule() {
    let (mut engine, host, _) = preset(SessionModeId::Pomodoro, 0);
    engine.start().unwrap();
    host.advance(5_000);
    engine.pause().unwrap();
    let export = engine.export_state().unwrap();
    assert_eq!(export.start_time, None);

    let mut other = TimerEngine::new(ManualHost::new(999_999));
    other.restore_state(export).unwrap();
    assert!(other.is_paused());
    assert!(!other.has_pending_frame());
    assert_eq!(other.current_state().unwrap().time_remaining, 1495);

    other.resume().unwrap();
    assert_eq!(other.current_state().unwrap().time_remaining, 1495);
}

#[test]
fn restore_rejects_invalid_snapshots() {
    let (mut engine, _, _) = preset(SessionModeId::Pomodoro, 0);
    let good = engine.export_state().unwrap();

    let mut both = good.clone();
    both.timer_state.is_active = true;
    both.timer_state.is_paused = true;
    assert!(matches!(
        engine.restore_state(both),
        Err(TimerError::InvalidTimerState(_))
    ));

    let mut wrong_mode = good.clone();
    wrong_mode.timer_state.mode = SessionModeId::Zen;
    assert!(matches!(
        engine.restore_state(wrong_mode),
        Err(TimerError::ModeMismatch { .. })
    ));

    // the engine kept its previous state
    assert_eq!(engine.export_state().unwrap(), good);
}

#[test]
fn no_tick_after_reset_or_destroy() {
    let (mut engine, host, log) = preset(SessionModeId::Pomodoro, 0);
    engine.start().unwrap();
    let stale = host.pending_frame().unwrap();
    engine.reset().unwrap();

    host.advance(10_000);
    engine.run_frame(stale);
    assert_eq!(engine.current_state().unwrap().time_remaining, 1500);
    assert!(!kinds(&log).contains(&EventKind::Tick));

    engine.start().unwrap();
    let stale = host.pending_frame().unwrap();
    engine.destroy();
    engine.run_frame(stale);
    assert!(engine.current_state().is_none());

    // subscriptions and the visibility listener are gone too
    let count = log.lock().unwrap().len();
    engine.handle_visibility_change(true);
    assert_eq!(log.lock().unwrap().len(), count);
    assert!(!host.visibility_attached());
}

#[test]
fn failing_subscriber_does_not_block_others_or_engine() {
    let (mut engine, host, log) = preset(SessionModeId::Pomodoro, 0);
    engine.on(EventKind::Start, |_| anyhow::bail!("ui went away"));
    engine.on(EventKind::Complete, |_| panic!("audio crashed"));

    engine.start().unwrap();
    host.advance(25 * 60 * 1000);
    frame(&mut engine, &host);

    assert_eq!(engine.current_state().unwrap().phase, Phase::Break);
    let seen = kinds(&log);
    assert!(seen.contains(&EventKind::Start));
    assert!(seen.contains(&EventKind::PhaseChange));
}

#[test]
fn off_stops_delivery() {
    let (mut engine, _, _) = preset(SessionModeId::Pomodoro, 0);
    let hits = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&hits);
    let id = engine.on(EventKind::Start, move |_| {
        *counter.lock().unwrap() += 1;
        Ok(())
    });

    engine.start().unwrap();
    engine.pause().unwrap();
    assert!(engine.off(EventKind::Start, id));
    engine.start().unwrap();
    assert_eq!(*hits.lock().unwrap(), 1);
}
