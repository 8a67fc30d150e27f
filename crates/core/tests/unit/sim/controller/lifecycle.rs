//! # Controller Lifecycle Tests
//!
//! Start, pause, resume, step and stop transitions, including the rejected ones.

use std::time::{Duration, Instant};

use avrsim_core::common::ControlError;
use avrsim_core::config::Config;
use avrsim_core::sim::controller::{ExecutionController, StepReport, StopOutcome};
use avrsim_core::sim::mode::RunMode;
use avrsim_core::sim::observer::{Event, PortChange};
use pretty_assertions::assert_eq;

use crate::common::encode;
use crate::common::harness::{drain, fast_config, image, init_tracing, wait_for, write_temp};

fn spin() -> Vec<u16> {
    vec![encode::ldi(16, 0xFF), encode::rjmp(-1)]
}

#[test]
fn test_initially_stopped() {
    let controller = ExecutionController::new(Config::default());
    assert_eq!(controller.mode(), RunMode::Stopped);
    assert_eq!(controller.snapshot().cycles, 0);
}

#[test]
fn test_start_publishes_initial_state() {
    init_tracing();
    let mut controller = ExecutionController::new(fast_config());
    let events = controller.subscribe();
    controller.start_paused(image(&spin())).unwrap();

    let initial = drain(&events);
    assert!(matches!(&initial[0], Event::Snapshot(s) if s.pc == 0 && s.cycles == 0));
    let ports: Vec<&PortChange> = initial
        .iter()
        .filter_map(|e| match e {
            Event::Port(p) => Some(p),
            _ => None,
        })
        .collect();
    assert_eq!(ports.len(), 4);
    assert!(ports.iter().all(|p| p.value == 0));
    assert_eq!(initial.last(), Some(&Event::ModeChanged(RunMode::Paused)));
}

#[test]
fn test_start_while_active_is_rejected() {
    let mut controller = ExecutionController::new(fast_config());
    controller.start_paused(image(&spin())).unwrap();

    let err = controller.start(image(&spin())).unwrap_err();
    assert!(matches!(err, ControlError::AlreadyActive { mode: RunMode::Paused }));
    assert_eq!(controller.mode(), RunMode::Paused);
}

#[test]
fn test_controls_rejected_while_stopped() {
    let controller = ExecutionController::new(fast_config());
    for (result, action) in [
        (controller.pause(), "pause"),
        (controller.resume(), "resume"),
        (controller.step().map(|_| ()), "step"),
    ] {
        match result {
            Err(ControlError::InvalidTransition { from, action: got }) => {
                assert_eq!(from, RunMode::Stopped);
                assert_eq!(got, action);
            }
            other => panic!("{action}: expected InvalidTransition, got {other:?}"),
        }
    }
}

#[test]
fn test_pause_resume_cycle() {
    init_tracing();
    let mut controller = ExecutionController::new(fast_config());
    let events = controller.subscribe();
    controller.start(image(&spin())).unwrap();
    assert!(wait_for(&events, |e| matches!(e, Event::Snapshot(s) if s.cycles >= 3)).is_some());

    controller.pause().unwrap();
    assert_eq!(controller.mode(), RunMode::Paused);
    assert!(matches!(controller.pause(), Err(ControlError::InvalidTransition { from: RunMode::Paused, .. })));

    // Let any in-flight step land, then verify the program stays put.
    std::thread::sleep(Duration::from_millis(30));
    let frozen = controller.snapshot();
    std::thread::sleep(Duration::from_millis(30));
    assert_eq!(controller.snapshot(), frozen);

    controller.resume().unwrap();
    assert_eq!(controller.mode(), RunMode::Running);
    assert!(matches!(controller.resume(), Err(ControlError::InvalidTransition { from: RunMode::Running, .. })));
    assert!(matches!(controller.step(), Err(ControlError::InvalidTransition { from: RunMode::Running, .. })));

    let target = frozen.cycles + 3;
    assert!(wait_for(&events, |e| matches!(e, Event::Snapshot(s) if s.cycles >= target)).is_some());
    assert_eq!(controller.stop(), StopOutcome::Joined);
}

#[test]
fn test_pause_does_not_change_state() {
    let mut controller = ExecutionController::new(fast_config());
    controller.start_paused(image(&spin())).unwrap();
    let _ = controller.step().unwrap();
    let before = controller.snapshot();

    controller.resume().unwrap();
    controller.pause().unwrap();
    std::thread::sleep(Duration::from_millis(20));
    let after = controller.snapshot();

    assert_eq!(after.registers, before.registers);
    assert_eq!(after.sreg, before.sreg);
    assert_eq!(controller.mode(), RunMode::Paused);
}

#[test]
fn test_step_reports_each_instruction() {
    let mut controller = ExecutionController::new(fast_config());
    controller.start_paused(image(&[encode::ldi(16, 1), encode::ldi(17, 2), encode::rjmp(-1)])).unwrap();

    let StepReport::Executed(first) = controller.step().unwrap() else {
        panic!("expected Executed");
    };
    assert_eq!((first.pc, first.cycles, first.registers[16]), (2, 1, 1));

    let StepReport::Executed(second) = controller.step().unwrap() else {
        panic!("expected Executed");
    };
    assert_eq!((second.pc, second.cycles, second.registers[17]), (4, 2, 2));
    assert_eq!(controller.snapshot(), second);
    assert_eq!(controller.mode(), RunMode::Paused);
}

#[test]
fn test_stop_is_bounded() {
    init_tracing();
    let mut config = Config::default();
    config.general.step_delay_ms = 50;
    config.general.stop_timeout_ms = 200;
    let mut controller = ExecutionController::new(config);
    let events = controller.subscribe();
    controller.start(image(&spin())).unwrap();
    assert!(wait_for(&events, |e| matches!(e, Event::Snapshot(s) if s.cycles >= 1)).is_some());

    let started = Instant::now();
    assert_eq!(controller.stop(), StopOutcome::Joined);
    assert!(started.elapsed() < Duration::from_millis(200));
    assert_eq!(controller.mode(), RunMode::Stopped);
    assert!(wait_for(&events, |e| *e == Event::ModeChanged(RunMode::Stopped)).is_some());
}

#[test]
fn test_stop_from_paused() {
    let mut controller = ExecutionController::new(fast_config());
    controller.start_paused(image(&spin())).unwrap();
    assert_eq!(controller.stop(), StopOutcome::Joined);
    assert_eq!(controller.mode(), RunMode::Stopped);
}

#[test]
fn test_stop_when_stopped() {
    let mut controller = ExecutionController::new(fast_config());
    assert_eq!(controller.stop(), StopOutcome::AlreadyStopped);

    controller.start_paused(image(&spin())).unwrap();
    assert_eq!(controller.stop(), StopOutcome::Joined);
    assert_eq!(controller.stop(), StopOutcome::AlreadyStopped);
}

#[test]
fn test_restart_resets_state() {
    let mut controller = ExecutionController::new(fast_config());
    controller.start_paused(image(&spin())).unwrap();
    let _ = controller.step().unwrap();
    let _ = controller.step().unwrap();
    assert_eq!(controller.stop(), StopOutcome::Joined);

    controller.start_paused(image(&[encode::ldi(17, 9)])).unwrap();
    let snap = controller.snapshot();
    assert_eq!(snap.cycles, 0);
    assert_eq!(snap.registers[16], 0);
    assert_eq!(controller.stats().cycles, 0);
}

#[test]
fn test_malformed_object_keeps_controller_stopped() {
    init_tracing();
    let mut controller = ExecutionController::new(fast_config());
    let events = controller.subscribe();
    let file = write_temp(":0200\n");

    let err = controller.load_and_start(file.path()).unwrap_err();
    assert!(matches!(err, ControlError::Load(_)));
    assert_eq!(controller.mode(), RunMode::Stopped);
    assert!(matches!(drain(&events).as_slice(), [Event::Diagnostic(msg)] if msg.contains("load failed")));
}

#[test]
fn test_missing_object_keeps_controller_stopped() {
    let mut controller = ExecutionController::new(fast_config());
    let err = controller.load_and_start("/nonexistent/main.hex").unwrap_err();
    assert!(matches!(err, ControlError::Load(_)));
    assert_eq!(controller.mode(), RunMode::Stopped);
}

#[test]
fn test_drop_stops_worker() {
    let mut controller = ExecutionController::new(fast_config());
    let events = controller.subscribe();
    controller.start(image(&spin())).unwrap();
    drop(controller);

    // The worker is gone, so the channel drains and disconnects.
    let deadline = Instant::now() + Duration::from_secs(5);
    while events.recv_timeout(Duration::from_millis(100)).is_ok() {
        assert!(Instant::now() < deadline, "worker still publishing after drop");
    }
}

/// Configuration that skips validation to reach a zero stop timeout.
fn zero_timeout_config() -> Config {
    let mut config = Config::default();
    config.general.step_delay_ms = 0;
    config.general.stop_timeout_ms = 0;
    config
}

#[test]
fn test_step_reply_outlasts_zero_stop_timeout() {
    init_tracing();
    let mut controller = ExecutionController::new(zero_timeout_config());
    controller.start_paused(image(&spin())).unwrap();

    let StepReport::Executed(snap) = controller.step().unwrap() else {
        panic!("expected Executed");
    };
    assert_eq!((snap.cycles, snap.registers[16]), (1, 0xFF));
    assert_eq!(controller.snapshot().cycles, 1);
    assert_eq!(controller.mode(), RunMode::Paused);
}

#[test]
fn test_stop_timeout_abandons_worker() {
    init_tracing();
    let mut controller = ExecutionController::new(zero_timeout_config());
    let events = controller.subscribe();
    controller.start(image(&spin())).unwrap();
    assert!(wait_for(&events, |e| matches!(e, Event::Snapshot(s) if s.cycles >= 1)).is_some());

    assert_eq!(controller.stop(), StopOutcome::Abandoned);
    assert_eq!(controller.mode(), RunMode::Stopped);
    let diagnostic = wait_for(&events, |e| matches!(e, Event::Diagnostic(_)));
    assert_eq!(
        diagnostic,
        Some(Event::Diagnostic(
            "execution worker did not stop within 0 ms and was abandoned".to_string()
        ))
    );
    assert!(wait_for(&events, |e| *e == Event::ModeChanged(RunMode::Stopped)).is_some());
}

#[test]
fn test_last_mode_event_matches_mode_when_pause_races_completion() {
    init_tracing();
    for _ in 0..50 {
        let mut controller = ExecutionController::new(fast_config());
        let events = controller.subscribe();
        controller.start(image(&[encode::ldi(16, 1), encode::ldi(17, 2)])).unwrap();
        let _ = controller.pause();

        let deadline = Instant::now() + Duration::from_secs(5);
        while controller.mode() == RunMode::Running {
            assert!(Instant::now() < deadline, "run never settled");
            std::thread::sleep(Duration::from_millis(1));
        }
        std::thread::sleep(Duration::from_millis(20));

        let mode = controller.mode();
        let last = drain(&events).into_iter().rev().find_map(|e| match e {
            Event::ModeChanged(m) => Some(m),
            _ => None,
        });
        assert_eq!(last, Some(mode));
        let _ = controller.stop();
    }
}
