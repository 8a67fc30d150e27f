//! # End-to-End Scenarios
//!
//! Small programs run through the controller from start to completion or fault.

use avrsim_core::common::ExecutionError;
use avrsim_core::sim::controller::{ExecutionController, StepReport, StopOutcome};
use avrsim_core::sim::mode::RunMode;
use avrsim_core::sim::observer::{Event, PortChange};
use avrsim_core::sim::image::ProgramImage;
use pretty_assertions::assert_eq;

use crate::common::encode;
use crate::common::harness::{drain, fast_config, hex_from_words, image, init_tracing, wait_for, write_temp};

#[test]
fn test_ldi_and_self_jump() {
    init_tracing();
    let mut controller = ExecutionController::new(fast_config());
    controller.start_paused(image(&[0xEF0F, 0xCFFF])).unwrap();

    let StepReport::Executed(first) = controller.step().unwrap() else {
        panic!("expected Executed");
    };
    assert_eq!(first.registers[16], 0xFF);

    let StepReport::Executed(second) = controller.step().unwrap() else {
        panic!("expected Executed");
    };
    assert_eq!(second.pc, 2);
    assert_eq!(second.cycles, 2);

    let StepReport::Executed(third) = controller.step().unwrap() else {
        panic!("expected Executed");
    };
    assert_eq!(third.pc, 2);
    assert_eq!(third.cycles, 3);
}

#[test]
fn test_run_to_completion() {
    init_tracing();
    let mut controller = ExecutionController::new(fast_config());
    let events = controller.subscribe();
    controller
        .start(image(&[encode::ldi(16, 0x0F), encode::swap(16), encode::ori(16, 0x01)]))
        .unwrap();

    let done = wait_for(&events, |e| matches!(e, Event::Completed { .. }));
    assert_eq!(done, Some(Event::Completed { cycles: 3 }));
    assert_eq!(controller.mode(), RunMode::Stopped);
    assert_eq!(controller.snapshot().registers[16], 0xF1);
    assert_eq!(controller.snapshot().pc, 6);
    assert_eq!(controller.stats().cycles, 3);
    assert_eq!(controller.stats().inst_alu, 2);
    assert!(wait_for(&events, |e| *e == Event::ModeChanged(RunMode::Stopped)).is_some());

    assert_eq!(controller.stop(), StopOutcome::AlreadyStopped);
}

#[test]
fn test_empty_image_completes_immediately() {
    let mut controller = ExecutionController::new(fast_config());
    let events = controller.subscribe();
    controller.start(ProgramImage::default()).unwrap();
    assert_eq!(
        wait_for(&events, |e| matches!(e, Event::Completed { .. })),
        Some(Event::Completed { cycles: 0 })
    );
}

#[test]
fn test_step_into_completion() {
    let mut controller = ExecutionController::new(fast_config());
    controller.start_paused(image(&[encode::ldi(18, 7)])).unwrap();

    match controller.step().unwrap() {
        StepReport::Completed(snap) => {
            assert_eq!(snap.registers[18], 7);
            assert_eq!(snap.cycles, 1);
        }
        other => panic!("expected Completed, got {other:?}"),
    }
    assert_eq!(controller.mode(), RunMode::Stopped);
    assert!(controller.step().is_err());
}

#[test]
fn test_restart_after_completion() {
    let mut controller = ExecutionController::new(fast_config());
    let events = controller.subscribe();
    controller.start(image(&[encode::ldi(16, 1)])).unwrap();
    assert!(wait_for(&events, |e| matches!(e, Event::Completed { .. })).is_some());

    controller.start(image(&[encode::ldi(16, 2), encode::ldi(17, 3)])).unwrap();
    assert_eq!(
        wait_for(&events, |e| matches!(e, Event::Completed { .. })),
        Some(Event::Completed { cycles: 2 })
    );
    assert_eq!(controller.snapshot().registers[17], 3);
}

#[test]
fn test_jump_fault_halts_run() {
    init_tracing();
    let mut controller = ExecutionController::new(fast_config());
    let events = controller.subscribe();
    controller.start_paused(image(&[encode::rjmp(-2)])).unwrap();

    let report = controller.step().unwrap();
    assert_eq!(report, StepReport::Faulted(ExecutionError::JumpOutOfRange { pc: 0, target: -1 }));
    assert_eq!(controller.mode(), RunMode::Stopped);
    assert!(
        drain(&events)
            .iter()
            .any(|e| matches!(e, Event::Diagnostic(msg) if msg.contains("execution halted")))
    );
}

#[test]
fn test_port_events_follow_bit_writes() {
    let mut controller = ExecutionController::new(fast_config());
    controller
        .start_paused(image(&[encode::sbi(0x18, 0), encode::sbi(0x18, 2), encode::cbi(0x18, 0), encode::rjmp(-1)]))
        .unwrap();
    let events = controller.subscribe();

    for _ in 0..3 {
        let _ = controller.step().unwrap();
    }

    let values: Vec<u8> = drain(&events)
        .into_iter()
        .filter_map(|e| match e {
            Event::Port(PortChange { name, value, .. }) if name == "PORTB" => Some(value),
            _ => None,
        })
        .collect();
    assert_eq!(values, vec![0b001, 0b101, 0b100]);
}

#[test]
fn test_load_and_start_from_file() {
    init_tracing();
    let file = write_temp(&hex_from_words(&[encode::ldi(16, 0xAA), encode::mov(0, 16)]));
    let mut controller = ExecutionController::new(fast_config());
    let events = controller.subscribe();

    controller.load_and_start(file.path()).unwrap();
    assert!(matches!(
        wait_for(&events, |e| matches!(e, Event::Log(_))),
        Some(Event::Log(msg)) if msg.starts_with("loaded 2 words")
    ));
    assert!(wait_for(&events, |e| matches!(e, Event::Completed { cycles: 2 })).is_some());
    assert_eq!(controller.snapshot().registers[0], 0xAA);
}
