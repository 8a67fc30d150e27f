//! # Breakpoint Tests
//!
//! Breakpoints pause a running program before the instruction at their word
//! address executes; resuming executes that instruction without re-triggering.

use avrsim_core::sim::controller::{ExecutionController, StepReport};
use avrsim_core::sim::mode::RunMode;
use avrsim_core::sim::observer::Event;
use pretty_assertions::assert_eq;

use crate::common::encode;
use crate::common::harness::{fast_config, image, init_tracing, wait_for};

fn program() -> Vec<u16> {
    vec![
        encode::ldi(16, 1),
        encode::ldi(17, 2),
        encode::ldi(18, 3),
        encode::rjmp(-1),
    ]
}

#[test]
fn test_breakpoint_set_management() {
    let controller = ExecutionController::new(fast_config());
    assert!(controller.add_breakpoint(3));
    assert!(controller.add_breakpoint(1));
    assert!(!controller.add_breakpoint(3));
    assert_eq!(controller.breakpoints(), vec![1, 3]);

    assert!(controller.remove_breakpoint(1));
    assert!(!controller.remove_breakpoint(1));
    assert_eq!(controller.breakpoints(), vec![3]);

    controller.clear_breakpoints();
    assert!(controller.breakpoints().is_empty());
}

#[test]
fn test_breakpoint_pauses_before_instruction() {
    init_tracing();
    let mut controller = ExecutionController::new(fast_config());
    let events = controller.subscribe();
    let _ = controller.add_breakpoint(2);
    controller.start(image(&program())).unwrap();

    assert_eq!(
        wait_for(&events, |e| matches!(e, Event::BreakpointHit { .. })),
        Some(Event::BreakpointHit { pc: 4 })
    );
    assert_eq!(controller.mode(), RunMode::Paused);

    let snap = controller.snapshot();
    assert_eq!(snap.pc, 4);
    assert_eq!((snap.registers[16], snap.registers[17], snap.registers[18]), (1, 2, 0));
    assert_eq!(controller.stats().breakpoints_hit, 1);

    let StepReport::Executed(after) = controller.step().unwrap() else {
        panic!("expected Executed");
    };
    assert_eq!(after.registers[18], 3);
    assert_eq!(controller.mode(), RunMode::Paused);
}

#[test]
fn test_resume_executes_breakpoint_instruction_once() {
    init_tracing();
    let mut controller = ExecutionController::new(fast_config());
    let events = controller.subscribe();
    let _ = controller.add_breakpoint(3);
    controller.start(image(&program())).unwrap();

    assert!(wait_for(&events, |e| matches!(e, Event::BreakpointHit { pc: 6 })).is_some());
    assert_eq!(controller.snapshot().cycles, 3);

    // The self-jump lands back on the breakpoint after exactly one instruction.
    controller.resume().unwrap();
    assert!(wait_for(&events, |e| matches!(e, Event::BreakpointHit { pc: 6 })).is_some());
    assert_eq!(controller.mode(), RunMode::Paused);
    assert_eq!(controller.snapshot().cycles, 4);
    assert_eq!(controller.stats().breakpoints_hit, 2);
}

#[test]
fn test_breakpoints_do_not_fire_while_stepping() {
    let mut controller = ExecutionController::new(fast_config());
    let _ = controller.add_breakpoint(1);
    controller.start_paused(image(&program())).unwrap();

    for _ in 0..3 {
        assert!(matches!(controller.step().unwrap(), StepReport::Executed(_)));
    }
    assert_eq!(controller.stats().breakpoints_hit, 0);
}

#[test]
fn test_removed_breakpoint_no_longer_pauses() {
    let mut controller = ExecutionController::new(fast_config());
    let events = controller.subscribe();
    let _ = controller.add_breakpoint(1);
    let _ = controller.remove_breakpoint(1);
    controller.start(image(&program()[..3])).unwrap();

    let completed = wait_for(&events, |e| matches!(e, Event::Completed { .. } | Event::BreakpointHit { .. }));
    assert_eq!(completed, Some(Event::Completed { cycles: 3 }));
}
