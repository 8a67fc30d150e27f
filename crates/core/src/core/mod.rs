//! Core processor implementation.
//!
//! This module contains the architectural state of the simulated microcontroller,
//! the execution units, and the step function that ties them together.

/// Architectural components (register file, I/O space, status flags).
pub mod arch;

/// CPU state and the fetch-decode-execute step.
pub mod cpu;

/// Execution units (ALU).
pub mod units;

pub use self::cpu::{Cpu, Writeback};
