//! AVR microcontroller simulator library.
//!
//! This crate simulates a subset of the 8-bit AVR instruction set with the following:
//! 1. **Core:** Register file, I/O space, status flags and the fetch-decode-execute step.
//! 2. **ISA:** Decoding and disassembly for `ldi`, `mov`, `andi`, `ori`, `swap`, `sbi`,
//!    `cbi` and `rjmp`; every other word executes as a no-op.
//! 3. **Simulation:** Intel-HEX loader, program image, and a threaded execution
//!    controller that publishes state changes to observers.
//! 4. **Toolchain:** Assembling source with the external `avr-gcc` tool chain.
//! 5. **Support:** Configuration and statistics collection.

/// Common constants and error types.
pub mod common;
/// Simulator configuration (defaults, loader and port settings).
pub mod config;
/// CPU core (architectural state, execution units, step function).
pub mod core;
/// Instruction set (opcodes, decode, instruction, disassembly).
pub mod isa;
/// Loader, simulator, controller and observer.
pub mod sim;
/// Simulation statistics collection and reporting.
pub mod stats;
/// External assembler integration.
pub mod toolchain;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Architectural state of one run.
pub use crate::core::Cpu;
/// Threaded execution controller; the main entry point for front ends.
pub use crate::sim::controller::{ExecutionController, StepReport, StopOutcome};
/// Loaded program memory.
pub use crate::sim::image::ProgramImage;
/// Events and the observer that fans them out.
pub use crate::sim::observer::{Event, Observer, PortChange, Snapshot};
/// Single-threaded stepping engine.
pub use crate::sim::simulator::Simulator;
