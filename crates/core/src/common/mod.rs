//! Common types and constants used throughout the AVR simulator.
//!
//! This module provides the building blocks shared by every other component:
//! 1. **Constants:** Program-memory capacity, register and I/O space sizes.
//! 2. **Error Handling:** Load, execution, control, toolchain and config errors.

/// Common constants used throughout the simulator.
pub mod constants;

/// Error types for loading, executing and controlling a simulation.
pub mod error;

pub use constants::{IO_SPACE_SIZE, PROGRAM_CAPACITY_WORDS, REGISTER_COUNT};
pub use error::{ConfigError, ControlError, ExecutionError, LoadError, ToolchainError};
