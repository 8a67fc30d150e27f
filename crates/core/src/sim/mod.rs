//! Simulation: program loading, execution and control.
//!
//! Provides the object loader, the program image, the single-threaded simulator,
//! and the threaded execution controller with its observer channel.

/// Threaded run/pause/step/stop state machine.
pub mod controller;
/// Loaded program memory.
pub mod image;
/// Intel-HEX object file loader.
pub mod loader;
/// Controller run modes.
pub mod mode;
/// Event publication to front ends.
pub mod observer;
/// CPU plus image stepping engine.
pub mod simulator;
