//! # Simulation Tests
//!
//! Tests for object loading, the stepping engine, the observer channel and the
//! threaded execution controller.
