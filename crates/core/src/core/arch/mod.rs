//! AVR architectural state components.
//!
//! This module contains the storage that makes up the programmer-visible machine state:
//! 1. **GPRs:** The 32 x 8-bit general-purpose register file.
//! 2. **I/O:** The 64-register I/O space and its port bindings.
//! 3. **Flags:** The derived status flags.

/// Status flag storage and derivation.
pub mod flags;

/// General-Purpose Register file implementation.
pub mod gpr;

/// I/O register space and port bindings.
pub mod io;
