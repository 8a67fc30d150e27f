//! Execution units.
//!
//! The simulated subset only needs the integer ALU; memory, branch and
//! peripheral units of a full core are not modelled.

/// Arithmetic logic unit (and, or, nibble swap).
pub mod alu;
