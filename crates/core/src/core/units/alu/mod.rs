//! Arithmetic Logic Unit (ALU).
//!
//! This module implements the 8-bit ALU used by the execute step. Only the
//! operations the decoded instruction subset needs are present.
//!
//! Operations are organized into submodules by category:
//! - [`logic`]:  And, Or
//! - [`shifts`]: Swap (nibble rotation)
//!
//! Flag derivation is not done here; the caller feeds the result into
//! [`StatusFlags`](crate::core::arch::flags::StatusFlags) when the instruction affects flags.

/// Bitwise logical operations (and, or).
pub mod logic;

/// Rotations (nibble swap).
pub mod shifts;

/// ALU operation selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AluOp {
    /// Bitwise AND.
    And,
    /// Bitwise OR.
    Or,
    /// Exchange the high and low nibble of the first operand; the second is ignored.
    Swap,
}

/// Arithmetic Logic Unit for 8-bit register operations.
#[derive(Debug)]
pub struct Alu;

impl Alu {
    /// Executes an 8-bit ALU operation.
    ///
    /// # Arguments
    ///
    /// * `op` - The ALU operation to perform
    /// * `a`  - First operand (register value)
    /// * `b`  - Second operand (immediate), unused by unary operations
    ///
    /// # Examples
    ///
    /// ```
    /// use avrsim_core::core::units::alu::{Alu, AluOp};
    ///
    /// assert_eq!(Alu::execute(AluOp::And, 0xF0, 0x3C), 0x30);
    /// assert_eq!(Alu::execute(AluOp::Or, 0xF0, 0x0F), 0xFF);
    /// assert_eq!(Alu::execute(AluOp::Swap, 0xA5, 0), 0x5A);
    /// ```
    pub fn execute(op: AluOp, a: u8, b: u8) -> u8 {
        match op {
            AluOp::And => logic::and(a, b),
            AluOp::Or => logic::or(a, b),
            AluOp::Swap => shifts::swap_nibbles(a),
        }
    }
}
