//! ALU logical operations.
//!
//! Implements bitwise AND and OR on 8-bit operands, as used by `andi` and `ori`.

/// Bitwise AND of `a` and `b`.
#[inline]
pub fn and(a: u8, b: u8) -> u8 {
    a & b
}

/// Bitwise OR of `a` and `b`.
#[inline]
pub fn or(a: u8, b: u8) -> u8 {
    a | b
}
