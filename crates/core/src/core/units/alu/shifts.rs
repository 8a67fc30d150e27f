//! ALU rotations.

/// Exchanges the high and low nibble of `val`.
///
/// Equivalent to a 4-bit rotation, so applying it twice is the identity.
#[inline]
pub fn swap_nibbles(val: u8) -> u8 {
    val.rotate_left(4)
}
