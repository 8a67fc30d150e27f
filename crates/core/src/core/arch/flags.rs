//! Status Flags.
//!
//! Derived condition flags laid out like the AVR `SREG`. Only Zero and Negative are
//! produced by the implemented instructions; Carry and Overflow are held for
//! arithmetic that is not modelled yet and always read as clear.

/// Bit position of the Carry flag in the packed status byte.
pub const SREG_C: u8 = 0;
/// Bit position of the Zero flag in the packed status byte.
pub const SREG_Z: u8 = 1;
/// Bit position of the Negative flag in the packed status byte.
pub const SREG_N: u8 = 2;
/// Bit position of the Overflow flag in the packed status byte.
pub const SREG_V: u8 = 3;

/// Condition flags computed from the result of flag-affecting operations.
///
/// There is no setter: flags change only through [`StatusFlags::update_zn`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusFlags {
    carry: bool,
    zero: bool,
    negative: bool,
    overflow: bool,
}

impl StatusFlags {
    /// Carry flag.
    pub fn carry(&self) -> bool {
        self.carry
    }

    /// Zero flag: the last flag-affecting result was 0.
    pub fn zero(&self) -> bool {
        self.zero
    }

    /// Negative flag: bit 7 of the last flag-affecting result.
    pub fn negative(&self) -> bool {
        self.negative
    }

    /// Overflow flag.
    pub fn overflow(&self) -> bool {
        self.overflow
    }

    /// Updates Zero and Negative from an 8-bit result, leaving the others untouched.
    ///
    /// Returns `true` if either flag changed.
    pub(crate) fn update_zn(&mut self, result: u8) -> bool {
        let before = *self;
        self.zero = result == 0;
        self.negative = result & 0x80 != 0;
        before != *self
    }

    /// Packs the flags into an `SREG`-style byte.
    pub fn bits(&self) -> u8 {
        (u8::from(self.carry) << SREG_C)
            | (u8::from(self.zero) << SREG_Z)
            | (u8::from(self.negative) << SREG_N)
            | (u8::from(self.overflow) << SREG_V)
    }
}
