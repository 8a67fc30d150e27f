//! Instruction encoding and decoding utilities.
//!
//! Provides bit extraction for the AVR 16-bit instruction formats used by the
//! decoded subset, and the [`Instruction`] type the decoder produces.

use crate::common::constants::UPPER_REGISTER_BASE;

/// Bit mask for the 4-bit upper-register field (bits 4-7).
pub const RD4_MASK: u16 = 0xF;
/// Bit mask for the 5-bit register field (bits 4-8).
pub const RD5_MASK: u16 = 0x1F;
/// Bit mask for the I/O address field (bits 3-7).
pub const IO_ADDR_MASK: u16 = 0x1F;
/// Bit mask for the I/O bit number (bits 0-2).
pub const IO_BIT_MASK: u16 = 0x7;
/// Bit mask for the 12-bit relative displacement (bits 0-11).
pub const REL12_MASK: u16 = 0x0FFF;

/// Trait for extracting instruction fields from an encoded 16-bit word.
///
/// Field meaning depends on the format; callers pick the accessor that
/// matches the decoded operation.
pub trait InstructionBits {
    /// Destination register of the immediate format: `16 + bits 4-7`.
    fn rd_upper(&self) -> usize;

    /// 5-bit destination register (bits 4-8).
    fn rd(&self) -> usize;

    /// 5-bit source register: bit 9 as the high bit, bits 0-3 below it.
    fn rr(&self) -> usize;

    /// 8-bit immediate: bits 8-11 form the high nibble, bits 0-3 the low.
    fn imm8(&self) -> u8;

    /// 5-bit I/O address (bits 3-7).
    fn io_addr(&self) -> u8;

    /// Bit number within an I/O register (bits 0-2).
    fn io_bit(&self) -> u8;

    /// Raw 12-bit relative displacement field (bits 0-11), not sign-extended.
    fn rel12(&self) -> u16;
}

impl InstructionBits for u16 {
    #[inline(always)]
    fn rd_upper(&self) -> usize {
        UPPER_REGISTER_BASE + ((self >> 4) & RD4_MASK) as usize
    }

    #[inline(always)]
    fn rd(&self) -> usize {
        ((self >> 4) & RD5_MASK) as usize
    }

    #[inline(always)]
    fn rr(&self) -> usize {
        (((self >> 5) & 0x10) | (self & 0x0F)) as usize
    }

    #[inline(always)]
    fn imm8(&self) -> u8 {
        (((self >> 4) & 0xF0) | (self & 0x0F)) as u8
    }

    #[inline(always)]
    fn io_addr(&self) -> u8 {
        ((self >> 3) & IO_ADDR_MASK) as u8
    }

    #[inline(always)]
    fn io_bit(&self) -> u8 {
        (self & IO_BIT_MASK) as u8
    }

    #[inline(always)]
    fn rel12(&self) -> u16 {
        self & REL12_MASK
    }
}

/// A decoded instruction.
///
/// Register operands are indices into the register file; `k` of `Rjmp` is a
/// word displacement relative to the following instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// Load immediate: `Rd := K`.
    Ldi {
        /// Destination register (16-31).
        d: usize,
        /// Immediate value.
        k: u8,
    },
    /// Copy register: `Rd := Rr`.
    Mov {
        /// Destination register (0-31).
        d: usize,
        /// Source register (0-31).
        r: usize,
    },
    /// Logical AND with immediate: `Rd := Rd & K`, updates Z and N.
    Andi {
        /// Destination register (16-31).
        d: usize,
        /// Immediate mask.
        k: u8,
    },
    /// Logical OR with immediate: `Rd := Rd | K`, updates Z and N.
    Ori {
        /// Destination register (16-31).
        d: usize,
        /// Immediate mask.
        k: u8,
    },
    /// Exchange the nibbles of `Rd`.
    Swap {
        /// Register (0-31).
        d: usize,
    },
    /// Set bit `b` of I/O register `a`.
    Sbi {
        /// I/O address (0-31).
        a: u8,
        /// Bit number (0-7).
        b: u8,
    },
    /// Clear bit `b` of I/O register `a`.
    Cbi {
        /// I/O address (0-31).
        a: u8,
        /// Bit number (0-7).
        b: u8,
    },
    /// Relative jump: next PC is `PC + 1 + k`.
    Rjmp {
        /// Sign-extended word displacement (-2048..=2047).
        k: i16,
    },
    /// Any word outside the decoded subset. Executes as a no-op.
    Unrecognized(u16),
}

/// Coarse instruction class, used for statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstructionClass {
    /// Register loads and copies (`ldi`, `mov`).
    Transfer,
    /// Logic and bit-permutation (`andi`, `ori`, `swap`).
    Alu,
    /// I/O bit manipulation (`sbi`, `cbi`).
    Io,
    /// Control flow (`rjmp`).
    Branch,
    /// Words outside the decoded subset.
    Unrecognized,
}

impl Instruction {
    /// Returns the lowercase mnemonic (`".dw"` for unrecognized words).
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::Ldi { .. } => "ldi",
            Self::Mov { .. } => "mov",
            Self::Andi { .. } => "andi",
            Self::Ori { .. } => "ori",
            Self::Swap { .. } => "swap",
            Self::Sbi { .. } => "sbi",
            Self::Cbi { .. } => "cbi",
            Self::Rjmp { .. } => "rjmp",
            Self::Unrecognized(_) => ".dw",
        }
    }

    /// Returns the statistics class of the instruction.
    pub fn class(&self) -> InstructionClass {
        match self {
            Self::Ldi { .. } | Self::Mov { .. } => InstructionClass::Transfer,
            Self::Andi { .. } | Self::Ori { .. } | Self::Swap { .. } => InstructionClass::Alu,
            Self::Sbi { .. } | Self::Cbi { .. } => InstructionClass::Io,
            Self::Rjmp { .. } => InstructionClass::Branch,
            Self::Unrecognized(_) => InstructionClass::Unrecognized,
        }
    }
}
