//! Global System Constants.
//!
//! This module defines the architectural sizes shared across the simulator. It includes:
//! 1. **Memory Constants:** Program-memory capacity and word size.
//! 2. **Register Constants:** General-purpose register count and the upper register bank.
//! 3. **I/O Constants:** Size of the memory-mapped I/O register space.

/// Program memory capacity in 16-bit words (32 KiB of code space).
pub const PROGRAM_CAPACITY_WORDS: usize = 16_384;

/// Size of one program-memory word in bytes.
pub const WORD_BYTES: usize = 2;

/// Number of 8-bit general-purpose registers (`r0`-`r31`).
pub const REGISTER_COUNT: usize = 32;

/// First register reachable by the immediate-operand instructions (`r16`).
pub const UPPER_REGISTER_BASE: usize = 16;

/// Number of 8-bit registers in the I/O space (6-bit address).
pub const IO_SPACE_SIZE: usize = 64;

/// Mask applied to I/O addresses so they stay within the 6-bit space.
pub const IO_ADDRESS_MASK: u8 = 0x3F;
