//! AVR General-Purpose Register File.
//!
//! This module implements the 32-entry, 8-bit register file. It performs the following:
//! 1. **Storage:** Maintains registers `r0`-`r31`, all independent (no aliasing).
//! 2. **Observability:** Provides snapshots and a formatted dump of the register state.

use std::fmt;

use crate::common::constants::REGISTER_COUNT;

/// General-Purpose Register file.
///
/// There is no hardwired zero register; every index is plain storage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Gpr {
    regs: [u8; REGISTER_COUNT],
}

impl Gpr {
    /// Creates a new register file with all registers initialized to zero.
    pub fn new() -> Self {
        Self {
            regs: [0; REGISTER_COUNT],
        }
    }

    /// Reads a general-purpose register value.
    ///
    /// # Arguments
    ///
    /// * `idx` - Register index (0-31).
    ///
    /// # Returns
    ///
    /// The 8-bit value stored in the specified register.
    pub fn read(&self, idx: usize) -> u8 {
        self.regs[idx]
    }

    /// Writes a value to a general-purpose register.
    ///
    /// # Arguments
    ///
    /// * `idx` - Register index (0-31).
    /// * `val` - The 8-bit value to write.
    pub fn write(&mut self, idx: usize, val: u8) {
        self.regs[idx] = val;
    }

    /// Returns a copy of all 32 register values.
    pub fn snapshot(&self) -> [u8; REGISTER_COUNT] {
        self.regs
    }

    /// Zeroes every register.
    pub fn clear(&mut self) {
        self.regs = [0; REGISTER_COUNT];
    }
}

impl fmt::Display for Gpr {
    /// Formats the registers four per line, e.g. `r0 =0x00 r1 =0x00 ...`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (line, values) in self.regs.chunks(4).enumerate() {
            let base = line * 4;
            for (i, val) in values.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write!(f, "r{:<2}={:#04x}", base + i, val)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
