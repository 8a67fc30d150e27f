//! CPU Core Definition and Initialization.
//!
//! This module defines the `Cpu` structure, the explicitly owned architectural state of
//! one simulation run. It holds:
//! 1. **Register State:** The general-purpose register file and status flags.
//! 2. **I/O State:** The memory-mapped I/O register space.
//! 3. **Execution State:** Program counter (word index) and executed-cycle count.
//!
//! A `Cpu` is created zeroed at the start of every run and is never shared between runs.

/// Fetch-decode-execute step.
pub mod execution;

use std::fmt;

use crate::common::constants::WORD_BYTES;
use crate::core::arch::flags::StatusFlags;
use crate::core::arch::gpr::Gpr;
use crate::core::arch::io::IoSpace;

pub use execution::Writeback;

/// Architectural state of the simulated microcontroller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cpu {
    /// General-purpose registers `r0`-`r31`.
    pub regs: Gpr,
    /// I/O register space.
    pub io: IoSpace,
    flags: StatusFlags,
    /// Program counter as a word index into program memory.
    pub pc: usize,
    /// Number of instructions executed since reset.
    pub cycles: u64,
}

impl Cpu {
    /// Creates a CPU with every register, I/O location, flag and counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the CPU to its power-on state.
    pub fn reset(&mut self) {
        self.regs.clear();
        self.io.clear();
        self.flags = StatusFlags::default();
        self.pc = 0;
        self.cycles = 0;
    }

    /// Current status flags.
    pub fn flags(&self) -> StatusFlags {
        self.flags
    }

    /// Program counter as a byte address (word index x 2), the form shown to users.
    pub fn pc_byte_address(&self) -> usize {
        self.pc * WORD_BYTES
    }
}

impl fmt::Display for Cpu {
    /// Formats PC, cycle count, status byte and registers for diagnostics.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "PC: {:#06x}  Cycles: {}  SREG: {:08b}",
            self.pc_byte_address(),
            self.cycles,
            self.flags.bits()
        )?;
        write!(f, "{}", self.regs)
    }
}
