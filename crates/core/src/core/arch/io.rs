//! Memory-Mapped I/O Register Space.
//!
//! This module implements the 64-entry I/O space addressed by `sbi`/`cbi`. It provides:
//! 1. **Storage:** 64 independent 8-bit registers behind a 6-bit address.
//! 2. **Bit Access:** Single-bit set and clear, the only I/O writes this subset performs.
//! 3. **Port Binding:** A lookup from I/O address to the named port an observer renders.

use crate::common::constants::{IO_ADDRESS_MASK, IO_SPACE_SIZE};
use crate::config::PortConfig;

/// The I/O register space.
///
/// Addresses are masked to 6 bits, so every `u8` address is valid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IoSpace {
    regs: [u8; IO_SPACE_SIZE],
}

impl Default for IoSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl IoSpace {
    /// Creates a zeroed I/O space.
    pub fn new() -> Self {
        Self {
            regs: [0; IO_SPACE_SIZE],
        }
    }

    /// Reads the register at `addr`.
    pub fn read(&self, addr: u8) -> u8 {
        self.regs[usize::from(addr & IO_ADDRESS_MASK)]
    }

    /// Writes `val` to the register at `addr`.
    pub fn write(&mut self, addr: u8, val: u8) {
        self.regs[usize::from(addr & IO_ADDRESS_MASK)] = val;
    }

    /// Sets bit `bit` (0-7) of the register at `addr` and returns the new value.
    pub fn set_bit(&mut self, addr: u8, bit: u8) -> u8 {
        let val = self.read(addr) | (1 << (bit & 7));
        self.write(addr, val);
        val
    }

    /// Clears bit `bit` (0-7) of the register at `addr` and returns the new value.
    pub fn clear_bit(&mut self, addr: u8, bit: u8) -> u8 {
        let val = self.read(addr) & !(1 << (bit & 7));
        self.write(addr, val);
        val
    }

    /// Zeroes every register.
    pub fn clear(&mut self) {
        self.regs = [0; IO_SPACE_SIZE];
    }
}

/// Maps I/O addresses to port names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PortMap {
    bindings: Vec<(u8, String)>,
}

impl PortMap {
    /// Builds a port map from configured bindings.
    pub fn new(ports: &[PortConfig]) -> Self {
        Self {
            bindings: ports
                .iter()
                .map(|p| (p.address & IO_ADDRESS_MASK, p.name.clone()))
                .collect(),
        }
    }

    /// Returns the name of the port bound to `addr`, if any.
    pub fn name(&self, addr: u8) -> Option<&str> {
        let addr = addr & IO_ADDRESS_MASK;
        self.bindings
            .iter()
            .find(|(a, _)| *a == addr)
            .map(|(_, name)| name.as_str())
    }

    /// Iterates over `(address, name)` bindings in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &str)> {
        self.bindings.iter().map(|(a, n)| (*a, n.as_str()))
    }
}
