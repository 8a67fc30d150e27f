//! Simulation statistics collection and reporting.
//!
//! This module tracks per-run execution metrics. It provides:
//! 1. **Cycles:** Executed instructions and host time, with derived instructions per second.
//! 2. **Instruction mix:** Counts by class (transfer, ALU, I/O, branch).
//! 3. **Unrecognized words:** How many executed words fell outside the decoded subset.

use std::fmt;
use std::time::{Duration, Instant};

use crate::isa::instruction::{Instruction, InstructionClass};

/// Simulation statistics for a single run.
#[derive(Clone, Debug)]
pub struct SimStats {
    start_time: Instant,
    /// Total executed instructions (one cycle each in this model).
    pub cycles: u64,
    /// Count of `ldi` / `mov` instructions executed.
    pub inst_transfer: u64,
    /// Count of `andi` / `ori` / `swap` instructions executed.
    pub inst_alu: u64,
    /// Count of `sbi` / `cbi` instructions executed.
    pub inst_io: u64,
    /// Count of `rjmp` instructions executed.
    pub inst_branch: u64,
    /// Count of words executed as no-ops because they are outside the decoded subset.
    pub inst_unrecognized: u64,
    /// Number of times a breakpoint paused the run.
    pub breakpoints_hit: u64,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: 0,
            inst_transfer: 0,
            inst_alu: 0,
            inst_io: 0,
            inst_branch: 0,
            inst_unrecognized: 0,
            breakpoints_hit: 0,
        }
    }
}

impl SimStats {
    /// Records one executed instruction.
    pub fn record(&mut self, inst: &Instruction) {
        self.cycles += 1;
        match inst.class() {
            InstructionClass::Transfer => self.inst_transfer += 1,
            InstructionClass::Alu => self.inst_alu += 1,
            InstructionClass::Io => self.inst_io += 1,
            InstructionClass::Branch => self.inst_branch += 1,
            InstructionClass::Unrecognized => self.inst_unrecognized += 1,
        }
    }

    /// Host time since the statistics were created.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Instructions actually interpreted (excludes unrecognized no-ops).
    pub fn instructions_recognized(&self) -> u64 {
        self.cycles - self.inst_unrecognized
    }
}

impl fmt::Display for SimStats {
    /// Renders the report table.
    ///
    /// Percentages divide by `max(cycles, 1)`, so an empty run prints zeros.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seconds = self.elapsed().as_secs_f64();
        let cyc = self.cycles.max(1) as f64;
        let ips = if seconds > 0.0 {
            self.cycles as f64 / seconds
        } else {
            0.0
        };
        let pct = |n: u64| (n as f64 / cyc) * 100.0;

        writeln!(f, "==========================================================")?;
        writeln!(f, "AVR SIMULATION STATISTICS")?;
        writeln!(f, "==========================================================")?;
        writeln!(f, "host_seconds             {seconds:.4} s")?;
        writeln!(f, "sim_cycles               {}", self.cycles)?;
        writeln!(f, "sim_ips                  {ips:.2}")?;
        writeln!(f, "breakpoints_hit          {}", self.breakpoints_hit)?;
        writeln!(f, "----------------------------------------------------------")?;
        writeln!(f, "INSTRUCTION MIX")?;
        writeln!(f, "  op.transfer            {} ({:.2}%)", self.inst_transfer, pct(self.inst_transfer))?;
        writeln!(f, "  op.alu                 {} ({:.2}%)", self.inst_alu, pct(self.inst_alu))?;
        writeln!(f, "  op.io                  {} ({:.2}%)", self.inst_io, pct(self.inst_io))?;
        writeln!(f, "  op.branch              {} ({:.2}%)", self.inst_branch, pct(self.inst_branch))?;
        writeln!(
            f,
            "  op.unrecognized        {} ({:.2}%)",
            self.inst_unrecognized,
            pct(self.inst_unrecognized)
        )?;
        write!(f, "----------------------------------------------------------")
    }
}
