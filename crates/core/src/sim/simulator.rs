//! Simulator: owns the CPU and the program image side-by-side.
//!
//! The simulator is the single-threaded execution engine. It performs:
//! 1. **Stepping:** One fetch-decode-execute per call against the owned image.
//! 2. **Port Resolution:** Maps I/O writes onto named ports for observers.
//! 3. **Accounting:** Records every executed instruction in [`SimStats`].
//!
//! The execution controller drives a `Simulator` from its worker thread; tests and the
//! CLI can also drive one directly.

use std::collections::HashSet;

use tracing::{trace, warn};

use crate::common::error::ExecutionError;
use crate::config::Config;
use crate::core::arch::io::PortMap;
use crate::core::{Cpu, Writeback};
use crate::isa::disasm::format_instruction;
use crate::isa::instruction::Instruction;
use crate::sim::image::ProgramImage;
use crate::sim::observer::PortChange;
use crate::stats::SimStats;

/// Result of one executed step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepOutcome {
    /// Word index of the executed instruction.
    pub pc: usize,
    /// Decoded instruction.
    pub instruction: Instruction,
    /// Register, I/O and flag changes.
    pub writeback: Writeback,
    /// Set when the step wrote an I/O address bound to a port.
    pub port: Option<PortChange>,
}

/// Top-level simulator: architectural state plus the program it runs.
#[derive(Debug)]
pub struct Simulator {
    /// CPU architectural state.
    pub cpu: Cpu,
    /// Counters for the current run.
    pub stats: SimStats,
    image: ProgramImage,
    ports: PortMap,
    trace: bool,
    seen_unrecognized: HashSet<u16>,
}

impl Simulator {
    /// Creates a simulator with a zeroed CPU positioned at word 0 of `image`.
    pub fn new(image: ProgramImage, config: &Config) -> Self {
        Self {
            cpu: Cpu::new(),
            stats: SimStats::default(),
            image,
            ports: PortMap::new(&config.ports),
            trace: config.general.trace_instructions,
            seen_unrecognized: HashSet::new(),
        }
    }

    /// Returns CPU state and statistics to the start of a run.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.stats = SimStats::default();
        self.seen_unrecognized.clear();
    }

    /// The program being executed.
    pub fn image(&self) -> &ProgramImage {
        &self.image
    }

    /// Port bindings used to name I/O writes.
    pub fn ports(&self) -> &PortMap {
        &self.ports
    }

    /// Whether the program counter has run off the end of the image.
    ///
    /// This is the normal terminal condition of a run, not an error.
    pub fn at_end(&self) -> bool {
        self.cpu.pc >= self.image.len()
    }

    /// Executes the instruction at the program counter.
    ///
    /// # Errors
    ///
    /// Propagates [`ExecutionError`] from [`Cpu::step`]; the CPU is unchanged on error.
    pub fn step(&mut self) -> Result<StepOutcome, ExecutionError> {
        let pc = self.cpu.pc;
        let (instruction, writeback) = self.cpu.step(&self.image)?;

        if self.trace {
            trace!(pc = pc * 2, "{}", format_instruction(&instruction));
        }
        if let Instruction::Unrecognized(word) = instruction
            && self.seen_unrecognized.insert(word)
        {
            warn!(
                pc = pc * 2,
                word = %format!("{word:#06x}"),
                "unrecognized instruction executed as no-op"
            );
        }
        self.stats.record(&instruction);

        let port = writeback.io.and_then(|(address, value)| {
            self.ports.name(address).map(|name| PortChange {
                name: name.to_string(),
                address,
                value,
            })
        });

        Ok(StepOutcome {
            pc,
            instruction,
            writeback,
            port,
        })
    }

    /// Steps until the image ends or `max_cycles` instructions have run.
    ///
    /// # Returns
    ///
    /// The number of instructions executed by this call.
    ///
    /// # Errors
    ///
    /// The first [`ExecutionError`] encountered.
    pub fn run(&mut self, max_cycles: Option<u64>) -> Result<u64, ExecutionError> {
        let mut executed = 0;
        while !self.at_end() && max_cycles.is_none_or(|max| executed < max) {
            let _ = self.step()?;
            executed += 1;
        }
        Ok(executed)
    }
}
