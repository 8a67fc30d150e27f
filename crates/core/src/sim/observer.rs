//! State Observation.
//!
//! This module carries state-change notifications from the execution worker to any
//! number of consumers. It provides:
//! 1. **Snapshots:** Registers, status byte, PC (as a byte address) and cycle count.
//! 2. **Port Deltas:** Named port plus new 8-bit value whenever a bound I/O address is written.
//! 3. **Control and Log Events:** Mode changes, breakpoint hits, completion and diagnostics.
//!
//! The core never holds a reference to a renderer; consumers subscribe and drain a
//! channel on their own thread.

use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::common::constants::REGISTER_COUNT;
use crate::core::Cpu;
use crate::sim::mode::RunMode;

/// Full view of the observable architectural state after a step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Values of `r0`-`r31`.
    pub registers: [u8; REGISTER_COUNT],
    /// Packed status flags (`SREG` layout).
    pub sreg: u8,
    /// Program counter as a byte address (word index x 2).
    pub pc: usize,
    /// Executed instruction count.
    pub cycles: u64,
}

impl From<&Cpu> for Snapshot {
    fn from(cpu: &Cpu) -> Self {
        Self {
            registers: cpu.regs.snapshot(),
            sreg: cpu.flags().bits(),
            pc: cpu.pc_byte_address(),
            cycles: cpu.cycles,
        }
    }
}

/// New value of a named port after an I/O write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortChange {
    /// Port name, e.g. `PORTB`.
    pub name: String,
    /// I/O address of the port.
    pub address: u8,
    /// Full 8-bit value; bit `i` drives indicator `i`.
    pub value: u8,
}

impl PortChange {
    /// Returns whether bit `bit` (0-7) of the port is set.
    pub fn bit(&self, bit: u8) -> bool {
        self.value & (1 << (bit & 7)) != 0
    }
}

/// Notification delivered to subscribers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Architectural state after a step (or at the start of a run).
    Snapshot(Snapshot),
    /// A port's value was written.
    Port(PortChange),
    /// The controller entered a new mode.
    ModeChanged(RunMode),
    /// Execution paused before the instruction at this byte address.
    BreakpointHit {
        /// Byte address of the breakpoint.
        pc: usize,
    },
    /// The program counter ran off the end of the image; the run finished normally.
    Completed {
        /// Instructions executed during the run.
        cycles: u64,
    },
    /// Informational progress message.
    Log(String),
    /// Error or anomaly the user should see (load failures, execution errors, leaked workers).
    Diagnostic(String),
}

/// Fan-out publisher for [`Event`]s.
///
/// Cloning yields another handle to the same subscriber list. Subscribers whose receiver
/// has been dropped are pruned on the next publish.
#[derive(Clone, Debug, Default)]
pub struct Observer {
    subscribers: Arc<Mutex<Vec<Sender<Event>>>>,
}

impl Observer {
    /// Creates an observer with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber and returns its receiving end.
    pub fn subscribe(&self) -> Receiver<Event> {
        let (tx, rx) = channel();
        self.lock().push(tx);
        rx
    }

    /// Delivers `event` to every live subscriber.
    pub fn publish(&self, event: Event) {
        self.lock().retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of registered subscribers.
    ///
    /// `subscribe` counts immediately; a dropped receiver is only removed by the next
    /// `publish`.
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Sender<Event>>> {
        // A publisher that panicked mid-push leaves the list intact.
        self.subscribers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
