//! Run Modes.
//!
//! This module defines the states of the execution controller. It implements the following:
//! 1. **Mode Classification:** Stopped, Running and Paused.
//! 2. **Serialization:** Conversion to and from `u8` so the mode can live in an atomic.
//! 3. **Observability:** Human-readable naming and display formatting.

/// Execution controller state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RunMode {
    /// No run is active. Initial state.
    #[default]
    Stopped = 0,

    /// The worker executes instructions continuously, pacing each step.
    Running = 1,

    /// The worker is alive but only executes on explicit single-step requests.
    Paused = 2,
}

impl RunMode {
    /// Converts a `u8` value to a run mode.
    ///
    /// # Returns
    ///
    /// The corresponding `RunMode`, defaulting to `Stopped` for invalid values.
    pub fn from_u8(val: u8) -> Self {
        match val {
            1 => Self::Running,
            2 => Self::Paused,
            _ => Self::Stopped,
        }
    }

    /// Converts a run mode to its `u8` representation.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Returns the human-readable name of the run mode.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
            Self::Paused => "paused",
        }
    }

    /// Whether a worker is attached (running or paused).
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Stopped)
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
