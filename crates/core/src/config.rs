//! Configuration system for the AVR simulator.
//!
//! This module defines the configuration structures used to parameterize a run. It provides:
//! 1. **Defaults:** Pacing delay, stop timeout, program capacity and the ATmega32 port map.
//! 2. **Structures:** General (execution control), loader and port binding settings.
//! 3. **Validation:** Rejects port maps and capacities the architecture cannot express.
//!
//! Configuration is supplied as JSON (`Config::from_json_str` / `Config::from_file`) or
//! built with `Config::default()` for the CLI.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::common::constants::{IO_SPACE_SIZE, PROGRAM_CAPACITY_WORDS};
use crate::common::error::ConfigError;

/// Default configuration constants for the simulator.
mod defaults {
    /// Delay inserted after every executed instruction while running (milliseconds).
    ///
    /// A presentation knob so register and port changes are perceptible, not a
    /// model of hardware timing.
    pub const STEP_DELAY_MS: u64 = 50;

    /// Upper bound on how long `stop` waits for the worker to exit (milliseconds).
    pub const STOP_TIMEOUT_MS: u64 = 200;

    /// Program memory capacity in words.
    pub const CAPACITY_WORDS: usize = super::PROGRAM_CAPACITY_WORDS;

    /// Port bindings of the ATmega32 (`PORTx` data registers).
    pub const PORTS: [(&str, u8); 4] = [
        ("PORTA", 0x1B),
        ("PORTB", 0x18),
        ("PORTC", 0x15),
        ("PORTD", 0x12),
    ];
}

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Execution control settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Object loader settings.
    #[serde(default)]
    pub loader: LoaderConfig,
    /// I/O addresses reported to observers as named ports.
    #[serde(default = "Config::default_ports")]
    pub ports: Vec<PortConfig>,
}

impl Config {
    fn default_ports() -> Vec<PortConfig> {
        defaults::PORTS
            .iter()
            .map(|&(name, address)| PortConfig {
                name: name.to_string(),
                address,
            })
            .collect()
    }

    /// Parses and validates a configuration from a JSON string.
    ///
    /// Missing sections and fields fall back to their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Checks the configuration for values the simulator cannot honor.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the stop timeout is zero, the program capacity
    /// is zero or larger than program memory, a port address lies outside the I/O space, or
    /// two ports share a name or an address.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.general.stop_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "general.stop_timeout_ms must be at least 1".to_string(),
            ));
        }

        let capacity = self.loader.capacity_words;
        if capacity == 0 || capacity > PROGRAM_CAPACITY_WORDS {
            return Err(ConfigError::Invalid(format!(
                "loader.capacity_words must be in 1..={PROGRAM_CAPACITY_WORDS}, got {capacity}"
            )));
        }

        for (i, port) in self.ports.iter().enumerate() {
            if usize::from(port.address) >= IO_SPACE_SIZE {
                return Err(ConfigError::Invalid(format!(
                    "port {} address {:#04x} is outside the I/O space",
                    port.name, port.address
                )));
            }
            let earlier = &self.ports[..i];
            if earlier.iter().any(|p| p.name == port.name) {
                return Err(ConfigError::Invalid(format!(
                    "port name {} is bound twice",
                    port.name
                )));
            }
            if earlier.iter().any(|p| p.address == port.address) {
                return Err(ConfigError::Invalid(format!(
                    "I/O address {:#04x} is bound to more than one port",
                    port.address
                )));
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            loader: LoaderConfig::default(),
            ports: Self::default_ports(),
        }
    }
}

/// Execution control configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneralConfig {
    /// Pause after each executed instruction while running, in milliseconds. Zero runs
    /// flat out.
    #[serde(default = "GeneralConfig::default_step_delay_ms")]
    pub step_delay_ms: u64,

    /// Maximum time `stop` blocks waiting for the worker, in milliseconds.
    #[serde(default = "GeneralConfig::default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,

    /// Log every executed instruction at `trace` level with its disassembly.
    #[serde(default)]
    pub trace_instructions: bool,
}

impl GeneralConfig {
    fn default_step_delay_ms() -> u64 {
        defaults::STEP_DELAY_MS
    }

    fn default_stop_timeout_ms() -> u64 {
        defaults::STOP_TIMEOUT_MS
    }

    /// Pacing delay as a [`Duration`].
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    /// Stop timeout as a [`Duration`].
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: defaults::STEP_DELAY_MS,
            stop_timeout_ms: defaults::STOP_TIMEOUT_MS,
            trace_instructions: false,
        }
    }
}

/// Object loader configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoaderConfig {
    /// Reject records whose checksum byte does not match. Off by default: the
    /// reference object format consumer never checked them.
    #[serde(default)]
    pub verify_checksums: bool,

    /// Program image capacity in words; data records past it fail to load.
    #[serde(default = "LoaderConfig::default_capacity_words")]
    pub capacity_words: usize,
}

impl LoaderConfig {
    fn default_capacity_words() -> usize {
        defaults::CAPACITY_WORDS
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            verify_checksums: false,
            capacity_words: defaults::CAPACITY_WORDS,
        }
    }
}

/// Binding of an I/O address to a named, observable port.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PortConfig {
    /// Port name reported to observers (e.g. `PORTB`).
    pub name: String,
    /// 6-bit I/O address of the port's data register.
    pub address: u8,
}
