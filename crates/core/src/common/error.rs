//! Error definitions.
//!
//! This module defines the error taxonomy of the simulator. It provides:
//! 1. **Load Errors:** Unreadable or malformed object files; a run must not start.
//! 2. **Execution Errors:** The program counter left the program image mid-run.
//! 3. **Control Errors:** Invalid run/pause/step/stop requests.
//! 4. **Collaborator Errors:** External toolchain failures and bad configuration.
//!
//! An unrecognized instruction word is deliberately absent: it executes as a no-op.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::sim::mode::RunMode;

/// Failure to turn an object file into a program image.
///
/// Loading is all-or-nothing: when any of these is returned, no part of the
/// file is used for a run.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The object file could not be opened or read.
    #[error("could not read object file '{}': {source}", .path.display())]
    Io {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A record line is truncated or contains a non-hex digit.
    #[error("line {line}: {reason}")]
    Parse {
        /// 1-based line number in the object file.
        line: usize,
        /// Human-readable description of what was malformed.
        reason: String,
    },

    /// A data record addresses a word beyond program-memory capacity.
    #[error("line {line}: word address {word:#06x} exceeds program capacity of {capacity} words")]
    AddressOutOfRange {
        /// 1-based line number in the object file.
        line: usize,
        /// Offending word index.
        word: usize,
        /// Capacity of the program image in words.
        capacity: usize,
    },

    /// A data record does not start on, or does not cover whole, 16-bit words.
    #[error("line {line}: record at byte address {address:#06x} with {len} bytes is not word aligned")]
    Unaligned {
        /// 1-based line number in the object file.
        line: usize,
        /// Byte address from the record header.
        address: u16,
        /// Payload length in bytes.
        len: usize,
    },

    /// The record checksum does not match (only when verification is enabled).
    #[error("line {line}: checksum mismatch (expected {expected:#04x}, found {found:#04x})")]
    Checksum {
        /// 1-based line number in the object file.
        line: usize,
        /// Checksum computed over the record bytes.
        expected: u8,
        /// Checksum stored in the record.
        found: u8,
    },

    /// A word list handed to [`ProgramImage::from_words`](crate::sim::image::ProgramImage::from_words)
    /// does not fit in program memory.
    #[error("program of {words} words exceeds capacity of {capacity} words")]
    ImageTooLarge {
        /// Number of words supplied.
        words: usize,
        /// Capacity of the program image in words.
        capacity: usize,
    },
}

/// Failure while stepping through a loaded program.
///
/// Reaching the end of the image is not an error; these are internal
/// inconsistencies that halt the run.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// The program counter does not address a loaded word.
    #[error("program counter {pc:#06x} is outside the loaded image of {len} words")]
    PcOutOfBounds {
        /// Word index of the program counter.
        pc: usize,
        /// Length of the program image in words.
        len: usize,
    },

    /// A relative jump targets a word before address 0 or past program memory.
    #[error("jump at word {pc:#06x} targets {target}, outside program memory")]
    JumpOutOfRange {
        /// Word index of the jump instruction.
        pc: usize,
        /// Computed (possibly negative) target word index.
        target: i64,
    },
}

/// Rejected request on the execution control surface.
#[derive(Debug, Error)]
pub enum ControlError {
    /// `start` was requested while a run is still active.
    #[error("a run is already active ({mode})")]
    AlreadyActive {
        /// Mode of the active run.
        mode: RunMode,
    },

    /// The requested transition is not valid from the current mode.
    #[error("cannot {action} while {from}")]
    InvalidTransition {
        /// Mode at the time of the request.
        from: RunMode,
        /// Requested action (`pause`, `resume`, `step`).
        action: &'static str,
    },

    /// The execution worker did not answer within the stop timeout.
    #[error("execution worker did not respond")]
    WorkerUnresponsive,

    /// The execution worker thread could not be spawned.
    #[error("could not spawn execution worker: {0}")]
    Spawn(io::Error),

    /// The object file could not be loaded, so the run was not started.
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Failure reported by the external assembler toolchain.
///
/// When this is returned the produced object file must not be loaded.
#[derive(Debug, Error)]
pub enum ToolchainError {
    /// The build directory or source file could not be written.
    #[error("could not prepare build directory: {0}")]
    Io(#[from] io::Error),

    /// A toolchain program could not be launched at all.
    #[error("could not launch '{command}': {source}")]
    Spawn {
        /// Program that failed to start.
        command: String,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A toolchain program exited with a non-zero status.
    #[error("'{command}' failed with status {status:?}")]
    Failed {
        /// Program that failed.
        command: String,
        /// Exit status, or `None` when terminated by a signal.
        status: Option<i32>,
        /// Diagnostic output, verbatim and line by line.
        output: Vec<String>,
    },
}

/// Invalid or unreadable simulator configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("could not read config '{}': {source}", .path.display())]
    Io {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The configuration is not valid JSON for [`Config`](crate::config::Config).
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration parsed but describes an impossible setup.
    #[error("invalid config: {0}")]
    Invalid(String),
}
