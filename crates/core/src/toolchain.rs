//! External Assembler Toolchain.
//!
//! This module turns assembly source into an object file by driving the GNU AVR tools. It
//! performs:
//! 1. **Source Preparation:** Adds the preamble `avr-gcc` needs and comments out
//!    assembler-specific `.INCLUDE` directives.
//! 2. **Assembly:** `avr-gcc -mmcu=<mcu> -nostdlib -o main.elf main.S`.
//! 3. **Conversion:** `avr-objcopy -O ihex -R .eeprom main.elf main.hex`.
//!
//! Tool output is captured line by line and returned verbatim. A non-zero exit status is
//! an error, and callers must not load the object file in that case.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::common::error::ToolchainError;

/// Lines prepended to every source file before assembly.
const PREAMBLE: &str = "#define __SFR_OFFSET 0\n#include <avr/io.h>\n.global main\nmain:\n";

/// Name of the generated source file inside the work directory.
pub const SOURCE_FILE: &str = "main.S";
/// Name of the linked ELF inside the work directory.
pub const ELF_FILE: &str = "main.elf";
/// Name of the object file inside the work directory.
pub const HEX_FILE: &str = "main.hex";

/// Successful build result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildOutput {
    /// Path of the produced object file.
    pub object: PathBuf,
    /// Output of every tool invocation, in order.
    pub log: Vec<String>,
}

/// Something that can turn assembly source into an object file.
pub trait Toolchain {
    /// Builds `source` inside `workdir`.
    ///
    /// # Errors
    ///
    /// Any [`ToolchainError`]; the object file must not be used when one is returned.
    fn build(&self, source: &str, workdir: &Path) -> Result<BuildOutput, ToolchainError>;
}

/// The GNU AVR toolchain (`avr-gcc` plus `avr-objcopy`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AvrGccToolchain {
    /// Target device passed as `-mmcu`.
    pub mcu: String,
    /// Compiler driver.
    pub gcc: PathBuf,
    /// Object copy tool.
    pub objcopy: PathBuf,
}

impl Default for AvrGccToolchain {
    fn default() -> Self {
        Self::new("atmega32")
    }
}

impl AvrGccToolchain {
    /// Creates a toolchain for `mcu` using the tools found on `PATH`.
    pub fn new(mcu: impl Into<String>) -> Self {
        Self {
            mcu: mcu.into().to_lowercase(),
            gcc: PathBuf::from("avr-gcc"),
            objcopy: PathBuf::from("avr-objcopy"),
        }
    }

    /// Returns the tools that cannot be resolved on `PATH`.
    pub fn missing_tools(&self) -> Vec<String> {
        [&self.gcc, &self.objcopy]
            .into_iter()
            .filter(|tool| which::which(tool).is_err())
            .map(|tool| tool.display().to_string())
            .collect()
    }
}

impl Toolchain for AvrGccToolchain {
    fn build(&self, source: &str, workdir: &Path) -> Result<BuildOutput, ToolchainError> {
        fs::create_dir_all(workdir)?;
        fs::write(workdir.join(SOURCE_FILE), prepare_source(source))?;

        let mut log = Vec::new();
        let mmcu = format!("-mmcu={}", self.mcu);
        run_tool(
            &self.gcc,
            &[&mmcu, "-nostdlib", "-o", ELF_FILE, SOURCE_FILE],
            workdir,
            &mut log,
        )?;
        run_tool(
            &self.objcopy,
            &["-O", "ihex", "-R", ".eeprom", ELF_FILE, HEX_FILE],
            workdir,
            &mut log,
        )?;

        let object = workdir.join(HEX_FILE);
        info!(object = %object.display(), mcu = %self.mcu, "build succeeded");
        Ok(BuildOutput { object, log })
    }
}

/// Rewrites source for `avr-gcc`.
///
/// Prepends the preamble and turns every line whose first token is `.INCLUDE` (any case)
/// into a comment. All other lines pass through unchanged.
pub fn prepare_source(source: &str) -> String {
    let mut out = String::with_capacity(PREAMBLE.len() + source.len());
    out.push_str(PREAMBLE);
    for line in source.lines() {
        if line.trim_start().to_uppercase().starts_with(".INCLUDE") {
            out.push_str("; ");
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Runs one tool, appending its stdout then stderr lines to `log`.
fn run_tool(program: &Path, args: &[&str], workdir: &Path, log: &mut Vec<String>) -> Result<(), ToolchainError> {
    let command = program.display().to_string();
    debug!(%command, ?args, "running toolchain command");

    let output = Command::new(program)
        .args(args)
        .current_dir(workdir)
        .output()
        .map_err(|source| ToolchainError::Spawn {
            command: command.clone(),
            source,
        })?;

    let lines: Vec<String> = [&output.stdout, &output.stderr]
        .into_iter()
        .flat_map(|stream| {
            String::from_utf8_lossy(stream)
                .lines()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect();
    for line in &lines {
        debug!(%command, "{line}");
    }
    log.extend(lines.iter().cloned());

    if output.status.success() {
        Ok(())
    } else {
        Err(ToolchainError::Failed {
            command,
            status: output.status.code(),
            output: lines,
        })
    }
}
