//! AVR simulator CLI.
//!
//! This binary provides a terminal front end for the simulator. It performs:
//! 1. **Run:** Load an Intel-HEX object file and execute it, printing port changes.
//! 2. **Disassemble:** List the words of an object file with their mnemonics.
//! 3. **Build:** Assemble a source file with `avr-gcc` and optionally run the result.
//!
//! Logging goes to stderr and is controlled with `RUST_LOG` (default `info`).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc::Receiver;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::SubscriberInitExt;

use avrsim_core::common::{ConfigError, ControlError, LoadError, ToolchainError};
use avrsim_core::isa::disasm::listing;
use avrsim_core::sim::loader::load_hex_file;
use avrsim_core::sim::mode::RunMode;
use avrsim_core::toolchain::{AvrGccToolchain, Toolchain};
use avrsim_core::{Config, Event, ExecutionController, Snapshot};

#[derive(Parser, Debug)]
#[command(
    name = "avrsim",
    author,
    version,
    about = "Instruction-level AVR microcontroller simulator",
    long_about = "Run, disassemble or build AVR programs.\n\nExamples:\n  avrsim run main.hex --delay-ms 0 --max-cycles 1000\n  avrsim run main.hex --break 0x0004\n  avrsim disasm main.hex\n  avrsim build blink.S --mcu atmega32 --run"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute an Intel-HEX object file.
    Run {
        /// Object file to load.
        hex: PathBuf,

        #[command(flatten)]
        opts: RunOpts,
    },

    /// Print a disassembly listing of an Intel-HEX object file.
    Disasm {
        /// Object file to load.
        hex: PathBuf,

        /// JSON configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Assemble a source file with avr-gcc and avr-objcopy.
    Build {
        /// Assembly source file.
        source: PathBuf,

        /// Target device passed to avr-gcc.
        #[arg(long, default_value = "atmega32")]
        mcu: String,

        /// Directory for main.S, main.elf and main.hex.
        #[arg(long, default_value = ".")]
        workdir: PathBuf,

        /// Run the object file after a successful build.
        #[arg(long)]
        run: bool,

        #[command(flatten)]
        opts: RunOpts,
    },
}

/// Options shared by every command that executes a program.
#[derive(clap::Args, Debug)]
struct RunOpts {
    /// Pause after each instruction in milliseconds (overrides the config).
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Stop after this many executed instructions.
    #[arg(long)]
    max_cycles: Option<u64>,

    /// Pause at this byte address (hex with 0x, or decimal). Repeatable.
    #[arg(long = "break", value_parser = parse_address)]
    breakpoints: Vec<usize>,

    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reject records with a bad checksum.
    #[arg(long)]
    verify_checksums: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Control(#[from] ControlError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Toolchain(#[from] ToolchainError),
    #[error("could not read '{}': {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("execution halted: {0}")]
    Halted(String),
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt::Subscriber::builder()
        .with_target(false)
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .finish()
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run { hex, opts } => cmd_run(&hex, &opts),
        Commands::Disasm { hex, config } => cmd_disasm(&hex, config.as_deref()),
        Commands::Build {
            source,
            mcu,
            workdir,
            run,
            opts,
        } => cmd_build(&source, &mcu, &workdir, run, &opts),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

/// Accepts `0x`-prefixed hex or decimal byte addresses and returns the word address.
fn parse_address(s: &str) -> Result<usize, String> {
    let byte = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => s.parse(),
    }
    .map_err(|e| format!("invalid address '{s}': {e}"))?;
    if byte % 2 != 0 {
        return Err(format!("address {byte:#06x} is not word aligned"));
    }
    Ok(byte / 2)
}

fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    path.map_or_else(|| Ok(Config::default()), Config::from_file)
}

fn cmd_run(hex: &Path, opts: &RunOpts) -> Result<(), CliError> {
    let mut config = load_config(opts.config.as_deref())?;
    if let Some(delay) = opts.delay_ms {
        config.general.step_delay_ms = delay;
    }
    if opts.verify_checksums {
        config.loader.verify_checksums = true;
    }

    let mut controller = ExecutionController::new(config);
    let events = controller.subscribe();
    for &word in &opts.breakpoints {
        let _ = controller.add_breakpoint(word);
    }
    controller.load_and_start(hex)?;

    let outcome = drive(&mut controller, &events, opts.max_cycles);
    print_snapshot(&controller.snapshot());
    println!("{}", controller.stats());
    outcome
}

/// Renders events until the run ends.
fn drive(
    controller: &mut ExecutionController,
    events: &Receiver<Event>,
    max_cycles: Option<u64>,
) -> Result<(), CliError> {
    let mut halted = None;
    while let Ok(event) = events.recv() {
        match event {
            Event::Snapshot(snapshot) => {
                if max_cycles.is_some_and(|max| snapshot.cycles >= max) {
                    info!(cycles = snapshot.cycles, "cycle limit reached");
                    let _ = controller.stop();
                    break;
                }
            }
            Event::Port(port) => println!("{:<6} {:#010b}", port.name, port.value),
            Event::BreakpointHit { pc } => {
                println!("breakpoint at {pc:#06x}");
                print_snapshot(&controller.snapshot());
                controller.resume()?;
            }
            Event::Completed { cycles } => {
                println!("program completed after {cycles} cycles");
            }
            Event::Log(msg) => println!("{msg}"),
            Event::Diagnostic(msg) => {
                warn!("{msg}");
                halted = Some(msg);
            }
            Event::ModeChanged(RunMode::Stopped) => break,
            Event::ModeChanged(_) => {}
        }
    }
    halted.map_or(Ok(()), |msg| Err(CliError::Halted(msg)))
}

fn print_snapshot(snapshot: &Snapshot) {
    println!(
        "PC: {:#06x}  Cycles: {}  SREG: {:08b}",
        snapshot.pc, snapshot.cycles, snapshot.sreg
    );
    for (row, values) in snapshot.registers.chunks(8).enumerate() {
        let line: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(i, v)| format!("r{:<2}={v:02x}", row * 8 + i))
            .collect();
        println!("  {}", line.join(" "));
    }
}

fn cmd_disasm(hex: &Path, config: Option<&Path>) -> Result<(), CliError> {
    let config = load_config(config)?;
    let image = load_hex_file(hex, &config.loader)?;
    for (addr, word, text) in listing(image.words()) {
        println!("{addr:04x}:  {word:04x}    {text}");
    }
    Ok(())
}

fn cmd_build(source: &Path, mcu: &str, workdir: &Path, run: bool, opts: &RunOpts) -> Result<(), CliError> {
    let text = fs::read_to_string(source).map_err(|e| CliError::Read {
        path: source.to_path_buf(),
        source: e,
    })?;

    let toolchain = AvrGccToolchain::new(mcu);
    let missing = toolchain.missing_tools();
    if !missing.is_empty() {
        warn!(tools = ?missing, "toolchain programs not found on PATH");
    }

    println!(">>> BUILDING...");
    let output = match toolchain.build(&text, workdir) {
        Ok(output) => output,
        Err(err) => {
            if let ToolchainError::Failed { output, .. } = &err {
                for line in output {
                    println!("{line}");
                }
            }
            return Err(err.into());
        }
    };
    for line in &output.log {
        println!("{line}");
    }
    println!(">>> BUILD SUCCESSFUL: {}", output.object.display());

    if run {
        cmd_run(&output.object, opts)
    } else {
        Ok(())
    }
}
