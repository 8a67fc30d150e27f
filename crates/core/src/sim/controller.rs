//! Execution Controller.
//!
//! This module owns the run/pause/step/stop state machine and the worker thread that
//! executes a program. It implements:
//! 1. **Lifecycle:** `Stopped -> Running <-> Paused -> Stopped`, with completion and
//!    execution faults returning to `Stopped` on their own.
//! 2. **Worker Loop:** A dedicated thread per run; all architectural mutation happens there.
//! 3. **Pacing:** A configurable delay after each step while running.
//! 4. **Bounded Stop:** `stop` waits at most the configured timeout and reports a worker
//!    that failed to exit instead of blocking.
//! 5. **Breakpoints:** Word addresses that pause a running program before they execute.
//!
//! Control requests set atomic flags the worker observes cooperatively; single steps are
//! sent over a command channel and acknowledged with a [`StepReport`].

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, TryRecvError, channel};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::common::error::{ControlError, ExecutionError};
use crate::config::Config;
use crate::sim::image::ProgramImage;
use crate::sim::loader::load_hex_file;
use crate::sim::mode::RunMode;
use crate::sim::observer::{Event, Observer, PortChange, Snapshot};
use crate::sim::simulator::Simulator;
use crate::stats::SimStats;

/// How often a paused worker re-checks the cancellation flag.
const PAUSE_POLL: Duration = Duration::from_millis(10);

/// Lower bound on how long `step` waits for the worker's reply.
const STEP_REPLY_FLOOR: Duration = Duration::from_millis(250);

/// Result of [`ExecutionController::stop`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopOutcome {
    /// The worker observed the stop flag and exited within the timeout.
    Joined,
    /// The worker did not exit within the timeout and was detached.
    Abandoned,
    /// No run was active.
    AlreadyStopped,
}

/// Result of a single step requested while paused.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepReport {
    /// One instruction executed; the run stays paused.
    Executed(Snapshot),
    /// The program counter is past the end of the image; the run is now stopped.
    Completed(Snapshot),
    /// The step failed; the run is now stopped.
    Faulted(ExecutionError),
}

/// Requests sent to the worker.
#[derive(Debug)]
enum Command {
    /// Execute one instruction and reply with the result.
    Step(Sender<StepReport>),
    /// Re-check mode and cancellation now.
    Wake,
}

/// Per-run flags shared between the controller and its worker.
#[derive(Debug)]
struct RunState {
    mode: AtomicU8,
    cancel: AtomicBool,
}

impl RunState {
    fn new(mode: RunMode) -> Self {
        Self {
            mode: AtomicU8::new(mode.to_u8()),
            cancel: AtomicBool::new(false),
        }
    }

    fn mode(&self) -> RunMode {
        RunMode::from_u8(self.mode.load(Ordering::Acquire))
    }

    fn set(&self, mode: RunMode) {
        self.mode.store(mode.to_u8(), Ordering::Release);
    }

    /// Moves `from -> to` atomically; on failure returns the actual mode.
    fn transition(&self, from: RunMode, to: RunMode) -> Result<(), RunMode> {
        self.mode
            .compare_exchange(from.to_u8(), to.to_u8(), Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(RunMode::from_u8)
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }
}

/// State readable from the controller while a worker runs.
#[derive(Debug, Default)]
struct Shared {
    /// Held while a mode changes and its `ModeChanged` event is published, so observers
    /// see mode changes in the order they happened.
    mode_events: Mutex<()>,
    breakpoints: Mutex<BTreeSet<usize>>,
    snapshot: Mutex<Snapshot>,
    stats: Mutex<SimStats>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Controller-side handle to a running worker.
#[derive(Debug)]
struct WorkerHandle {
    state: Arc<RunState>,
    commands: Sender<Command>,
    done: Receiver<()>,
    thread: JoinHandle<()>,
}

/// Owner of the execution state machine.
///
/// At most one run is active at a time. Dropping the controller stops its run.
#[derive(Debug)]
pub struct ExecutionController {
    config: Config,
    observer: Observer,
    shared: Arc<Shared>,
    worker: Option<WorkerHandle>,
}

impl ExecutionController {
    /// Creates a stopped controller publishing to a fresh [`Observer`].
    pub fn new(config: Config) -> Self {
        Self::with_observer(config, Observer::new())
    }

    /// Creates a stopped controller publishing to `observer`.
    pub fn with_observer(config: Config, observer: Observer) -> Self {
        Self {
            config,
            observer,
            shared: Arc::new(Shared::default()),
            worker: None,
        }
    }

    /// The event publisher of this controller.
    pub fn observer(&self) -> &Observer {
        &self.observer
    }

    /// Shorthand for `observer().subscribe()`.
    pub fn subscribe(&self) -> Receiver<Event> {
        self.observer.subscribe()
    }

    /// The configuration runs are started with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current run mode.
    pub fn mode(&self) -> RunMode {
        self.worker
            .as_ref()
            .map_or(RunMode::Stopped, |w| w.state.mode())
    }

    /// Last published architectural snapshot.
    pub fn snapshot(&self) -> Snapshot {
        lock(&self.shared.snapshot).clone()
    }

    /// Statistics of the current (or last) run.
    pub fn stats(&self) -> SimStats {
        lock(&self.shared.stats).clone()
    }

    /// Adds a breakpoint at word address `word`. Returns `false` if it was already set.
    pub fn add_breakpoint(&self, word: usize) -> bool {
        lock(&self.shared.breakpoints).insert(word)
    }

    /// Removes the breakpoint at `word`. Returns `false` if none was set.
    pub fn remove_breakpoint(&self, word: usize) -> bool {
        lock(&self.shared.breakpoints).remove(&word)
    }

    /// Removes every breakpoint.
    pub fn clear_breakpoints(&self) {
        lock(&self.shared.breakpoints).clear();
    }

    /// Breakpoint word addresses in ascending order.
    pub fn breakpoints(&self) -> Vec<usize> {
        lock(&self.shared.breakpoints).iter().copied().collect()
    }

    /// Resets state and runs `image` continuously.
    ///
    /// # Errors
    ///
    /// [`ControlError::AlreadyActive`] if a run is running or paused, and
    /// [`ControlError::Spawn`] if the worker thread cannot be created.
    pub fn start(&mut self, image: ProgramImage) -> Result<(), ControlError> {
        self.launch(image, RunMode::Running)
    }

    /// Resets state and enters `Paused` at the first instruction, ready for [`step`](Self::step).
    ///
    /// # Errors
    ///
    /// As [`start`](Self::start).
    pub fn start_paused(&mut self, image: ProgramImage) -> Result<(), ControlError> {
        self.launch(image, RunMode::Paused)
    }

    /// Loads an object file and starts it.
    ///
    /// On a load failure the controller stays `Stopped`; the error is returned and
    /// published as a diagnostic.
    ///
    /// # Errors
    ///
    /// [`ControlError::Load`] plus anything [`start`](Self::start) returns.
    pub fn load_and_start(&mut self, path: impl AsRef<Path>) -> Result<(), ControlError> {
        let path = path.as_ref();
        self.reap_finished();
        if let Some(worker) = &self.worker {
            return Err(ControlError::AlreadyActive {
                mode: worker.state.mode(),
            });
        }

        let image = match load_hex_file(path, &self.config.loader) {
            Ok(image) => image,
            Err(err) => {
                error!(path = %path.display(), %err, "load failed");
                self.observer.publish(Event::Diagnostic(format!("load failed: {err}")));
                return Err(err.into());
            }
        };
        self.observer.publish(Event::Log(format!(
            "loaded {} words from {}",
            image.len(),
            path.display()
        )));
        self.start(image)
    }

    /// Suspends a running program after the current step.
    ///
    /// # Errors
    ///
    /// [`ControlError::InvalidTransition`] unless the mode is `Running`.
    pub fn pause(&self) -> Result<(), ControlError> {
        self.transition(RunMode::Running, RunMode::Paused, "pause")
    }

    /// Continues a paused program.
    ///
    /// # Errors
    ///
    /// [`ControlError::InvalidTransition`] unless the mode is `Paused`.
    pub fn resume(&self) -> Result<(), ControlError> {
        self.transition(RunMode::Paused, RunMode::Running, "resume")
    }

    /// Executes exactly one instruction of a paused program.
    ///
    /// Blocks until the worker acknowledges, at most the stop timeout but never less than
    /// 250 ms.
    ///
    /// # Errors
    ///
    /// [`ControlError::InvalidTransition`] unless the mode is `Paused`;
    /// [`ControlError::WorkerUnresponsive`] if the worker does not answer in time. The
    /// request stays queued in that case and the worker may still execute it, so check
    /// [`snapshot`](Self::snapshot) before stepping again.
    pub fn step(&self) -> Result<StepReport, ControlError> {
        let worker = self.active_worker("step")?;
        let mode = worker.state.mode();
        if mode != RunMode::Paused {
            return Err(ControlError::InvalidTransition {
                from: mode,
                action: "step",
            });
        }

        let (reply, report) = channel();
        worker
            .commands
            .send(Command::Step(reply))
            .map_err(|_| ControlError::WorkerUnresponsive)?;
        report
            .recv_timeout(self.config.general.stop_timeout().max(STEP_REPLY_FLOOR))
            .map_err(|_| ControlError::WorkerUnresponsive)
    }

    /// Stops the active run, waiting at most the configured stop timeout.
    pub fn stop(&mut self) -> StopOutcome {
        let Some(worker) = self.worker.take() else {
            return StopOutcome::AlreadyStopped;
        };
        let was = worker.state.mode();
        worker.state.cancel.store(true, Ordering::Release);
        let _ = worker.commands.send(Command::Wake);

        let timeout = self.config.general.stop_timeout();
        let outcome = match worker.done.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if worker.thread.join().is_err() {
                    warn!("execution worker panicked");
                }
                StopOutcome::Joined
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    timeout_ms = self.config.general.stop_timeout_ms,
                    "execution worker did not stop in time; abandoning it"
                );
                self.observer.publish(Event::Diagnostic(format!(
                    "execution worker did not stop within {} ms and was abandoned",
                    self.config.general.stop_timeout_ms
                )));
                StopOutcome::Abandoned
            }
        };
        let guard = lock(&self.shared.mode_events);
        worker.state.set(RunMode::Stopped);
        if !was.is_active() {
            drop(guard);
            debug!("reaped finished execution worker");
            return StopOutcome::AlreadyStopped;
        }
        self.observer.publish(Event::ModeChanged(RunMode::Stopped));
        drop(guard);
        info!(?outcome, "run stopped");
        outcome
    }

    fn launch(&mut self, image: ProgramImage, mode: RunMode) -> Result<(), ControlError> {
        self.reap_finished();
        if let Some(worker) = &self.worker {
            return Err(ControlError::AlreadyActive {
                mode: worker.state.mode(),
            });
        }

        let mut sim = Simulator::new(image, &self.config);
        sim.reset();
        let snapshot = Snapshot::from(&sim.cpu);
        *lock(&self.shared.snapshot) = snapshot.clone();
        *lock(&self.shared.stats) = sim.stats.clone();

        self.observer.publish(Event::Snapshot(snapshot));
        for (address, name) in sim.ports().iter() {
            self.observer.publish(Event::Port(PortChange {
                name: name.to_string(),
                address,
                value: 0,
            }));
        }
        self.observer.publish(Event::ModeChanged(mode));

        let words = sim.image().len();
        let state = Arc::new(RunState::new(mode));
        let (commands_tx, commands_rx) = channel();
        let (done_tx, done_rx) = channel();
        let worker = Worker {
            sim,
            state: Arc::clone(&state),
            commands: commands_rx,
            shared: Arc::clone(&self.shared),
            observer: self.observer.clone(),
            delay: self.config.general.step_delay(),
            skip_breakpoint: false,
            _done: done_tx,
        };

        let thread = match thread::Builder::new()
            .name("avrsim-worker".to_string())
            .spawn(move || worker.run())
        {
            Ok(thread) => thread,
            Err(err) => {
                error!(%err, "could not spawn execution worker");
                self.observer.publish(Event::Diagnostic(format!("could not start run: {err}")));
                self.observer.publish(Event::ModeChanged(RunMode::Stopped));
                return Err(ControlError::Spawn(err));
            }
        };

        info!(words, %mode, "run started");
        self.worker = Some(WorkerHandle {
            state,
            commands: commands_tx,
            done: done_rx,
            thread,
        });
        Ok(())
    }

    fn transition(&self, from: RunMode, to: RunMode, action: &'static str) -> Result<(), ControlError> {
        let worker = self.active_worker(action)?;
        let guard = lock(&self.shared.mode_events);
        worker
            .state
            .transition(from, to)
            .map_err(|actual| ControlError::InvalidTransition {
                from: actual,
                action,
            })?;
        self.observer.publish(Event::ModeChanged(to));
        drop(guard);
        debug!(%from, %to, "mode transition");
        let _ = worker.commands.send(Command::Wake);
        Ok(())
    }

    fn active_worker(&self, action: &'static str) -> Result<&WorkerHandle, ControlError> {
        self.worker.as_ref().ok_or(ControlError::InvalidTransition {
            from: RunMode::Stopped,
            action,
        })
    }

    /// Collects a worker whose run already completed or faulted.
    fn reap_finished(&mut self) {
        if self.worker.as_ref().is_some_and(|w| w.state.mode() == RunMode::Stopped) {
            let _ = self.stop();
        }
    }
}

impl Drop for ExecutionController {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Whether the worker loop should keep going.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Worker-side state; lives on the execution thread.
struct Worker {
    sim: Simulator,
    state: Arc<RunState>,
    commands: Receiver<Command>,
    shared: Arc<Shared>,
    observer: Observer,
    delay: Duration,
    /// Set after pausing at a breakpoint so resuming executes that instruction.
    skip_breakpoint: bool,
    /// Dropped on exit; the controller waits for the disconnect.
    _done: Sender<()>,
}

impl Worker {
    fn run(mut self) {
        debug!("execution worker started");
        while !self.state.cancelled() {
            let flow = match self.state.mode() {
                RunMode::Running => self.run_once(),
                RunMode::Paused => self.wait_paused(),
                RunMode::Stopped => Flow::Exit,
            };
            if flow == Flow::Exit {
                break;
            }
        }
        debug!(cycles = self.sim.cpu.cycles, "execution worker exiting");
    }

    fn run_once(&mut self) -> Flow {
        let pc = self.sim.cpu.pc;
        if !self.skip_breakpoint && lock(&self.shared.breakpoints).contains(&pc) {
            let guard = lock(&self.shared.mode_events);
            if self.state.transition(RunMode::Running, RunMode::Paused).is_ok() {
                self.skip_breakpoint = true;
                self.sim.stats.breakpoints_hit += 1;
                *lock(&self.shared.stats) = self.sim.stats.clone();
                self.observer.publish(Event::BreakpointHit { pc: pc * 2 });
                self.observer.publish(Event::ModeChanged(RunMode::Paused));
                info!(pc = pc * 2, "breakpoint hit");
            }
            drop(guard);
            return Flow::Continue;
        }

        match self.execute() {
            StepReport::Executed(_) => self.pace(),
            StepReport::Completed(_) | StepReport::Faulted(_) => Flow::Exit,
        }
    }

    /// Sleeps for the pacing delay, waking early for control requests.
    fn pace(&mut self) -> Flow {
        let command = if self.delay.is_zero() {
            match self.commands.try_recv() {
                Ok(cmd) => Some(cmd),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => return Flow::Exit,
            }
        } else {
            match self.commands.recv_timeout(self.delay) {
                Ok(cmd) => Some(cmd),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => return Flow::Exit,
            }
        };
        command.map_or(Flow::Continue, |cmd| self.handle(cmd))
    }

    fn wait_paused(&mut self) -> Flow {
        match self.commands.recv_timeout(PAUSE_POLL) {
            Ok(cmd) => self.handle(cmd),
            Err(RecvTimeoutError::Timeout) => Flow::Continue,
            Err(RecvTimeoutError::Disconnected) => Flow::Exit,
        }
    }

    fn handle(&mut self, command: Command) -> Flow {
        match command {
            Command::Wake => Flow::Continue,
            Command::Step(reply) => {
                let report = self.execute();
                let flow = match report {
                    StepReport::Executed(_) => Flow::Continue,
                    StepReport::Completed(_) | StepReport::Faulted(_) => Flow::Exit,
                };
                let _ = reply.send(report);
                flow
            }
        }
    }

    /// Executes one instruction and publishes the resulting state.
    fn execute(&mut self) -> StepReport {
        if self.sim.at_end() {
            return self.complete();
        }
        match self.sim.step() {
            Ok(outcome) => {
                self.skip_breakpoint = false;
                if let Some(port) = outcome.port {
                    self.observer.publish(Event::Port(port));
                }
                let snapshot = self.publish_state();
                if self.sim.at_end() {
                    self.complete()
                } else {
                    StepReport::Executed(snapshot)
                }
            }
            Err(err) => self.fault(err),
        }
    }

    fn publish_state(&self) -> Snapshot {
        let snapshot = Snapshot::from(&self.sim.cpu);
        *lock(&self.shared.snapshot) = snapshot.clone();
        *lock(&self.shared.stats) = self.sim.stats.clone();
        self.observer.publish(Event::Snapshot(snapshot.clone()));
        snapshot
    }

    fn complete(&self) -> StepReport {
        let cycles = self.sim.cpu.cycles;
        info!(cycles, "program completed");
        self.finish(Event::Completed { cycles });
        StepReport::Completed(Snapshot::from(&self.sim.cpu))
    }

    fn fault(&self, err: ExecutionError) -> StepReport {
        error!(%err, "execution halted");
        self.finish(Event::Diagnostic(format!("execution halted: {err}")));
        StepReport::Faulted(err)
    }

    /// Enters `Stopped` from whatever mode is current, publishing `event` first.
    fn finish(&self, event: Event) {
        let guard = lock(&self.shared.mode_events);
        self.state.set(RunMode::Stopped);
        self.observer.publish(event);
        self.observer.publish(Event::ModeChanged(RunMode::Stopped));
        drop(guard);
    }
}
