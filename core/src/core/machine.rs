//! The machine: owns a CPU, its controllers and the clock, and runs the
//! fetch/execute loop until the I/O controller asks it to stop.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::clock::CpuClock;
use crate::core::bus::SystemBus;
use crate::core::controller::{Controller, Isr, SharedController};
use crate::core::error::MachineError;
use crate::core::options::Options;
use crate::cpu::{Cpu, CpuStateTrait, I8080, I8080State, StepKind};
use crate::snapshot::Snapshot;

/// Lifecycle of a [`Machine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum MachineState {
    /// At least one controller is missing.
    Idle,
    /// Both controllers are attached.
    Ready,
    Running,
    /// Running, with the CPU stopped on HLT until an interrupt.
    Halted,
    /// The last run has returned.
    Stopped,
}

impl MachineState {
    fn from_u8(val: u8) -> Self {
        match val {
            1 => MachineState::Ready,
            2 => MachineState::Running,
            3 => MachineState::Halted,
            4 => MachineState::Stopped,
            _ => MachineState::Idle,
        }
    }

    fn is_active(self) -> bool {
        matches!(self, MachineState::Running | MachineState::Halted)
    }
}

/// Counters from the most recent run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub cycles: u64,
    /// Instructions fetched and executed; halt idling and interrupt
    /// acknowledgement are not counted.
    pub instructions: u64,
    pub interrupts: u64,
    pub elapsed_ns: u64,
    /// How far behind real time the pacer was at the end of the run.
    pub drift: Duration,
}

type SaveHook = Box<dyn FnMut(&str) + Send>;
type LoadHook = Box<dyn FnMut() -> Option<String> + Send>;

/// Everything a run needs, locked by the run for its whole duration.
struct ExecutionContext {
    cpu: I8080,
    clock: CpuClock,
    memory: Option<SharedController>,
    io: Option<SharedController>,
    options: Options,
    on_save: Option<SaveHook>,
    on_load: Option<LoadHook>,
    stats: RunStats,
}

impl ExecutionContext {
    fn new() -> Self {
        Self {
            cpu: I8080::new(),
            clock: CpuClock::default(),
            memory: None,
            io: None,
            options: Options::default(),
            on_save: None,
            on_load: None,
            stats: RunStats::default(),
        }
    }

    fn controllers(&self) -> Result<(SharedController, SharedController), MachineError> {
        let memory = self.memory.clone().ok_or(MachineError::NoMemoryController)?;
        let io = self.io.clone().ok_or(MachineError::NoIoController)?;
        Ok((memory, io))
    }

    /// Checks performed before a run starts, so configuration errors never
    /// leave the machine running.
    fn prepare(&mut self) -> Result<u64, MachineError> {
        self.controllers()?;
        Ok(self.clock.set_tick_resolution(self.options.clock_resolution)?)
    }

    /// Run until quit, exit address or a fatal error. `entry` resets the CPU
    /// to that address first; `None` continues from the current registers.
    fn run(&mut self, entry: Option<u16>, phase: &AtomicU8) -> Result<u64, MachineError> {
        let resolution_ticks = self.prepare()?;
        let (memory, io) = self.controllers()?;
        let mut memory = memory.lock();
        let mut io = io.lock();

        let ticks_per_isr = (self.options.isr_freq * resolution_ticks as f64) as u64;
        if let Some(pc) = entry {
            self.cpu.reset(pc);
        }
        self.clock.reset();
        self.stats = RunStats::default();
        let mut last_isr_ticks = 0;

        phase.store(MachineState::Running as u8, Ordering::Release);
        debug!(pc = self.cpu.pc, resolution_ticks, ticks_per_isr, "run started");

        let result = loop {
            let total_ticks = self.clock.total_ticks();
            if total_ticks - last_isr_ticks >= ticks_per_isr {
                last_isr_ticks = total_ticks;
                match io.service_interrupts(self.clock.elapsed_ns(), total_ticks) {
                    Isr::NoInterrupt => {}
                    Isr::Quit => break Ok(()),
                    Isr::Save => self.save_requested(&mut *memory),
                    Isr::Load => self.load_requested(&mut *memory),
                    isr => {
                        self.stats.interrupts += 1;
                        self.cpu.signal_interrupt(isr);
                    }
                }
            }

            let was_halted = self.cpu.halted;
            let mut bus = SystemBus::new(&mut *memory, &mut *io);
            let step = match self.cpu.step_detailed(&mut bus) {
                Ok(step) => step,
                Err(err) => break Err(MachineError::from(err)),
            };
            self.clock.tick(step.cycles as u64);
            let executed = step.kind == StepKind::Executed;
            if executed {
                self.stats.instructions += 1;
            }

            if self.cpu.halted != was_halted {
                let state = if self.cpu.halted {
                    MachineState::Halted
                } else {
                    MachineState::Running
                };
                phase.store(state as u8, Ordering::Release);
            }
            // Vectoring to an interrupt or idling on HLT never reaches the exit address
            if executed && self.options.exit_address == Some(self.cpu.pc) {
                break Ok(());
            }
        };

        if self.clock.is_paced() {
            self.clock.sync();
        }
        self.stats.cycles = self.clock.total_ticks();
        self.stats.elapsed_ns = self.clock.elapsed_ns();
        self.stats.drift = self.clock.drift();
        phase.store(MachineState::Stopped as u8, Ordering::Release);

        match &result {
            Ok(()) => debug!(
                cycles = self.stats.cycles,
                instructions = self.stats.instructions,
                elapsed_ns = self.stats.elapsed_ns,
                "run stopped"
            ),
            Err(err) => warn!(%err, pc = self.cpu.pc, "run aborted"),
        }
        result.map(|()| self.stats.elapsed_ns)
    }

    fn save_requested(&mut self, memory: &mut dyn Controller) {
        let Some(hook) = self.on_save.as_mut() else {
            debug!("save requested without a save hook");
            return;
        };
        match Snapshot::capture(&self.cpu, memory, self.options.compressor)
            .map(|snapshot| snapshot.with_rom(memory, &self.options.rom))
            .and_then(|snapshot| snapshot.to_json())
        {
            Ok(json) => hook(&json),
            Err(err) => warn!(%err, "save request failed"),
        }
    }

    fn load_requested(&mut self, memory: &mut dyn Controller) {
        let Some(json) = self.on_load.as_mut().and_then(|hook| hook()) else {
            debug!("load requested with nothing to load");
            return;
        };
        if let Err(err) =
            Snapshot::from_json(&json).and_then(|snapshot| snapshot.restore(&mut self.cpu, memory))
        {
            warn!(%err, "load request failed");
        }
    }
}

/// An 8080 machine with pluggable memory and I/O controllers.
pub struct Machine {
    context: Arc<Mutex<ExecutionContext>>,
    phase: Arc<AtomicU8>,
    worker: Option<JoinHandle<Result<u64, MachineError>>>,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    pub fn new() -> Self {
        Self {
            context: Arc::new(Mutex::new(ExecutionContext::new())),
            phase: Arc::new(AtomicU8::new(MachineState::Idle as u8)),
            worker: None,
        }
    }

    pub fn status(&self) -> MachineState {
        match MachineState::from_u8(self.phase.load(Ordering::Acquire)) {
            MachineState::Idle => {
                let context = self.context.lock();
                if context.memory.is_some() && context.io.is_some() {
                    MachineState::Ready
                } else {
                    MachineState::Idle
                }
            }
            state => state,
        }
    }

    /// Lock the context for a configuration change or query.
    fn idle_context(&self) -> Result<parking_lot::MutexGuard<'_, ExecutionContext>, MachineError> {
        if MachineState::from_u8(self.phase.load(Ordering::Acquire)).is_active() {
            return Err(MachineError::Busy);
        }
        self.context.try_lock().ok_or(MachineError::Busy)
    }

    fn reset_phase(&self) {
        self.phase.store(MachineState::Idle as u8, Ordering::Release);
    }

    /// Attach the memory backend. `None` is rejected and the previous
    /// controller stays attached.
    pub fn set_memory_controller(
        &mut self,
        controller: Option<SharedController>,
    ) -> Result<(), MachineError> {
        let controller = controller.ok_or(MachineError::InvalidArgument)?;
        self.idle_context()?.memory = Some(controller);
        self.reset_phase();
        debug!("memory controller attached");
        Ok(())
    }

    /// Attach the I/O backend. `None` is rejected and the previous
    /// controller stays attached.
    pub fn set_io_controller(
        &mut self,
        controller: Option<SharedController>,
    ) -> Result<(), MachineError> {
        let controller = controller.ok_or(MachineError::InvalidArgument)?;
        self.idle_context()?.io = Some(controller);
        self.reset_phase();
        debug!("io controller attached");
        Ok(())
    }

    /// Nanoseconds of emulated time between syncs with real time.
    /// Zero fails; negative runs unpaced.
    pub fn set_clock_resolution(&mut self, resolution_ns: i64) -> Result<(), MachineError> {
        let mut context = self.idle_context()?;
        context.clock.set_tick_resolution(resolution_ns)?;
        context.options.clock_resolution = resolution_ns;
        Ok(())
    }

    /// Merge JSON options (or `file://<path>`); `None` restores defaults.
    pub fn set_options(&mut self, json: Option<&str>) -> Result<(), MachineError> {
        let mut context = self.idle_context()?;
        let mut options = match json {
            Some(json) => {
                let mut options = context.options.clone();
                options.merge_json(json)?;
                options
            }
            None => Options::default(),
        };
        context.clock.set_tick_resolution(options.clock_resolution)?;
        std::mem::swap(&mut context.options, &mut options);
        Ok(())
    }

    pub fn options(&self) -> Result<Options, MachineError> {
        Ok(self.idle_context()?.options.clone())
    }

    /// Called with the snapshot JSON when the I/O controller returns
    /// [`Isr::Save`].
    pub fn on_save(&mut self, hook: impl FnMut(&str) + Send + 'static) -> Result<(), MachineError> {
        self.idle_context()?.on_save = Some(Box::new(hook));
        Ok(())
    }

    /// Called for snapshot JSON when the I/O controller returns
    /// [`Isr::Load`]; `None` skips the load.
    pub fn on_load(
        &mut self,
        hook: impl FnMut() -> Option<String> + Send + 'static,
    ) -> Result<(), MachineError> {
        self.idle_context()?.on_load = Some(Box::new(hook));
        Ok(())
    }

    /// Reset the CPU to `pc` and run until the I/O controller returns
    /// [`Isr::Quit`] or PC reaches the exit address. Returns elapsed
    /// wall-clock nanoseconds.
    ///
    /// With the `runAsync` option set this starts the run on a worker
    /// thread and returns `Ok(0)`; collect the result with
    /// [`Machine::wait_for_completion`].
    pub fn run(&mut self, pc: u16) -> Result<u64, MachineError> {
        if self.idle_context()?.options.run_async {
            self.spawn(Some(pc))?;
            return Ok(0);
        }
        self.run_blocking(Some(pc))
    }

    /// Continue from the current CPU state, e.g. after [`Machine::load`].
    pub fn resume(&mut self) -> Result<u64, MachineError> {
        self.run_blocking(None)
    }

    fn run_blocking(&mut self, entry: Option<u16>) -> Result<u64, MachineError> {
        let mut context = self.idle_context()?;
        context.run(entry, &self.phase)
    }

    /// Start a run on a worker thread.
    pub fn run_async(&mut self, pc: u16) -> Result<(), MachineError> {
        self.spawn(Some(pc))
    }

    fn spawn(&mut self, entry: Option<u16>) -> Result<(), MachineError> {
        // A finished worker still holds a result for wait_for_completion
        if self.worker.is_some() {
            return Err(MachineError::Busy);
        }
        self.idle_context()?.prepare()?;

        let context = Arc::clone(&self.context);
        let phase = Arc::clone(&self.phase);
        self.phase.store(MachineState::Running as u8, Ordering::Release);
        let worker = std::thread::Builder::new()
            .name("cadence-run".into())
            .spawn(move || context.lock().run(entry, &phase));
        match worker {
            Ok(worker) => {
                self.worker = Some(worker);
                Ok(())
            }
            Err(err) => {
                self.phase.store(MachineState::Stopped as u8, Ordering::Release);
                Err(MachineError::Spawn(err))
            }
        }
    }

    /// Join the worker started by [`Machine::run_async`] and return its result.
    pub fn wait_for_completion(&mut self) -> Result<u64, MachineError> {
        let worker = self.worker.take().ok_or(MachineError::NotRunning)?;
        let result = worker.join().map_err(|_| MachineError::RunThread);
        if result.is_err() {
            self.phase.store(MachineState::Stopped as u8, Ordering::Release);
        }
        result?
    }

    /// Serialize registers and memory to snapshot JSON.
    pub fn save(&self) -> Result<String, MachineError> {
        let context = self.idle_context()?;
        let (memory, _) = context.controllers()?;
        let mut memory = memory.lock();
        let snapshot = Snapshot::capture(&context.cpu, &mut *memory, context.options.compressor)?
            .with_rom(&mut *memory, &context.options.rom);
        Ok(snapshot.to_json()?)
    }

    /// Restore a snapshot produced by [`Machine::save`]. A snapshot that
    /// fails validation leaves the machine untouched.
    pub fn load(&mut self, json: &str) -> Result<(), MachineError> {
        let mut context = self.idle_context()?;
        let (memory, _) = context.controllers()?;
        let snapshot = Snapshot::from_json(json)?;
        snapshot.restore(&mut context.cpu, &mut *memory.lock())?;
        Ok(())
    }

    pub fn cpu_state(&self) -> Result<I8080State, MachineError> {
        Ok(self.idle_context()?.cpu.snapshot())
    }

    /// Packed register dump, see [`I8080State::to_bytes`].
    pub fn state(&self) -> Result<[u8; 12], MachineError> {
        Ok(self.cpu_state()?.to_bytes())
    }

    pub fn stats(&self) -> Result<RunStats, MachineError> {
        Ok(self.idle_context()?.stats)
    }
}
