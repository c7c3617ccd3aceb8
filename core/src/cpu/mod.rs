use thiserror::Error;

use crate::core::{Bus, Isr};

/// Generic CPU interface
pub trait Cpu: CpuStateTrait {
    /// Reset registers and start fetching at `pc`
    fn reset(&mut self, pc: u16);

    /// Run one instruction boundary: acknowledge a pending interrupt,
    /// idle while halted, or execute the next instruction.
    fn step_detailed(&mut self, bus: &mut dyn Bus) -> Result<Step, CpuError>;

    /// Like [`Cpu::step_detailed`], returning only the cycles spent.
    fn step(&mut self, bus: &mut dyn Bus) -> Result<u8, CpuError> {
        self.step_detailed(bus).map(|step| step.cycles)
    }

    /// Latch a vectored interrupt request
    fn signal_interrupt(&mut self, isr: Isr);

    /// Query if CPU is halted internally (HLT instruction)
    fn is_sleeping(&self) -> bool;
}

/// What a single [`Cpu::step_detailed`] call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepKind {
    /// Fetched and executed an instruction.
    Executed,
    /// Pushed PC and vectored to a restart address.
    Interrupt,
    /// Halted; no instruction was fetched.
    Idle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    pub cycles: u8,
    pub kind: StepKind,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CpuError {
    #[error("opcode {opcode:#04x} at {pc:#06x} has no valid encoding")]
    Decode { opcode: u8, pc: u16 },
}

// Re-export state types
pub mod state;
pub use state::{CpuStateTrait, I8080State};

// Intel 8080 CPU
pub mod i8080;
pub use i8080::I8080;
