pub mod clock;
pub mod core;
pub mod cpu;
pub mod snapshot;

pub mod prelude {
    pub use crate::clock::{CpuClock, I8080_CLOCK_HZ};
    pub use crate::core::{
        Bus, Controller, Isr, Machine, MachineError, MachineState, Options, SharedController, share,
    };
    pub use crate::cpu::{Cpu, CpuStateTrait, I8080};
    pub use crate::snapshot::{Compressor, MemoryRegion, Snapshot};
}
