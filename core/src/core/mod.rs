pub mod bus;
pub mod controller;
pub mod error;
pub mod machine;
pub mod options;

pub use bus::{Bus, SystemBus};
pub use controller::{Controller, Isr, SharedController, share};
pub use error::MachineError;
pub use machine::{Machine, MachineState, RunStats};
pub use options::{Options, OptionsError};
