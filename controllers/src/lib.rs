pub mod cpm;
pub mod memory;
pub mod registry;
pub mod test_io;

pub use cpm::{CpmIoController, CpmSystem};
pub use memory::{LoadError, MemoryController};
pub use test_io::TestIoController;

/// Port whose writes ask the machine to stop.
pub const CONTROL_PORT: u16 = 0x00;
