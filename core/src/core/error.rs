use thiserror::Error;

use crate::clock::ClockError;
use crate::cpu::CpuError;
use crate::core::options::OptionsError;
use crate::snapshot::SnapshotError;

/// Errors returned by [`Machine`](crate::core::machine::Machine) operations.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("an argument supplied to the method is invalid")]
    InvalidArgument,
    #[error("the clock resolution must be non-zero")]
    ClockResolution,
    #[error("no memory controller has been set")]
    NoMemoryController,
    #[error("no io controller has been set")]
    NoIoController,
    #[error("the machine is running")]
    Busy,
    #[error("no asynchronous run is in progress")]
    NotRunning,
    #[error("failed to start the run thread: {0}")]
    Spawn(std::io::Error),
    #[error("the run thread terminated abnormally")]
    RunThread,
    #[error(transparent)]
    Options(#[from] OptionsError),
    #[error(transparent)]
    Cpu(#[from] CpuError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

impl From<ClockError> for MachineError {
    fn from(err: ClockError) -> Self {
        match err {
            ClockError::Resolution => MachineError::ClockResolution,
        }
    }
}
