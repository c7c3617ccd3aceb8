//! Minimal CP/M environment for running console programs such as the
//! classic 8080 CPU diagnostics.
//!
//! Only what those programs use is provided: warm boot through address
//! 0x0000 stops the machine, and BDOS functions 2 (console output) and 9
//! (print `$`-terminated string) are served by a small 8080 routine that
//! writes characters to port 1.

use std::path::Path;
use std::sync::Arc;

use cadence_core::core::{Controller, Isr, Machine, MachineError, SharedController, share};
use parking_lot::Mutex;

use crate::CONTROL_PORT;
use crate::memory::{LoadError, MemoryController};
use crate::registry::IoControllerEntry;

/// Console character output.
pub const CONSOLE_PORT: u16 = 0x01;
/// A write here requests [`Isr::Load`].
pub const LOAD_PORT: u16 = 0xFD;
/// A write here requests [`Isr::Save`].
pub const SAVE_PORT: u16 = 0xFE;

/// Transient program area, where CP/M loads .COM files.
pub const TPA: u16 = 0x0100;
/// Where the BDOS stub lives; 0x0006 points here, so programs that take
/// their stack from it stay below.
pub const BDOS_STUB: u16 = 0xFF00;

/// OUT 0; HLT
const WARM_BOOT: [u8; 3] = [0xD3, 0x00, 0x76];

const BDOS_ENTRY: [u8; 3] = [0xC3, BDOS_STUB as u8, (BDOS_STUB >> 8) as u8];

#[rustfmt::skip]
const BDOS_ROUTINE: [u8; 26] = [
    0x79,             // FF00 MOV A,C
    0xFE, 0x02,       // FF01 CPI 2
    0xCA, 0x0C, 0xFF, // FF03 JZ  putch
    0xFE, 0x09,       // FF06 CPI 9
    0xCA, 0x10, 0xFF, // FF08 JZ  putstr
    0xC9,             // FF0B RET
    0x7B,             // FF0C putch: MOV A,E
    0xD3, 0x01,       // FF0D OUT 1
    0xC9,             // FF0F RET
    0x1A,             // FF10 putstr: LDAX D
    0xFE, b'$',       // FF11 CPI '$'
    0xC8,             // FF13 RZ
    0xD3, 0x01,       // FF14 OUT 1
    0x13,             // FF16 INX D
    0xC3, 0x10, 0xFF, // FF17 JMP putstr
];

/// Write the warm-boot trap, the BDOS entry jump and the BDOS routine.
pub fn install_cpm_stubs(memory: &mut dyn Controller) {
    let regions: [(u16, &[u8]); 3] = [
        (0x0000, &WARM_BOOT),
        (0x0005, &BDOS_ENTRY),
        (BDOS_STUB, &BDOS_ROUTINE),
    ];
    for (base, bytes) in regions {
        for (i, &byte) in bytes.iter().enumerate() {
            memory.write(base + i as u16, byte);
        }
    }
}

/// I/O controller for CP/M console programs.
///
/// Port 1 output accumulates in [`CpmIoController::message`] (and is echoed
/// to stdout when enabled). Writing port 0 quits; ports 0xFD and 0xFE
/// request a load or a save.
#[derive(Default)]
pub struct CpmIoController {
    message: String,
    echo: bool,
    quit: bool,
    requested: Option<Isr>,
    save_at: Option<u64>,
}

impl CpmIoController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_echo(echo: bool) -> Self {
        Self {
            echo,
            ..Self::default()
        }
    }

    /// Request one save once the run reaches `cycles`.
    pub fn save_at(&mut self, cycles: u64) {
        self.save_at = Some(cycles);
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn take_message(&mut self) -> String {
        std::mem::take(&mut self.message)
    }

    /// Ready for another run: output kept, quit request cleared.
    pub fn rearm(&mut self) {
        self.quit = false;
        self.requested = None;
    }
}

impl Controller for CpmIoController {
    fn read(&mut self, _address: u16) -> u8 {
        0x00
    }

    fn write(&mut self, address: u16, value: u8) {
        match address {
            CONTROL_PORT => self.quit = true,
            CONSOLE_PORT => {
                let ch = value as char;
                self.message.push(ch);
                if self.echo {
                    print!("{ch}");
                }
            }
            LOAD_PORT => self.requested = Some(Isr::Load),
            SAVE_PORT => self.requested = Some(Isr::Save),
            _ => {}
        }
    }

    fn service_interrupts(&mut self, _curr_time: u64, cycles: u64) -> Isr {
        if self.quit {
            return Isr::Quit;
        }
        if let Some(isr) = self.requested.take() {
            return isr;
        }
        if self.save_at.is_some_and(|at| cycles >= at) {
            self.save_at = None;
            return Isr::Save;
        }
        Isr::NoInterrupt
    }
}

fn create_console() -> SharedController {
    share(CpmIoController::with_echo(true)).1
}

inventory::submit! {
    IoControllerEntry::new(
        "cpm",
        "CP/M console: BDOS output on port 1, quit on port 0",
        create_console,
    )
}

/// A machine set up to run one CP/M .COM program from the TPA.
pub struct CpmSystem {
    pub machine: Machine,
    memory: Arc<Mutex<MemoryController>>,
    console: Arc<Mutex<CpmIoController>>,
}

impl CpmSystem {
    pub fn new(echo: bool) -> Result<Self, MachineError> {
        let mut memory = MemoryController::new();
        install_cpm_stubs(&mut memory);
        let (memory, memory_shared) = share(memory);
        let (console, console_shared) = share(CpmIoController::with_echo(echo));

        let mut machine = Machine::new();
        machine.set_memory_controller(Some(memory_shared))?;
        machine.set_io_controller(Some(console_shared))?;
        Ok(Self {
            machine,
            memory,
            console,
        })
    }

    pub fn load_program(&mut self, program: &[u8]) -> Result<(), LoadError> {
        self.memory.lock().load_bytes(TPA, program)
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<usize, LoadError> {
        self.memory.lock().load_file(path, TPA)
    }

    /// Run from the TPA until warm boot. Returns the console output of
    /// this run.
    pub fn run(&mut self) -> Result<String, MachineError> {
        self.console.lock().rearm();
        self.machine.run(TPA)?;
        Ok(self.console.lock().take_message())
    }

    pub fn memory(&self) -> Arc<Mutex<MemoryController>> {
        Arc::clone(&self.memory)
    }

    pub fn console(&self) -> Arc<Mutex<CpmIoController>> {
        Arc::clone(&self.console)
    }
}
