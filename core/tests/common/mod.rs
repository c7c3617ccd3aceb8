#![allow(dead_code)]

use std::collections::VecDeque;

use cadence_core::core::{Bus, Controller, Isr};
use cadence_core::cpu::{Cpu, I8080};

/// Minimal bus for testing: flat 64KB read/write memory, 256 I/O ports.
/// Port writes are also logged in order.
pub struct TestBus {
    pub memory: [u8; 0x10000],
    pub ports: [u8; 256],
    pub io_log: Vec<(u8, u8)>,
}

impl TestBus {
    pub fn new() -> Self {
        Self {
            memory: [0; 0x10000],
            ports: [0; 256],
            io_log: Vec::new(),
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }
}

impl Bus for TestBus {
    fn read(&mut self, addr: u16) -> u8 {
        self.memory[addr as usize]
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.memory[addr as usize] = data;
    }

    fn io_read(&mut self, port: u8) -> u8 {
        self.ports[port as usize]
    }

    fn io_write(&mut self, port: u8, data: u8) {
        self.ports[port as usize] = data;
        self.io_log.push((port, data));
    }
}

/// Execute one instruction boundary and return its cycles.
pub fn step(cpu: &mut I8080, bus: &mut TestBus) -> u8 {
    cpu.step(bus).unwrap()
}

/// CPU reset to `pc` with SP at 0x1000.
pub fn cpu_at(pc: u16) -> I8080 {
    let mut cpu = I8080::new();
    cpu.reset(pc);
    cpu.sp = 0x1000;
    cpu
}

/// Flat 64KB memory controller.
pub struct RamController {
    pub memory: Vec<u8>,
}

impl RamController {
    pub fn new() -> Self {
        Self {
            memory: vec![0; 0x10000],
        }
    }

    pub fn with_program(addr: u16, program: &[u8]) -> Self {
        let mut ram = Self::new();
        let start = addr as usize;
        ram.memory[start..start + program.len()].copy_from_slice(program);
        ram
    }
}

impl Controller for RamController {
    fn read(&mut self, address: u16) -> u8 {
        self.memory[address as usize]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.memory[address as usize] = value;
    }
}

/// I/O controller for machine tests.
///
/// A write to port 0 requests quit; port 1 writes are collected in
/// `output`. `script` holds signals to return from successive polls
/// once `cycles` reaches the given count.
pub struct ScriptedIo {
    pub output: Vec<u8>,
    pub script: VecDeque<(u64, Isr)>,
    pub polls: u64,
    quit: bool,
}

impl ScriptedIo {
    pub fn new() -> Self {
        Self {
            output: Vec::new(),
            script: VecDeque::new(),
            polls: 0,
            quit: false,
        }
    }

    pub fn with_script(script: &[(u64, Isr)]) -> Self {
        let mut io = Self::new();
        io.script = script.iter().copied().collect();
        io
    }
}

impl Controller for ScriptedIo {
    fn read(&mut self, _address: u16) -> u8 {
        0
    }

    fn write(&mut self, address: u16, value: u8) {
        match address {
            0 => self.quit = true,
            1 => self.output.push(value),
            _ => {}
        }
    }

    fn service_interrupts(&mut self, _curr_time: u64, cycles: u64) -> Isr {
        self.polls += 1;
        if self.quit {
            return Isr::Quit;
        }
        match self.script.front() {
            Some(&(at, isr)) if cycles >= at => {
                self.script.pop_front();
                isr
            }
            _ => Isr::NoInterrupt,
        }
    }
}
