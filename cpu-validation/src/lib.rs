use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use cadence_core::core::Bus;
use cadence_core::cpu::I8080;
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};

// --- TracingBus: flat 64KB memory and 256 ports, recording every access ---

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BusOp {
    Read,
    Write,
    In,
    Out,
}

impl BusOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BusOp::Read => "read",
            BusOp::Write => "write",
            BusOp::In => "in",
            BusOp::Out => "out",
        }
    }
}

#[derive(Clone, Debug)]
pub struct BusCycle {
    pub addr: u16,
    pub data: u8,
    pub op: BusOp,
}

pub struct TracingBus {
    pub memory: [u8; 0x10000],
    /// Value returned by IN for each port.
    pub ports: [u8; 0x100],
    pub cycles: Vec<BusCycle>,
}

impl TracingBus {
    pub fn new() -> Self {
        Self {
            memory: [0; 0x10000],
            ports: [0; 0x100],
            cycles: Vec::new(),
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }

    pub fn clear_cycles(&mut self) {
        self.cycles.clear();
    }
}

impl Default for TracingBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for TracingBus {
    fn read(&mut self, addr: u16) -> u8 {
        let data = self.memory[addr as usize];
        self.cycles.push(BusCycle {
            addr,
            data,
            op: BusOp::Read,
        });
        data
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.memory[addr as usize] = data;
        self.cycles.push(BusCycle {
            addr,
            data,
            op: BusOp::Write,
        });
    }

    fn io_read(&mut self, port: u8) -> u8 {
        let data = self.ports[port as usize];
        self.cycles.push(BusCycle {
            addr: port as u16,
            data,
            op: BusOp::In,
        });
        data
    }

    fn io_write(&mut self, port: u8, data: u8) {
        self.cycles.push(BusCycle {
            addr: port as u16,
            data,
            op: BusOp::Out,
        });
    }
}

// --- JSON test vector types ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct I8080TestCase {
    pub name: String,
    pub initial: I8080CpuState,
    #[serde(rename = "final")]
    pub final_state: I8080CpuState,
    /// T-states reported for the instruction.
    pub t_states: u8,
    /// Every bus access in order: (address or port, data, "read"/"write"/"in"/"out").
    pub cycles: Vec<(u16, u8, String)>,
    /// Values presented to IN: (port, data).
    #[serde(default)]
    pub ports: Vec<(u8, u8)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct I8080CpuState {
    pub pc: u16,
    pub sp: u16,
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub f: u8,
    pub iff: bool,
    pub ram: Vec<(u16, u8)>,
}

impl I8080CpuState {
    /// Registers of `cpu`, with an empty `ram` list.
    pub fn capture(cpu: &I8080) -> Self {
        Self {
            pc: cpu.pc,
            sp: cpu.sp,
            a: cpu.a,
            b: cpu.b,
            c: cpu.c,
            d: cpu.d,
            e: cpu.e,
            h: cpu.h,
            l: cpu.l,
            f: cpu.flags(),
            iff: cpu.iff,
            ram: Vec::new(),
        }
    }

    /// Load registers and `ram` into a CPU and bus.
    pub fn apply(&self, cpu: &mut I8080, bus: &mut TracingBus) {
        cpu.pc = self.pc;
        cpu.sp = self.sp;
        cpu.a = self.a;
        cpu.b = self.b;
        cpu.c = self.c;
        cpu.d = self.d;
        cpu.e = self.e;
        cpu.h = self.h;
        cpu.l = self.l;
        cpu.set_flags(self.f);
        cpu.iff = self.iff;
        for &(addr, val) in &self.ram {
            bus.memory[addr as usize] = val;
        }
    }
}

/// Read a vector file, gzip-compressed when the name ends in `.gz`.
pub fn load_test_file(path: &Path) -> io::Result<Vec<I8080TestCase>> {
    let mut file = BufReader::new(File::open(path)?);
    let mut json = String::new();
    if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        GzDecoder::new(file).read_to_string(&mut json)?;
    } else {
        file.read_to_string(&mut json)?;
    }
    serde_json::from_str(&json).map_err(io::Error::from)
}
