mod alu;
mod branch;
mod load_store;
pub mod opcodes;
mod stack;

use tracing::trace;

use crate::core::{Bus, Isr};
use crate::cpu::{
    Cpu, CpuError, Step, StepKind,
    state::{CpuStateTrait, I8080State},
};

pub use opcodes::{Instruction, OPCODES, Operands, Outcome};

/// Cycles charged for acknowledging an interrupt (the injected RST).
pub const INTERRUPT_CYCLES: u8 = 11;

/// Cycles charged per boundary while halted.
pub const HALT_IDLE_CYCLES: u8 = 4;

#[repr(u8)]
#[derive(Copy, Clone, Debug)]
pub enum Flag {
    C = 0x01,  // Carry
    P = 0x04,  // Parity (even)
    AC = 0x10, // Auxiliary carry
    Z = 0x40,  // Zero
    S = 0x80,  // Sign
}

/// Flag bits the CPU may change.
pub const FLAGS_WRITABLE: u8 = 0xD7;
/// Bit 1 of the flag byte always reads as 1.
pub const FLAGS_FIXED: u8 = 0x02;

pub struct I8080 {
    // Registers
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    f: u8,
    pub sp: u16,
    pub pc: u16,

    // Internal state
    pub iff: bool,
    pub halted: bool,
    pub ei_delay: bool,
    /// Restart number of a latched interrupt request.
    pending: Option<u8>,
}

impl Default for I8080 {
    fn default() -> Self {
        Self::new()
    }
}

impl I8080 {
    pub fn new() -> Self {
        Self {
            a: 0,
            b: 0,
            c: 0,
            d: 0,
            e: 0,
            h: 0,
            l: 0,
            f: FLAGS_FIXED,
            sp: 0,
            pc: 0,
            iff: false,
            halted: false,
            ei_delay: false,
            pending: None,
        }
    }

    // Helpers for 16-bit register access
    pub fn get_bc(&self) -> u16 { ((self.b as u16) << 8) | self.c as u16 }
    pub fn set_bc(&mut self, val: u16) { self.b = (val >> 8) as u8; self.c = val as u8; }

    pub fn get_de(&self) -> u16 { ((self.d as u16) << 8) | self.e as u16 }
    pub fn set_de(&mut self, val: u16) { self.d = (val >> 8) as u8; self.e = val as u8; }

    pub fn get_hl(&self) -> u16 { ((self.h as u16) << 8) | self.l as u16 }
    pub fn set_hl(&mut self, val: u16) { self.h = (val >> 8) as u8; self.l = val as u8; }

    /// Processor status word: A in the high byte, flags in the low byte.
    pub fn get_psw(&self) -> u16 { ((self.a as u16) << 8) | self.f as u16 }
    pub fn set_psw(&mut self, val: u16) { self.a = (val >> 8) as u8; self.set_flags(val as u8); }

    pub fn flags(&self) -> u8 {
        self.f
    }

    /// Replace the flag byte, forcing bits 1, 3 and 5 to their fixed values.
    pub fn set_flags(&mut self, val: u8) {
        self.f = (val & FLAGS_WRITABLE) | FLAGS_FIXED;
    }

    pub fn flag(&self, flag: Flag) -> bool {
        self.f & flag as u8 != 0
    }

    pub fn set_flag(&mut self, flag: Flag, on: bool) {
        if on {
            self.f |= flag as u8;
        } else {
            self.f &= !(flag as u8);
        }
    }

    /// Restart number of the latched interrupt, if any.
    pub fn pending_interrupt(&self) -> Option<u8> {
        self.pending
    }

    /// Get 8-bit register by index (0=B, 1=C, 2=D, 3=E, 4=H, 5=L, 7=A).
    /// Index 6 (M) goes through [`I8080::read_operand`].
    pub fn get_reg8(&self, index: u8) -> u8 {
        match index {
            0 => self.b,
            1 => self.c,
            2 => self.d,
            3 => self.e,
            4 => self.h,
            5 => self.l,
            7 => self.a,
            _ => unreachable!("get_reg8 called with index {}", index),
        }
    }

    pub fn set_reg8(&mut self, index: u8, val: u8) {
        match index {
            0 => self.b = val,
            1 => self.c = val,
            2 => self.d = val,
            3 => self.e = val,
            4 => self.h = val,
            5 => self.l = val,
            7 => self.a = val,
            _ => unreachable!("set_reg8 called with index {}", index),
        }
    }

    /// Read register `index`, or memory at HL for index 6 (M).
    pub(crate) fn read_operand(&self, bus: &mut dyn Bus, index: u8) -> u8 {
        if index == 6 {
            bus.read(self.get_hl())
        } else {
            self.get_reg8(index)
        }
    }

    pub(crate) fn write_operand(&mut self, bus: &mut dyn Bus, index: u8, val: u8) {
        if index == 6 {
            bus.write(self.get_hl(), val);
        } else {
            self.set_reg8(index, val);
        }
    }

    /// Get 16-bit register pair by index (0=BC, 1=DE, 2=HL, 3=SP).
    pub(crate) fn get_rp(&self, index: u8) -> u16 {
        match index {
            0 => self.get_bc(),
            1 => self.get_de(),
            2 => self.get_hl(),
            3 => self.sp,
            _ => unreachable!("get_rp called with index {}", index),
        }
    }

    pub(crate) fn set_rp(&mut self, index: u8, val: u16) {
        match index {
            0 => self.set_bc(val),
            1 => self.set_de(val),
            2 => self.set_hl(val),
            3 => self.sp = val,
            _ => unreachable!("set_rp called with index {}", index),
        }
    }

    /// Get 16-bit register pair by index for PUSH/POP (0=BC, 1=DE, 2=HL, 3=PSW).
    pub(crate) fn get_rp_psw(&self, index: u8) -> u16 {
        match index {
            3 => self.get_psw(),
            _ => self.get_rp(index),
        }
    }

    pub(crate) fn set_rp_psw(&mut self, index: u8, val: u16) {
        match index {
            3 => self.set_psw(val),
            _ => self.set_rp(index, val),
        }
    }

    /// Fetch, decode and execute the instruction at PC. Returns cycles.
    ///
    /// PC is advanced past the instruction before its handler runs, so
    /// control transfers simply overwrite it.
    pub fn execute(&mut self, bus: &mut dyn Bus) -> Result<u8, CpuError> {
        let pc = self.pc;
        let opcode = bus.read(pc);
        let instr = &OPCODES[opcode as usize];
        let data = match instr.size {
            1 => 0,
            2 => bus.read(pc.wrapping_add(1)) as u16,
            3 => bus.read_word(pc.wrapping_add(1)),
            _ => return Err(CpuError::Decode { opcode, pc }),
        };
        self.pc = pc.wrapping_add(instr.size as u16);

        let outcome = (instr.exec)(self, bus, Operands { opcode, data });
        Ok(match outcome {
            Outcome::Taken => instr.cycles,
            Outcome::NotTaken => instr.cycles_not_taken,
        })
    }

    /// Vector to a latched interrupt if interrupts are enabled.
    ///
    /// Acknowledging pushes PC, jumps to the restart address, clears the
    /// interrupt enable and leaves the halt state.
    fn acknowledge_interrupt(&mut self, bus: &mut dyn Bus) -> Option<u8> {
        if self.ei_delay {
            // EI delay: skip interrupt check for one instruction after EI
            self.ei_delay = false;
            return None;
        }
        if !self.iff {
            return None;
        }
        let rst = self.pending.take()?;
        trace!(rst, pc = self.pc, "interrupt acknowledged");
        self.iff = false;
        self.halted = false;
        self.push(bus, self.pc);
        self.pc = rst as u16 * 8;
        Some(INTERRUPT_CYCLES)
    }

    /// NOP — 4 T (also the undocumented 0x08, 0x10, ... 0x38 aliases)
    pub fn op_nop(&mut self, _bus: &mut dyn Bus, _op: Operands) -> Outcome {
        Outcome::Taken
    }

    /// HLT — 7 T
    pub fn op_hlt(&mut self, _bus: &mut dyn Bus, _op: Operands) -> Outcome {
        self.halted = true;
        Outcome::Taken
    }

    /// EI — 4 T. Interrupts are accepted after the following instruction.
    pub fn op_ei(&mut self, _bus: &mut dyn Bus, _op: Operands) -> Outcome {
        self.iff = true;
        self.ei_delay = true;
        Outcome::Taken
    }

    /// DI — 4 T
    pub fn op_di(&mut self, _bus: &mut dyn Bus, _op: Operands) -> Outcome {
        self.iff = false;
        Outcome::Taken
    }
}

impl Cpu for I8080 {
    fn reset(&mut self, pc: u16) {
        *self = Self::new();
        self.pc = pc;
    }

    fn step_detailed(&mut self, bus: &mut dyn Bus) -> Result<Step, CpuError> {
        if let Some(cycles) = self.acknowledge_interrupt(bus) {
            return Ok(Step {
                cycles,
                kind: StepKind::Interrupt,
            });
        }
        if self.halted {
            return Ok(Step {
                cycles: HALT_IDLE_CYCLES,
                kind: StepKind::Idle,
            });
        }
        let cycles = self.execute(bus)?;
        Ok(Step {
            cycles,
            kind: StepKind::Executed,
        })
    }

    fn signal_interrupt(&mut self, isr: Isr) {
        if let Some(rst) = isr.rst() {
            self.pending = Some(rst);
        }
    }

    fn is_sleeping(&self) -> bool {
        self.halted
    }
}

impl CpuStateTrait for I8080 {
    type Snapshot = I8080State;

    fn snapshot(&self) -> I8080State {
        I8080State {
            a: self.a,
            b: self.b,
            c: self.c,
            d: self.d,
            e: self.e,
            h: self.h,
            l: self.l,
            f: self.f,
            sp: self.sp,
            pc: self.pc,
            iff: self.iff,
            halted: self.halted,
        }
    }

    fn restore(&mut self, s: &I8080State) {
        self.a = s.a;
        self.b = s.b;
        self.c = s.c;
        self.d = s.d;
        self.e = s.e;
        self.h = s.h;
        self.l = s.l;
        self.set_flags(s.f);
        self.sp = s.sp;
        self.pc = s.pc;
        self.iff = s.iff;
        self.halted = s.halted;
        self.ei_delay = false;
        self.pending = None;
    }
}
