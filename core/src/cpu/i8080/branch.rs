use crate::core::Bus;
use crate::cpu::i8080::{Flag, I8080, Operands, Outcome};

impl I8080 {
    /// Evaluate condition code (0=NZ, 1=Z, 2=NC, 3=C, 4=PO, 5=PE, 6=P, 7=M).
    pub(crate) fn eval_condition(&self, cc: u8) -> bool {
        match cc {
            0 => !self.flag(Flag::Z),
            1 => self.flag(Flag::Z),
            2 => !self.flag(Flag::C),
            3 => self.flag(Flag::C),
            4 => !self.flag(Flag::P),
            5 => self.flag(Flag::P),
            6 => !self.flag(Flag::S),
            7 => self.flag(Flag::S),
            _ => unreachable!(),
        }
    }

    /// JMP a16 — 10 T (also undocumented 0xCB)
    pub fn op_jmp(&mut self, _bus: &mut dyn Bus, op: Operands) -> Outcome {
        self.pc = op.word();
        Outcome::Taken
    }

    /// Jcc a16 — 10 T whether or not the jump is taken
    /// Opcode mask: 11 ccc 010
    pub fn op_jmp_cc(&mut self, _bus: &mut dyn Bus, op: Operands) -> Outcome {
        if self.eval_condition(op.dst()) {
            self.pc = op.word();
            Outcome::Taken
        } else {
            Outcome::NotTaken
        }
    }

    /// CALL a16 — 17 T (also undocumented 0xDD, 0xED, 0xFD)
    pub fn op_call(&mut self, bus: &mut dyn Bus, op: Operands) -> Outcome {
        self.push(bus, self.pc);
        self.pc = op.word();
        Outcome::Taken
    }

    /// Ccc a16 — 17 T (taken) / 11 T (not taken)
    /// Opcode mask: 11 ccc 100
    pub fn op_call_cc(&mut self, bus: &mut dyn Bus, op: Operands) -> Outcome {
        if self.eval_condition(op.dst()) {
            self.op_call(bus, op)
        } else {
            Outcome::NotTaken
        }
    }

    /// RET — 10 T (also undocumented 0xD9)
    pub fn op_ret(&mut self, bus: &mut dyn Bus, _op: Operands) -> Outcome {
        self.pc = self.pop(bus);
        Outcome::Taken
    }

    /// Rcc — 11 T (taken) / 5 T (not taken)
    /// Opcode mask: 11 ccc 000
    pub fn op_ret_cc(&mut self, bus: &mut dyn Bus, op: Operands) -> Outcome {
        if self.eval_condition(op.dst()) {
            self.op_ret(bus, op)
        } else {
            Outcome::NotTaken
        }
    }

    /// RST n — 11 T
    /// Opcode mask: 11 nnn 111
    pub fn op_rst(&mut self, bus: &mut dyn Bus, op: Operands) -> Outcome {
        self.push(bus, self.pc);
        self.pc = op.dst() as u16 * 8;
        Outcome::Taken
    }

    /// PCHL — 5 T
    pub fn op_pchl(&mut self, _bus: &mut dyn Bus, _op: Operands) -> Outcome {
        self.pc = self.get_hl();
        Outcome::Taken
    }
}
