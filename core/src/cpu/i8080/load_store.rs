use crate::core::Bus;
use crate::cpu::i8080::{I8080, Operands, Outcome};

impl I8080 {
    /// MOV r, r' — 5 T (reg) or 7 T (M)
    /// Opcode mask: 01 ddd sss (01 110 110 is HLT)
    pub fn op_mov(&mut self, bus: &mut dyn Bus, op: Operands) -> Outcome {
        let val = self.read_operand(bus, op.src());
        self.write_operand(bus, op.dst(), val);
        Outcome::Taken
    }

    /// MVI r, d8 — 7 T (reg) or 10 T (M)
    pub fn op_mvi(&mut self, bus: &mut dyn Bus, op: Operands) -> Outcome {
        self.write_operand(bus, op.dst(), op.byte());
        Outcome::Taken
    }

    /// LXI rp, d16 — 10 T
    pub fn op_lxi(&mut self, _bus: &mut dyn Bus, op: Operands) -> Outcome {
        self.set_rp(op.rp(), op.word());
        Outcome::Taken
    }

    /// LDA a16 — 13 T
    pub fn op_lda(&mut self, bus: &mut dyn Bus, op: Operands) -> Outcome {
        self.a = bus.read(op.word());
        Outcome::Taken
    }

    /// STA a16 — 13 T
    pub fn op_sta(&mut self, bus: &mut dyn Bus, op: Operands) -> Outcome {
        bus.write(op.word(), self.a);
        Outcome::Taken
    }

    /// LHLD a16 — 16 T
    pub fn op_lhld(&mut self, bus: &mut dyn Bus, op: Operands) -> Outcome {
        let val = bus.read_word(op.word());
        self.set_hl(val);
        Outcome::Taken
    }

    /// SHLD a16 — 16 T
    pub fn op_shld(&mut self, bus: &mut dyn Bus, op: Operands) -> Outcome {
        bus.write_word(op.word(), self.get_hl());
        Outcome::Taken
    }

    /// LDAX B / LDAX D — 7 T
    pub fn op_ldax(&mut self, bus: &mut dyn Bus, op: Operands) -> Outcome {
        self.a = bus.read(self.get_rp(op.rp()));
        Outcome::Taken
    }

    /// STAX B / STAX D — 7 T
    pub fn op_stax(&mut self, bus: &mut dyn Bus, op: Operands) -> Outcome {
        bus.write(self.get_rp(op.rp()), self.a);
        Outcome::Taken
    }

    /// XCHG — 4 T
    pub fn op_xchg(&mut self, _bus: &mut dyn Bus, _op: Operands) -> Outcome {
        let de = self.get_de();
        self.set_de(self.get_hl());
        self.set_hl(de);
        Outcome::Taken
    }

    /// IN d8 — 10 T
    pub fn op_in(&mut self, bus: &mut dyn Bus, op: Operands) -> Outcome {
        self.a = bus.io_read(op.byte());
        Outcome::Taken
    }

    /// OUT d8 — 10 T
    pub fn op_out(&mut self, bus: &mut dyn Bus, op: Operands) -> Outcome {
        bus.io_write(op.byte(), self.a);
        Outcome::Taken
    }
}
