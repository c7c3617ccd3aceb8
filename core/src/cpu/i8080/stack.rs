use crate::core::Bus;
use crate::cpu::i8080::{I8080, Operands, Outcome};

impl I8080 {
    pub(crate) fn push(&mut self, bus: &mut dyn Bus, val: u16) {
        self.sp = self.sp.wrapping_sub(1);
        bus.write(self.sp, (val >> 8) as u8);
        self.sp = self.sp.wrapping_sub(1);
        bus.write(self.sp, val as u8);
    }

    pub(crate) fn pop(&mut self, bus: &mut dyn Bus) -> u16 {
        let val = bus.read_word(self.sp);
        self.sp = self.sp.wrapping_add(2);
        val
    }

    /// PUSH rp — 11 T (BC, DE, HL, PSW)
    pub fn op_push(&mut self, bus: &mut dyn Bus, op: Operands) -> Outcome {
        let val = self.get_rp_psw(op.rp());
        self.push(bus, val);
        Outcome::Taken
    }

    /// POP rp — 10 T. POP PSW restores flags through the fixed-bit mask.
    pub fn op_pop(&mut self, bus: &mut dyn Bus, op: Operands) -> Outcome {
        let val = self.pop(bus);
        self.set_rp_psw(op.rp(), val);
        Outcome::Taken
    }

    /// XTHL — 18 T
    pub fn op_xthl(&mut self, bus: &mut dyn Bus, _op: Operands) -> Outcome {
        let top = bus.read_word(self.sp);
        bus.write_word(self.sp, self.get_hl());
        self.set_hl(top);
        Outcome::Taken
    }

    /// SPHL — 5 T
    pub fn op_sphl(&mut self, _bus: &mut dyn Bus, _op: Operands) -> Outcome {
        self.sp = self.get_hl();
        Outcome::Taken
    }
}
