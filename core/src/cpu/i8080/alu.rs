use crate::core::Bus;
use crate::cpu::i8080::{Flag, I8080, Operands, Outcome};

impl I8080 {
    // --- Flag Helpers ---

    fn get_parity(val: u8) -> bool {
        val.count_ones() % 2 == 0
    }

    /// S, Z and P for `result`; every other bit clear.
    fn szp(result: u8) -> u8 {
        let mut f = 0;
        if result == 0 { f |= Flag::Z as u8; }
        if (result & 0x80) != 0 { f |= Flag::S as u8; }
        if Self::get_parity(result) { f |= Flag::P as u8; }
        f
    }

    fn carry_in(&self, use_carry: bool) -> u8 {
        (use_carry && self.flag(Flag::C)) as u8
    }

    fn do_add(&mut self, val: u8, use_carry: bool) {
        let a = self.a;
        let c = self.carry_in(use_carry);
        let sum = a as u16 + val as u16 + c as u16;
        let result = sum as u8;

        let mut f = Self::szp(result);
        if (a & 0x0F) + (val & 0x0F) + c > 0x0F { f |= Flag::AC as u8; }
        if sum > 0xFF { f |= Flag::C as u8; }

        self.a = result;
        self.set_flags(f);
    }

    /// A - val - borrow, setting flags. Returns the result without storing it.
    ///
    /// AC is the carry out of bit 3 of `a + !val + !borrow`, which is how the
    /// 8080 forms subtraction internally.
    fn do_sub(&mut self, val: u8, use_borrow: bool) -> u8 {
        let a = self.a;
        let borrow = self.carry_in(use_borrow);
        let result = a.wrapping_sub(val).wrapping_sub(borrow);

        let mut f = Self::szp(result);
        if (a & 0x0F) + (!val & 0x0F) + (1 - borrow) > 0x0F { f |= Flag::AC as u8; }
        if (a as u16) < val as u16 + borrow as u16 { f |= Flag::C as u8; }

        self.set_flags(f);
        result
    }

    fn perform_alu_op(&mut self, op: u8, val: u8) {
        match op {
            0 => self.do_add(val, false),          // ADD
            1 => self.do_add(val, true),           // ADC
            2 => self.a = self.do_sub(val, false), // SUB
            3 => self.a = self.do_sub(val, true),  // SBB
            4 => {
                // ANA: AC reflects bit 3 of either operand
                let mut f = Self::szp(self.a & val);
                if ((self.a | val) & 0x08) != 0 { f |= Flag::AC as u8; }
                self.a &= val;
                self.set_flags(f);
            }
            5 => { self.a ^= val; self.set_flags(Self::szp(self.a)); } // XRA
            6 => { self.a |= val; self.set_flags(Self::szp(self.a)); } // ORA
            7 => { self.do_sub(val, false); }                          // CMP
            _ => unreachable!(),
        }
    }

    // --- Instructions ---

    /// ALU A, r — 4 T (reg) or 7 T (M)
    /// ADD, ADC, SUB, SBB, ANA, XRA, ORA, CMP
    /// Opcode mask: 10 xxx zzz
    pub fn op_alu_r(&mut self, bus: &mut dyn Bus, op: Operands) -> Outcome {
        let val = self.read_operand(bus, op.src());
        self.perform_alu_op(op.dst(), val);
        Outcome::Taken
    }

    /// ALU A, d8 — 7 T
    /// ADI, ACI, SUI, SBI, ANI, XRI, ORI, CPI
    /// Opcode mask: 11 xxx 110
    pub fn op_alu_imm(&mut self, _bus: &mut dyn Bus, op: Operands) -> Outcome {
        self.perform_alu_op(op.dst(), op.byte());
        Outcome::Taken
    }

    /// INR r — 5 T (reg) or 10 T (M). Carry is preserved.
    pub fn op_inr(&mut self, bus: &mut dyn Bus, op: Operands) -> Outcome {
        let r = op.dst();
        let result = self.read_operand(bus, r).wrapping_add(1);
        self.write_operand(bus, r, result);

        let mut f = Self::szp(result) | (self.flags() & Flag::C as u8);
        if (result & 0x0F) == 0 { f |= Flag::AC as u8; }
        self.set_flags(f);
        Outcome::Taken
    }

    /// DCR r — 5 T (reg) or 10 T (M). Carry is preserved.
    pub fn op_dcr(&mut self, bus: &mut dyn Bus, op: Operands) -> Outcome {
        let r = op.dst();
        let result = self.read_operand(bus, r).wrapping_sub(1);
        self.write_operand(bus, r, result);

        let mut f = Self::szp(result) | (self.flags() & Flag::C as u8);
        if (result & 0x0F) != 0x0F { f |= Flag::AC as u8; }
        self.set_flags(f);
        Outcome::Taken
    }

    /// INX rp — 5 T. No flags.
    pub fn op_inx(&mut self, _bus: &mut dyn Bus, op: Operands) -> Outcome {
        let rp = op.rp();
        self.set_rp(rp, self.get_rp(rp).wrapping_add(1));
        Outcome::Taken
    }

    /// DCX rp — 5 T. No flags.
    pub fn op_dcx(&mut self, _bus: &mut dyn Bus, op: Operands) -> Outcome {
        let rp = op.rp();
        self.set_rp(rp, self.get_rp(rp).wrapping_sub(1));
        Outcome::Taken
    }

    /// DAD rp — 10 T. Only carry is affected.
    pub fn op_dad(&mut self, _bus: &mut dyn Bus, op: Operands) -> Outcome {
        let sum = self.get_hl() as u32 + self.get_rp(op.rp()) as u32;
        self.set_hl(sum as u16);
        self.set_flag(Flag::C, sum > 0xFFFF);
        Outcome::Taken
    }

    /// DAA — 4 T
    pub fn op_daa(&mut self, _bus: &mut dyn Bus, _op: Operands) -> Outcome {
        let a = self.a;
        let lsb = a & 0x0F;
        let msb = a >> 4;
        let mut correction = 0u8;
        let mut carry = self.flag(Flag::C);

        if self.flag(Flag::AC) || lsb > 9 {
            correction |= 0x06;
        }
        if carry || msb > 9 || (msb >= 9 && lsb > 9) {
            correction |= 0x60;
            carry = true;
        }

        let result = a.wrapping_add(correction);
        let mut f = Self::szp(result);
        if (a & 0x0F) + (correction & 0x0F) > 0x0F { f |= Flag::AC as u8; }
        if carry { f |= Flag::C as u8; }
        self.a = result;
        self.set_flags(f);
        Outcome::Taken
    }

    /// RLC, RRC, RAL, RAR — 4 T. Only carry is affected.
    /// Opcode mask: 00 0xx 111
    pub fn op_rotate(&mut self, _bus: &mut dyn Bus, op: Operands) -> Outcome {
        let a = self.a;
        let carry = self.flag(Flag::C) as u8;
        let (result, carry_out) = match op.dst() {
            0 => (a.rotate_left(1), a & 0x80 != 0),          // RLC
            1 => (a.rotate_right(1), a & 0x01 != 0),         // RRC
            2 => ((a << 1) | carry, a & 0x80 != 0),          // RAL
            3 => ((a >> 1) | (carry << 7), a & 0x01 != 0),   // RAR
            _ => unreachable!(),
        };
        self.a = result;
        self.set_flag(Flag::C, carry_out);
        Outcome::Taken
    }

    /// CMA — 4 T. No flags.
    pub fn op_cma(&mut self, _bus: &mut dyn Bus, _op: Operands) -> Outcome {
        self.a = !self.a;
        Outcome::Taken
    }

    /// STC — 4 T
    pub fn op_stc(&mut self, _bus: &mut dyn Bus, _op: Operands) -> Outcome {
        self.set_flag(Flag::C, true);
        Outcome::Taken
    }

    /// CMC — 4 T
    pub fn op_cmc(&mut self, _bus: &mut dyn Bus, _op: Operands) -> Outcome {
        let carry = self.flag(Flag::C);
        self.set_flag(Flag::C, !carry);
        Outcome::Taken
    }
}
