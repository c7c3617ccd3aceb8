//! Flat opcode table: one descriptor per opcode byte, built at compile time.

use std::fmt;

use crate::core::Bus;
use crate::cpu::i8080::I8080;

/// Which cycle cost a handler's path incurs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Unconditional instruction, or condition met.
    Taken,
    NotTaken,
}

/// Opcode byte and operand bytes of the instruction being executed.
///
/// `data` holds the immediate byte or little-endian word; zero for
/// single-byte instructions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Operands {
    pub opcode: u8,
    pub data: u16,
}

impl Operands {
    pub fn byte(&self) -> u8 {
        self.data as u8
    }

    pub fn word(&self) -> u16 {
        self.data
    }

    /// Bits 5..3: destination register, ALU op, condition or restart number.
    pub fn dst(&self) -> u8 {
        (self.opcode >> 3) & 0x07
    }

    /// Bits 2..0: source register.
    pub fn src(&self) -> u8 {
        self.opcode & 0x07
    }

    /// Bits 5..4: register pair.
    pub fn rp(&self) -> u8 {
        (self.opcode >> 4) & 0x03
    }
}

pub type Handler = fn(&mut I8080, &mut dyn Bus, Operands) -> Outcome;

#[derive(Clone, Copy)]
pub struct Instruction {
    /// Assembler form with `d8`, `d16` or `a16` standing for operand bytes.
    /// Undocumented aliases carry a leading `*`.
    pub mnemonic: &'static str,
    /// Length in bytes including the opcode (1-3).
    pub size: u8,
    /// Cycles when the instruction is unconditional or its condition holds.
    pub cycles: u8,
    pub cycles_not_taken: u8,
    pub exec: Handler,
}

impl Instruction {
    pub fn is_documented(&self) -> bool {
        !self.mnemonic.starts_with('*')
    }

    pub fn is_conditional(&self) -> bool {
        self.cycles != self.cycles_not_taken
    }

    /// Render with operands substituted, e.g. `JMP $0100`.
    pub fn disassemble(&self, data: u16) -> String {
        let text = self.mnemonic.trim_start_matches('*');
        text.replace("d16", &format!("${data:04X}"))
            .replace("a16", &format!("${data:04X}"))
            .replace("d8", &format!("${:02X}", data as u8))
    }
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instruction")
            .field("mnemonic", &self.mnemonic)
            .field("size", &self.size)
            .field("cycles", &self.cycles)
            .field("cycles_not_taken", &self.cycles_not_taken)
            .finish()
    }
}

pub static OPCODES: [Instruction; 256] = build_table();

const fn build_table() -> [Instruction; 256] {
    let mut table = [decode(0); 256];
    let mut i = 0;
    while i < 256 {
        table[i] = decode(i as u8);
        i += 1;
    }
    table
}

const fn decode(op: u8) -> Instruction {
    let (size, cycles, cycles_not_taken, exec): (u8, u8, u8, Handler) = match op {
        0x00 | 0x08 | 0x10 | 0x18 | 0x20 | 0x28 | 0x30 | 0x38 => (1, 4, 4, I8080::op_nop),
        0x76 => (1, 7, 7, I8080::op_hlt),

        // 00 xxx xxx: loads, 16-bit arithmetic, INR/DCR/MVI, rotates
        op if op & 0xCF == 0x01 => (3, 10, 10, I8080::op_lxi),
        0x02 | 0x12 => (1, 7, 7, I8080::op_stax),
        0x0A | 0x1A => (1, 7, 7, I8080::op_ldax),
        0x22 => (3, 16, 16, I8080::op_shld),
        0x2A => (3, 16, 16, I8080::op_lhld),
        0x32 => (3, 13, 13, I8080::op_sta),
        0x3A => (3, 13, 13, I8080::op_lda),
        op if op & 0xCF == 0x03 => (1, 5, 5, I8080::op_inx),
        op if op & 0xCF == 0x0B => (1, 5, 5, I8080::op_dcx),
        op if op & 0xCF == 0x09 => (1, 10, 10, I8080::op_dad),
        0x34 => (1, 10, 10, I8080::op_inr),
        0x35 => (1, 10, 10, I8080::op_dcr),
        0x36 => (2, 10, 10, I8080::op_mvi),
        op if op & 0xC7 == 0x04 => (1, 5, 5, I8080::op_inr),
        op if op & 0xC7 == 0x05 => (1, 5, 5, I8080::op_dcr),
        op if op & 0xC7 == 0x06 => (2, 7, 7, I8080::op_mvi),
        0x07 | 0x0F | 0x17 | 0x1F => (1, 4, 4, I8080::op_rotate),
        0x27 => (1, 4, 4, I8080::op_daa),
        0x2F => (1, 4, 4, I8080::op_cma),
        0x37 => (1, 4, 4, I8080::op_stc),
        0x3F => (1, 4, 4, I8080::op_cmc),

        // 01 ddd sss: MOV
        op if op & 0xC0 == 0x40 => {
            let cycles = if op & 0x07 == 6 || op & 0x38 == 0x30 { 7 } else { 5 };
            (1, cycles, cycles, I8080::op_mov)
        }

        // 10 xxx sss: ALU with register or M
        op if op & 0xC0 == 0x80 => {
            let cycles = if op & 0x07 == 6 { 7 } else { 4 };
            (1, cycles, cycles, I8080::op_alu_r)
        }

        // 11 xxx xxx: control flow, stack, immediates, I/O
        0xC9 | 0xD9 => (1, 10, 10, I8080::op_ret),
        0xC3 | 0xCB => (3, 10, 10, I8080::op_jmp),
        0xCD | 0xDD | 0xED | 0xFD => (3, 17, 17, I8080::op_call),
        0xD3 => (2, 10, 10, I8080::op_out),
        0xDB => (2, 10, 10, I8080::op_in),
        0xE3 => (1, 18, 18, I8080::op_xthl),
        0xE9 => (1, 5, 5, I8080::op_pchl),
        0xEB => (1, 4, 4, I8080::op_xchg),
        0xF3 => (1, 4, 4, I8080::op_di),
        0xF9 => (1, 5, 5, I8080::op_sphl),
        0xFB => (1, 4, 4, I8080::op_ei),
        op if op & 0xC7 == 0xC0 => (1, 11, 5, I8080::op_ret_cc),
        op if op & 0xCF == 0xC1 => (1, 10, 10, I8080::op_pop),
        op if op & 0xC7 == 0xC2 => (3, 10, 10, I8080::op_jmp_cc),
        op if op & 0xC7 == 0xC4 => (3, 17, 11, I8080::op_call_cc),
        op if op & 0xCF == 0xC5 => (1, 11, 11, I8080::op_push),
        op if op & 0xC7 == 0xC6 => (2, 7, 7, I8080::op_alu_imm),
        _ => (1, 11, 11, I8080::op_rst),
    };

    Instruction {
        mnemonic: MNEMONICS[op as usize],
        size,
        cycles,
        cycles_not_taken,
        exec,
    }
}

const MNEMONICS: [&str; 256] = [
    // 0x00
    "NOP", "LXI B,d16", "STAX B", "INX B",
    "INR B", "DCR B", "MVI B,d8", "RLC",
    "*NOP", "DAD B", "LDAX B", "DCX B",
    "INR C", "DCR C", "MVI C,d8", "RRC",
    // 0x10
    "*NOP", "LXI D,d16", "STAX D", "INX D",
    "INR D", "DCR D", "MVI D,d8", "RAL",
    "*NOP", "DAD D", "LDAX D", "DCX D",
    "INR E", "DCR E", "MVI E,d8", "RAR",
    // 0x20
    "*NOP", "LXI H,d16", "SHLD a16", "INX H",
    "INR H", "DCR H", "MVI H,d8", "DAA",
    "*NOP", "DAD H", "LHLD a16", "DCX H",
    "INR L", "DCR L", "MVI L,d8", "CMA",
    // 0x30
    "*NOP", "LXI SP,d16", "STA a16", "INX SP",
    "INR M", "DCR M", "MVI M,d8", "STC",
    "*NOP", "DAD SP", "LDA a16", "DCX SP",
    "INR A", "DCR A", "MVI A,d8", "CMC",
    // 0x40
    "MOV B,B", "MOV B,C", "MOV B,D", "MOV B,E",
    "MOV B,H", "MOV B,L", "MOV B,M", "MOV B,A",
    "MOV C,B", "MOV C,C", "MOV C,D", "MOV C,E",
    "MOV C,H", "MOV C,L", "MOV C,M", "MOV C,A",
    // 0x50
    "MOV D,B", "MOV D,C", "MOV D,D", "MOV D,E",
    "MOV D,H", "MOV D,L", "MOV D,M", "MOV D,A",
    "MOV E,B", "MOV E,C", "MOV E,D", "MOV E,E",
    "MOV E,H", "MOV E,L", "MOV E,M", "MOV E,A",
    // 0x60
    "MOV H,B", "MOV H,C", "MOV H,D", "MOV H,E",
    "MOV H,H", "MOV H,L", "MOV H,M", "MOV H,A",
    "MOV L,B", "MOV L,C", "MOV L,D", "MOV L,E",
    "MOV L,H", "MOV L,L", "MOV L,M", "MOV L,A",
    // 0x70
    "MOV M,B", "MOV M,C", "MOV M,D", "MOV M,E",
    "MOV M,H", "MOV M,L", "HLT", "MOV M,A",
    "MOV A,B", "MOV A,C", "MOV A,D", "MOV A,E",
    "MOV A,H", "MOV A,L", "MOV A,M", "MOV A,A",
    // 0x80
    "ADD B", "ADD C", "ADD D", "ADD E",
    "ADD H", "ADD L", "ADD M", "ADD A",
    "ADC B", "ADC C", "ADC D", "ADC E",
    "ADC H", "ADC L", "ADC M", "ADC A",
    // 0x90
    "SUB B", "SUB C", "SUB D", "SUB E",
    "SUB H", "SUB L", "SUB M", "SUB A",
    "SBB B", "SBB C", "SBB D", "SBB E",
    "SBB H", "SBB L", "SBB M", "SBB A",
    // 0xA0
    "ANA B", "ANA C", "ANA D", "ANA E",
    "ANA H", "ANA L", "ANA M", "ANA A",
    "XRA B", "XRA C", "XRA D", "XRA E",
    "XRA H", "XRA L", "XRA M", "XRA A",
    // 0xB0
    "ORA B", "ORA C", "ORA D", "ORA E",
    "ORA H", "ORA L", "ORA M", "ORA A",
    "CMP B", "CMP C", "CMP D", "CMP E",
    "CMP H", "CMP L", "CMP M", "CMP A",
    // 0xC0
    "RNZ", "POP B", "JNZ a16", "JMP a16",
    "CNZ a16", "PUSH B", "ADI d8", "RST 0",
    "RZ", "RET", "JZ a16", "*JMP a16",
    "CZ a16", "CALL a16", "ACI d8", "RST 1",
    // 0xD0
    "RNC", "POP D", "JNC a16", "OUT d8",
    "CNC a16", "PUSH D", "SUI d8", "RST 2",
    "RC", "*RET", "JC a16", "IN d8",
    "CC a16", "*CALL a16", "SBI d8", "RST 3",
    // 0xE0
    "RPO", "POP H", "JPO a16", "XTHL",
    "CPO a16", "PUSH H", "ANI d8", "RST 4",
    "RPE", "PCHL", "JPE a16", "XCHG",
    "CPE a16", "*CALL a16", "XRI d8", "RST 5",
    // 0xF0
    "RP", "POP PSW", "JP a16", "DI",
    "CP a16", "PUSH PSW", "ORI d8", "RST 6",
    "RM", "SPHL", "JM a16", "EI",
    "CM a16", "*CALL a16", "CPI d8", "RST 7",
];
