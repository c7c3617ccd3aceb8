use cadence_core::cpu::i8080::{Flag, I8080};
mod common;
use common::{TestBus, cpu_at, step};

fn setup(program: &[u8]) -> (I8080, TestBus) {
    let cpu = cpu_at(0x0100);
    let mut bus = TestBus::new();
    bus.load(0x0100, program);
    (cpu, bus)
}

#[test]
fn test_jmp() {
    let (mut cpu, mut bus) = setup(&[0xC3, 0x00, 0x3E]); // JMP 3E00

    assert_eq!(step(&mut cpu, &mut bus), 10);
    assert_eq!(cpu.pc, 0x3E00);
}

#[test]
fn test_conditional_jump_costs_same_either_way() {
    let (mut cpu, mut bus) = setup(&[0xCA, 0x00, 0x20, 0xCA, 0x00, 0x20]); // JZ 2000; JZ 2000
    cpu.set_flag(Flag::Z, false);

    assert_eq!(step(&mut cpu, &mut bus), 10);
    assert_eq!(cpu.pc, 0x0103, "not taken falls through");

    cpu.set_flag(Flag::Z, true);
    assert_eq!(step(&mut cpu, &mut bus), 10);
    assert_eq!(cpu.pc, 0x2000);
}

#[test]
fn test_all_jump_conditions() {
    // (opcode, flag, flag value that takes the jump)
    let cases = [
        (0xC2, Flag::Z, false), // JNZ
        (0xCA, Flag::Z, true),  // JZ
        (0xD2, Flag::C, false), // JNC
        (0xDA, Flag::C, true),  // JC
        (0xE2, Flag::P, false), // JPO
        (0xEA, Flag::P, true),  // JPE
        (0xF2, Flag::S, false), // JP
        (0xFA, Flag::S, true),  // JM
    ];
    for (opcode, flag, taken_when) in cases {
        for value in [false, true] {
            let (mut cpu, mut bus) = setup(&[opcode, 0x34, 0x12]);
            cpu.set_flag(flag, value);
            step(&mut cpu, &mut bus);
            let expected = if value == taken_when { 0x1234 } else { 0x0103 };
            assert_eq!(cpu.pc, expected, "opcode {opcode:#04X} with {flag:?}={value}");
        }
    }
}

#[test]
fn test_call_and_ret() {
    let (mut cpu, mut bus) = setup(&[0xCD, 0x00, 0x20]); // CALL 2000
    bus.load(0x2000, &[0xC9]); // RET

    assert_eq!(step(&mut cpu, &mut bus), 17, "CALL should be 17 T-states");
    assert_eq!(cpu.pc, 0x2000);
    assert_eq!(cpu.sp, 0x0FFE);
    assert_eq!(bus.memory[0x0FFF], 0x01, "return address high byte");
    assert_eq!(bus.memory[0x0FFE], 0x03, "return address low byte");

    assert_eq!(step(&mut cpu, &mut bus), 10, "RET should be 10 T-states");
    assert_eq!(cpu.pc, 0x0103);
    assert_eq!(cpu.sp, 0x1000);
}

#[test]
fn test_conditional_call_cycles() {
    let (mut cpu, mut bus) = setup(&[0xDC, 0x00, 0x20, 0xDC, 0x00, 0x20]); // CC 2000; CC 2000
    cpu.set_flag(Flag::C, false);

    assert_eq!(step(&mut cpu, &mut bus), 11, "Ccc not taken should be 11 T-states");
    assert_eq!(cpu.pc, 0x0103);
    assert_eq!(cpu.sp, 0x1000);

    cpu.set_flag(Flag::C, true);
    assert_eq!(step(&mut cpu, &mut bus), 17, "Ccc taken should be 17 T-states");
    assert_eq!(cpu.pc, 0x2000);
}

#[test]
fn test_conditional_return_cycles() {
    let (mut cpu, mut bus) = setup(&[0xC0, 0xC0]); // RNZ; RNZ
    bus.load(0x0FFE, &[0x00, 0x30]);
    cpu.sp = 0x0FFE;
    cpu.set_flag(Flag::Z, true);

    assert_eq!(step(&mut cpu, &mut bus), 5, "Rcc not taken should be 5 T-states");
    assert_eq!(cpu.pc, 0x0101);

    cpu.set_flag(Flag::Z, false);
    assert_eq!(step(&mut cpu, &mut bus), 11, "Rcc taken should be 11 T-states");
    assert_eq!(cpu.pc, 0x3000);
    assert_eq!(cpu.sp, 0x1000);
}

#[test]
fn test_rst() {
    let (mut cpu, mut bus) = setup(&[0xEF]); // RST 5

    assert_eq!(step(&mut cpu, &mut bus), 11);
    assert_eq!(cpu.pc, 0x0028);
    assert_eq!(bus.memory[0x0FFF], 0x01);
    assert_eq!(bus.memory[0x0FFE], 0x01, "pushes the address after RST");
}

#[test]
fn test_pchl() {
    let (mut cpu, mut bus) = setup(&[0xE9]); // PCHL
    cpu.set_hl(0x413E);

    assert_eq!(step(&mut cpu, &mut bus), 5);
    assert_eq!(cpu.pc, 0x413E);
}

#[test]
fn test_undocumented_aliases() {
    // 0xCB behaves as JMP
    let (mut cpu, mut bus) = setup(&[0xCB, 0x00, 0x30]);
    assert_eq!(step(&mut cpu, &mut bus), 10);
    assert_eq!(cpu.pc, 0x3000);

    // 0xDD/0xED/0xFD behave as CALL
    for opcode in [0xDD, 0xED, 0xFD] {
        let (mut cpu, mut bus) = setup(&[opcode, 0x00, 0x30]);
        assert_eq!(step(&mut cpu, &mut bus), 17);
        assert_eq!(cpu.pc, 0x3000);
        assert_eq!(cpu.sp, 0x0FFE);
    }

    // 0xD9 behaves as RET
    let (mut cpu, mut bus) = setup(&[0xD9]);
    bus.load(0x1000, &[0x34, 0x12]);
    assert_eq!(step(&mut cpu, &mut bus), 10);
    assert_eq!(cpu.pc, 0x1234);

    // 0x08..0x38 behave as NOP
    for opcode in [0x08, 0x10, 0x18, 0x20, 0x28, 0x30, 0x38] {
        let (mut cpu, mut bus) = setup(&[opcode]);
        assert_eq!(step(&mut cpu, &mut bus), 4);
        assert_eq!(cpu.pc, 0x0101);
    }
}
