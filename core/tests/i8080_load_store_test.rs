use cadence_core::cpu::i8080::I8080;
mod common;
use common::{TestBus, cpu_at, step};

fn setup(program: &[u8]) -> (I8080, TestBus) {
    let cpu = cpu_at(0x0100);
    let mut bus = TestBus::new();
    bus.load(0x0100, program);
    (cpu, bus)
}

#[test]
fn test_mov_register_to_register() {
    let (mut cpu, mut bus) = setup(&[0x78]); // MOV A,B
    cpu.b = 0x5C;

    let cycles = step(&mut cpu, &mut bus);
    assert_eq!(cycles, 5, "MOV r,r should be 5 T-states");
    assert_eq!(cpu.a, 0x5C);
    assert_eq!(cpu.pc, 0x0101);
}

#[test]
fn test_mov_through_memory() {
    let (mut cpu, mut bus) = setup(&[0x77, 0x4E]); // MOV M,A; MOV C,M
    cpu.a = 0xA5;
    cpu.set_hl(0x2345);

    assert_eq!(step(&mut cpu, &mut bus), 7, "MOV M,r should be 7 T-states");
    assert_eq!(bus.memory[0x2345], 0xA5);

    assert_eq!(step(&mut cpu, &mut bus), 7, "MOV r,M should be 7 T-states");
    assert_eq!(cpu.c, 0xA5);
}

#[test]
fn test_mvi() {
    let (mut cpu, mut bus) = setup(&[0x26, 0x3C, 0x36, 0xFF]); // MVI H,3C; MVI M,FF

    assert_eq!(step(&mut cpu, &mut bus), 7);
    assert_eq!(cpu.h, 0x3C);

    cpu.l = 0x10;
    assert_eq!(step(&mut cpu, &mut bus), 10, "MVI M should be 10 T-states");
    assert_eq!(bus.memory[0x3C10], 0xFF);
    assert_eq!(cpu.pc, 0x0104);
}

#[test]
fn test_lxi_all_pairs() {
    let (mut cpu, mut bus) = setup(&[
        0x01, 0x34, 0x12, // LXI B,1234
        0x11, 0x78, 0x56, // LXI D,5678
        0x21, 0xBC, 0x9A, // LXI H,9ABC
        0x31, 0xF0, 0xDE, // LXI SP,DEF0
    ]);

    for _ in 0..4 {
        assert_eq!(step(&mut cpu, &mut bus), 10);
    }
    assert_eq!(cpu.get_bc(), 0x1234);
    assert_eq!(cpu.get_de(), 0x5678);
    assert_eq!(cpu.get_hl(), 0x9ABC);
    assert_eq!(cpu.sp, 0xDEF0);
}

#[test]
fn test_sta_lda() {
    let (mut cpu, mut bus) = setup(&[0x32, 0x00, 0x30, 0x3A, 0x01, 0x30]); // STA 3000; LDA 3001
    cpu.a = 0x42;
    bus.memory[0x3001] = 0x99;

    assert_eq!(step(&mut cpu, &mut bus), 13);
    assert_eq!(bus.memory[0x3000], 0x42);
    assert_eq!(step(&mut cpu, &mut bus), 13);
    assert_eq!(cpu.a, 0x99);
}

#[test]
fn test_shld_lhld() {
    let (mut cpu, mut bus) = setup(&[0x22, 0x0A, 0x01, 0x2A, 0x0A, 0x01]); // SHLD 010A; LHLD 010A
    cpu.set_hl(0xAE29);

    assert_eq!(step(&mut cpu, &mut bus), 16);
    assert_eq!(bus.memory[0x010A], 0x29, "L stored first");
    assert_eq!(bus.memory[0x010B], 0xAE);

    cpu.set_hl(0x0000);
    assert_eq!(step(&mut cpu, &mut bus), 16);
    assert_eq!(cpu.get_hl(), 0xAE29);
}

#[test]
fn test_stax_ldax() {
    let (mut cpu, mut bus) = setup(&[0x12, 0x0A]); // STAX D; LDAX B
    cpu.a = 0x77;
    cpu.set_de(0x4000);
    cpu.set_bc(0x4001);
    bus.memory[0x4001] = 0x11;

    assert_eq!(step(&mut cpu, &mut bus), 7);
    assert_eq!(bus.memory[0x4000], 0x77);
    assert_eq!(step(&mut cpu, &mut bus), 7);
    assert_eq!(cpu.a, 0x11);
}

#[test]
fn test_xchg() {
    let (mut cpu, mut bus) = setup(&[0xEB]); // XCHG
    cpu.set_de(0x1111);
    cpu.set_hl(0x2222);

    assert_eq!(step(&mut cpu, &mut bus), 4);
    assert_eq!(cpu.get_de(), 0x2222);
    assert_eq!(cpu.get_hl(), 0x1111);
}

#[test]
fn test_in_out() {
    let (mut cpu, mut bus) = setup(&[0xDB, 0x10, 0xD3, 0x11]); // IN 10; OUT 11
    bus.ports[0x10] = 0x5A;

    assert_eq!(step(&mut cpu, &mut bus), 10);
    assert_eq!(cpu.a, 0x5A);
    assert_eq!(step(&mut cpu, &mut bus), 10);
    assert_eq!(bus.io_log, vec![(0x11, 0x5A)]);
}

#[test]
fn test_operand_fetch_wraps_address_space() {
    let mut cpu = cpu_at(0xFFFF);
    let mut bus = TestBus::new();
    bus.memory[0xFFFF] = 0x3E; // MVI A,d8 with the operand at 0x0000
    bus.memory[0x0000] = 0x81;

    step(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0x81);
    assert_eq!(cpu.pc, 0x0001);
}
