use cadence_core::core::Isr;
use cadence_core::cpu::Cpu;
use cadence_core::cpu::i8080::{HALT_IDLE_CYCLES, I8080, INTERRUPT_CYCLES};
mod common;
use common::{TestBus, cpu_at, step};

fn setup(program: &[u8]) -> (I8080, TestBus) {
    let cpu = cpu_at(0x0100);
    let mut bus = TestBus::new();
    bus.load(0x0100, program);
    (cpu, bus)
}

#[test]
fn test_interrupt_vectors_to_rst_address() {
    let (mut cpu, mut bus) = setup(&[0x00, 0x00]);
    cpu.iff = true;

    step(&mut cpu, &mut bus);
    cpu.signal_interrupt(Isr::Three);

    let cycles = step(&mut cpu, &mut bus);
    assert_eq!(cycles, INTERRUPT_CYCLES, "acknowledge costs an RST");
    assert_eq!(cycles, 11);
    assert_eq!(cpu.pc, 0x0018, "RST 3 vector");
    assert_eq!(cpu.sp, 0x0FFE);
    assert_eq!(bus.memory[0x0FFF], 0x01, "return address high byte");
    assert_eq!(bus.memory[0x0FFE], 0x01, "return address low byte");
    assert!(!cpu.iff, "acknowledge disables interrupts");
    assert_eq!(cpu.pending_interrupt(), None);
}

#[test]
fn test_interrupt_latched_while_disabled() {
    let (mut cpu, mut bus) = setup(&[0x00, 0x00, 0xFB, 0x00, 0x00]); // NOP; NOP; EI; NOP; NOP
    cpu.signal_interrupt(Isr::Seven);

    step(&mut cpu, &mut bus);
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x0102, "disabled interrupts do not vector");
    assert_eq!(cpu.pending_interrupt(), Some(7));

    step(&mut cpu, &mut bus); // EI
    assert!(cpu.iff);
    step(&mut cpu, &mut bus); // one more instruction runs after EI
    assert_eq!(cpu.pc, 0x0104);

    assert_eq!(step(&mut cpu, &mut bus), 11);
    assert_eq!(cpu.pc, 0x0038);
    assert_eq!(bus.memory[0x0FFE], 0x04, "returns to the instruction after the delay slot");
}

#[test]
fn test_di_masks_interrupts() {
    let (mut cpu, mut bus) = setup(&[0xF3, 0x00]); // DI; NOP
    cpu.iff = true;

    assert_eq!(step(&mut cpu, &mut bus), 4);
    cpu.signal_interrupt(Isr::One);
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x0102);
    assert_eq!(cpu.pending_interrupt(), Some(1));
}

#[test]
fn test_halt_waits_for_interrupt() {
    let (mut cpu, mut bus) = setup(&[0x76]); // HLT
    cpu.iff = true;

    assert_eq!(step(&mut cpu, &mut bus), 7, "HLT should be 7 T-states");
    assert!(cpu.is_sleeping());
    assert_eq!(cpu.pc, 0x0101);

    for _ in 0..3 {
        assert_eq!(step(&mut cpu, &mut bus), HALT_IDLE_CYCLES);
        assert_eq!(cpu.pc, 0x0101, "no fetch while halted");
    }

    cpu.signal_interrupt(Isr::Two);
    assert_eq!(step(&mut cpu, &mut bus), 11);
    assert!(!cpu.is_sleeping());
    assert_eq!(cpu.pc, 0x0010);
    assert_eq!(bus.memory[0x0FFE], 0x01, "returns past the HLT");
}

#[test]
fn test_control_signals_do_not_latch() {
    let mut cpu = cpu_at(0x0100);
    cpu.signal_interrupt(Isr::Quit);
    cpu.signal_interrupt(Isr::Save);
    cpu.signal_interrupt(Isr::NoInterrupt);
    assert_eq!(cpu.pending_interrupt(), None);
}

#[test]
fn test_handler_returns_with_ei_ret() {
    let (mut cpu, mut bus) = setup(&[0x00, 0x00]);
    bus.load(0x0008, &[0xFB, 0xC9]); // EI; RET
    cpu.iff = true;
    cpu.signal_interrupt(Isr::One);

    step(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x0008);
    step(&mut cpu, &mut bus); // EI
    step(&mut cpu, &mut bus); // RET
    assert_eq!(cpu.pc, 0x0100);
    assert!(cpu.iff);
}

#[test]
fn test_isr_vectors() {
    assert_eq!(Isr::Zero.vector(), Some(0x00));
    assert_eq!(Isr::Seven.vector(), Some(0x38));
    assert_eq!(Isr::Quit.vector(), None);
    assert_eq!(Isr::from_rst(4), Some(Isr::Four));
    assert_eq!(Isr::from_rst(8), None);
}
