use cadence_controllers::MemoryController;
use cadence_controllers::TestIoController;
use cadence_core::core::{Isr, Machine, share};

/// EI; spin. The RST 1 handler increments the device register and quits.
fn interrupt_program() -> MemoryController {
    let mut memory = MemoryController::new();
    memory.load_bytes(0x0000, &[0xFB, 0xC3, 0x01, 0x00]).unwrap(); // EI; JMP 0001
    // IN 1; INR A; OUT 1; OUT 0
    memory
        .load_bytes(0x0008, &[0xDB, 0x01, 0x3C, 0xD3, 0x01, 0xD3, 0x00])
        .unwrap();
    memory
}

#[test]
fn test_timer_interrupt_reaches_handler() {
    let (io, io_shared) = share(TestIoController::with_period(2_000_000));
    let (_, memory_shared) = share(interrupt_program());
    let mut machine = Machine::new();
    machine.set_memory_controller(Some(memory_shared)).unwrap();
    machine.set_io_controller(Some(io_shared)).unwrap();

    let elapsed = machine.run(0x0000).unwrap();
    assert!(elapsed >= 2_000_000, "fires after one period of wall-clock time");
    assert_eq!(io.lock().device_data(), 0xAB);
    assert_eq!(machine.stats().unwrap().interrupts, 1);
}

#[test]
fn test_raised_interrupt_uses_its_vector() {
    let mut memory = interrupt_program();
    // Move the handler to RST 6 and leave RST 1 as a bare return
    memory.load_bytes(0x0030, &[0xDB, 0x01, 0x3C, 0xD3, 0x01, 0xD3, 0x00]).unwrap();
    memory.load_bytes(0x0008, &[0xFB, 0xC9]).unwrap();
    let mut controller = TestIoController::new();
    controller.raise(Isr::Six);
    let (io, io_shared) = share(controller);
    let (_, memory_shared) = share(memory);

    let mut machine = Machine::new();
    machine.set_memory_controller(Some(memory_shared)).unwrap();
    machine.set_io_controller(Some(io_shared)).unwrap();
    machine.run(0x0000).unwrap();

    assert_eq!(io.lock().device_data(), 0xAB);
}
