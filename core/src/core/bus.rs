use crate::core::controller::Controller;

/// Address and data path seen by the CPU.
///
/// Memory uses the full 16-bit address space; the I/O space is addressed
/// by an 8-bit port number, as driven by IN/OUT.
pub trait Bus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);

    /// Read from I/O port space (separate from memory on the 8080).
    fn io_read(&mut self, port: u8) -> u8;

    /// Write to I/O port space (separate from memory on the 8080).
    fn io_write(&mut self, port: u8, data: u8);

    /// Read a little-endian word at `addr` (high byte from `addr + 1`, wrapping).
    fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        let hi = self.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    /// Write a little-endian word at `addr`.
    fn write_word(&mut self, addr: u16, data: u16) {
        self.write(addr, data as u8);
        self.write(addr.wrapping_add(1), (data >> 8) as u8);
    }
}

/// Routes memory cycles to one controller and port cycles to another.
///
/// Ports are zero-extended to a 16-bit address before reaching the I/O
/// controller.
pub struct SystemBus<'a> {
    memory: &'a mut dyn Controller,
    io: &'a mut dyn Controller,
}

impl<'a> SystemBus<'a> {
    pub fn new(memory: &'a mut dyn Controller, io: &'a mut dyn Controller) -> Self {
        Self { memory, io }
    }
}

impl Bus for SystemBus<'_> {
    fn read(&mut self, addr: u16) -> u8 {
        self.memory.read(addr)
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.memory.write(addr, data)
    }

    fn io_read(&mut self, port: u8) -> u8 {
        self.io.read(port as u16)
    }

    fn io_write(&mut self, port: u8, data: u8) {
        self.io.write(port as u16, data)
    }
}
