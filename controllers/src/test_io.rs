use std::collections::VecDeque;

use cadence_core::core::{Controller, Isr, SharedController, share};

use crate::CONTROL_PORT;
use crate::registry::IoControllerEntry;

/// Read/write device register.
pub const DEVICE_PORT: u16 = 0x01;
/// Initial value of the device register.
pub const DEVICE_RESET: u8 = 0xAA;

const ONE_SECOND_NS: u64 = 1_000_000_000;

/// I/O controller for exercising interrupt delivery.
///
/// Raises [`Isr::One`] once per period of wall-clock time, exposes a
/// single device register on port 1 and quits on a port 0 write. Extra
/// signals can be queued with [`TestIoController::raise`].
pub struct TestIoController {
    device_data: u8,
    period_ns: u64,
    last_fire_ns: u64,
    quit: bool,
    queued: VecDeque<Isr>,
}

impl Default for TestIoController {
    fn default() -> Self {
        Self::new()
    }
}

impl TestIoController {
    pub fn new() -> Self {
        Self::with_period(ONE_SECOND_NS)
    }

    pub fn with_period(period_ns: u64) -> Self {
        Self {
            device_data: DEVICE_RESET,
            period_ns,
            last_fire_ns: 0,
            quit: false,
            queued: VecDeque::new(),
        }
    }

    /// Return `isr` from an upcoming poll, ahead of the timer.
    pub fn raise(&mut self, isr: Isr) {
        self.queued.push_back(isr);
    }

    pub fn device_data(&self) -> u8 {
        self.device_data
    }
}

impl Controller for TestIoController {
    fn read(&mut self, address: u16) -> u8 {
        match address {
            DEVICE_PORT => self.device_data,
            _ => 0x00,
        }
    }

    fn write(&mut self, address: u16, value: u8) {
        match address {
            CONTROL_PORT => self.quit = true,
            DEVICE_PORT => self.device_data = value,
            _ => {}
        }
    }

    fn service_interrupts(&mut self, curr_time: u64, _cycles: u64) -> Isr {
        if self.quit {
            return Isr::Quit;
        }
        if let Some(isr) = self.queued.pop_front() {
            return isr;
        }
        if curr_time.saturating_sub(self.last_fire_ns) >= self.period_ns {
            self.last_fire_ns = curr_time;
            return Isr::One;
        }
        Isr::NoInterrupt
    }
}

fn create_test_io() -> SharedController {
    share(TestIoController::new()).1
}

inventory::submit! {
    IoControllerEntry::new(
        "test",
        "device register on port 1, RST 1 every second, quit on port 0",
        create_test_io,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_register_round_trips() {
        let mut io = TestIoController::new();
        assert_eq!(io.read(DEVICE_PORT), 0xAA);
        io.write(DEVICE_PORT, 0x55);
        assert_eq!(io.read(DEVICE_PORT), 0x55);
        assert_eq!(io.read(0x02), 0x00);
    }

    #[test]
    fn fires_once_per_period() {
        let mut io = TestIoController::with_period(1_000);
        assert_eq!(io.service_interrupts(500, 0), Isr::NoInterrupt);
        assert_eq!(io.service_interrupts(1_000, 0), Isr::One);
        assert_eq!(io.service_interrupts(1_500, 0), Isr::NoInterrupt);
        assert_eq!(io.service_interrupts(2_000, 0), Isr::One);
    }

    #[test]
    fn queued_signals_then_quit() {
        let mut io = TestIoController::new();
        io.raise(Isr::Five);
        assert_eq!(io.service_interrupts(0, 0), Isr::Five);
        io.write(CONTROL_PORT, 0);
        assert_eq!(io.service_interrupts(0, 0), Isr::Quit);
    }
}
