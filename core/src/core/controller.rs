//! Pluggable backends for the memory and I/O address spaces.

use std::sync::Arc;

use parking_lot::Mutex;

/// Signal returned by [`Controller::service_interrupts`].
///
/// `Zero` through `Seven` vector the CPU to `RST n` (address `n * 8`).
/// The remaining variants are requests to the machine rather than to the CPU.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Isr {
    Zero,
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    /// Restore machine state through the load hook.
    Load,
    /// Persist machine state through the save hook.
    Save,
    /// Stop the run loop.
    Quit,
    NoInterrupt,
}

impl Isr {
    /// Restart number for the vectored variants.
    pub fn rst(self) -> Option<u8> {
        match self {
            Isr::Zero => Some(0),
            Isr::One => Some(1),
            Isr::Two => Some(2),
            Isr::Three => Some(3),
            Isr::Four => Some(4),
            Isr::Five => Some(5),
            Isr::Six => Some(6),
            Isr::Seven => Some(7),
            Isr::Load | Isr::Save | Isr::Quit | Isr::NoInterrupt => None,
        }
    }

    /// Handler address for the vectored variants.
    pub fn vector(self) -> Option<u16> {
        self.rst().map(|n| n as u16 * 8)
    }

    /// Inverse of [`Isr::rst`].
    pub fn from_rst(n: u8) -> Option<Isr> {
        const VECTORED: [Isr; 8] = [
            Isr::Zero,
            Isr::One,
            Isr::Two,
            Isr::Three,
            Isr::Four,
            Isr::Five,
            Isr::Six,
            Isr::Seven,
        ];
        VECTORED.get(n as usize).copied()
    }
}

/// A memory or I/O backend.
///
/// Memory controllers see 16-bit addresses. I/O controllers see the port
/// number zero-extended to 16 bits.
pub trait Controller {
    fn read(&mut self, address: u16) -> u8;
    fn write(&mut self, address: u16, value: u8);

    /// Polled by the run loop between instructions.
    ///
    /// `curr_time` is the wall-clock time since the run started in
    /// nanoseconds and `cycles` the number of CPU cycles executed so far.
    fn service_interrupts(&mut self, _curr_time: u64, _cycles: u64) -> Isr {
        Isr::NoInterrupt
    }
}

/// Controller handle shared between the host and a machine.
pub type SharedController = Arc<Mutex<dyn Controller + Send>>;

/// Wrap a controller in a [`SharedController`], keeping a typed handle.
///
/// The returned `Arc<Mutex<C>>` lets the host inspect the concrete
/// controller after a run; the second value is what the machine takes.
pub fn share<C: Controller + Send + 'static>(controller: C) -> (Arc<Mutex<C>>, SharedController) {
    let typed = Arc::new(Mutex::new(controller));
    let shared: SharedController = typed.clone();
    (typed, shared)
}
