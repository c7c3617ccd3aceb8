//! CPU state snapshot types and traits

use serde::{Deserialize, Serialize};

/// Trait for CPU types that can provide and restore state snapshots
pub trait CpuStateTrait {
    type Snapshot;
    fn snapshot(&self) -> Self::Snapshot;
    fn restore(&mut self, snapshot: &Self::Snapshot);
}

/// I8080 CPU state snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct I8080State {
    pub a: u8,   // Accumulator
    pub b: u8,   // Register B
    pub c: u8,   // Register C
    pub d: u8,   // Register D
    pub e: u8,   // Register E
    pub h: u8,   // Register H
    pub l: u8,   // Register L
    pub f: u8,   // Flags (S Z 0 AC 0 P 1 CY)
    pub sp: u16, // Stack pointer
    pub pc: u16, // Program counter
    pub iff: bool,
    pub halted: bool,
}

impl I8080State {
    /// Packed register dump: A B C D E H L F, then PC and SP little-endian.
    pub fn to_bytes(&self) -> [u8; 12] {
        let [pc_lo, pc_hi] = self.pc.to_le_bytes();
        let [sp_lo, sp_hi] = self.sp.to_le_bytes();
        [
            self.a, self.b, self.c, self.d, self.e, self.h, self.l, self.f, pc_lo, pc_hi, sp_lo,
            sp_hi,
        ]
    }
}
