//! Wall-clock pacing of emulated CPU cycles.
//!
//! The clock counts cycles reported by the run loop and, once a full
//! resolution period's worth has accumulated, blocks until real time has
//! caught up with emulated time. Running behind is recorded as drift;
//! instructions are never skipped.

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{trace, warn};

/// Emulated 8080 clock rate.
pub const I8080_CLOCK_HZ: u64 = 2_000_000;

/// Remaining wait below which [`CpuClock::sync`] spins instead of sleeping.
const SPIN_THRESHOLD: Duration = Duration::from_millis(1);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClockError {
    #[error("the clock resolution must be non-zero")]
    Resolution,
}

#[derive(Debug)]
pub struct CpuClock {
    period_ns: u64,
    /// Cycles per pacing check; `None` when unpaced.
    resolution_ticks: Option<u64>,
    start: Instant,
    total_ticks: u64,
    last_sync_ticks: u64,
    drift: Duration,
}

impl Default for CpuClock {
    fn default() -> Self {
        Self::new(I8080_CLOCK_HZ)
    }
}

impl CpuClock {
    pub fn new(frequency_hz: u64) -> Self {
        Self {
            period_ns: 1_000_000_000 / frequency_hz.max(1),
            resolution_ticks: None,
            start: Instant::now(),
            total_ticks: 0,
            last_sync_ticks: 0,
            drift: Duration::ZERO,
        }
    }

    /// Length of one clock cycle in nanoseconds.
    pub fn period_ns(&self) -> u64 {
        self.period_ns
    }

    /// Set how often the clock synchronises with real time.
    ///
    /// Zero is rejected. A negative resolution runs unpaced. A positive one
    /// is rounded down to whole cycles (at least one). Returns the
    /// resolution in cycles, zero when unpaced.
    pub fn set_tick_resolution(&mut self, resolution_ns: i64) -> Result<u64, ClockError> {
        match resolution_ns {
            0 => Err(ClockError::Resolution),
            ns if ns < 0 => {
                self.resolution_ticks = None;
                Ok(0)
            }
            ns => {
                let ticks = (ns as u64 / self.period_ns).max(1);
                self.resolution_ticks = Some(ticks);
                Ok(ticks)
            }
        }
    }

    /// Resolution in cycles, zero when unpaced.
    pub fn resolution_ticks(&self) -> u64 {
        self.resolution_ticks.unwrap_or(0)
    }

    pub fn is_paced(&self) -> bool {
        self.resolution_ticks.is_some()
    }

    /// Restart the clock at the current instant.
    pub fn reset(&mut self) {
        self.start = Instant::now();
        self.total_ticks = 0;
        self.last_sync_ticks = 0;
        self.drift = Duration::ZERO;
    }

    /// Account for `ticks` executed cycles, pacing if a resolution period
    /// has elapsed. Real time is only read when a sync is due.
    pub fn tick(&mut self, ticks: u64) {
        self.total_ticks += ticks;
        if let Some(resolution) = self.resolution_ticks
            && self.total_ticks - self.last_sync_ticks >= resolution
        {
            self.sync();
        }
    }

    /// Block until real time has caught up with the emulated cycle count.
    pub fn sync(&mut self) {
        self.last_sync_ticks = self.total_ticks;
        let target = self.start + self.emulated_time();
        let now = Instant::now();

        if now >= target {
            self.drift = now - target;
            if let Some(resolution) = self.resolution_ticks
                && self.drift > Duration::from_nanos(resolution * self.period_ns)
            {
                warn!(drift_us = self.drift.as_micros() as u64, "clock running behind");
            }
            return;
        }

        self.drift = Duration::ZERO;
        trace!(wait_us = (target - now).as_micros() as u64, "pacing");
        sleep_until(target);
    }

    /// Total cycles counted since the last reset.
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Time the counted cycles take on real hardware.
    pub fn emulated_time(&self) -> Duration {
        Duration::from_nanos(self.total_ticks * self.period_ns)
    }

    pub fn elapsed_ns(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }

    /// How far behind real time the last sync found the clock.
    pub fn drift(&self) -> Duration {
        self.drift
    }
}

fn sleep_until(deadline: Instant) {
    loop {
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        let remaining = deadline - now;
        if remaining > SPIN_THRESHOLD {
            std::thread::sleep(remaining - SPIN_THRESHOLD);
        } else {
            std::hint::spin_loop();
        }
    }
}
