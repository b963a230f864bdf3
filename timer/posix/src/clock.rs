//! Monotonic tick source for POSIX
//!
//! Counts microseconds since the first reading, truncated to 32 bits so the
//! counter wraps every ~71 minutes exactly like a hardware `micros()` timer.

use std::sync::OnceLock;
use std::time::Instant;

use softtimer_core::{Tick, TickRate, TickSource};

/// Microsecond counter backed by `std::time::Instant`
#[derive(Debug)]
pub struct MonotonicClock {
    epoch: OnceLock<Instant>,
}

impl MonotonicClock {
    /// Tick rate of this clock
    pub const TICK_RATE: TickRate = TickRate::MICROS;

    /// Create a clock; the epoch is fixed by the first reading
    pub const fn new() -> Self {
        Self {
            epoch: OnceLock::new(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for MonotonicClock {
    fn now(&self) -> Tick {
        let epoch = self.epoch.get_or_init(Instant::now);
        // truncation is the counter wrap
        Tick::new(epoch.elapsed().as_micros() as u32)
    }
}
