//! Cortex-M cycle counter as a tick source
//!
//! The DWT `CYCCNT` register is a free-running 32-bit counter clocked at the
//! core frequency, which is exactly the wrap-at-2^32 counter the pool
//! expects. Not present on ARMv6-M parts.

use cortex_m::peripheral::{DCB, DWT};

use crate::source::TickSource;
use crate::time::{Tick, TickRate};
use crate::TimerResult;

/// Tick source reading `DWT::CYCCNT`
#[derive(Debug, Clone, Copy)]
pub struct DwtTickSource {
    rate: TickRate,
}

impl DwtTickSource {
    /// Enable the cycle counter and return a source ticking at `core_hz`
    pub fn enable(dcb: &mut DCB, dwt: &mut DWT, core_hz: u32) -> TimerResult<Self> {
        let rate = TickRate::new(core_hz / 1_000)?;
        dcb.enable_trace();
        dwt.enable_cycle_counter();
        Ok(Self { rate })
    }

    /// Ticks per millisecond at the configured core clock
    pub const fn tick_rate(&self) -> TickRate {
        self.rate
    }
}

impl TickSource for DwtTickSource {
    fn now(&self) -> Tick {
        Tick::new(DWT::cycle_count())
    }
}
