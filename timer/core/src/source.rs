//! Tick source abstraction
//!
//! The pool never touches hardware. It asks a [`TickSource`] for the current
//! counter value and does all arithmetic with wrapping subtraction.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::time::{Tick, TickDuration};

/// Free-running, monotonically non-decreasing tick counter.
///
/// `now` must be callable at any time, including from inside pool
/// operations, and must have no side effect beyond reading the counter.
/// When the counter overflows it wraps to zero.
pub trait TickSource {
    /// Current counter value
    fn now(&self) -> Tick;
}

impl<T: TickSource + ?Sized> TickSource for &T {
    fn now(&self) -> Tick {
        (**self).now()
    }
}

/// Ticks elapsed between `past` and the source's current reading
pub fn elapsed_since<S: TickSource + ?Sized>(source: &S, past: Tick) -> TickDuration {
    source.now().elapsed_since(past)
}

/// Adapter for a platform function such as `micros()` or `millis()`
#[derive(Clone, Copy)]
pub struct FnTickSource(pub fn() -> u32);

impl TickSource for FnTickSource {
    fn now(&self) -> Tick {
        Tick::new((self.0)())
    }
}

impl core::fmt::Debug for FnTickSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("FnTickSource")
    }
}

/// Software tick counter advanced by a periodic interrupt.
///
/// An interrupt-driven target calls [`TickCounter::increment`] from its tick
/// ISR and then services the pool. Hosts and tests use [`TickCounter::set`]
/// and [`TickCounter::advance`] to drive time explicitly.
#[derive(Debug)]
pub struct TickCounter {
    ticks: AtomicU32,
}

impl TickCounter {
    /// Counter starting at zero
    pub const fn new() -> Self {
        Self::starting_at(Tick::ZERO)
    }

    /// Counter starting at an arbitrary tick
    pub const fn starting_at(start: Tick) -> Self {
        Self {
            ticks: AtomicU32::new(start.raw()),
        }
    }

    /// Advance by one tick
    pub fn increment(&self) {
        self.advance(TickDuration::from_ticks(1));
    }

    /// Advance by `duration`, wrapping past `u32::MAX`
    pub fn advance(&self, duration: TickDuration) {
        // load/store pair keeps this usable on cores without atomic RMW
        critical_section::with(|_| {
            let current = self.ticks.load(Ordering::Relaxed);
            self.ticks
                .store(current.wrapping_add(duration.ticks()), Ordering::Release);
        });
    }

    /// Jump to an absolute tick
    pub fn set(&self, tick: Tick) {
        // same critical section as `advance`, so a jump never lands inside
        // an increment's load/store pair
        critical_section::with(|_| self.ticks.store(tick.raw(), Ordering::Release));
    }
}

impl Default for TickCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for TickCounter {
    fn now(&self) -> Tick {
        Tick::new(self.ticks.load(Ordering::Acquire))
    }
}
