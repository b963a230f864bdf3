//! Timer slots and the handles that address them

use core::fmt;

use softtimer_core::{Tick, TickDuration};

/// Expiry callback.
///
/// The code behind the pointer is owned by the application; the pool only
/// stores and invokes it.
pub type TimerCallback = fn();

/// Stable reference to a registered timer slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u8);

impl TimerHandle {
    /// Wrap a raw slot index.
    ///
    /// Handles are normally obtained from registration. A handle built here
    /// is checked against the pool on every use and rejected with
    /// `InvalidHandle` if its slot is not registered.
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    /// Slot index
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw handle value
    pub const fn raw(self) -> u8 {
        self.0
    }
}

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TimerHandle {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "timer#{}", self.0);
    }
}

/// One entry in the pool
#[derive(Debug, Clone, Copy)]
pub struct TimerSlot {
    pub(crate) in_use: bool,
    pub(crate) active: bool,
    pub(crate) duration: TickDuration,
    pub(crate) start_tick: Tick,
    pub(crate) callback: Option<TimerCallback>,
    pub(crate) generation: u32,
}

impl TimerSlot {
    /// Unregistered slot
    pub const EMPTY: Self = Self {
        in_use: false,
        active: false,
        duration: TickDuration::ZERO,
        start_tick: Tick::ZERO,
        callback: None,
        generation: 0,
    };

    /// Whether the slot is bound to a registered timer
    pub const fn in_use(&self) -> bool {
        self.in_use
    }

    /// Whether the timer is counting toward expiry
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Configured timeout
    pub const fn duration(&self) -> TickDuration {
        self.duration
    }

    /// Tick captured by the most recent start or reset
    pub const fn start_tick(&self) -> Tick {
        self.start_tick
    }

    /// Arm cycle counter, bumped by every start, stop and reset
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    pub(crate) fn bind(&mut self, duration: TickDuration, callback: TimerCallback) {
        *self = Self {
            in_use: true,
            active: false,
            duration,
            start_tick: Tick::ZERO,
            callback: Some(callback),
            generation: self.generation,
        };
    }

    pub(crate) fn arm(&mut self, now: Tick) {
        self.start_tick = now;
        self.active = true;
        self.generation = self.generation.wrapping_add(1);
    }

    pub(crate) fn disarm(&mut self) {
        self.active = false;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Active and at least `duration` ticks past `start_tick` at `now`
    pub fn is_expired_at(&self, now: Tick) -> bool {
        self.active && now.elapsed_since(self.start_tick) >= self.duration
    }

    /// Ticks left before expiry at `now`; zero when inactive or expired
    pub fn remaining_at(&self, now: Tick) -> TickDuration {
        if !self.active {
            return TickDuration::ZERO;
        }
        self.duration
            .saturating_sub(now.elapsed_since(self.start_tick))
    }
}

impl Default for TimerSlot {
    fn default() -> Self {
        Self::EMPTY
    }
}
