//! Tick instants, tick durations and the millisecond conversion rate

use core::fmt;
use crate::TimerError;

/// A reading of the hardware tick counter.
///
/// The counter is 32 bits wide and wraps to zero on overflow, so instants are
/// only comparable through [`Tick::elapsed_since`] and [`Tick::is_after`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Tick(u32);

impl Tick {
    /// Zero tick
    pub const ZERO: Self = Self(0);

    /// Last tick before the counter wraps
    pub const MAX: Self = Self(u32::MAX);

    /// Create a tick from a raw counter value
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw counter value
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Tick reached after `duration` more ticks, wrapping past `MAX`
    pub const fn wrapping_add(self, duration: TickDuration) -> Self {
        Self(self.0.wrapping_add(duration.ticks()))
    }

    /// Ticks elapsed since `earlier`.
    ///
    /// Correct across a single counter wrap: `earlier = 2^32 - 5` and
    /// `self = 3` yields 8.
    pub const fn elapsed_since(self, earlier: Tick) -> TickDuration {
        TickDuration::from_ticks(self.0.wrapping_sub(earlier.0))
    }

    /// Check if this tick is after another tick (handles wraparound)
    pub const fn is_after(self, other: Tick) -> bool {
        let diff = self.0.wrapping_sub(other.0);
        diff != 0 && diff < u32::MAX / 2
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tick:{}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Tick {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "tick:{}", self.0);
    }
}

/// Span of time measured in ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TickDuration(u32);

impl TickDuration {
    /// Zero duration
    pub const ZERO: Self = Self(0);

    /// Maximum duration
    pub const MAX: Self = Self(u32::MAX);

    /// Create duration from ticks
    pub const fn from_ticks(ticks: u32) -> Self {
        Self(ticks)
    }

    /// Get tick count
    pub const fn ticks(self) -> u32 {
        self.0
    }

    /// Check if duration is zero
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Subtract, clamping at zero
    pub const fn saturating_sub(self, other: TickDuration) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for TickDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ticks", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TickDuration {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}ticks", self.0);
    }
}

/// Conversion factor between application milliseconds and hardware ticks.
///
/// This is the only place milliseconds turn into ticks. Pools keep one rate
/// for their whole lifetime and convert once when a duration enters the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickRate {
    ticks_per_ms: u32,
}

impl TickRate {
    /// Microsecond counter, 1000 ticks per millisecond
    pub const MICROS: Self = Self { ticks_per_ms: 1000 };

    /// Millisecond counter, one tick per millisecond
    pub const MILLIS: Self = Self { ticks_per_ms: 1 };

    /// Create a rate, rejecting zero ticks per millisecond
    pub const fn new(ticks_per_ms: u32) -> Result<Self, TimerError> {
        if ticks_per_ms == 0 {
            Err(TimerError::InvalidConfig)
        } else {
            Ok(Self { ticks_per_ms })
        }
    }

    /// Ticks per millisecond
    pub const fn ticks_per_ms(self) -> u32 {
        self.ticks_per_ms
    }

    /// Convert milliseconds to ticks, saturating at [`TickDuration::MAX`]
    pub const fn duration_from_millis(self, millis: u32) -> TickDuration {
        TickDuration::from_ticks(millis.saturating_mul(self.ticks_per_ms))
    }

    /// Convert ticks back to whole milliseconds (truncating)
    pub const fn millis_from_duration(self, duration: TickDuration) -> u32 {
        duration.ticks() / self.ticks_per_ms
    }
}

impl Default for TickRate {
    fn default() -> Self {
        Self::MICROS
    }
}

impl fmt::Display for TickRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ticks/ms", self.ticks_per_ms)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TickRate {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}ticks/ms", self.ticks_per_ms);
    }
}

/// Macro to create compile-time tick durations
#[macro_export]
macro_rules! ticks {
    ($value:literal ticks) => {
        $crate::TickDuration::from_ticks($value)
    };
    ($value:literal ms) => {
        $crate::TickRate::MICROS.duration_from_millis($value)
    };
}
