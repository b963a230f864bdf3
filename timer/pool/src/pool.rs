//! The timer pool

use heapless::Vec;
use softtimer_core::{
    timer_debug, timer_warn, Tick, TickDuration, TickSource, TimerError, TimerResult,
};

use crate::config::PoolConfig;
use crate::slot::{TimerCallback, TimerHandle, TimerSlot};

/// Fixed-capacity pool of software timers sharing one tick source.
///
/// Slots are assigned lowest-index-first and are never recycled: a pool is
/// meant to be filled once at initialization. Once all `N` slots are taken,
/// further registrations fail with [`TimerError::CapacityExceeded`] until
/// restart.
pub struct TimerPool<S, const N: usize> {
    source: S,
    config: PoolConfig,
    slots: [TimerSlot; N],
}

impl<S, const N: usize> TimerPool<S, N> {
    const CAPACITY_FITS_HANDLE: () = assert!(
        N <= u8::MAX as usize + 1,
        "timer pool capacity exceeds the handle range"
    );

    /// Create a pool with every slot empty
    pub const fn new(source: S, config: PoolConfig) -> Self {
        let () = Self::CAPACITY_FITS_HANDLE;
        Self {
            source,
            config,
            slots: [TimerSlot::EMPTY; N],
        }
    }

    /// Number of slots
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Pool configuration
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// The tick source the pool reads
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Number of registered timers
    pub fn registered(&self) -> usize {
        self.slots.iter().filter(|slot| slot.in_use).count()
    }

    /// Look up a registered slot
    pub fn slot(&self, handle: TimerHandle) -> TimerResult<&TimerSlot> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.in_use)
            .ok_or(TimerError::InvalidHandle)
    }

    fn slot_mut(&mut self, handle: TimerHandle) -> TimerResult<&mut TimerSlot> {
        self.slots
            .get_mut(handle.index())
            .filter(|slot| slot.in_use)
            .ok_or(TimerError::InvalidHandle)
    }

    /// Snapshot of slot usage
    pub fn stats(&self) -> PoolStats {
        let mut stats = PoolStats::new(N);
        for slot in self.slots.iter().filter(|slot| slot.in_use) {
            stats.registered += 1;
            if slot.active {
                stats.active += 1;
            }
        }
        stats
    }
}

impl<S: TickSource, const N: usize> TimerPool<S, N> {
    /// Current tick of the underlying source
    pub fn now(&self) -> Tick {
        self.source.now()
    }

    /// Ticks elapsed since `past`, wrap-safe
    pub fn elapsed_since(&self, past: Tick) -> TickDuration {
        self.source.now().elapsed_since(past)
    }

    /// Bind the first free slot to `duration` and `callback`.
    ///
    /// The new timer is inactive until [`start`](Self::start) is called.
    pub fn register(
        &mut self,
        duration: TickDuration,
        callback: TimerCallback,
    ) -> TimerResult<TimerHandle> {
        let name = self.config.name;
        match self.slots.iter().position(|slot| !slot.in_use) {
            Some(index) => {
                self.slots[index].bind(duration, callback);
                timer_debug!("{}: timer {} assigned", name, index);
                Ok(TimerHandle::new(index as u8))
            }
            None => {
                timer_warn!("{}: no more timers available", name);
                Err(TimerError::CapacityExceeded)
            }
        }
    }

    /// [`register`](Self::register) with a timeout in milliseconds
    pub fn register_millis(
        &mut self,
        millis: u32,
        callback: TimerCallback,
    ) -> TimerResult<TimerHandle> {
        let duration = self.config.tick_rate.duration_from_millis(millis);
        self.register(duration, callback)
    }

    /// Arm the timer from the current tick.
    ///
    /// Starting a timer that is already running rebases its start tick, which
    /// makes `start` on an active timer the same operation as
    /// [`reset`](Self::reset).
    pub fn start(&mut self, handle: TimerHandle) -> TimerResult<()> {
        let now = self.source.now();
        self.slot_mut(handle)?.arm(now);
        Ok(())
    }

    /// Disarm the timer, keeping its duration and start tick.
    ///
    /// A stopped timer never fires for the cycle it was stopped in.
    pub fn stop(&mut self, handle: TimerHandle) -> TimerResult<()> {
        self.slot_mut(handle)?.disarm();
        Ok(())
    }

    /// Stop then start: rebase the start tick and arm unconditionally
    pub fn reset(&mut self, handle: TimerHandle) -> TimerResult<()> {
        let now = self.source.now();
        let slot = self.slot_mut(handle)?;
        slot.disarm();
        slot.arm(now);
        Ok(())
    }

    /// Change the timeout without touching the active flag or start tick.
    ///
    /// On a running timer the new duration applies from the next expiry
    /// check, measured from the existing start tick.
    pub fn set_duration(&mut self, handle: TimerHandle, duration: TickDuration) -> TimerResult<()> {
        self.slot_mut(handle)?.duration = duration;
        Ok(())
    }

    /// [`set_duration`](Self::set_duration) with a timeout in milliseconds
    pub fn set_duration_millis(&mut self, handle: TimerHandle, millis: u32) -> TimerResult<()> {
        let duration = self.config.tick_rate.duration_from_millis(millis);
        self.set_duration(handle, duration)
    }

    /// True iff the timer is active and its duration has elapsed
    pub fn is_expired(&self, handle: TimerHandle) -> TimerResult<bool> {
        let slot = self.slot(handle)?;
        Ok(slot.is_expired_at(self.source.now()))
    }

    /// Whether the timer is running
    pub fn is_active(&self, handle: TimerHandle) -> TimerResult<bool> {
        Ok(self.slot(handle)?.active)
    }

    /// Configured timeout
    pub fn duration(&self, handle: TimerHandle) -> TimerResult<TickDuration> {
        Ok(self.slot(handle)?.duration)
    }

    /// Ticks until expiry; zero when stopped or already expired
    pub fn remaining(&self, handle: TimerHandle) -> TimerResult<TickDuration> {
        let slot = self.slot(handle)?;
        Ok(slot.remaining_at(self.source.now()))
    }

    /// Retire every expired timer.
    ///
    /// Each expired slot is made inactive and its callback collected, in slot
    /// order, together with the arm cycle it expired in. No callback runs
    /// here; hand the result to [`dispatch`](Self::dispatch).
    pub fn expire(&mut self) -> Expired<N> {
        let now = self.source.now();
        let mut expired = Expired::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if !slot.is_expired_at(now) {
                continue;
            }
            slot.active = false;
            if let Some(callback) = slot.callback {
                // one entry per slot, so the vector cannot overflow
                let _ = expired.timers.push(ExpiredTimer {
                    handle: TimerHandle::new(index as u8),
                    generation: slot.generation,
                    callback,
                });
            }
        }
        expired
    }

    /// Invoke the callbacks of `expired` in slot order.
    ///
    /// A timer stopped, started or reset since the scan is skipped: its
    /// expired arm cycle was cancelled. Returns how many callbacks ran.
    pub fn dispatch(&mut self, expired: Expired<N>) -> usize {
        let mut fired = 0;
        for timer in expired.timers.iter() {
            if let Some(callback) = self.claim(timer) {
                callback();
                fired += 1;
            }
        }
        fired
    }

    /// Retire expired timers and invoke their callbacks.
    ///
    /// Returns how many callbacks ran. Callbacks cannot reach this pool while
    /// it is mutably borrowed; use [`SharedTimerPool`](crate::SharedTimerPool)
    /// when a callback needs to re-arm or stop a timer.
    pub fn service(&mut self) -> usize {
        let expired = self.expire();
        self.dispatch(expired)
    }
}

impl<S, const N: usize> TimerPool<S, N> {
    /// Callback of `timer` if its slot is still in the arm cycle that expired
    pub(crate) fn claim(&self, timer: &ExpiredTimer) -> Option<TimerCallback> {
        self.slots
            .get(timer.handle.index())
            .filter(|slot| slot.in_use && slot.generation == timer.generation)
            .map(|_| timer.callback)
    }
}

impl<S: core::fmt::Debug, const N: usize> core::fmt::Debug for TimerPool<S, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TimerPool")
            .field("name", &self.config.name)
            .field("source", &self.source)
            .field("stats", &self.stats())
            .finish()
    }
}

/// One timer retired by an expiry scan
#[derive(Debug, Clone, Copy)]
pub(crate) struct ExpiredTimer {
    pub(crate) handle: TimerHandle,
    pub(crate) generation: u32,
    pub(crate) callback: TimerCallback,
}

/// Timers retired by one expiry scan, waiting to be dispatched
#[derive(Debug, Clone)]
pub struct Expired<const N: usize> {
    pub(crate) timers: Vec<ExpiredTimer, N>,
}

impl<const N: usize> Expired<N> {
    const fn new() -> Self {
        Self { timers: Vec::new() }
    }

    /// Number of expired timers
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// True when nothing expired
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Handles of the expired timers in slot order
    pub fn handles(&self) -> impl Iterator<Item = TimerHandle> + '_ {
        self.timers.iter().map(|timer| timer.handle)
    }
}

/// Slot usage counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Total number of slots
    pub capacity: usize,
    /// Slots bound to a registered timer
    pub registered: usize,
    /// Registered timers currently running
    pub active: usize,
}

impl PoolStats {
    /// Statistics for an empty pool
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            registered: 0,
            active: 0,
        }
    }

    /// Slots still available for registration
    pub const fn free(&self) -> usize {
        self.capacity - self.registered
    }

    /// Check if no slot is left
    pub const fn is_exhausted(&self) -> bool {
        self.registered >= self.capacity
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PoolStats {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "PoolStats{{ capacity: {}, registered: {}, active: {} }}",
            self.capacity,
            self.registered,
            self.active
        );
    }
}
