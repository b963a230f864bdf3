//! Critical-section guarded pool for `static` placement
//!
//! On the target the pool is touched from the main loop and from a tick
//! interrupt. Every operation here runs inside one short critical section.
//! [`SharedTimerPool::service`] evaluates expiry inside the critical section
//! and runs callbacks after leaving it, so a callback may re-arm timers.
//! Each callback is claimed in its own critical section right before it
//! runs; a stop, start or reset issued after the scan cancels it.

use core::cell::RefCell;

use critical_section::Mutex;
use softtimer_core::{Tick, TickDuration, TickSource, TimerResult};

use crate::config::PoolConfig;
use crate::pool::{Expired, PoolStats, TimerPool};
use crate::slot::{TimerCallback, TimerHandle};

/// Timer pool shareable between thread and interrupt context
pub struct SharedTimerPool<S, const N: usize> {
    pool: Mutex<RefCell<TimerPool<S, N>>>,
}

impl<S, const N: usize> SharedTimerPool<S, N> {
    /// Create a pool with every slot empty
    pub const fn new(source: S, config: PoolConfig) -> Self {
        Self {
            pool: Mutex::new(RefCell::new(TimerPool::new(source, config))),
        }
    }

    /// Run `f` with exclusive access to the pool.
    ///
    /// `f` executes inside a critical section and must stay short.
    pub fn with_pool<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut TimerPool<S, N>) -> R,
    {
        critical_section::with(|cs| {
            let mut pool = self.pool.borrow_ref_mut(cs);
            f(&mut pool)
        })
    }

    /// Number of slots
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Snapshot of slot usage
    pub fn stats(&self) -> PoolStats {
        self.with_pool(|pool| pool.stats())
    }
}

impl<S: TickSource, const N: usize> SharedTimerPool<S, N> {
    /// Current tick of the underlying source
    pub fn now(&self) -> Tick {
        self.with_pool(|pool| pool.now())
    }

    /// Ticks elapsed since `past`, wrap-safe
    pub fn elapsed_since(&self, past: Tick) -> TickDuration {
        self.with_pool(|pool| pool.elapsed_since(past))
    }

    /// See [`TimerPool::register`]
    pub fn register(
        &self,
        duration: TickDuration,
        callback: TimerCallback,
    ) -> TimerResult<TimerHandle> {
        self.with_pool(|pool| pool.register(duration, callback))
    }

    /// See [`TimerPool::register_millis`]
    pub fn register_millis(&self, millis: u32, callback: TimerCallback) -> TimerResult<TimerHandle> {
        self.with_pool(|pool| pool.register_millis(millis, callback))
    }

    /// See [`TimerPool::start`]
    pub fn start(&self, handle: TimerHandle) -> TimerResult<()> {
        self.with_pool(|pool| pool.start(handle))
    }

    /// See [`TimerPool::stop`]
    pub fn stop(&self, handle: TimerHandle) -> TimerResult<()> {
        self.with_pool(|pool| pool.stop(handle))
    }

    /// See [`TimerPool::reset`]
    pub fn reset(&self, handle: TimerHandle) -> TimerResult<()> {
        self.with_pool(|pool| pool.reset(handle))
    }

    /// See [`TimerPool::set_duration`]
    pub fn set_duration(&self, handle: TimerHandle, duration: TickDuration) -> TimerResult<()> {
        self.with_pool(|pool| pool.set_duration(handle, duration))
    }

    /// See [`TimerPool::set_duration_millis`]
    pub fn set_duration_millis(&self, handle: TimerHandle, millis: u32) -> TimerResult<()> {
        self.with_pool(|pool| pool.set_duration_millis(handle, millis))
    }

    /// See [`TimerPool::is_expired`]
    pub fn is_expired(&self, handle: TimerHandle) -> TimerResult<bool> {
        self.with_pool(|pool| pool.is_expired(handle))
    }

    /// See [`TimerPool::is_active`]
    pub fn is_active(&self, handle: TimerHandle) -> TimerResult<bool> {
        self.with_pool(|pool| pool.is_active(handle))
    }

    /// See [`TimerPool::remaining`]
    pub fn remaining(&self, handle: TimerHandle) -> TimerResult<TickDuration> {
        self.with_pool(|pool| pool.remaining(handle))
    }

    /// Retire expired timers inside the critical section
    pub fn expire(&self) -> Expired<N> {
        self.with_pool(|pool| pool.expire())
    }

    /// Invoke the callbacks of `expired` outside the critical section.
    ///
    /// A timer stopped, started or reset since the scan, by an earlier
    /// callback or another context, is skipped. Returns how many callbacks
    /// ran.
    pub fn dispatch(&self, expired: Expired<N>) -> usize {
        let mut fired = 0;
        for timer in expired.timers.iter() {
            if let Some(callback) = self.with_pool(|pool| pool.claim(timer)) {
                callback();
                fired += 1;
            }
        }
        fired
    }

    /// Retire expired timers, then invoke their callbacks outside the
    /// critical section. Returns how many callbacks ran.
    pub fn service(&self) -> usize {
        self.dispatch(self.expire())
    }
}
