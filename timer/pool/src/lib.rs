#![no_std]
#![forbid(unsafe_code)]

//! # Soft Timer Pool
//!
//! A fixed-capacity registry of logical timers multiplexed onto a single
//! hardware tick source. Timers are registered once, then started, stopped,
//! reset and reconfigured through the [`TimerHandle`] returned at
//! registration.
//!
//! Expiry is evaluated cooperatively: the application's poll loop (or a
//! periodic tick interrupt) calls [`TimerPool::service`], which retires every
//! expired timer and invokes its callback exactly once per arm cycle.
//! [`SharedTimerPool`] wraps the pool in a critical section so it can live in
//! a `static` and be touched from both the main loop and an interrupt.

pub mod config;
pub mod pool;
pub mod shared;
pub mod slot;

pub use softtimer_core::*;
pub use config::*;
pub use pool::*;
pub use shared::*;
pub use slot::*;

/// Slot count of the reference radio stack
pub const DEFAULT_CAPACITY: usize = 10;
