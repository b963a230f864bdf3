//! # Soft Timer POSIX port
//!
//! Runs the timer pool on a hosted system. [`MonotonicClock`] stands in for
//! the free-running hardware counter and [`Ticker`] stands in for the
//! periodic tick interrupt, servicing a `static` [`SharedTimerPool`] from a
//! background thread.
//!
//! Critical sections come from the `critical-section` crate's `std`
//! implementation, a process-wide mutex.
//!
//! [`SharedTimerPool`]: softtimer_pool::SharedTimerPool

pub mod clock;
pub mod ticker;

pub use clock::*;
pub use ticker::*;
