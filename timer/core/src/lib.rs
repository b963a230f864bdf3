#![no_std]
#![forbid(unsafe_code)]

//! # Soft Timer Core
//!
//! Tick arithmetic, the tick source abstraction and the error taxonomy shared
//! by the software timer pool. Everything here works on a bare `u32` hardware
//! counter that wraps to zero on overflow.

#[cfg(feature = "std")]
extern crate std;

use core::fmt;

mod logging;
pub mod source;
pub mod time;

#[cfg(feature = "cortex-m")]
pub mod dwt;

pub use source::*;
pub use time::*;

#[cfg(feature = "cortex-m")]
pub use dwt::DwtTickSource;

#[doc(hidden)]
pub mod __private {
    pub use crate::logging::backend::{debug, warn};
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type used throughout the timer crates
pub type TimerResult<T> = Result<T, TimerError>;

/// Error types for timer pool operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// Every slot in the pool is already registered
    CapacityExceeded,
    /// Handle does not refer to a registered slot
    InvalidHandle,
    /// Configuration value out of range
    InvalidConfig,
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerError::CapacityExceeded => write!(f, "No more timers available"),
            TimerError::InvalidHandle => write!(f, "Timer handle is not registered"),
            TimerError::InvalidConfig => write!(f, "Invalid timer configuration"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TimerError {}

#[cfg(feature = "defmt")]
impl defmt::Format for TimerError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            TimerError::CapacityExceeded => defmt::write!(fmt, "CapacityExceeded"),
            TimerError::InvalidHandle => defmt::write!(fmt, "InvalidHandle"),
            TimerError::InvalidConfig => defmt::write!(fmt, "InvalidConfig"),
        }
    }
}
