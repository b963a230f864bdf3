//! Logging shims
//!
//! `timer_debug!` and `timer_warn!` format their arguments with
//! `core::fmt` and hand them to [`__private`](crate::__private), which
//! forwards to `defmt` or the `log` facade depending on which feature is
//! enabled and drops them otherwise. Callers need neither backend as a
//! direct dependency.

/// Debug-level message from the timer crates
#[macro_export]
macro_rules! timer_debug {
    ($($arg:tt)*) => {
        $crate::__private::debug(::core::format_args!($($arg)*))
    };
}

/// Warning from the timer crates
#[macro_export]
macro_rules! timer_warn {
    ($($arg:tt)*) => {
        $crate::__private::warn(::core::format_args!($($arg)*))
    };
}

#[doc(hidden)]
pub mod backend {
    use core::fmt::Arguments;

    #[inline]
    pub fn debug(args: Arguments<'_>) {
        #[cfg(feature = "defmt")]
        defmt::debug!("{}", defmt::Display2Format(&args));
        #[cfg(all(feature = "log", not(feature = "defmt")))]
        log::debug!(target: "TIM", "{}", args);
        #[cfg(not(any(feature = "log", feature = "defmt")))]
        let _ = args;
    }

    #[inline]
    pub fn warn(args: Arguments<'_>) {
        #[cfg(feature = "defmt")]
        defmt::warn!("{}", defmt::Display2Format(&args));
        #[cfg(all(feature = "log", not(feature = "defmt")))]
        log::warn!(target: "TIM", "{}", args);
        #[cfg(not(any(feature = "log", feature = "defmt")))]
        let _ = args;
    }
}
