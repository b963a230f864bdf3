//! Periodic ticker thread for POSIX
//!
//! Plays the role of the tick interrupt on a hosted system: at a fixed rate
//! it optionally advances a [`TickCounter`] and then services the pool.
//! Timing is drift-free; the thread sleeps until the next absolute deadline
//! rather than for a relative period.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, info};
use softtimer_core::{TickCounter, TickSource, TimerError};
use softtimer_pool::SharedTimerPool;

/// Default tick rate in Hz
pub const DEFAULT_TICKS_PER_SEC: u32 = 1_000;

/// Highest supported tick rate in Hz
pub const MAX_TICKS_PER_SEC: u32 = 10_000;

/// Nanoseconds per second
const NSEC_PER_SEC: u64 = 1_000_000_000;

/// Ticker thread failures
#[derive(Debug, thiserror::Error)]
pub enum TickerError {
    /// Rejected configuration
    #[error(transparent)]
    Config(#[from] TimerError),
    /// The OS refused to create the thread
    #[error("failed to spawn ticker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Ticker configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickerConfig {
    rate_hz: u32,
}

impl TickerConfig {
    /// Create a configuration ticking `rate_hz` times per second
    pub fn new(rate_hz: u32) -> Result<Self, TimerError> {
        if rate_hz == 0 || rate_hz > MAX_TICKS_PER_SEC {
            return Err(TimerError::InvalidConfig);
        }
        Ok(Self { rate_hz })
    }

    /// Tick rate in Hz
    pub fn rate_hz(&self) -> u32 {
        self.rate_hz
    }

    /// Get the tick period as a Duration
    pub fn period(&self) -> Duration {
        Duration::from_nanos(NSEC_PER_SEC / self.rate_hz as u64)
    }
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            rate_hz: DEFAULT_TICKS_PER_SEC,
        }
    }
}

struct TickerShared {
    running: AtomicBool,
    ticks: AtomicU64,
    fired: AtomicU64,
}

/// Handle to a running ticker thread.
///
/// Dropping the handle stops the thread and waits for it to exit.
pub struct Ticker {
    shared: Arc<TickerShared>,
    thread: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Service `pool` at the configured rate.
    ///
    /// Use this with a free-running source such as
    /// [`MonotonicClock`](crate::MonotonicClock).
    pub fn spawn<S, const N: usize>(
        config: TickerConfig,
        pool: &'static SharedTimerPool<S, N>,
    ) -> Result<Self, TickerError>
    where
        S: TickSource + Send + 'static,
    {
        Self::spawn_inner(config, None, pool)
    }

    /// Increment `counter` and then service `pool` once per period, the way
    /// a SysTick-style interrupt handler drives the pool on a target.
    pub fn spawn_counting<S, const N: usize>(
        config: TickerConfig,
        counter: &'static TickCounter,
        pool: &'static SharedTimerPool<S, N>,
    ) -> Result<Self, TickerError>
    where
        S: TickSource + Send + 'static,
    {
        Self::spawn_inner(config, Some(counter), pool)
    }

    fn spawn_inner<S, const N: usize>(
        config: TickerConfig,
        counter: Option<&'static TickCounter>,
        pool: &'static SharedTimerPool<S, N>,
    ) -> Result<Self, TickerError>
    where
        S: TickSource + Send + 'static,
    {
        let shared = Arc::new(TickerShared {
            running: AtomicBool::new(true),
            ticks: AtomicU64::new(0),
            fired: AtomicU64::new(0),
        });
        let period = config.period();
        let worker = Arc::clone(&shared);

        let thread = thread::Builder::new()
            .name("softtimer-ticker".into())
            .spawn(move || ticker_thread(period, &worker, counter, pool))?;

        info!("ticker started at {} Hz", config.rate_hz());
        Ok(Self {
            shared,
            thread: Some(thread),
        })
    }

    /// Number of periods serviced so far
    pub fn ticks(&self) -> u64 {
        self.shared.ticks.load(Ordering::Relaxed)
    }

    /// Number of timer callbacks dispatched so far
    pub fn fired(&self) -> u64 {
        self.shared.fired.load(Ordering::Relaxed)
    }

    /// Check if the ticker thread is still running
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Relaxed)
    }

    /// Stop the ticker thread and wait for it to finish
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
            info!("ticker stopped after {} ticks", self.ticks());
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn ticker_thread<S, const N: usize>(
    period: Duration,
    shared: &TickerShared,
    counter: Option<&TickCounter>,
    pool: &SharedTimerPool<S, N>,
) where
    S: TickSource,
{
    let mut next_tick = Instant::now();

    while shared.running.load(Ordering::Relaxed) {
        // Advance to next tick (absolute time)
        next_tick += period;

        let now = Instant::now();
        if next_tick > now {
            thread::sleep(next_tick - now);
        }

        if let Some(counter) = counter {
            counter.increment();
        }

        let fired = pool.service();
        if fired > 0 {
            debug!("tick {}: {} timer(s) fired", shared.ticks.load(Ordering::Relaxed), fired);
            shared.fired.fetch_add(fired as u64, Ordering::Relaxed);
        }
        shared.ticks.fetch_add(1, Ordering::Relaxed);
    }
}
