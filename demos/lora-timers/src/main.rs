//! LoRa MAC receive-window scheduling on the software timer pool
//!
//! A class A end device sends an uplink, then opens two receive windows at
//! fixed delays after the end of transmission. This demo drives that cycle
//! with five timers sharing one monotonic clock:
//!
//! - `app_tx`: periodic uplink trigger, re-armed from its own callback
//! - `tx_done`: stands in for the radio's TX-done interrupt
//! - `tx_timeout`: guards a transmission that never completes
//! - `rx_window_1` / `rx_window_2`: receive windows after TX done
//!
//! After each transmission the uplink period is stretched, on the live
//! `app_tx` timer, so the device stays within its duty-cycle budget.
//!
//! Callbacks only raise event flags; the main loop reacts to them. The pool
//! is serviced either by a background ticker thread (the default, modelling
//! a tick interrupt) or from the main loop with `--poll`.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use softtimer_pool::{PoolConfig, SharedTimerPool, TimerHandle, DEFAULT_CAPACITY};
use softtimer_posix::{MonotonicClock, Ticker, TickerConfig};

static CLOCK: MonotonicClock = MonotonicClock::new();
static TIMERS: SharedTimerPool<&MonotonicClock, DEFAULT_CAPACITY> = SharedTimerPool::new(
    &CLOCK,
    PoolConfig {
        name: "lora",
        tick_rate: MonotonicClock::TICK_RATE,
    },
);

/// Pending events raised by timer callbacks
static EVENTS: AtomicU32 = AtomicU32::new(0);

const EV_APP_TX: u32 = 1 << 0;
const EV_TX_DONE: u32 = 1 << 1;
const EV_TX_TIMEOUT: u32 = 1 << 2;
const EV_RX_WINDOW_1: u32 = 1 << 3;
const EV_RX_WINDOW_2: u32 = 1 << 4;

#[derive(Debug, Clone, Copy)]
struct MacTimers {
    app_tx: TimerHandle,
    tx_done: TimerHandle,
    tx_timeout: TimerHandle,
    rx_window_1: TimerHandle,
    rx_window_2: TimerHandle,
}

static MAC_TIMERS: OnceLock<MacTimers> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "lora-timers")]
#[command(about = "Class A uplink/receive-window cycle on the software timer pool", long_about = None)]
struct Args {
    /// Number of uplinks to send before exiting
    #[arg(short, long, default_value_t = 3)]
    uplinks: u32,

    /// Interval between uplinks in milliseconds
    #[arg(long, default_value_t = 400)]
    interval_ms: u32,

    /// Simulated time on air in milliseconds
    #[arg(long, default_value_t = 60)]
    airtime_ms: u32,

    /// Duty-cycle limit in percent of airtime per uplink period
    #[arg(long, default_value_t = 25, value_parser = clap::value_parser!(u32).range(1..=100))]
    duty_cycle_percent: u32,

    /// Delay from TX done to the first receive window in milliseconds
    #[arg(long, default_value_t = 100)]
    rx1_delay_ms: u32,

    /// Delay from TX done to the second receive window in milliseconds
    #[arg(long, default_value_t = 200)]
    rx2_delay_ms: u32,

    /// Ticker rate in Hz
    #[arg(long, default_value_t = 1000)]
    tick_hz: u32,

    /// Service the pool from the main loop instead of a ticker thread
    #[arg(long)]
    poll: bool,
}

fn raise(event: u32) {
    EVENTS.fetch_or(event, Ordering::SeqCst);
}

/// Start `handle` from callback context, where errors cannot propagate
fn restart_or_warn(handle: TimerHandle, what: &str) -> bool {
    match TIMERS.start(handle) {
        Ok(()) => true,
        Err(err) => {
            warn!("re-arming {} timer ({}) failed: {}", what, handle, err);
            false
        }
    }
}

fn on_app_tx() {
    raise(EV_APP_TX);
    if let Some(timers) = MAC_TIMERS.get() {
        restart_or_warn(timers.app_tx, "uplink");
    }
}

fn on_tx_done() {
    raise(EV_TX_DONE);
}

fn on_tx_timeout() {
    raise(EV_TX_TIMEOUT);
}

fn on_rx_window_1() {
    raise(EV_RX_WINDOW_1);
}

fn on_rx_window_2() {
    raise(EV_RX_WINDOW_2);
}

/// Uplink period honouring the duty-cycle limit.
///
/// A transmission of `airtime_ms` must be followed by
/// `airtime_ms * (100 - duty) / duty` of silence; the configured interval is
/// kept when it is already longer.
fn uplink_period_ms(interval_ms: u32, airtime_ms: u32, duty_cycle_percent: u32) -> u32 {
    let duty = u64::from(duty_cycle_percent.clamp(1, 100));
    let airtime = u64::from(airtime_ms);
    let off_time = airtime * (100 - duty) / duty;
    let period = u32::try_from(airtime + off_time).unwrap_or(u32::MAX);
    period.max(interval_ms)
}

fn register_timers(args: &Args) -> Result<MacTimers> {
    let timers = MacTimers {
        app_tx: TIMERS.register_millis(args.interval_ms, on_app_tx)?,
        tx_done: TIMERS.register_millis(args.airtime_ms, on_tx_done)?,
        tx_timeout: TIMERS.register_millis(args.airtime_ms.saturating_mul(4), on_tx_timeout)?,
        rx_window_1: TIMERS.register_millis(args.rx1_delay_ms, on_rx_window_1)?,
        rx_window_2: TIMERS.register_millis(args.rx2_delay_ms, on_rx_window_2)?,
    };
    MAC_TIMERS
        .set(timers)
        .map_err(|_| anyhow!("MAC timers already registered"))?;
    Ok(timers)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.rx2_delay_ms <= args.rx1_delay_ms {
        return Err(anyhow!("the second receive window must open after the first"));
    }

    let timers = register_timers(&args).context("registering MAC timers")?;
    info!(
        "{} of {} timer slots registered",
        TIMERS.stats().registered,
        TIMERS.capacity()
    );

    let ticker = if args.poll {
        None
    } else {
        let config = TickerConfig::new(args.tick_hz)?;
        Some(Ticker::spawn(config, &TIMERS)?)
    };

    TIMERS.start(timers.app_tx)?;
    let mut sent = 0;
    let mut completed = 0;

    while completed < args.uplinks {
        if args.poll {
            TIMERS.service();
        }

        let events = EVENTS.swap(0, Ordering::SeqCst);

        if events & EV_APP_TX != 0 {
            if sent < args.uplinks {
                sent += 1;
                info!("uplink #{} on air", sent);
                TIMERS.start(timers.tx_done)?;
                TIMERS.start(timers.tx_timeout)?;
            } else {
                TIMERS.stop(timers.app_tx)?;
            }
        }
        if events & EV_TX_DONE != 0 {
            TIMERS.stop(timers.tx_timeout)?;
            let period =
                uplink_period_ms(args.interval_ms, args.airtime_ms, args.duty_cycle_percent);
            TIMERS.set_duration_millis(timers.app_tx, period)?;
            if period > args.interval_ms {
                info!(
                    "duty cycle {}%: next uplink backed off to {} ms",
                    args.duty_cycle_percent, period
                );
            } else {
                debug!("next uplink in {} ms", period);
            }
            TIMERS.start(timers.rx_window_1)?;
            TIMERS.start(timers.rx_window_2)?;
            info!("uplink #{} done, receive windows armed", sent);
        }
        if events & EV_TX_TIMEOUT != 0 {
            warn!("uplink #{} timed out on air", sent);
            completed += 1;
        }
        if events & EV_RX_WINDOW_1 != 0 {
            info!("RX1 open: no downlink");
        }
        if events & EV_RX_WINDOW_2 != 0 {
            info!("RX2 open: no downlink, cycle {} complete", sent);
            completed += 1;
        }

        thread::sleep(Duration::from_millis(1));
    }

    TIMERS.stop(timers.app_tx)?;
    if let Some(ticker) = ticker {
        info!("{} ticks, {} callbacks", ticker.ticks(), ticker.fired());
        ticker.stop();
    }
    info!("pool at exit: {:?}", TIMERS.stats());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_kept_within_budget() {
        // 60 ms on air at 25% needs 240 ms per period
        assert_eq!(uplink_period_ms(400, 60, 25), 400);
        assert_eq!(uplink_period_ms(400, 60, 100), 400);
    }

    #[test]
    fn test_backoff_stretches_period() {
        assert_eq!(uplink_period_ms(400, 60, 10), 600);
        assert_eq!(uplink_period_ms(0, 60, 1), 6_000);
    }

    #[test]
    fn test_backoff_saturates() {
        assert_eq!(uplink_period_ms(0, u32::MAX, 1), u32::MAX);
    }

    #[test]
    fn test_failed_rearm_is_reported() {
        // nothing is registered in this process's pool
        assert!(!restart_or_warn(TimerHandle::new(0), "uplink"));
        assert!(!restart_or_warn(TimerHandle::new(u8::MAX), "uplink"));
    }

    #[test]
    fn test_duty_cycle_range_checked() {
        assert!(Args::try_parse_from(["lora-timers", "--duty-cycle-percent", "0"]).is_err());
        assert!(Args::try_parse_from(["lora-timers", "--duty-cycle-percent", "101"]).is_err());
        let args = Args::try_parse_from(["lora-timers", "--duty-cycle-percent", "1"]).unwrap();
        assert_eq!(args.duty_cycle_percent, 1);
    }
}
