//! Timer pool behaviour against a hand-driven tick counter

use std::sync::atomic::{AtomicUsize, Ordering};

use softtimer_pool::{
    PoolConfig, Tick, TickCounter, TickDuration, TickRate, TimerError, TimerHandle, TimerPool,
    DEFAULT_CAPACITY,
};

fn noop() {}

fn ticks(n: u32) -> TickDuration {
    TickDuration::from_ticks(n)
}

fn pool(clock: &TickCounter) -> TimerPool<&TickCounter, DEFAULT_CAPACITY> {
    TimerPool::new(clock, PoolConfig::new(TickRate::MILLIS))
}

#[test]
fn test_register_up_to_capacity() {
    let clock = TickCounter::new();
    let mut pool = pool(&clock);

    let mut handles = Vec::new();
    for i in 0..DEFAULT_CAPACITY {
        handles.push(pool.register(ticks(100 * (i as u32 + 1)), noop).unwrap());
    }
    handles.sort();
    handles.dedup();
    assert_eq!(handles.len(), DEFAULT_CAPACITY);

    assert_eq!(pool.register(ticks(5), noop), Err(TimerError::CapacityExceeded));
    assert!(pool.stats().is_exhausted());
}

#[test]
fn test_expiry_window() {
    let clock = TickCounter::starting_at(Tick::new(1_000));
    let mut pool = pool(&clock);
    let handle = pool.register(ticks(50), noop).unwrap();
    pool.start(handle).unwrap();

    for _ in 0..49 {
        clock.increment();
        assert!(!pool.is_expired(handle).unwrap());
    }
    clock.increment();
    assert!(pool.is_expired(handle).unwrap());
    clock.advance(ticks(1_000));
    assert!(pool.is_expired(handle).unwrap());
}

#[test]
fn test_stopped_timer_never_expires() {
    let clock = TickCounter::new();
    let mut pool = pool(&clock);
    let handle = pool.register(ticks(10), noop).unwrap();
    pool.start(handle).unwrap();
    clock.advance(ticks(5));
    pool.stop(handle).unwrap();

    for _ in 0..4 {
        clock.advance(ticks(u32::MAX / 4));
        assert!(!pool.is_expired(handle).unwrap());
    }
    assert_eq!(pool.service(), 0);
    assert_eq!(pool.duration(handle).unwrap(), ticks(10));
    assert_eq!(pool.slot(handle).unwrap().start_tick(), Tick::ZERO);
}

#[test]
fn test_reset_rebases_expiry() {
    let clock = TickCounter::new();
    let mut pool = pool(&clock);
    let handle = pool.register(ticks(100), noop).unwrap();
    pool.start(handle).unwrap();

    clock.set(Tick::new(80));
    pool.reset(handle).unwrap();

    clock.set(Tick::new(179));
    assert!(!pool.is_expired(handle).unwrap());
    clock.set(Tick::new(180));
    assert!(pool.is_expired(handle).unwrap());
}

#[test]
fn test_reset_arms_stopped_timer() {
    let clock = TickCounter::new();
    let mut pool = pool(&clock);
    let handle = pool.register(ticks(10), noop).unwrap();

    pool.reset(handle).unwrap();
    assert!(pool.is_active(handle).unwrap());
}

#[test]
fn test_start_on_active_timer_rebases() {
    let clock = TickCounter::new();
    let mut pool = pool(&clock);
    let handle = pool.register(ticks(100), noop).unwrap();
    pool.start(handle).unwrap();

    clock.set(Tick::new(60));
    pool.start(handle).unwrap();
    clock.set(Tick::new(120));
    assert!(!pool.is_expired(handle).unwrap());
    assert_eq!(pool.remaining(handle).unwrap(), ticks(40));
}

#[test]
fn test_set_duration_keeps_start_tick() {
    static FIRED: AtomicUsize = AtomicUsize::new(0);
    fn on_expiry() {
        FIRED.fetch_add(1, Ordering::SeqCst);
    }

    let clock = TickCounter::new();
    let mut pool = pool(&clock);
    let handle = pool.register(ticks(100), on_expiry).unwrap();
    pool.start(handle).unwrap();

    clock.set(Tick::new(60));
    pool.set_duration(handle, ticks(200)).unwrap();
    assert!(pool.is_active(handle).unwrap());
    assert_eq!(pool.service(), 0);

    clock.set(Tick::new(150));
    assert_eq!(pool.service(), 0);
    clock.set(Tick::new(200));
    assert_eq!(pool.service(), 1);
    assert_eq!(FIRED.load(Ordering::SeqCst), 1);
}

#[test]
fn test_shortened_duration_fires_on_next_scan() {
    let clock = TickCounter::new();
    let mut pool = pool(&clock);
    let handle = pool.register(ticks(100), noop).unwrap();
    pool.start(handle).unwrap();

    clock.set(Tick::new(60));
    pool.set_duration(handle, ticks(30)).unwrap();
    assert!(pool.is_expired(handle).unwrap());
    assert_eq!(pool.service(), 1);
}

#[test]
fn test_elapsed_across_counter_wrap() {
    let clock = TickCounter::starting_at(Tick::new(u32::MAX - 4));
    let pool = pool(&clock);
    let start = pool.now();

    clock.set(Tick::new(3));
    assert_eq!(pool.elapsed_since(start), ticks(8));
}

#[test]
fn test_timer_spanning_counter_wrap() {
    let clock = TickCounter::starting_at(Tick::new(u32::MAX - 20));
    let mut pool = pool(&clock);
    let handle = pool.register(ticks(50), noop).unwrap();
    pool.start(handle).unwrap();

    clock.advance(ticks(49));
    assert!(!pool.is_expired(handle).unwrap());
    clock.increment();
    assert!(pool.is_expired(handle).unwrap());
}

#[test]
fn test_only_short_timers_expired_at_150() {
    let clock = TickCounter::new();
    let mut pool = pool(&clock);

    let mut handles = Vec::new();
    for i in 1..=10 {
        let handle = pool.register(ticks(100 * i), noop).unwrap();
        pool.start(handle).unwrap();
        handles.push(handle);
    }

    clock.set(Tick::new(150));
    let expired: Vec<_> = handles
        .iter()
        .filter(|h| pool.is_expired(**h).unwrap())
        .copied()
        .collect();
    assert_eq!(expired, vec![handles[0]]);

    let retired = pool.expire();
    assert_eq!(retired.handles().collect::<Vec<_>>(), vec![handles[0]]);
    assert_eq!(pool.stats().active, 9);
}

#[test]
fn test_one_shot_fires_once() {
    static FIRED: AtomicUsize = AtomicUsize::new(0);
    fn on_expiry() {
        FIRED.fetch_add(1, Ordering::SeqCst);
    }

    let clock = TickCounter::new();
    let mut pool = pool(&clock);
    let handle = pool.register(ticks(50), on_expiry).unwrap();
    pool.start(handle).unwrap();

    clock.set(Tick::new(49));
    assert_eq!(pool.service(), 0);
    clock.set(Tick::new(50));
    assert_eq!(pool.service(), 1);
    assert!(!pool.is_active(handle).unwrap());

    clock.set(Tick::new(100));
    assert_eq!(pool.service(), 0);
    assert_eq!(FIRED.load(Ordering::SeqCst), 1);

    pool.start(handle).unwrap();
    clock.set(Tick::new(150));
    assert_eq!(pool.service(), 1);
    assert_eq!(FIRED.load(Ordering::SeqCst), 2);
}

#[test]
fn test_callbacks_dispatch_in_slot_order() {
    static ORDER: AtomicUsize = AtomicUsize::new(0);
    fn first() {
        assert_eq!(ORDER.fetch_add(1, Ordering::SeqCst), 0);
    }
    fn second() {
        assert_eq!(ORDER.fetch_add(1, Ordering::SeqCst), 1);
    }

    let clock = TickCounter::new();
    let mut pool = pool(&clock);
    let a = pool.register(ticks(30), first).unwrap();
    let b = pool.register(ticks(10), second).unwrap();
    pool.start(a).unwrap();
    pool.start(b).unwrap();

    clock.set(Tick::new(30));
    assert_eq!(pool.service(), 2);
    assert_eq!(ORDER.load(Ordering::SeqCst), 2);
}

#[test]
fn test_invalid_handle_is_rejected_without_side_effects() {
    let clock = TickCounter::new();
    let mut pool = pool(&clock);
    let valid = pool.register(ticks(10), noop).unwrap();
    pool.start(valid).unwrap();
    let before = *pool.slot(valid).unwrap();

    for raw in [1u8, 9, 10, 200, u8::MAX] {
        let bogus = TimerHandle::new(raw);
        assert_eq!(pool.start(bogus), Err(TimerError::InvalidHandle));
        assert_eq!(pool.stop(bogus), Err(TimerError::InvalidHandle));
        assert_eq!(pool.reset(bogus), Err(TimerError::InvalidHandle));
        assert_eq!(pool.set_duration(bogus, ticks(1)), Err(TimerError::InvalidHandle));
        assert_eq!(pool.is_expired(bogus), Err(TimerError::InvalidHandle));
        assert_eq!(pool.remaining(bogus), Err(TimerError::InvalidHandle));
    }

    let after = pool.slot(valid).unwrap();
    assert_eq!(after.is_active(), before.is_active());
    assert_eq!(after.duration(), before.duration());
    assert_eq!(after.start_tick(), before.start_tick());
    assert_eq!(pool.stats().registered, 1);
}

#[test]
fn test_error_display() {
    assert_eq!(TimerError::CapacityExceeded.to_string(), "No more timers available");
    assert_eq!(TimerError::InvalidHandle.to_string(), "Timer handle is not registered");
}
