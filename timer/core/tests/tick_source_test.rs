//! Tick source tests for softtimer-core
//! These run on the host but exercise the same no_std code used on target

use std::sync::atomic::{AtomicU32, Ordering};

use softtimer_core::{elapsed_since, FnTickSource, Tick, TickCounter, TickDuration, TickSource};

static MICROS: AtomicU32 = AtomicU32::new(0);

fn micros() -> u32 {
    MICROS.load(Ordering::SeqCst)
}

#[test]
fn test_platform_function_source() {
    let source = FnTickSource(micros);
    MICROS.store(u32::MAX - 4, Ordering::SeqCst);
    let start = source.now();

    MICROS.store(3, Ordering::SeqCst);
    assert_eq!(elapsed_since(&source, start), TickDuration::from_ticks(8));
}

#[test]
fn test_counter_is_monotonic_between_wraps() {
    let counter = TickCounter::starting_at(Tick::new(1_000));
    let mut last = counter.now();
    for _ in 0..100 {
        counter.increment();
        let now = counter.now();
        assert!(now.is_after(last));
        last = now;
    }
    assert_eq!(last.raw(), 1_100);
}

#[test]
fn test_source_by_reference() {
    fn read<S: TickSource>(source: S) -> Tick {
        source.now()
    }

    let counter = TickCounter::new();
    counter.set(Tick::new(42));
    assert_eq!(read(&counter), Tick::new(42));
}

#[test]
fn test_counter_set_and_advance_from_threads() {
    static COUNTER: TickCounter = TickCounter::new();

    let tickers: Vec<_> = (0..4)
        .map(|_| {
            std::thread::spawn(|| {
                for _ in 0..1_000 {
                    COUNTER.increment();
                }
            })
        })
        .collect();
    for ticker in tickers {
        ticker.join().unwrap();
    }
    assert_eq!(COUNTER.now(), Tick::new(4_000));

    COUNTER.set(Tick::new(u32::MAX));
    COUNTER.increment();
    assert_eq!(COUNTER.now(), Tick::ZERO);
}
