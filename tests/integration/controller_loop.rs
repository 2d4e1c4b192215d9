#![allow(missing_docs)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use replay_pacer::pacer::{LoopState, PacerConfig, ReplayPacer};
use replay_pacer::types::Result;

const PRODUCERS: usize = 6;
const EVENTS_PER_PRODUCER: u64 = 20_000;

fn fast_config() -> PacerConfig {
    let mut cfg = PacerConfig::default().enabled(true);
    cfg.cycle_interval_ms = 5;
    cfg
}

fn wait_for_cycle(pacer: &ReplayPacer) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while pacer.read_metrics().last_update_ms == 0 {
        assert!(Instant::now() < deadline, "controller did not cycle in time");
        thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn producers_and_controller_run_concurrently() -> Result<()> {
    let pacer = Arc::new(ReplayPacer::with_config(fast_config())?);
    assert_eq!(pacer.start_controller(), LoopState::Running);

    let barrier = Arc::new(Barrier::new(PRODUCERS + 1));
    let done = Arc::new(AtomicBool::new(false));
    let producers: Vec<_> = (0..PRODUCERS)
        .map(|id| {
            let pacer = Arc::clone(&pacer);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..EVENTS_PER_PRODUCER {
                    match id % 3 {
                        0 => pacer.record_replay_task(1),
                        1 => pacer.record_hot_miss(),
                        _ => pacer.record_wal_ingest(8192),
                    }
                    if i % 1024 == 0 {
                        let budget = pacer.current_budget();
                        assert!((10..=2000).contains(&budget), "budget {budget} out of range");
                    }
                }
            })
        })
        .collect();

    let sampler = {
        let pacer = Arc::clone(&pacer);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            while !done.load(Ordering::Relaxed) {
                let snap = pacer.read_metrics();
                assert!((0.0..=1.0).contains(&snap.aggressiveness));
                assert!((10..=2000).contains(&snap.replay_budget));
                assert!(snap.replay_queue_rate >= 0.0);
                assert!(snap.hot_miss_rate >= 0.0);
                assert!(snap.wal_ingest_bps >= 0.0);
                thread::sleep(Duration::from_millis(1));
            }
        })
    };

    barrier.wait();
    for producer in producers {
        producer.join().unwrap();
    }
    wait_for_cycle(&pacer);
    done.store(true, Ordering::Relaxed);
    sampler.join().unwrap();
    pacer.shutdown();

    let counters = pacer.raw_counters();
    let per_kind = EVENTS_PER_PRODUCER * (PRODUCERS as u64 / 3);
    assert_eq!(counters.replay_tasks, per_kind);
    assert_eq!(counters.hot_misses, per_kind);
    assert_eq!(counters.wal_bytes, per_kind * 8192);
    assert_eq!(pacer.loop_state(), LoopState::Stopped);
    Ok(())
}

#[test]
fn shutdown_is_prompt_with_long_cycle() -> Result<()> {
    let mut cfg = PacerConfig::default().enabled(true);
    cfg.cycle_interval_ms = 60_000;
    let pacer = ReplayPacer::with_config(cfg)?;
    pacer.start_controller();
    wait_for_cycle(&pacer);
    let started = Instant::now();
    pacer.shutdown();
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(pacer.loop_state(), LoopState::Stopped);
    Ok(())
}

#[test]
fn disabled_pacer_keeps_initial_budget() {
    let pacer = ReplayPacer::init();
    assert_eq!(pacer.start_controller(), LoopState::Idle);
    for _ in 0..1000 {
        pacer.record_hot_miss();
        pacer.record_replay_task(3);
    }
    thread::sleep(Duration::from_millis(20));
    assert_eq!(pacer.current_budget(), 10);
    assert_eq!(pacer.read_metrics().last_update_ms, 0);
    pacer.shutdown();
    assert_eq!(pacer.loop_state(), LoopState::Idle);
}

#[test]
fn shutdown_before_start_is_a_no_op() -> Result<()> {
    let pacer = ReplayPacer::with_config(fast_config())?;
    pacer.shutdown();
    assert_eq!(pacer.loop_state(), LoopState::Idle);
    assert_eq!(pacer.start_controller(), LoopState::Running);
    pacer.shutdown();
    Ok(())
}

#[test]
fn instances_are_independent() -> Result<()> {
    let busy = ReplayPacer::with_config(PacerConfig::default().enabled(true))?;
    let quiet = ReplayPacer::with_config(PacerConfig::default().enabled(true))?;
    for _ in 0..50 {
        busy.record_hot_miss();
    }
    busy.tick();
    quiet.tick();
    assert!(busy.current_budget() > 10);
    assert_eq!(quiet.current_budget(), 10);
    assert_eq!(quiet.raw_counters().hot_misses, 0);
    Ok(())
}

#[test]
fn config_swaps_apply_while_running() -> Result<()> {
    let pacer = ReplayPacer::with_config(fast_config())?;
    pacer.start_controller();
    wait_for_cycle(&pacer);
    let mut narrowed = fast_config().budget_bounds(300, 400);
    narrowed.hysteresis = 0;
    pacer.update_config(narrowed)?;
    let deadline = Instant::now() + Duration::from_secs(5);
    while pacer.current_budget() < 300 {
        assert!(Instant::now() < deadline, "budget never entered new bounds");
        thread::sleep(Duration::from_millis(2));
    }
    pacer.shutdown();
    assert!((300..=400).contains(&pacer.current_budget()));
    Ok(())
}

#[test]
fn dropping_a_running_pacer_stops_the_loop() -> Result<()> {
    let pacer = ReplayPacer::with_config(fast_config())?;
    pacer.start_controller();
    wait_for_cycle(&pacer);
    let started = Instant::now();
    drop(pacer);
    assert!(started.elapsed() < Duration::from_secs(5));
    Ok(())
}
