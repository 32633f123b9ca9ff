//! Reducer and effect failures propagate and leave well-defined state.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use funnel_core::{Funnel, FunnelConfig, FunnelPhase, Recorder, Simulation, TriggerAt};
use funnel_traits::ManualClock;

const fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

/// Collects values but rejects negative ones.
fn picky(acc: Option<Vec<i32>>, x: i32) -> eyre::Result<Vec<i32>> {
    if x < 0 {
        eyre::bail!("negative input {x}");
    }
    let mut batch = acc.unwrap_or_default();
    batch.push(x);
    Ok(batch)
}

fn picky_sim(cfg: FunnelConfig) -> (Simulation<i32, Vec<i32>>, Recorder<Vec<i32>>) {
    let clock = ManualClock::new();
    let rec = Recorder::new(clock.clone());
    let funnel = Funnel::builder()
        .with_config(cfg)
        .with_clock(clock.clone())
        .with_reducer(picky)
        .with_effect(rec.effect())
        .build()
        .expect("funnel build");
    (Simulation::new(clock, funnel), rec)
}

fn failing_sim(cfg: FunnelConfig) -> (Simulation<i32, Vec<i32>>, Rc<Cell<u32>>) {
    let clock = ManualClock::new();
    let attempts = Rc::new(Cell::new(0));
    let seen = attempts.clone();
    let funnel = Funnel::builder()
        .with_config(cfg)
        .with_clock(clock.clone())
        .with_reducer(picky)
        .with_effect(move |_batch: Vec<i32>| {
            seen.set(seen.get() + 1);
            eyre::bail!("sink unavailable")
        })
        .build()
        .expect("funnel build");
    (Simulation::new(clock, funnel), attempts)
}

#[test]
fn reducer_error_discards_pending_and_keeps_timers() {
    let (mut sim, rec) = picky_sim(FunnelConfig::debounce(ms(100)));

    sim.call(1).unwrap();
    sim.advance(ms(10)).unwrap();
    let err = sim.call(-1).expect_err("reducer should fail");
    assert!(format!("{err}").contains("negative input -1"));

    assert!(!sim.funnel().has_pending());
    assert_eq!(sim.funnel().phase(), FunnelPhase::BurstOnly);
    assert_eq!(
        sim.funnel().next_deadline(),
        Some(sim.clock().origin() + ms(100)),
        "failed call must not extend the burst"
    );

    sim.advance_to(ms(100)).unwrap();
    assert!(rec.is_empty());
    assert!(sim.funnel().is_idle());

    sim.call(2).unwrap();
    sim.run_until_idle().unwrap();
    assert_eq!(rec.values(), vec![vec![2]]);
}

#[test]
fn reducer_error_on_idle_funnel_stays_idle() {
    let (mut sim, rec) = picky_sim(FunnelConfig {
        trigger_at: TriggerAt::Start,
        min_quiet_period: Some(ms(50)),
        ..FunnelConfig::default()
    });

    sim.call(-5).expect_err("reducer should fail");

    assert!(sim.funnel().is_idle());
    assert_eq!(sim.funnel().next_deadline(), None);
    assert!(rec.is_empty(), "no leading edge for a failed call");
}

#[test]
fn effect_error_surfaces_from_the_timer_and_still_arms_the_gap() {
    let (mut sim, attempts) = failing_sim(FunnelConfig {
        min_quiet_period: Some(ms(10)),
        min_gap: Some(ms(100)),
        ..FunnelConfig::default()
    });

    sim.call(1).unwrap();
    let err = sim.advance_to(ms(10)).expect_err("effect should fail");
    assert!(format!("{err}").contains("sink unavailable"));
    assert_eq!(attempts.get(), 1);
    assert!(!sim.funnel().has_pending(), "value was handed to the effect");
    assert_eq!(sim.funnel().phase(), FunnelPhase::GapOnly);

    sim.advance_to(ms(110)).unwrap();
    assert!(sim.funnel().is_idle());
    assert_eq!(attempts.get(), 1, "nothing is retried");
}

#[test]
fn leading_effect_error_is_returned_from_call() {
    let (mut sim, attempts) = failing_sim(FunnelConfig {
        trigger_at: TriggerAt::Start,
        min_quiet_period: Some(ms(50)),
        ..FunnelConfig::default()
    });

    sim.call(1).expect_err("effect should fail");
    assert_eq!(attempts.get(), 1);
    assert_eq!(sim.funnel().phase(), FunnelPhase::BurstOnly);
    assert!(!sim.funnel().has_pending());

    sim.run_until_idle().unwrap();
    assert_eq!(attempts.get(), 1);
}

#[test]
fn failed_flush_still_ends_idle() {
    let (mut sim, attempts) = failing_sim(FunnelConfig {
        min_quiet_period: Some(ms(100)),
        min_gap: Some(ms(50)),
        ..FunnelConfig::default()
    });

    sim.call(1).unwrap();
    sim.funnel_mut().flush().expect_err("effect should fail");

    assert_eq!(attempts.get(), 1);
    assert!(sim.funnel().is_idle());
    assert_eq!(sim.funnel().next_deadline(), None);
}
