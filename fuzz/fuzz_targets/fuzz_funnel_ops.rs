#![no_main]
use std::time::Duration;

use funnel_core::{Funnel, FunnelConfig, Recorder, Simulation, TriggerAt, reducers};
use funnel_traits::ManualClock;
use libfuzzer_sys::arbitrary::{self, Arbitrary};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Call(u8),
    Advance(u16),
    Cancel,
    Flush,
}

#[derive(Debug, Arbitrary)]
struct Input {
    trigger: u8,
    quiet: Option<u16>,
    max_burst: Option<u16>,
    gap: Option<u16>,
    ops: Vec<Op>,
}

fn ms(v: Option<u16>) -> Option<Duration> {
    v.map(|v| Duration::from_millis(u64::from(v)))
}

fuzz_target!(|input: Input| {
    let config = FunnelConfig {
        trigger_at: match input.trigger % 3 {
            0 => TriggerAt::Start,
            1 => TriggerAt::End,
            _ => TriggerAt::Both,
        },
        min_quiet_period: ms(input.quiet),
        max_burst_duration: ms(input.max_burst),
        min_gap: ms(input.gap),
    };
    if config.validate().is_err() {
        return;
    }
    let clock = ManualClock::new();
    let rec = Recorder::new(clock.clone());
    let Ok(funnel) = Funnel::builder()
        .with_config(config)
        .with_clock(clock.clone())
        .with_reducer(reducers::collect::<u8>())
        .with_effect(rec.effect())
        .build()
    else {
        return;
    };
    let mut sim = Simulation::new(clock, funnel);
    for op in input.ops {
        let outcome = match op {
            Op::Call(v) => sim.call(v),
            Op::Advance(d) => sim.advance(Duration::from_millis(u64::from(d))),
            Op::Cancel => {
                sim.funnel_mut().cancel();
                Ok(())
            }
            Op::Flush => sim.funnel_mut().flush(),
        };
        assert!(outcome.is_ok());
        let f = sim.funnel();
        assert_eq!(f.is_idle(), f.next_deadline().is_none());
        assert!(!f.is_idle() || !f.has_pending());
    }
    assert!(sim.run_until_idle().is_ok());
    assert!(rec.values().iter().all(|batch| !batch.is_empty()));
});
