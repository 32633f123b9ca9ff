use std::time::Duration;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use funnel_core::{Funnel, FunnelConfig, Simulation, TriggerAt, reducers};
use funnel_traits::ManualClock;

fn sim_for(config: FunnelConfig) -> Simulation<u64, u64> {
    let clock = ManualClock::new();
    let funnel = Funnel::builder()
        .with_config(config)
        .with_clock(clock.clone())
        .with_reducer(reducers::sum::<u64>())
        .with_effect(|total| {
            black_box(total);
            Ok(())
        })
        .build()
        .unwrap();
    Simulation::new(clock, funnel)
}

pub fn bench_calls(c: &mut Criterion) {
    let mut g = c.benchmark_group("call_throughput");
    // BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p funnel_core --bench call_throughput
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE")
        && let Ok(n) = ss.parse::<usize>()
    {
        g.sample_size(n.max(10));
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(Duration::from_millis(ms_u64));
    }

    let presets = [
        ("debounce", FunnelConfig::debounce(Duration::from_millis(50))),
        (
            "throttle_both",
            FunnelConfig::throttle(Duration::from_millis(50), TriggerAt::Both),
        ),
        (
            "batch",
            FunnelConfig::batch(Duration::from_millis(20), Duration::from_millis(200)),
        ),
    ];
    let n = 10_000u64;

    for (name, config) in presets {
        g.bench_function(format!("{name}_1ms_spacing"), |b| {
            b.iter_batched(
                || sim_for(config),
                |mut sim| {
                    for i in 0..n {
                        sim.call(black_box(i)).unwrap();
                        sim.advance(Duration::from_millis(1)).unwrap();
                    }
                    sim.run_until_idle().unwrap();
                    black_box(sim.funnel().invocations());
                },
                BatchSize::SmallInput,
            )
        });
    }
    g.finish();
}

criterion_group!(funnel_calls, bench_calls);
criterion_main!(funnel_calls);
