//! Trace replay on virtual time.

use std::io::Write;
use std::time::Duration;

use eyre::Result;
use funnel_config::{ReducerKind, TraceRow};
use funnel_core::util::millis;
use funnel_core::{Funnel, FunnelConfig, Recorder, Simulation, reducers};
use funnel_traits::ManualClock;
use serde::Serialize;

use crate::output::Printer;

/// Counters printed after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub calls: u64,
    pub invocations: u64,
}

/// Numeric-sum reducer over textual call values.
pub fn numeric_sum() -> impl FnMut(Option<f64>, String) -> funnel_core::Result<f64> {
    let mut add = reducers::sum::<f64>();
    move |acc, raw| {
        let x: f64 = raw
            .trim()
            .parse()
            .map_err(|_| eyre::eyre!("call value {raw:?} is not a number"))?;
        add(acc, x)
    }
}

/// Replay `rows` through a funnel built from `config`, printing every
/// invocation as it happens on the virtual clock.
pub fn run_simulate<W: Write>(
    config: FunnelConfig,
    rows: &[TraceRow],
    reducer: ReducerKind,
    flush_at_end: bool,
    printer: &mut Printer<W>,
) -> Result<Summary> {
    tracing::info!(
        rows = rows.len(),
        reducer = reducer.as_str(),
        flush_at_end,
        "replay start"
    );
    let summary = match reducer {
        ReducerKind::Latest => replay(
            config,
            rows,
            reducers::latest::<String>(),
            flush_at_end,
            printer,
        ),
        ReducerKind::Collect => replay(
            config,
            rows,
            reducers::collect::<String>(),
            flush_at_end,
            printer,
        ),
        ReducerKind::Count => replay(
            config,
            rows,
            reducers::count::<String>(),
            flush_at_end,
            printer,
        ),
        ReducerKind::Sum => replay(config, rows, numeric_sum(), flush_at_end, printer),
    }?;
    tracing::info!(
        calls = summary.calls,
        invocations = summary.invocations,
        "replay complete"
    );
    Ok(summary)
}

fn replay<R, F, W>(
    config: FunnelConfig,
    rows: &[TraceRow],
    reducer: F,
    flush_at_end: bool,
    printer: &mut Printer<W>,
) -> Result<Summary>
where
    R: Serialize + 'static,
    F: FnMut(Option<R>, String) -> funnel_core::Result<R> + 'static,
    W: Write,
{
    let clock = ManualClock::new();
    let rec = Recorder::new(clock.clone());
    let funnel = Funnel::builder()
        .with_config(config)
        .with_clock(clock.clone())
        .with_reducer(reducer)
        .with_effect(rec.effect())
        .build()?;
    let mut sim = Simulation::new(clock, funnel);

    let mut drain = |rec: &Recorder<R>| -> Result<()> {
        for inv in rec.take() {
            printer.invocation(millis(inv.at), &inv.value)?;
        }
        Ok(())
    };

    for row in rows {
        sim.advance_to(Duration::from_millis(row.at_ms))?;
        let called = sim.call(row.value.clone());
        drain(&rec)?;
        called?;
    }
    if flush_at_end {
        sim.funnel_mut().flush()?;
    } else {
        sim.run_until_idle()?;
    }
    drain(&rec)?;

    Ok(Summary {
        calls: rows.len() as u64,
        invocations: sim.funnel().invocations(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use funnel_core::TriggerAt;

    fn rows(entries: &[(u64, &str)]) -> Vec<TraceRow> {
        entries
            .iter()
            .map(|&(at_ms, value)| TraceRow {
                at_ms,
                value: value.to_string(),
            })
            .collect()
    }

    fn text(config: FunnelConfig, trace: &[(u64, &str)], reducer: ReducerKind) -> String {
        let mut p = Printer::new(Vec::new(), false);
        run_simulate(config, &rows(trace), reducer, false, &mut p).unwrap();
        String::from_utf8(p.into_inner()).unwrap()
    }

    #[test]
    fn debounce_replay_prints_the_trailing_edge() {
        let out = text(
            FunnelConfig::debounce(Duration::from_millis(100)),
            &[(0, "a"), (50, "b")],
            ReducerKind::Latest,
        );
        assert_eq!(out, "     150 ms  b\n");
    }

    #[test]
    fn sum_parses_numbers() {
        let out = text(
            FunnelConfig::throttle(Duration::from_millis(100), TriggerAt::Both),
            &[(0, "1"), (10, "2.5"), (20, "0.5")],
            ReducerKind::Sum,
        );
        assert_eq!(out, "       0 ms  1.0\n     100 ms  3.0\n");
    }

    #[test]
    fn non_numeric_sum_value_is_an_error() {
        let mut p = Printer::new(Vec::new(), false);
        let err = run_simulate(
            FunnelConfig::debounce(Duration::from_millis(10)),
            &rows(&[(0, "1"), (5, "x")]),
            ReducerKind::Sum,
            false,
            &mut p,
        )
        .unwrap_err();
        assert!(err.to_string().contains("\"x\" is not a number"));
    }

    #[test]
    fn flush_at_end_reports_pending_at_last_call() {
        let mut p = Printer::new(Vec::new(), false);
        let summary = run_simulate(
            FunnelConfig::debounce(Duration::from_secs(10)),
            &rows(&[(0, "a"), (30, "b"), (40, "c")]),
            ReducerKind::Count,
            true,
            &mut p,
        )
        .unwrap();
        assert_eq!(
            summary,
            Summary {
                calls: 3,
                invocations: 1
            }
        );
        assert_eq!(String::from_utf8(p.into_inner()).unwrap(), "      40 ms  3\n");
    }
}
