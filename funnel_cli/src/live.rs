//! Real-time mode: stdin lines are calls.

use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Instant;

use crossbeam_channel as xch;
use eyre::{Result, WrapErr};
use funnel_config::ReducerKind;
use funnel_core::runner::{RunStats, run_channel};
use funnel_core::util::millis;
use funnel_core::{Funnel, FunnelConfig, reducers};
use serde::Serialize;

use crate::output::Printer;
use crate::simulate::numeric_sum;

/// Feed every non-blank line of `input` to a funnel and print invocations to
/// `out` as they fire. Returns once `input` hits EOF and the funnel has been
/// flushed.
pub fn run_live<I, W>(
    config: FunnelConfig,
    reducer: ReducerKind,
    input: I,
    out: W,
    json: bool,
) -> Result<RunStats>
where
    I: BufRead + Send + 'static,
    W: Write + 'static,
{
    let (tx, rx) = xch::unbounded::<String>();
    let reader = thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || -> io::Result<()> {
            for line in input.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                if tx.send(line).is_err() {
                    break;
                }
            }
            Ok(())
        })
        .wrap_err("spawn stdin reader")?;

    tracing::info!(reducer = reducer.as_str(), "live mode: reading calls from stdin");
    let printer = Printer::new(out, json);
    let stats = match reducer {
        ReducerKind::Latest => drive(config, reducers::latest::<String>(), printer, &rx),
        ReducerKind::Collect => drive(config, reducers::collect::<String>(), printer, &rx),
        ReducerKind::Count => drive(config, reducers::count::<String>(), printer, &rx),
        ReducerKind::Sum => drive(config, numeric_sum(), printer, &rx),
    }?;

    reader
        .join()
        .map_err(|_| eyre::eyre!("stdin reader panicked"))?
        .wrap_err("read stdin")?;
    Ok(stats)
}

fn drive<R, F, W>(
    config: FunnelConfig,
    reducer: F,
    mut printer: Printer<W>,
    rx: &xch::Receiver<String>,
) -> Result<RunStats>
where
    R: Serialize + 'static,
    F: FnMut(Option<R>, String) -> funnel_core::Result<R> + 'static,
    W: Write + 'static,
{
    let start = Instant::now();
    let mut funnel = Funnel::builder()
        .with_config(config)
        .with_reducer(reducer)
        .with_effect(move |value: R| printer.invocation(millis(start.elapsed()), &value))
        .build()?;
    run_channel(&mut funnel, rx)
}
