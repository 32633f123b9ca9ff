mod cli;
mod error_fmt;
mod live;
mod output;
mod simulate;

use std::io;
use std::path::Path;

use clap::Parser;
use eyre::Result;
use funnel_config::{Config, Logging, ReducerKind};
use funnel_core::FunnelConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{CliError, exit_code_for_error, format_error_json, humanize};
use crate::output::Printer;

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    let code = match run(cli) {
        Ok(()) => 0,
        Err(e) => {
            if JSON_MODE.get().copied().unwrap_or(false) {
                println!("{}", format_error_json(&e));
            } else {
                eprintln!("{}", humanize(&e));
            }
            exit_code_for_error(&e)
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<()> {
    color_eyre::install()?;
    let cfg = load_config(cli.config.as_deref())?;
    // Held until the command finishes so buffered file logs are written.
    let _guard = init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging)?;

    let timing = FunnelConfig::from(&cfg.funnel);
    timing.validate()?;

    match cli.cmd {
        Commands::Simulate {
            trace,
            reducer,
            flush_at_end,
        } => {
            let rows = funnel_config::load_trace_csv(&trace)
                .map_err(|e| CliError::InvalidTrace(e.to_string()))?;
            let reducer = reducer.map_or(cfg.replay.reducer, ReducerKind::from);
            let mut printer = Printer::new(io::stdout().lock(), cli.json);
            let summary = simulate::run_simulate(
                timing,
                &rows,
                reducer,
                flush_at_end || cfg.replay.flush_at_end,
                &mut printer,
            )?;
            printer.summary(summary.calls, summary.invocations)?;
        }
        Commands::Live { reducer } => {
            let reducer = reducer.map_or(cfg.replay.reducer, ReducerKind::from);
            let stats = live::run_live(
                timing,
                reducer,
                io::BufReader::new(io::stdin()),
                io::stdout(),
                cli.json,
            )?;
            tracing::info!(
                calls = stats.calls,
                timer_fires = stats.timer_fires,
                "live mode finished"
            );
            Printer::new(io::stdout(), cli.json).summary(stats.calls, stats.invocations)?;
        }
        Commands::Check => print_check(&cfg, &timing, cli.json),
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::InvalidConfig(format!("cannot read {}: {e}", path.display())))?;
    let cfg = funnel_config::load_toml(&text)?;
    cfg.validate()
        .map_err(|e| CliError::InvalidConfig(e.to_string()))?;
    Ok(cfg)
}

/// Console logs go to stderr; stdout is reserved for invocations. An optional
/// `[logging].file` receives JSON lines through a non-blocking appender.
fn init_tracing(
    json: bool,
    cli_level: Option<&str>,
    logging: &Logging,
) -> Result<Option<WorkerGuard>> {
    let level = cli_level
        .or(logging.level.as_deref())
        .unwrap_or("warn")
        .to_ascii_lowercase();
    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(&level)
            .map_err(|e| CliError::InvalidConfig(format!("log level {level:?}: {e}")))?,
    };

    let (text_layer, json_layer) = if json {
        (None, Some(fmt::layer().json().with_writer(io::stderr)))
    } else {
        (
            Some(fmt::layer().with_target(false).with_writer(io::stderr)),
            None,
        )
    };

    let mut guard = None;
    let file_layer = match logging.file.as_deref() {
        Some(file) => {
            let path = Path::new(file);
            let dir = path
                .parent()
                .filter(|d| !d.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path.file_name().ok_or_else(|| {
                CliError::InvalidConfig(format!("logging.file {file:?} has no file name"))
            })?;
            let appender = match logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, g) = tracing_appender::non_blocking(appender);
            guard = Some(g);
            Some(fmt::layer().json().with_ansi(false).with_writer(writer))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text_layer)
        .with(json_layer)
        .with(file_layer)
        .try_init()?;
    Ok(guard)
}

fn print_check(cfg: &Config, timing: &FunnelConfig, json: bool) {
    let ms = |d: Option<std::time::Duration>| d.map(funnel_core::util::millis);
    if json {
        println!(
            "{}",
            serde_json::json!({
                "ok": true,
                "trigger_at": timing.trigger_at.as_str(),
                "min_quiet_period_ms": ms(timing.min_quiet_period),
                "max_burst_duration_ms": ms(timing.max_burst_duration),
                "min_gap_ms": ms(timing.min_gap),
                "reducer": cfg.replay.reducer.as_str(),
            })
        );
        return;
    }
    let show = |v: Option<u64>| v.map_or_else(|| "-".to_string(), |v| format!("{v} ms"));
    println!("trigger_at:          {}", timing.trigger_at);
    println!("min_quiet_period:    {}", show(ms(timing.min_quiet_period)));
    println!("max_burst_duration:  {}", show(ms(timing.max_burst_duration)));
    println!("min_gap:             {}", show(ms(timing.min_gap)));
    println!("reducer:             {}", cfg.replay.reducer.as_str());
    println!("config OK");
}
