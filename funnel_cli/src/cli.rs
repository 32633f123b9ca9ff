//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use funnel_config::ReducerKind;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(
    name = "funnel",
    version,
    about = "Debounce, throttle and batch call streams"
)]
pub struct Cli {
    /// Path to config TOML; built-in defaults when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print invocations, summaries and errors as JSON lines
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); RUST_LOG wins when set
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// How call values are folded; overrides `[replay].reducer`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ReducerArg {
    /// Keep the last value
    Latest,
    /// Keep every value
    Collect,
    /// Count calls
    Count,
    /// Add values as numbers
    Sum,
}

impl From<ReducerArg> for ReducerKind {
    fn from(r: ReducerArg) -> Self {
        match r {
            ReducerArg::Latest => ReducerKind::Latest,
            ReducerArg::Collect => ReducerKind::Collect,
            ReducerArg::Count => ReducerKind::Count,
            ReducerArg::Sum => ReducerKind::Sum,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a recorded call trace on virtual time
    Simulate {
        /// Call trace CSV with headers `at_ms,value`
        #[arg(long, value_name = "FILE")]
        trace: PathBuf,
        #[arg(long, value_enum, value_name = "KIND")]
        reducer: Option<ReducerArg>,
        /// Flush pending calls when the trace ends instead of letting timers run out
        #[arg(long, action = ArgAction::SetTrue)]
        flush_at_end: bool,
    },
    /// Read calls from stdin, one per line, in real time
    Live {
        #[arg(long, value_enum, value_name = "KIND")]
        reducer: Option<ReducerArg>,
    },
    /// Validate the config and print the effective timing
    Check,
}
