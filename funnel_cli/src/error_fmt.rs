//! Human-readable error descriptions and structured JSON error formatting.

use funnel_core::{ConfigError, FunnelError};
use thiserror::Error;

/// Failures the CLI raises itself, before any funnel runs.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid trace: {0}")]
    InvalidTrace(String),
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(ce) = err.downcast_ref::<ConfigError>() {
        return match ce {
            ConfigError::GapNeverArmed => "What happened: min_gap is set with trigger_at = \"end\" but nothing opens a burst.\nHow to fix: Add min_quiet_period_ms or max_burst_duration_ms, or use trigger_at = \"start\" / \"both\" for a plain throttle.".to_string(),
            ConfigError::WindowTooLong { field, max_ms } => format!(
                "What happened: {field} is longer than {max_ms} ms.\nHow to fix: Use a window of at most one day."
            ),
            ConfigError::MissingEffect => {
                "What happened: A funnel was built without an effect.\nHow to fix: Provide one with with_effect(...).".to_string()
            }
        };
    }

    if let Some(fe) = err.downcast_ref::<FunnelError>() {
        return format!(
            "What happened: {fe}.\nHow to fix: Do not call back into a funnel from its own reducer or effect."
        );
    }

    if let Some(te) = err.downcast_ref::<toml::de::Error>() {
        return format!(
            "What happened: The config file is not valid TOML ({}).\nHow to fix: Fix the syntax or field types in the [funnel], [replay] and [logging] tables.",
            te.message().trim()
        );
    }

    if let Some(cli) = err.downcast_ref::<CliError>() {
        return match cli {
            CliError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nHow to fix: Edit the config file, then rerun `funnel check`."
            ),
            CliError::InvalidTrace(msg) if msg.contains("must have headers") => format!(
                "What happened: {msg}.\nHow to fix: The first line of the trace must be exactly `at_ms,value`."
            ),
            CliError::InvalidTrace(msg) => format!(
                "What happened: The call trace could not be loaded ({msg}).\nHow to fix: Check the file path, that at_ms values are whole milliseconds, and that rows are in time order."
            ),
        };
    }

    // Generic fallback: reducer/effect errors and I/O
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong: {msg}.{cause}\nHow to fix: Re-run with --log-level=debug for details."
    )
}

/// Configuration problems exit with 2, everything else with 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    let is_config = err.downcast_ref::<ConfigError>().is_some()
        || err.downcast_ref::<toml::de::Error>().is_some()
        || matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::InvalidConfig(_))
        );
    if is_config { 2 } else { 1 }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = if let Some(ce) = err.downcast_ref::<ConfigError>() {
        match ce {
            ConfigError::GapNeverArmed => "GapNeverArmed",
            ConfigError::WindowTooLong { .. } => "WindowTooLong",
            ConfigError::MissingEffect => "MissingEffect",
        }
    } else if err.downcast_ref::<toml::de::Error>().is_some() {
        "InvalidToml"
    } else if let Some(cli) = err.downcast_ref::<CliError>() {
        match cli {
            CliError::InvalidConfig(_) => "InvalidConfig",
            CliError::InvalidTrace(_) => "InvalidTrace",
        }
    } else if let Some(FunnelError::Reentrant { .. }) = err.downcast_ref::<FunnelError>() {
        "Reentrant"
    } else {
        "Error"
    };

    json!({
        "reason": reason,
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
