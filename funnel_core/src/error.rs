use thiserror::Error;

/// Rejected funnel configuration. Raised by the builder, never at call time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "min_gap with trigger_at = end needs min_quiet_period or max_burst_duration; nothing would ever open a burst"
    )]
    GapNeverArmed,
    #[error("missing effect")]
    MissingEffect,
    #[error("{field} exceeds the maximum window of {max_ms} ms")]
    WindowTooLong { field: &'static str, max_ms: u64 },
}

/// Misuse of a funnel at runtime.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FunnelError {
    /// An operation reached the funnel from inside its own reducer or effect.
    #[error("re-entrant {op} rejected: the funnel is busy running its reducer or effect")]
    Reentrant { op: &'static str },
    /// The funnel behind a weak handle has been dropped.
    #[error("funnel has been dropped")]
    Dropped,
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
