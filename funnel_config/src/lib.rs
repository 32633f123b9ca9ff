#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and call-trace parsing for the funnel tools.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The call-trace CSV loader enforces headers and timestamp ordering.
use serde::Deserialize;

/// Longest accepted timing window in milliseconds (one day).
pub const MAX_WINDOW_MS: u64 = 24 * 60 * 60 * 1000;

/// One recorded call in a replay trace.
///
/// Expected headers:
/// at_ms,value
///
/// Example:
/// at_ms,value
/// 0,a
/// 10,b
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TraceRow {
    /// Offset of the call from the start of the trace.
    pub at_ms: u64,
    pub value: String,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TriggerAt {
    Start,
    #[default]
    End,
    Both,
}

/// Timing knobs, all in milliseconds. Absent knobs are disabled.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FunnelSection {
    pub trigger_at: TriggerAt,
    /// Debounce window. Also accepts alias "debounce_ms".
    #[serde(alias = "debounce_ms")]
    pub min_quiet_period_ms: Option<u64>,
    pub max_burst_duration_ms: Option<u64>,
    /// Throttle floor. Also accepts alias "throttle_ms".
    #[serde(alias = "throttle_ms")]
    pub min_gap_ms: Option<u64>,
}

/// How replayed call values are folded before reaching the effect.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReducerKind {
    /// Keep the last value of the burst.
    #[default]
    Latest,
    /// Keep every value, in call order.
    Collect,
    /// Number of calls.
    Count,
    /// Numeric sum; values must parse as numbers.
    Sum,
}

impl ReducerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReducerKind::Latest => "latest",
            ReducerKind::Collect => "collect",
            ReducerKind::Count => "count",
            ReducerKind::Sum => "sum",
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ReplayCfg {
    pub reducer: ReducerKind,
    /// Flush whatever is still pending once the trace ends instead of letting
    /// the timers run out.
    pub flush_at_end: bool,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub funnel: FunnelSection,
    #[serde(default)]
    pub replay: ReplayCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Parse a call trace from any CSV source.
pub fn parse_trace_csv<R: std::io::Read>(reader: R) -> eyre::Result<Vec<TraceRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read trace CSV headers: {}", e))?
        .clone();
    let expected = ["at_ms", "value"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "trace CSV must have headers 'at_ms,value', got: {}",
            actual.join(",")
        );
    }

    let mut rows: Vec<TraceRow> = Vec::new();
    for (idx, rec) in rdr.deserialize::<TraceRow>().enumerate() {
        let row = rec.map_err(|e| eyre::eyre!("invalid trace row {}: {}", idx + 2, e))?;
        if let Some(prev) = rows.last()
            && row.at_ms < prev.at_ms
        {
            eyre::bail!(
                "trace rows must be in time order: row {} at {} ms follows {} ms",
                idx + 2,
                row.at_ms,
                prev.at_ms
            );
        }
        rows.push(row);
    }
    Ok(rows)
}

pub fn load_trace_csv(path: &std::path::Path) -> eyre::Result<Vec<TraceRow>> {
    let file = std::fs::File::open(path)
        .map_err(|e| eyre::eyre!("open trace CSV {:?}: {}", path, e))?;
    parse_trace_csv(file).map_err(|e| eyre::eyre!("{:?}: {}", path, e))
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Funnel
        let windows = [
            ("funnel.min_quiet_period_ms", self.funnel.min_quiet_period_ms),
            (
                "funnel.max_burst_duration_ms",
                self.funnel.max_burst_duration_ms,
            ),
            ("funnel.min_gap_ms", self.funnel.min_gap_ms),
        ];
        for (field, window) in windows {
            if window.is_some_and(|ms| ms > MAX_WINDOW_MS) {
                eyre::bail!("{field} is unreasonably large (>24h)");
            }
        }
        if self.funnel.trigger_at == TriggerAt::End
            && self.funnel.min_gap_ms.is_some()
            && self.funnel.min_quiet_period_ms.is_none()
            && self.funnel.max_burst_duration_ms.is_none()
        {
            eyre::bail!(
                "funnel.min_gap_ms with trigger_at = \"end\" requires funnel.min_quiet_period_ms or funnel.max_burst_duration_ms"
            );
        }

        // Logging
        if let Some(level) = self.logging.level.as_deref()
            && !matches!(
                level.to_ascii_lowercase().as_str(),
                "error" | "warn" | "info" | "debug" | "trace"
            )
        {
            eyre::bail!("logging.level must be one of error|warn|info|debug|trace");
        }
        if let Some(rotation) = self.logging.rotation.as_deref()
            && !matches!(rotation, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
