//! Timing configuration for a funnel.
//!
//! `FunnelConfig` is plain data; the builder validates it once at construction
//! and the controller never re-checks it afterwards.

use std::time::Duration;

use crate::error::ConfigError;

/// Longest accepted window for any timing knob (one day).
pub const MAX_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Which edge of a burst runs the effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TriggerAt {
    /// Leading edge only; calls made while the funnel is busy are dropped.
    Start,
    /// Trailing edge only.
    #[default]
    End,
    /// Leading edge, then again on the trailing edge if more calls arrived.
    Both,
}

impl TriggerAt {
    #[inline]
    pub fn fires_on_start(self) -> bool {
        matches!(self, TriggerAt::Start | TriggerAt::Both)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TriggerAt::Start => "start",
            TriggerAt::End => "end",
            TriggerAt::Both => "both",
        }
    }
}

impl core::fmt::Display for TriggerAt {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing knobs. All windows are minimums; timers may fire late, never early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FunnelConfig {
    pub trigger_at: TriggerAt,
    /// Silence required after the last call before the trailing edge fires.
    pub min_quiet_period: Option<Duration>,
    /// Upper bound on how long repeated calls may keep a burst open.
    pub max_burst_duration: Option<Duration>,
    /// Minimum spacing between two effect invocations.
    pub min_gap: Option<Duration>,
}

impl FunnelConfig {
    /// Trailing-edge debounce.
    pub fn debounce(quiet: Duration) -> Self {
        Self {
            min_quiet_period: Some(quiet),
            ..Self::default()
        }
    }

    /// Throttle: at most one invocation per `gap`.
    ///
    /// `TriggerAt::Start` drops calls made during the gap, `TriggerAt::Both`
    /// delivers them once the gap elapses.
    pub fn throttle(gap: Duration, trigger_at: TriggerAt) -> Self {
        Self {
            trigger_at,
            min_gap: Some(gap),
            ..Self::default()
        }
    }

    /// Trailing-edge batching: flush after `quiet` of silence, or once the
    /// batch has been open for `max_burst`, whichever comes first.
    pub fn batch(quiet: Duration, max_burst: Duration) -> Self {
        Self {
            min_quiet_period: Some(quiet),
            max_burst_duration: Some(max_burst),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let windows = [
            ("min_quiet_period", self.min_quiet_period),
            ("max_burst_duration", self.max_burst_duration),
            ("min_gap", self.min_gap),
        ];
        for (field, window) in windows {
            if window.is_some_and(|w| w > MAX_WINDOW) {
                return Err(ConfigError::WindowTooLong {
                    field,
                    max_ms: MAX_WINDOW.as_millis() as u64,
                });
            }
        }
        if self.trigger_at == TriggerAt::End && self.min_gap.is_some() && !self.shapes_bursts() {
            return Err(ConfigError::GapNeverArmed);
        }
        Ok(())
    }

    #[inline]
    fn shapes_bursts(&self) -> bool {
        self.min_quiet_period.is_some() || self.max_burst_duration.is_some()
    }

    /// Whether calls open a burst timer at all. A bare throttle runs on the
    /// gap timer alone.
    #[inline]
    pub(crate) fn arms_burst_timer(&self) -> bool {
        self.shapes_bursts() || self.min_gap.is_none()
    }

    /// Delay until the burst should end, given how long it has been open.
    pub(crate) fn burst_window(&self, elapsed: Duration) -> Duration {
        match self.max_burst_duration {
            Some(max) => self
                .min_quiet_period
                .unwrap_or(max)
                .min(max.saturating_sub(elapsed)),
            None => self.min_quiet_period.unwrap_or(Duration::ZERO),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn quiet_period_alone_is_a_fixed_window() {
        let cfg = FunnelConfig::debounce(ms(100));
        assert_eq!(cfg.burst_window(ms(0)), ms(100));
        assert_eq!(cfg.burst_window(ms(5_000)), ms(100));
    }

    #[test]
    fn max_burst_shrinks_the_window() {
        let cfg = FunnelConfig::batch(ms(50), ms(200));
        assert_eq!(cfg.burst_window(ms(0)), ms(50));
        assert_eq!(cfg.burst_window(ms(160)), ms(40));
        assert_eq!(cfg.burst_window(ms(250)), ms(0));
    }

    #[test]
    fn max_burst_without_quiet_is_a_fixed_deadline() {
        let cfg = FunnelConfig {
            max_burst_duration: Some(ms(80)),
            ..FunnelConfig::default()
        };
        assert_eq!(cfg.burst_window(ms(0)), ms(80));
        assert_eq!(cfg.burst_window(ms(30)), ms(50));
    }

    #[test]
    fn no_knobs_means_next_turn() {
        assert_eq!(FunnelConfig::default().burst_window(ms(0)), Duration::ZERO);
        assert!(FunnelConfig::default().arms_burst_timer());
    }

    #[test]
    fn bare_throttle_skips_burst_timer() {
        assert!(!FunnelConfig::throttle(ms(10), TriggerAt::Start).arms_burst_timer());
    }
}
