//! `From` implementations bridging `funnel_config` types to `funnel_core` types.

use crate::config::{FunnelConfig, TriggerAt};
use crate::util::opt_ms;

// ── TriggerAt ────────────────────────────────────────────────────────────────

impl From<funnel_config::TriggerAt> for TriggerAt {
    fn from(t: funnel_config::TriggerAt) -> Self {
        match t {
            funnel_config::TriggerAt::Start => TriggerAt::Start,
            funnel_config::TriggerAt::End => TriggerAt::End,
            funnel_config::TriggerAt::Both => TriggerAt::Both,
        }
    }
}

// ── FunnelConfig ─────────────────────────────────────────────────────────────

impl From<&funnel_config::FunnelSection> for FunnelConfig {
    fn from(c: &funnel_config::FunnelSection) -> Self {
        Self {
            trigger_at: c.trigger_at.into(),
            min_quiet_period: opt_ms(c.min_quiet_period_ms),
            max_burst_duration: opt_ms(c.max_burst_duration_ms),
            min_gap: opt_ms(c.min_gap_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn maps_milliseconds_and_trigger() {
        let section = funnel_config::FunnelSection {
            trigger_at: funnel_config::TriggerAt::Both,
            min_quiet_period_ms: Some(32),
            max_burst_duration_ms: None,
            min_gap_ms: Some(100),
        };
        let cfg = FunnelConfig::from(&section);
        assert_eq!(cfg.trigger_at, TriggerAt::Both);
        assert_eq!(cfg.min_quiet_period, Some(Duration::from_millis(32)));
        assert_eq!(cfg.max_burst_duration, None);
        assert_eq!(cfg.min_gap, Some(Duration::from_millis(100)));
    }
}
