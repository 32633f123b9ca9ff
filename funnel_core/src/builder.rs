//! Type-state builder for `Funnel`.
//!
//! The effect is the only required piece: `build()` exists once an effect has
//! been set, `try_build()` is always available for dynamic checks. The reducer
//! decides the funnel's types, so it has to be chosen before the effect.

use std::marker::PhantomData;
use std::time::Duration;

use funnel_traits::clock::{Clock, MonotonicClock};
use funnel_traits::timer::TimerService;

use crate::config::{FunnelConfig, TriggerAt};
use crate::error::{ConfigError, Result};
use crate::funnel::{BoxedEffect, BoxedReducer, Funnel};
use crate::reducers;
use crate::timer::TimerQueue;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Funnel<A, R>`. Timing is validated on `build()`.
pub struct FunnelBuilder<A, R, E> {
    config: FunnelConfig,
    reducer: BoxedReducer<A, R>,
    effect: Option<BoxedEffect<R>>,
    clock: Option<Box<dyn Clock>>,
    timers: Option<Box<dyn TimerService>>,
    _e: PhantomData<E>,
}

impl Default for FunnelBuilder<(), (), Missing> {
    fn default() -> Self {
        Self {
            config: FunnelConfig::default(),
            reducer: Box::new(reducers::unit),
            effect: None,
            clock: None,
            timers: None,
            _e: PhantomData,
        }
    }
}

impl Funnel<(), ()> {
    /// Start building a funnel.
    pub fn builder() -> FunnelBuilder<(), (), Missing> {
        FunnelBuilder::default()
    }
}

impl<A: 'static, R: 'static> Funnel<A, R> {
    /// Build a funnel on the real-time clock and the default timer queue.
    pub fn new<F, G>(config: FunnelConfig, reducer: F, effect: G) -> Result<Self>
    where
        F: FnMut(Option<R>, A) -> Result<R> + 'static,
        G: FnMut(R) -> Result<()> + 'static,
    {
        Funnel::<(), ()>::builder()
            .with_config(config)
            .with_reducer(reducer)
            .with_effect(effect)
            .build()
    }
}

impl<A, R, E> FunnelBuilder<A, R, E> {
    /// Fallible build available in any type-state.
    pub fn try_build(self) -> Result<Funnel<A, R>> {
        let effect = self
            .effect
            .ok_or_else(|| eyre::Report::new(ConfigError::MissingEffect))?;
        self.config.validate().map_err(eyre::Report::new)?;
        tracing::debug!(
            trigger_at = %self.config.trigger_at,
            quiet_ms = ?self.config.min_quiet_period.map(|d| d.as_millis() as u64),
            max_burst_ms = ?self.config.max_burst_duration.map(|d| d.as_millis() as u64),
            gap_ms = ?self.config.min_gap.map(|d| d.as_millis() as u64),
            "funnel built"
        );
        Ok(Funnel::from_parts(
            self.config,
            self.reducer,
            effect,
            self.clock.unwrap_or_else(|| Box::new(MonotonicClock::new())),
            self.timers.unwrap_or_else(|| Box::new(TimerQueue::new())),
        ))
    }
}

/// Chainable setters that do not affect type-state.
impl<A, R, E> FunnelBuilder<A, R, E> {
    /// Replace all timing knobs at once.
    pub fn with_config(mut self, config: FunnelConfig) -> Self {
        self.config = config;
        self
    }
    pub fn trigger_at(mut self, trigger_at: TriggerAt) -> Self {
        self.config.trigger_at = trigger_at;
        self
    }
    pub fn min_quiet_period(mut self, quiet: Duration) -> Self {
        self.config.min_quiet_period = Some(quiet);
        self
    }
    pub fn max_burst_duration(mut self, max_burst: Duration) -> Self {
        self.config.max_burst_duration = Some(max_burst);
        self
    }
    pub fn min_gap(mut self, gap: Duration) -> Self {
        self.config.min_gap = Some(gap);
        self
    }
    /// Provide a custom clock; defaults to `MonotonicClock`.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }
    /// Provide a custom timer service; defaults to `TimerQueue`.
    pub fn with_timers(mut self, timers: impl TimerService + 'static) -> Self {
        self.timers = Some(Box::new(timers));
        self
    }
}

impl FunnelBuilder<(), (), Missing> {
    /// Fold each call's arguments into the accumulator handed to the effect.
    pub fn with_reducer<A, R, F>(self, reducer: F) -> FunnelBuilder<A, R, Missing>
    where
        F: FnMut(Option<R>, A) -> Result<R> + 'static,
    {
        FunnelBuilder {
            config: self.config,
            reducer: Box::new(reducer),
            effect: None,
            clock: self.clock,
            timers: self.timers,
            _e: PhantomData,
        }
    }
}

// Setter that advances type-state
impl<A, R> FunnelBuilder<A, R, Missing> {
    pub fn with_effect<G>(self, effect: G) -> FunnelBuilder<A, R, Set>
    where
        G: FnMut(R) -> Result<()> + 'static,
    {
        FunnelBuilder {
            config: self.config,
            reducer: self.reducer,
            effect: Some(Box::new(effect)),
            clock: self.clock,
            timers: self.timers,
            _e: PhantomData,
        }
    }
}

impl<A, R> FunnelBuilder<A, R, Set> {
    /// Validate and build. Only available once an effect is set.
    pub fn build(self) -> Result<Funnel<A, R>> {
        self.try_build()
    }
}
