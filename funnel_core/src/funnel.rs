//! The funnel controller.
//!
//! Folds a stream of calls into an accumulator and decides when the
//! accumulator becomes one effect invocation. All temporal state lives in a
//! private `FunnelState` with two named timer slots: the burst timer (debounce
//! and burst cap) and the gap timer (throttle floor). An invocation only ever
//! happens when both slots are empty.

use std::time::{Duration, Instant};

use funnel_traits::clock::Clock;
use funnel_traits::timer::{TimerHandle, TimerService};

use crate::config::{FunnelConfig, MAX_WINDOW, TriggerAt};
use crate::error::Result;

pub(crate) type BoxedReducer<A, R> = Box<dyn FnMut(Option<R>, A) -> Result<R>>;
pub(crate) type BoxedEffect<R> = Box<dyn FnMut(R) -> Result<()>>;

/// Observable timer state of a funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunnelPhase {
    Idle,
    BurstOnly,
    GapOnly,
    BurstAndGap,
}

struct FunnelState<R> {
    /// `None` exactly when no call data is pending.
    accumulated: Option<R>,
    burst_timer: Option<TimerHandle>,
    gap_timer: Option<TimerHandle>,
    /// Set iff `burst_timer` is set.
    burst_started_at: Option<Instant>,
}

impl<R> Default for FunnelState<R> {
    fn default() -> Self {
        Self {
            accumulated: None,
            burst_timer: None,
            gap_timer: None,
            burst_started_at: None,
        }
    }
}

/// Call-coalescing controller for one effect.
///
/// `A` is the argument of a single call, `R` the accumulated value handed to
/// the effect. A funnel without a custom reducer is a `Funnel<(), ()>`.
pub struct Funnel<A, R> {
    pub(crate) config: FunnelConfig,
    pub(crate) reducer: BoxedReducer<A, R>,
    pub(crate) effect: BoxedEffect<R>,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) timers: Box<dyn TimerService>,
    state: FunnelState<R>,
    invocations: u64,
}

impl<A, R> core::fmt::Debug for Funnel<A, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Funnel")
            .field("config", &self.config)
            .field("phase", &self.phase())
            .field("pending", &self.has_pending())
            .field("invocations", &self.invocations)
            .finish()
    }
}

impl<A, R> Funnel<A, R> {
    pub(crate) fn from_parts(
        config: FunnelConfig,
        reducer: BoxedReducer<A, R>,
        effect: BoxedEffect<R>,
        clock: Box<dyn Clock>,
        timers: Box<dyn TimerService>,
    ) -> Self {
        Self {
            config,
            reducer,
            effect,
            clock,
            timers,
            state: FunnelState::default(),
            invocations: 0,
        }
    }

    /// Submit one call.
    ///
    /// May run the effect synchronously (leading edge). Reducer and effect
    /// errors are returned as-is. A failing reducer discards the pending
    /// accumulator and leaves the timers untouched.
    pub fn call(&mut self, args: A) -> Result<()> {
        let was_idle = self.is_idle();

        if self.config.trigger_at != TriggerAt::Start || was_idle {
            let previous = self.state.accumulated.take();
            match (self.reducer)(previous, args) {
                Ok(next) => self.state.accumulated = Some(next),
                Err(e) => {
                    tracing::warn!(error = %e, "reducer failed; pending calls discarded");
                    return Err(e);
                }
            }
        }

        if self.state.burst_timer.is_none() && !was_idle {
            // Gap timer only: absorbed until the gap elapses.
            return Ok(());
        }

        if self.config.arms_burst_timer() {
            let now = self.clock.now();
            if let Some(handle) = self.state.burst_timer.take() {
                self.timers.cancel(handle);
            }
            let started = *self.state.burst_started_at.get_or_insert(now);
            let delay = self
                .config
                .burst_window(now.saturating_duration_since(started));
            self.state.burst_timer = Some(self.schedule_after(now, delay));
            tracing::trace!(delay_ms = delay.as_millis() as u64, "burst timer armed");
        }

        if self.config.trigger_at.fires_on_start() && was_idle {
            self.invoke()?;
        }
        Ok(())
    }

    /// Drop pending call data and disarm both timers. Never runs the effect.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.state.burst_timer.take() {
            self.timers.cancel(handle);
        }
        if let Some(handle) = self.state.gap_timer.take() {
            self.timers.cancel(handle);
        }
        self.state.burst_started_at = None;
        if self.state.accumulated.take().is_some() {
            tracing::debug!("pending calls cancelled");
        }
    }

    /// Run whatever is pending now and return to idle.
    ///
    /// Both halves always run; the first error is returned. An invocation
    /// made by the flush does not arm a new gap.
    pub fn flush(&mut self) -> Result<()> {
        let burst = self.handle_burst_end();
        let gap = self.handle_interval_end();
        if let Some(handle) = self.state.gap_timer.take() {
            self.timers.cancel(handle);
        }
        tracing::debug!("funnel flushed");
        burst.and(gap)
    }

    /// `true` when neither timer is armed.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.state.burst_timer.is_none() && self.state.gap_timer.is_none()
    }

    /// Whether call data is waiting for an invocation.
    #[inline]
    pub fn has_pending(&self) -> bool {
        self.state.accumulated.is_some()
    }

    pub fn phase(&self) -> FunnelPhase {
        match (self.state.burst_timer, self.state.gap_timer) {
            (None, None) => FunnelPhase::Idle,
            (Some(_), None) => FunnelPhase::BurstOnly,
            (None, Some(_)) => FunnelPhase::GapOnly,
            (Some(_), Some(_)) => FunnelPhase::BurstAndGap,
        }
    }

    /// Number of times the effect has been run.
    pub fn invocations(&self) -> u64 {
        self.invocations
    }

    pub fn config(&self) -> &FunnelConfig {
        &self.config
    }

    /// Earliest armed timer deadline; `None` when idle.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Deliver every timer that has expired by the funnel's clock.
    ///
    /// Returns how many expirations reached a live timer slot. On an effect
    /// error the remaining expired timers stay queued for the next call.
    pub fn fire_due(&mut self) -> Result<usize> {
        let now = self.clock.now();
        let mut fired = 0;
        while let Some(handle) = self.timers.pop_due(now) {
            if self.state.burst_timer == Some(handle) {
                fired += 1;
                self.handle_burst_end()?;
            } else if self.state.gap_timer == Some(handle) {
                fired += 1;
                self.handle_interval_end()?;
            } else {
                tracing::trace!(timer = handle.raw(), "stale timer ignored");
            }
        }
        Ok(fired)
    }

    fn handle_burst_end(&mut self) -> Result<()> {
        if let Some(handle) = self.state.burst_timer.take() {
            self.timers.cancel(handle);
        }
        self.state.burst_started_at = None;
        if self.state.gap_timer.is_some() {
            return Ok(());
        }
        self.invoke()
    }

    fn handle_interval_end(&mut self) -> Result<()> {
        if let Some(handle) = self.state.gap_timer.take() {
            self.timers.cancel(handle);
        }
        if self.state.burst_timer.is_some() {
            return Ok(());
        }
        self.invoke()
    }

    fn invoke(&mut self) -> Result<()> {
        let Some(value) = self.state.accumulated.take() else {
            return Ok(());
        };
        debug_assert!(self.state.gap_timer.is_none());
        self.invocations += 1;
        tracing::debug!(invocation = self.invocations, "running effect");
        let outcome = (self.effect)(value);
        if let Some(gap) = self.config.min_gap {
            let now = self.clock.now();
            self.state.gap_timer = Some(self.schedule_after(now, gap));
            tracing::trace!(gap_ms = gap.as_millis() as u64, "gap timer armed");
        }
        outcome
    }

    fn schedule_after(&mut self, now: Instant, delay: Duration) -> TimerHandle {
        let deadline = now
            .checked_add(delay)
            .or_else(|| now.checked_add(MAX_WINDOW))
            .unwrap_or(now);
        self.timers.schedule(deadline)
    }
}
