//! Virtual-time driver.
//!
//! `Simulation` owns a funnel built on a `ManualClock` and moves time forward
//! in jumps, stopping at every timer deadline on the way so each expiration
//! is delivered at exactly its scheduled instant. Tests and trace replays use
//! it to run hours of timing behaviour in microseconds.

use std::time::Duration;

use funnel_traits::clock::ManualClock;

use crate::error::Result;
use crate::funnel::Funnel;

pub struct Simulation<A, R> {
    clock: ManualClock,
    funnel: Funnel<A, R>,
}

impl<A, R> core::fmt::Debug for Simulation<A, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Simulation")
            .field("elapsed", &self.elapsed())
            .field("funnel", &self.funnel)
            .finish()
    }
}

impl<A, R> Simulation<A, R> {
    /// `funnel` must have been built with a clone of `clock`.
    pub fn new(clock: ManualClock, funnel: Funnel<A, R>) -> Self {
        Self { clock, funnel }
    }

    /// Virtual time since the clock's origin.
    pub fn elapsed(&self) -> Duration {
        self.clock.offset()
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    pub fn funnel(&self) -> &Funnel<A, R> {
        &self.funnel
    }

    pub fn funnel_mut(&mut self) -> &mut Funnel<A, R> {
        &mut self.funnel
    }

    pub fn into_funnel(self) -> Funnel<A, R> {
        self.funnel
    }

    /// Submit a call at the current virtual time.
    pub fn call(&mut self, args: A) -> Result<()> {
        self.funnel.call(args)
    }

    /// Move `d` forward, firing timers on the way.
    pub fn advance(&mut self, d: Duration) -> Result<()> {
        let target = self.elapsed().saturating_add(d);
        self.advance_to(target)
    }

    /// Move to `offset` from the origin, firing timers on the way. Targets in
    /// the past only deliver timers that are already due.
    pub fn advance_to(&mut self, offset: Duration) -> Result<()> {
        let target = self.clock.origin() + offset;
        while let Some(deadline) = self.funnel.next_deadline() {
            if deadline > target {
                break;
            }
            self.clock.set_now(deadline);
            self.funnel.fire_due()?;
        }
        self.clock.set_now(target);
        Ok(())
    }

    /// Fire timers until the funnel is idle.
    pub fn run_until_idle(&mut self) -> Result<()> {
        while let Some(deadline) = self.funnel.next_deadline() {
            self.clock.set_now(deadline);
            self.funnel.fire_due()?;
        }
        Ok(())
    }
}
