//! Effect that records invocations with their timestamps.
//!
//! Used by the trace replay in the CLI and throughout the tests.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use funnel_traits::clock::Clock;

use crate::error::Result;

/// One effect invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation<R> {
    /// Time since the recorder was created.
    pub at: Duration,
    pub value: R,
}

/// Shared log of invocations; clones append to the same log.
pub struct Recorder<R> {
    clock: Rc<dyn Clock>,
    epoch: Instant,
    log: Rc<RefCell<Vec<Invocation<R>>>>,
}

impl<R> Clone for Recorder<R> {
    fn clone(&self) -> Self {
        Self {
            clock: Rc::clone(&self.clock),
            epoch: self.epoch,
            log: Rc::clone(&self.log),
        }
    }
}

impl<R: 'static> Recorder<R> {
    /// Start recording; timestamps are measured from now on `clock`.
    pub fn new(clock: impl Clock + 'static) -> Self {
        let epoch = clock.now();
        Self {
            clock: Rc::new(clock),
            epoch,
            log: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// An effect appending to this recorder.
    pub fn effect(&self) -> impl FnMut(R) -> Result<()> + 'static {
        let rec = self.clone();
        move |value| {
            rec.record(value);
            Ok(())
        }
    }

    pub fn record(&self, value: R) {
        let at = self.clock.now().saturating_duration_since(self.epoch);
        self.log.borrow_mut().push(Invocation { at, value });
    }

    pub fn len(&self) -> usize {
        self.log.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.borrow().is_empty()
    }

    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<Invocation<R>> {
        std::mem::take(&mut *self.log.borrow_mut())
    }

    /// Invocation timestamps in milliseconds.
    pub fn times_ms(&self) -> Vec<u64> {
        self.log
            .borrow()
            .iter()
            .map(|inv| crate::util::millis(inv.at))
            .collect()
    }
}

impl<R: Clone + 'static> Recorder<R> {
    pub fn values(&self) -> Vec<R> {
        self.log.borrow().iter().map(|inv| inv.value.clone()).collect()
    }
}
