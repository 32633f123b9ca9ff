//! Deadline-ordered timer queue, the default `TimerService`.

use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

use funnel_traits::timer::{TimerHandle, TimerService};

/// One-shot timers ordered by deadline, FIFO among equal deadlines.
///
/// Handles are allocated from a monotonically increasing counter, which both
/// keeps them unique and breaks deadline ties in scheduling order.
#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    by_deadline: BTreeSet<(Instant, TimerHandle)>,
    deadlines: HashMap<TimerHandle, Instant>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deadline of an armed timer.
    pub fn deadline_of(&self, handle: TimerHandle) -> Option<Instant> {
        self.deadlines.get(&handle).copied()
    }
}

impl TimerService for TimerQueue {
    fn schedule(&mut self, deadline: Instant) -> TimerHandle {
        let handle = TimerHandle::from_raw(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.by_deadline.insert((deadline, handle));
        self.deadlines.insert(handle, deadline);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(deadline) = self.deadlines.remove(&handle) {
            self.by_deadline.remove(&(deadline, handle));
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.by_deadline.first().map(|(deadline, _)| *deadline)
    }

    fn pop_due(&mut self, now: Instant) -> Option<TimerHandle> {
        let &(deadline, handle) = self.by_deadline.first()?;
        if deadline > now {
            return None;
        }
        self.by_deadline.remove(&(deadline, handle));
        self.deadlines.remove(&handle);
        Some(handle)
    }

    fn len(&self) -> usize {
        self.deadlines.len()
    }
}
