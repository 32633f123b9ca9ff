use std::time::Instant;

/// Opaque identifier of one scheduled timer.
///
/// Handles are never reused by a single service, so a handle that outlived
/// its timer can be compared safely against the live ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    #[inline]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// One-shot timer scheduling as seen by a funnel.
///
/// The funnel only ever uses `schedule` and `cancel`. The remaining methods
/// are the driving side: an event loop asks for the next deadline, waits for
/// it by whatever means it has, then pops expired handles and hands them back
/// to the funnel.
pub trait TimerService {
    /// Arm a timer that expires at `deadline`.
    fn schedule(&mut self, deadline: Instant) -> TimerHandle;

    /// Disarm a timer. Unknown or already-expired handles are ignored.
    fn cancel(&mut self, handle: TimerHandle);

    /// Earliest deadline among armed timers.
    fn next_deadline(&self) -> Option<Instant>;

    /// Remove and return the earliest timer whose deadline is `<= now`.
    /// Timers sharing a deadline come out in scheduling order.
    fn pop_due(&mut self, now: Instant) -> Option<TimerHandle>;

    /// Number of armed timers.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
