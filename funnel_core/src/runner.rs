//! Real-time driver: feed a funnel from a channel.
//!
//! The calling thread owns the funnel. It blocks on the receiver until either
//! a call arrives or the funnel's next timer deadline passes, so timers fire
//! without a separate timer thread. When every sender is gone the funnel is
//! flushed and the loop returns.
use crossbeam_channel as xch;

use crate::error::Result;
use crate::funnel::Funnel;

/// Counters for one `run_channel` session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub calls: u64,
    pub invocations: u64,
    /// Timer expirations delivered to the funnel.
    pub timer_fires: u64,
}

/// Drive `funnel` from `rx` until the channel disconnects.
///
/// The funnel must run on a real-time clock (the default `MonotonicClock`);
/// deadlines are waited for with `recv_deadline`.
pub fn run_channel<A, R>(funnel: &mut Funnel<A, R>, rx: &xch::Receiver<A>) -> Result<RunStats> {
    let mut stats = RunStats::default();
    let invocations_before = funnel.invocations();
    loop {
        let next = match funnel.next_deadline() {
            Some(deadline) => rx.recv_deadline(deadline),
            None => rx.recv().map_err(|_| xch::RecvTimeoutError::Disconnected),
        };
        match next {
            Ok(args) => {
                stats.calls += 1;
                funnel.call(args)?;
            }
            Err(xch::RecvTimeoutError::Timeout) => {}
            Err(xch::RecvTimeoutError::Disconnected) => {
                tracing::debug!(calls = stats.calls, "call channel closed; flushing");
                funnel.flush()?;
                break;
            }
        }
        stats.timer_fires += funnel.fire_due()? as u64;
    }
    stats.invocations = funnel.invocations() - invocations_before;
    Ok(stats)
}
