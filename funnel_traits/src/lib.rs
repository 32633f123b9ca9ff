//! Time and scheduling seams shared by the funnel crates.
pub mod clock;
pub mod timer;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use timer::{TimerHandle, TimerService};
