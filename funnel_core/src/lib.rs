#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Call-coalescing funnel: debounce, throttle and batching in one primitive.
//!
//! A `Funnel` sits between a noisy stream of calls and a single effect that
//! should run less often. Calls are folded by a reducer into an accumulator;
//! two timers decide when the accumulator is handed to the effect.
//!
//! ## Architecture
//!
//! - **Configuration**: timing knobs and presets (`config` module)
//! - **Controller**: the two-timer state machine (`funnel` module)
//! - **Builder**: validation and wiring of clock/timers (`builder` module)
//! - **Timers**: default deadline queue (`timer` module)
//! - **Drivers**: virtual time (`sim`) and real time (`runner`)
//! - **Sharing**: re-entrancy-checked handles (`shared` module)
//!
//! ## Timing model
//!
//! The funnel never sleeps or spawns. A driver asks for `next_deadline()`,
//! waits by whatever means it has, then calls `fire_due()`. Every window is
//! a minimum: timers may be delivered late, never early.

pub mod builder;
pub mod config;
pub mod conversions;
pub mod error;
pub mod funnel;
pub mod recorder;
pub mod reducers;
pub mod runner;
pub mod shared;
pub mod sim;
pub mod timer;
pub mod util;

pub use builder::FunnelBuilder;
pub use config::{FunnelConfig, MAX_WINDOW, TriggerAt};
pub use error::{ConfigError, FunnelError, Result};
pub use funnel::{Funnel, FunnelPhase};
pub use recorder::{Invocation, Recorder};
pub use shared::{SharedFunnel, WeakFunnel};
pub use sim::Simulation;
pub use timer::TimerQueue;
