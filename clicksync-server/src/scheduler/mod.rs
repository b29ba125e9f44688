//! Click scheduler
//!
//! Emits a click event at each `period`-spaced synchronized instant,
//! `lookahead` seconds ahead of time, optionally stopping after a fixed
//! number of clicks.
//!
//! - [`core`]: clock-free scheduling decisions
//! - [`timer`]: cancellable wake-up used by the polling loop
//! - [`task`]: tokio task owning the scheduler, and its handle

pub mod core;
pub mod task;
pub mod timer;

pub use self::core::{ClickScheduler, Reconfigured, SchedulerState, TickOutcome};
pub use task::{spawn, SchedulerHandle};
pub use timer::WakeTimer;
