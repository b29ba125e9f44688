//! # ClickSync Server Library (clicksync-server)
//!
//! Emits clock-synchronized clicks to networked players and keeps their
//! per-device audio calibration.
//!
//! **Architecture:** one tokio task owns the click scheduler; the calibration
//! store sits behind an async mutex; both are reached from the axum router
//! through [`api::AppContext`]. Clicks and parameter changes go out over the
//! [`EventBus`](clicksync_common::events::EventBus) as SSE.

pub mod api;
pub mod calibration;
pub mod error;
pub mod scheduler;

pub use error::{Error, Result};

use clicksync_common::clock::SyncClock;
use clicksync_common::config::SchedulerSettings;
use clicksync_common::events::EventBus;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Events buffered per SSE subscriber before it is reported as lagged
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Start the scheduler task and assemble the handler context
pub fn start_services(
    settings: &SchedulerSettings,
    store: calibration::CalibrationStore,
    clock: Arc<dyn SyncClock>,
) -> (api::AppContext, JoinHandle<()>) {
    let events = EventBus::new(EVENT_BUS_CAPACITY);
    let scheduler = scheduler::ClickScheduler::new(settings.initial_config());
    let (handle, task) =
        scheduler::spawn(scheduler, clock, events.clone(), settings.tick_duration());
    (api::AppContext::new(handle, store, events), task)
}
