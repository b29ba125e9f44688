//! Event types and EventBus
//!
//! Events are broadcast on the [`EventBus`] and forwarded to SSE clients.
//! The SSE event name comes from [`ClickSyncEvent::event_name`] and the
//! data is the payload alone, so players receive exactly the wire messages
//! described in [`crate::protocol`].

use serde::Serialize;
use tokio::sync::broadcast;

use crate::protocol::{ScheduledClick, SchedulerConfig};

/// ClickSync event types
#[derive(Debug, Clone, PartialEq)]
pub enum ClickSyncEvent {
    /// A click was scheduled
    ///
    /// Triggers:
    /// - Players: schedule playback at `target_time` minus their delay
    Click(ScheduledClick),

    /// Scheduler parameters changed (full configuration)
    ///
    /// Triggers:
    /// - Control clients: refresh displayed parameters
    /// - Players: show running/stopped state
    Parameters(SchedulerConfig),

    /// A device saved calibration values
    ///
    /// Triggers:
    /// - Control clients: list recently calibrated devices
    CalibrationStored(CalibrationStoredInfo),
}

/// Summary of a calibration append
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationStoredInfo {
    /// Device identifier the values were stored under
    pub identifier: String,
    /// Outputs that received a new audio record
    pub outputs: Vec<String>,
    /// Whether network statistics were recorded
    pub network: bool,
    /// When the values were stored
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ClickSyncEvent {
    /// SSE event name
    pub fn event_name(&self) -> &'static str {
        match self {
            ClickSyncEvent::Click(_) => "click",
            ClickSyncEvent::Parameters(_) => "parameters",
            ClickSyncEvent::CalibrationStored(_) => "calibration-stored",
        }
    }

    /// JSON payload sent as SSE data
    pub fn payload_json(&self) -> serde_json::Result<String> {
        match self {
            ClickSyncEvent::Click(click) => serde_json::to_string(click),
            ClickSyncEvent::Parameters(config) => serde_json::to_string(config),
            ClickSyncEvent::CalibrationStored(info) => serde_json::to_string(info),
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block the scheduler)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use clicksync_common::events::{ClickSyncEvent, EventBus};
/// use clicksync_common::protocol::ScheduledClick;
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(ClickSyncEvent::Click(ScheduledClick::new(1.0)));
/// assert_eq!(rx.try_recv().unwrap(), ClickSyncEvent::Click(ScheduledClick::new(1.0)));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ClickSyncEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<ClickSyncEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ClickSyncEvent,
    ) -> Result<usize, broadcast::error::SendError<ClickSyncEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Clicks and parameter broadcasts are fire-and-forget: nobody listening
    /// is a normal state for a freshly started server.
    pub fn emit_lossy(&self, event: ClickSyncEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
