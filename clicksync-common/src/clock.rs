//! Synchronized time sources
//!
//! The scheduler and the player never read wall-clock time directly. They
//! ask a [`SyncClock`] for the shared synchronized time, in seconds. The
//! clock synchronization protocol itself lives outside this crate; these
//! types are the seam it plugs into.

use std::sync::Mutex;
use std::time::Instant;

/// Source of synchronized time shared by server and clients
///
/// Returns `None` while the clock is not yet ready (e.g. synchronization
/// has not converged). Callers treat that as "try again later", never as
/// an error.
pub trait SyncClock: Send + Sync {
    /// Current synchronized time in seconds
    fn sync_time(&self) -> Option<f64>;
}

/// Maps synchronized time onto the local audio clock of a device
pub trait LocalTimeMap: Send + Sync {
    /// Local time (seconds) corresponding to `sync_time`
    fn local_time(&self, sync_time: f64) -> f64;
}

/// Process-local monotonic clock
///
/// Seconds elapsed since construction, plus a fixed offset. Used by the
/// server until a synchronizing implementation is wired in; on a single
/// host it is exactly the synchronized time.
#[derive(Debug)]
pub struct MonotonicClock {
    origin: Instant,
    offset: f64,
}

impl MonotonicClock {
    /// Create a clock starting at 0 seconds
    pub fn new() -> Self {
        Self::with_offset(0.0)
    }

    /// Create a clock starting at `offset` seconds
    pub fn with_offset(offset: f64) -> Self {
        Self {
            origin: Instant::now(),
            offset,
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncClock for MonotonicClock {
    fn sync_time(&self) -> Option<f64> {
        Some(self.offset + self.origin.elapsed().as_secs_f64())
    }
}

impl LocalTimeMap for MonotonicClock {
    fn local_time(&self, sync_time: f64) -> f64 {
        sync_time - self.offset
    }
}

/// Manually driven clock for tests and simulations
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Option<f64>>,
}

impl ManualClock {
    /// Create a ready clock reading `now`
    pub fn new(now: f64) -> Self {
        Self {
            now: Mutex::new(Some(now)),
        }
    }

    /// Create a clock that is not yet ready
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Set the current time (makes the clock ready)
    pub fn set(&self, now: f64) {
        *self.lock() = Some(now);
    }

    /// Advance the current time by `seconds`
    ///
    /// An unavailable clock becomes ready at `seconds`.
    pub fn advance(&self, seconds: f64) {
        let mut now = self.lock();
        *now = Some(now.unwrap_or(0.0) + seconds);
    }

    /// Mark the clock as not ready
    pub fn set_unavailable(&self) {
        *self.lock() = None;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<f64>> {
        // A poisoned test clock still holds a usable value
        self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SyncClock for ManualClock {
    fn sync_time(&self) -> Option<f64> {
        *self.lock()
    }
}

impl LocalTimeMap for ManualClock {
    fn local_time(&self, sync_time: f64) -> f64 {
        sync_time
    }
}
