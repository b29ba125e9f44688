//! Cancellable wake-up timer for the scheduler loop

use std::pin::Pin;
use std::time::Duration;
use tokio::time::Sleep;

/// Single pending wake-up, owned by the scheduler task
///
/// Arming replaces any pending wake-up. Cancelling is idempotent.
#[derive(Debug, Default)]
pub struct WakeTimer {
    sleep: Option<Pin<Box<Sleep>>>,
}

impl WakeTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a wake-up `after` from now
    pub fn arm(&mut self, after: Duration) {
        self.sleep = Some(Box::pin(tokio::time::sleep(after)));
    }

    /// Drop the pending wake-up, if any
    pub fn cancel(&mut self) {
        self.sleep = None;
    }

    pub fn is_armed(&self) -> bool {
        self.sleep.is_some()
    }

    /// Resolve when the pending wake-up fires
    ///
    /// Never resolves while disarmed. Safe to use in `tokio::select!`:
    /// dropping the future leaves the wake-up pending.
    pub async fn wait(&mut self) {
        match self.sleep.as_mut() {
            Some(sleep) => {
                sleep.as_mut().await;
                self.sleep = None;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
