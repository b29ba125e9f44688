//! Scheduler task and handle
//!
//! One tokio task owns the [`ClickScheduler`], its [`WakeTimer`] and the
//! clock. Polls and reconfigurations are both handled inside that task, so
//! the read-decide-emit-rearm sequence never interleaves with a parameter
//! change and no lock is needed. Everything else talks to the task through
//! a cloneable [`SchedulerHandle`].

use std::sync::Arc;
use std::time::Duration;

use clicksync_common::clock::SyncClock;
use clicksync_common::events::{ClickSyncEvent, EventBus};
use clicksync_common::protocol::{SchedulerConfig, SchedulerPatch};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::core::ClickScheduler;
use super::timer::WakeTimer;
use crate::error::{Error, Result};

/// Requests served by the scheduler task
#[derive(Debug)]
enum SchedulerCommand {
    Reconfigure {
        patch: SchedulerPatch,
        reply: oneshot::Sender<SchedulerConfig>,
    },
    Snapshot {
        reply: oneshot::Sender<SchedulerConfig>,
    },
    Shutdown,
}

/// Cloneable access to the running scheduler
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    tx: mpsc::Sender<SchedulerCommand>,
}

impl SchedulerHandle {
    /// Merge `patch` into the parameters and return the full result
    ///
    /// The full configuration is also broadcast to all subscribers.
    pub async fn reconfigure(&self, patch: SchedulerPatch) -> Result<SchedulerConfig> {
        patch.validate()?;
        let (reply, rx) = oneshot::channel();
        self.send(SchedulerCommand::Reconfigure { patch, reply }).await?;
        rx.await.map_err(|_| stopped())
    }

    /// Current parameters
    pub async fn snapshot(&self) -> Result<SchedulerConfig> {
        let (reply, rx) = oneshot::channel();
        self.send(SchedulerCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| stopped())
    }

    /// Stop the scheduler task
    ///
    /// Succeeds if the task is already gone.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(SchedulerCommand::Shutdown).await;
    }

    async fn send(&self, command: SchedulerCommand) -> Result<()> {
        self.tx.send(command).await.map_err(|_| stopped())
    }
}

fn stopped() -> Error {
    Error::Scheduler("scheduler task is not running".to_string())
}

/// Start the scheduler task
///
/// The scheduler polls immediately if its configuration is active.
pub fn spawn(
    scheduler: ClickScheduler,
    clock: Arc<dyn SyncClock>,
    events: EventBus,
    tick_duration: Duration,
) -> (SchedulerHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(32);
    let runner = SchedulerRunner {
        scheduler,
        clock,
        events,
        tick_duration,
        timer: WakeTimer::new(),
    };
    let join = tokio::spawn(runner.run(rx));
    (SchedulerHandle { tx }, join)
}

struct SchedulerRunner {
    scheduler: ClickScheduler,
    clock: Arc<dyn SyncClock>,
    events: EventBus,
    tick_duration: Duration,
    timer: WakeTimer,
}

impl SchedulerRunner {
    async fn run(mut self, mut rx: mpsc::Receiver<SchedulerCommand>) {
        info!(
            "Click scheduler started: {:?}, tick {:?}",
            self.scheduler.config(),
            self.tick_duration
        );

        // Armed by default
        self.poll();

        loop {
            tokio::select! {
                command = rx.recv() => match command {
                    Some(SchedulerCommand::Reconfigure { patch, reply }) => {
                        let config = self.reconfigure(&patch);
                        let _ = reply.send(config);
                    }
                    Some(SchedulerCommand::Snapshot { reply }) => {
                        let _ = reply.send(self.scheduler.config());
                    }
                    Some(SchedulerCommand::Shutdown) | None => break,
                },
                () = self.timer.wait() => self.poll(),
            }
        }

        self.timer.cancel();
        info!("Click scheduler stopped");
    }

    /// One scheduler step: read clock, emit due clicks, rearm or go idle
    fn poll(&mut self) {
        self.timer.cancel();
        let now = self.clock.sync_time();
        let outcome = self.scheduler.tick(now);

        for click in outcome.emitted {
            self.events.emit_lossy(ClickSyncEvent::Click(click));
        }

        if outcome.rearm {
            self.timer.arm(self.tick_duration);
        } else if !self.scheduler.should_run() {
            debug!("Click scheduler idle");
        }

        if outcome.config_changed {
            self.broadcast_parameters();
        }
    }

    fn reconfigure(&mut self, patch: &SchedulerPatch) -> SchedulerConfig {
        let result = self.scheduler.reconfigure(patch);
        info!("Scheduler reconfigured: {:?}", result.config);
        self.broadcast_parameters();

        if !result.should_run {
            self.timer.cancel();
        } else if result.activated || !self.timer.is_armed() {
            // Kick now instead of waiting for the next poll
            self.poll();
        }

        self.scheduler.config()
    }

    fn broadcast_parameters(&self) {
        self.events
            .emit_lossy(ClickSyncEvent::Parameters(self.scheduler.config()));
    }
}
