//! Click scheduling decisions
//!
//! [`ClickScheduler`] holds the scheduler parameters and the next target
//! instant, and decides on each poll which clicks to emit. It never reads a
//! clock or touches a timer: the caller passes the synchronized time in and
//! acts on the returned [`TickOutcome`]. This keeps every timing decision
//! testable with plain numbers.
//!
//! # Emission window
//!
//! A click for target `t` is emitted once `t < now + lookahead`, so players
//! receive it `lookahead` seconds ahead of time. The poll interval only
//! bounds how quickly the window is noticed; the emitted target time is
//! exact.
//!
//! # Lateness
//!
//! If the scheduler wakes up after `t` already passed (process suspended,
//! debugger, overloaded host), the target is moved forward by whole periods
//! to the first instant `>= now` on the original grid. That instant is
//! emitted immediately if it falls inside the window. Missed instants are
//! skipped, never emitted late.

use clicksync_common::protocol::{ScheduledClick, SchedulerConfig, SchedulerPatch};
use tracing::debug;

/// Externally visible scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Not polling: inactive or count exhausted
    Idle,
    /// Polling for the next target
    Armed,
}

/// Result of one poll
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    /// Clicks to broadcast, in increasing target order
    pub emitted: Vec<ScheduledClick>,
    /// Whether the next poll should be scheduled
    pub rearm: bool,
    /// Whether `active` or `remaining` changed during this poll
    pub config_changed: bool,
}

/// Result of a reconfiguration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reconfigured {
    /// Full configuration after the merge
    pub config: SchedulerConfig,
    /// `active` went from false to true
    pub activated: bool,
    /// Whether the scheduler should be polling now
    pub should_run: bool,
}

/// Periodic click scheduler
#[derive(Debug, Clone)]
pub struct ClickScheduler {
    config: SchedulerConfig,
    next_target: f64,
}

impl ClickScheduler {
    /// Create a scheduler whose first target is synchronized time 0
    pub fn new(config: SchedulerConfig) -> Self {
        Self::with_next_target(config, 0.0)
    }

    /// Create a scheduler with an explicit first target
    pub fn with_next_target(config: SchedulerConfig, next_target: f64) -> Self {
        Self {
            config,
            next_target,
        }
    }

    /// Current parameters
    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    /// Absolute synchronized time of the next click
    pub fn next_target(&self) -> f64 {
        self.next_target
    }

    /// Whether the scheduler wants to be polled
    pub fn should_run(&self) -> bool {
        self.config.active && self.config.remaining != 0
    }

    /// Idle or Armed, derived from the parameters
    pub fn state(&self) -> SchedulerState {
        if self.should_run() {
            SchedulerState::Armed
        } else {
            SchedulerState::Idle
        }
    }

    /// Merge a partial update into the parameters
    ///
    /// The patch is assumed validated. Timer handling is the caller's job,
    /// guided by [`Reconfigured::should_run`].
    pub fn reconfigure(&mut self, patch: &SchedulerPatch) -> Reconfigured {
        let was_active = self.config.active;
        self.config.apply(patch);
        Reconfigured {
            config: self.config,
            activated: !was_active && self.config.active,
            should_run: self.should_run(),
        }
    }

    /// Poll the scheduler at synchronized time `now`
    ///
    /// `None` means the synchronized clock is not ready yet: nothing is
    /// emitted and polling continues.
    pub fn tick(&mut self, now: Option<f64>) -> TickOutcome {
        if !self.should_run() {
            return TickOutcome::default();
        }

        let before = self.config;
        let mut outcome = TickOutcome::default();

        let Some(now) = now else {
            debug!("sync clock not ready, polling again");
            outcome.rearm = true;
            return outcome;
        };

        let lookahead = self.config.lookahead;
        let period = self.config.period;

        if self.next_target < now + lookahead {
            self.consume_one();

            if self.next_target < now {
                debug!("too late by {} s", now - self.next_target);
                let missed = ((now - self.next_target) / period).ceil();
                self.next_target += missed * period;
                // Rounding may leave the realigned target a hair before now
                if self.next_target < now {
                    self.next_target += period;
                }

                if self.next_target < now + lookahead {
                    self.consume_one();
                    debug!("soon in {} s", self.next_target - now);
                    self.emit(&mut outcome);
                }
            } else {
                debug!(
                    "trigger {} (in {} s)",
                    self.next_target,
                    self.next_target - now
                );
                self.emit(&mut outcome);
            }
        }

        if self.config.remaining != 0 {
            outcome.rearm = true;
        } else {
            self.config.active = false;
        }
        outcome.config_changed = self.config != before;
        outcome
    }

    fn emit(&mut self, outcome: &mut TickOutcome) {
        outcome.emitted.push(ScheduledClick::new(self.next_target));
        self.next_target += self.config.period;
    }

    /// Count one emission against a finite `remaining`
    ///
    /// Unbounded (-1) is never decremented; finite counts stop at 0.
    fn consume_one(&mut self) {
        if self.config.remaining > 0 {
            self.config.remaining -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clicksync_common::protocol::UNBOUNDED;

    fn config(lookahead: f64, period: f64, remaining: i64) -> SchedulerConfig {
        SchedulerConfig {
            active: true,
            lookahead,
            period,
            remaining,
        }
    }

    fn targets(outcome: &TickOutcome) -> Vec<f64> {
        outcome.emitted.iter().map(|c| c.target_time).collect()
    }

    #[test]
    fn test_initial_state_is_armed() {
        let scheduler = ClickScheduler::new(SchedulerConfig::default());
        assert_eq!(scheduler.state(), SchedulerState::Armed);
        assert_eq!(scheduler.next_target(), 0.0);
    }

    #[test]
    fn test_first_ticks_emit_zero_then_one() {
        let mut scheduler = ClickScheduler::new(config(1.0, 1.0, UNBOUNDED));

        let first = scheduler.tick(Some(0.0));
        assert_eq!(targets(&first), vec![0.0]);
        assert!(first.rearm);
        assert!(!first.config_changed);

        let second = scheduler.tick(Some(0.025));
        assert_eq!(targets(&second), vec![1.0]);

        // Target 2 is outside the window until now > 1
        let idle = scheduler.tick(Some(0.05));
        assert!(idle.emitted.is_empty());
        assert!(idle.rearm);
        assert_eq!(scheduler.next_target(), 2.0);
    }

    #[test]
    fn test_target_outside_window_only_rearms() {
        let mut scheduler = ClickScheduler::with_next_target(config(0.5, 1.0, 3), 10.0);
        let outcome = scheduler.tick(Some(9.0));
        assert!(outcome.emitted.is_empty());
        assert!(outcome.rearm);
        assert_eq!(scheduler.config().remaining, 3);
    }

    #[test]
    fn test_window_boundary_is_exclusive() {
        let mut scheduler = ClickScheduler::with_next_target(config(1.0, 1.0, UNBOUNDED), 2.0);
        assert!(scheduler.tick(Some(1.0)).emitted.is_empty());
        assert_eq!(targets(&scheduler.tick(Some(1.001))), vec![2.0]);
    }

    #[test]
    fn test_clock_not_ready_keeps_polling() {
        let mut scheduler = ClickScheduler::new(config(1.0, 1.0, 2));
        let outcome = scheduler.tick(None);
        assert!(outcome.emitted.is_empty());
        assert!(outcome.rearm);
        assert_eq!(scheduler.config().remaining, 2);
    }

    #[test]
    fn test_finite_count_emits_exactly_n_then_idles() {
        let mut scheduler = ClickScheduler::new(config(1.0, 0.5, 4));
        let mut emitted = Vec::new();
        let mut now = 0.0;
        let mut last = TickOutcome::default();
        while scheduler.should_run() {
            last = scheduler.tick(Some(now));
            emitted.extend(targets(&last));
            now += 0.025;
        }

        assert_eq!(emitted, vec![0.0, 0.5, 1.0, 1.5]);
        assert!(!last.rearm);
        assert!(last.config_changed);
        assert!(!scheduler.config().active);
        assert_eq!(scheduler.config().remaining, 0);
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        // Idle scheduler ignores further polls
        let after = scheduler.tick(Some(now + 10.0));
        assert_eq!(after, TickOutcome::default());
    }

    #[test]
    fn test_unbounded_never_reaches_zero() {
        let mut scheduler = ClickScheduler::new(config(1.0, 0.1, UNBOUNDED));
        let mut count = 0;
        let mut now = 0.0;
        for _ in 0..2_000 {
            count += scheduler.tick(Some(now)).emitted.len();
            now += 0.025;
        }
        assert!(count > 400);
        assert_eq!(scheduler.config().remaining, UNBOUNDED);
        assert!(scheduler.config().active);
    }

    #[test]
    fn test_successive_targets_spaced_by_period() {
        let mut scheduler = ClickScheduler::new(config(0.3, 0.25, UNBOUNDED));
        let mut emitted = Vec::new();
        let mut now = 0.0;
        while now < 5.0 {
            emitted.extend(targets(&scheduler.tick(Some(now))));
            now += 0.025;
        }
        assert!(emitted.len() > 10);
        for pair in emitted.windows(2) {
            assert!((pair[1] - pair[0] - 0.25).abs() < 1e-9, "{:?}", pair);
        }
    }

    #[test]
    fn test_stall_realigns_to_next_grid_instant() {
        let mut scheduler = ClickScheduler::new(config(1.0, 1.0, UNBOUNDED));
        scheduler.tick(Some(0.0));
        scheduler.tick(Some(0.025));
        assert_eq!(scheduler.next_target(), 2.0);

        // Suspended 3.4 periods past the pending target
        let outcome = scheduler.tick(Some(5.4));
        assert_eq!(targets(&outcome), vec![6.0]);
        assert_eq!(scheduler.next_target(), 7.0);
        assert!(outcome.rearm);
    }

    #[test]
    fn test_stall_with_short_lookahead_defers_emission() {
        let mut scheduler = ClickScheduler::with_next_target(config(0.5, 1.0, UNBOUNDED), 2.0);
        let outcome = scheduler.tick(Some(5.4));
        assert!(outcome.emitted.is_empty());
        assert_eq!(scheduler.next_target(), 6.0);

        // Emitted once the realigned target enters the window
        assert_eq!(targets(&scheduler.tick(Some(5.6))), vec![6.0]);
    }

    #[test]
    fn test_realigned_target_never_before_now() {
        for (i, stall) in [0.3, 1.0, 2.999, 3.0, 7.77, 100.01].iter().enumerate() {
            let mut scheduler =
                ClickScheduler::with_next_target(config(2.0, 0.7, UNBOUNDED), 1.0);
            let now = 1.0 + stall;
            let outcome = scheduler.tick(Some(now));
            for click in &outcome.emitted {
                assert!(click.target_time >= now, "case {}: {} < {}", i, click.target_time, now);
            }
            assert!(scheduler.next_target() >= now);
        }
    }

    #[test]
    fn test_exact_grid_hit_after_stall_emits_now() {
        let mut scheduler = ClickScheduler::with_next_target(config(1.0, 1.0, UNBOUNDED), 2.0);
        let outcome = scheduler.tick(Some(4.0));
        assert_eq!(targets(&outcome), vec![4.0]);
    }

    #[test]
    fn test_lateness_consumes_two_counts() {
        let mut scheduler = ClickScheduler::with_next_target(config(1.0, 1.0, 5), 2.0);
        let outcome = scheduler.tick(Some(5.4));
        assert_eq!(outcome.emitted.len(), 1);
        assert_eq!(scheduler.config().remaining, 3);
        assert!(outcome.config_changed);
    }

    #[test]
    fn test_lateness_with_last_count_emits_and_stops() {
        let mut scheduler = ClickScheduler::with_next_target(config(1.0, 1.0, 1), 2.0);
        let outcome = scheduler.tick(Some(5.4));
        assert_eq!(targets(&outcome), vec![6.0]);
        assert_eq!(scheduler.config().remaining, 0);
        assert!(!scheduler.config().active);
        assert!(!outcome.rearm);
    }

    #[test]
    fn test_reconfigure_partial_merge() {
        let mut scheduler = ClickScheduler::new(SchedulerConfig::default());
        let result = scheduler.reconfigure(&SchedulerPatch {
            period: Some(0.5),
            ..Default::default()
        });
        assert_eq!(result.config.period, 0.5);
        assert_eq!(result.config.lookahead, 1.0);
        assert!(result.config.active);
        assert!(!result.activated);
        assert!(result.should_run);
    }

    #[test]
    fn test_reconfigure_deactivate_and_reactivate() {
        let mut scheduler = ClickScheduler::new(SchedulerConfig::default());

        let off = scheduler.reconfigure(&SchedulerPatch {
            active: Some(false),
            ..Default::default()
        });
        assert!(!off.should_run);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(scheduler.tick(Some(0.0)).emitted.is_empty());

        let on = scheduler.reconfigure(&SchedulerPatch {
            active: Some(true),
            remaining: Some(2),
            ..Default::default()
        });
        assert!(on.activated);
        assert!(on.should_run);
        assert_eq!(scheduler.state(), SchedulerState::Armed);
    }

    #[test]
    fn test_reconfigure_remaining_zero_stops() {
        let mut scheduler = ClickScheduler::new(SchedulerConfig::default());
        let result = scheduler.reconfigure(&SchedulerPatch {
            remaining: Some(0),
            ..Default::default()
        });
        assert!(result.config.active);
        assert!(!result.should_run);
        assert_eq!(scheduler.tick(Some(0.0)), TickOutcome::default());
    }
}
