//! Playback decisions for scheduled clicks
//!
//! A click carries the synchronized instant it must be *heard*. The player
//! starts it early by its intrinsic output delay and attenuates it by its
//! intrinsic gain. A click that arrives after its instant is replaced by a
//! short noise burst, so a miss is audible instead of silently off-beat.

use clicksync_common::clock::{LocalTimeMap, SyncClock};
use clicksync_common::protocol::{CalibrationResponse, CalibrationStoreRequest, ScheduledClick};
use tracing::debug;

use crate::audio::{db_to_lin, SoundType, FALLBACK_DURATION};
use crate::calibration::ClientCalibration;
use crate::local::LocalCalibrationStore;
use crate::steps::CalibrationStep;
use crate::sync::{ConnectionStatus, SyncReport, SyncStatus};

/// What to play for one click
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayDecision {
    pub sound: SoundType,
    /// Local audio-clock start time, in seconds (never negative)
    pub start_local: f64,
    /// Gain offset applied to the sound, in decibels
    pub gain_db: f64,
    /// Stop after this many seconds; `None` plays the whole sound
    pub duration: Option<f64>,
}

impl PlayDecision {
    /// Gain offset as a linear factor
    pub fn linear_gain(&self) -> f64 {
        db_to_lin(self.gain_db)
    }

    /// True for the fallback played when the click arrived too late
    pub fn is_fallback(&self) -> bool {
        self.duration.is_some()
    }
}

/// Player state driving playback of incoming clicks
#[derive(Debug, Clone)]
pub struct PlaybackCompensator {
    calibration: ClientCalibration,
    sound: SoundType,
    audio_active: bool,
    step: CalibrationStep,
    sync_status: SyncStatus,
    connection: ConnectionStatus,
}

impl Default for PlaybackCompensator {
    fn default() -> Self {
        let step = CalibrationStep::default();
        Self {
            calibration: ClientCalibration::new(),
            sound: step.sound().unwrap_or(SoundType::Clack),
            audio_active: true,
            step,
            sync_status: SyncStatus::New,
            connection: ConnectionStatus::Offline,
        }
    }
}

impl PlaybackCompensator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calibration(&self) -> &ClientCalibration {
        &self.calibration
    }

    pub fn calibration_mut(&mut self) -> &mut ClientCalibration {
        &mut self.calibration
    }

    pub fn sound(&self) -> SoundType {
        self.sound
    }

    pub fn set_sound(&mut self, sound: SoundType) {
        self.sound = sound;
    }

    pub fn audio_active(&self) -> bool {
        self.audio_active
    }

    /// Mute or unmute click playback
    pub fn set_audio_active(&mut self, active: bool) {
        self.audio_active = active;
    }

    pub fn step(&self) -> CalibrationStep {
        self.step
    }

    /// Move to `step`, switching to the sound it uses
    pub fn navigate(&mut self, step: CalibrationStep) {
        self.step = step;
        if let Some(sound) = step.sound() {
            self.sound = sound;
        }
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.sync_status
    }

    /// Apply a synchronization status report
    pub fn on_sync_report(&mut self, report: &SyncReport) {
        if let Some(status) = report.status {
            self.sync_status = status;
        }
        if let Some(connection) = report.connection {
            self.connection = connection;
        }
        self.calibration.update_network(report);
    }

    /// Saving needs a synchronized clock and a live connection
    pub fn ready_to_save(&self) -> bool {
        self.sync_status == SyncStatus::Sync && self.connection == ConnectionStatus::Online
    }

    pub fn save_request(&self, identifier: &str) -> CalibrationStoreRequest {
        self.calibration.save_request(identifier)
    }

    /// Save locally and return the message saving to the server
    pub fn save(
        &self,
        identifier: &str,
        local: &mut dyn LocalCalibrationStore,
    ) -> CalibrationStoreRequest {
        self.calibration.save(identifier, local)
    }

    /// Restore from the device; false means a server request is needed
    pub fn restore_local(&mut self, local: &dyn LocalCalibrationStore) -> bool {
        self.calibration.restore_local(local)
    }

    /// Apply a calibration response from the server
    pub fn restore(&mut self, response: &CalibrationResponse) {
        self.calibration.restore(response);
    }

    /// Decide how to play `click`
    ///
    /// `None` when muted, when the clock is not usable yet, or when the
    /// synchronized time cannot be read.
    pub fn decide(
        &self,
        click: &ScheduledClick,
        clock: &dyn SyncClock,
        local: &dyn LocalTimeMap,
    ) -> Option<PlayDecision> {
        if !self.audio_active || !self.sync_status.can_play() {
            return None;
        }
        let now = clock.sync_time()?;

        let target = click.target_time;
        let time_left = target - now;
        let (sound, duration) = if time_left > 0.0 {
            debug!("play {} in {} s", self.sound, time_left);
            (self.sound, None)
        } else {
            debug!("too late by {} s", -time_left);
            (SoundType::Noise, Some(FALLBACK_DURATION))
        };

        // Compensation is the inverse of the intrinsic correction
        let correction = self.calibration.correction();
        Some(PlayDecision {
            sound,
            start_local: local.local_time(target - correction.delay).max(0.0),
            gain_db: -correction.gain,
            duration,
        })
    }
}
