//! Calibration values held by a player
//!
//! The player stores what it *measured*: the intrinsic delay and gain of
//! each output. The user tunes the *compensation*, which is the additive
//! inverse, so setters and getters negate.

use clicksync_common::calibration::{
    AudioCorrections, CorrectionRecord, NetworkStats, KNOWN_OUTPUTS, OUTPUT_INTERNAL,
};
use clicksync_common::protocol::{CalibrationResponse, CalibrationStoreRequest};
use clicksync_common::time::round_to_tenth;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::local::{LocalCalibration, LocalCalibrationStore};
use crate::sync::SyncReport;

/// Largest delay compensation, in milliseconds
pub const DELAY_COMPENSATION_MAX_MS: f64 = 100.0;

/// Largest gain compensation, in decibels
pub const GAIN_COMPENSATION_MAX_DB: f64 = 30.0;

/// Intrinsic values of one output; `None` until tuned or restored
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct OutputCorrection {
    delay: Option<f64>,
    gain: Option<f64>,
}

impl OutputCorrection {
    fn record(&self) -> CorrectionRecord {
        CorrectionRecord::new(self.delay.unwrap_or(0.0), self.gain.unwrap_or(0.0))
    }
}

/// Per-output corrections and latest network statistics of one device
#[derive(Debug, Clone, PartialEq)]
pub struct ClientCalibration {
    output: &'static str,
    /// Outputs that were selected or restored at least once
    audio: BTreeMap<&'static str, OutputCorrection>,
    network_delay: Option<f64>,
    network_delay_max: Option<f64>,
}

impl Default for ClientCalibration {
    fn default() -> Self {
        Self {
            output: OUTPUT_INTERNAL,
            audio: BTreeMap::from([(OUTPUT_INTERNAL, OutputCorrection::default())]),
            network_delay: None,
            network_delay_max: None,
        }
    }
}

impl ClientCalibration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently selected output
    pub fn output(&self) -> &'static str {
        self.output
    }

    pub fn select_output(&mut self, output: &str) -> Result<()> {
        let output = known_output(output).ok_or_else(|| Error::UnknownOutput(output.to_string()))?;
        self.output = output;
        self.audio.entry(output).or_default();
        Ok(())
    }

    /// Intrinsic correction of the selected output (0 where unset)
    pub fn correction(&self) -> CorrectionRecord {
        self.audio
            .get(self.output)
            .map(OutputCorrection::record)
            .unwrap_or_default()
    }

    /// Set the delay compensation of the selected output, in milliseconds
    ///
    /// Clamped to ±100 ms and rounded to 0.1 ms.
    pub fn set_delay_compensation_ms(&mut self, value: f64) {
        let value = round_to_tenth(value.clamp(-DELAY_COMPENSATION_MAX_MS, DELAY_COMPENSATION_MAX_MS));
        self.selected_mut().delay = Some(-value * 1e-3);
    }

    /// Delay compensation of the selected output, in milliseconds
    pub fn delay_compensation_ms(&self) -> f64 {
        self.selected().and_then(|c| c.delay).map_or(0.0, |delay| -delay * 1e3)
    }

    /// Set the gain compensation of the selected output, in decibels
    ///
    /// Clamped to ±30 dB and rounded to 0.1 dB.
    pub fn set_gain_compensation_db(&mut self, value: f64) {
        let value = round_to_tenth(value.clamp(-GAIN_COMPENSATION_MAX_DB, GAIN_COMPENSATION_MAX_DB));
        self.selected_mut().gain = Some(-value);
    }

    /// Gain compensation of the selected output, in decibels
    pub fn gain_compensation_db(&self) -> f64 {
        self.selected().and_then(|c| c.gain).map_or(0.0, |gain| -gain)
    }

    /// Record the travel durations of a sync report
    pub fn update_network(&mut self, report: &SyncReport) {
        if let Some(delay) = report.travel_duration {
            self.network_delay = Some(delay);
        }
        if let Some(delay_max) = report.travel_duration_max {
            self.network_delay_max = Some(delay_max);
        }
    }

    /// Latest network statistics, if any were reported
    pub fn network(&self) -> Option<NetworkStats> {
        if self.network_delay.is_none() && self.network_delay_max.is_none() {
            return None;
        }
        Some(NetworkStats::new(
            self.network_delay.unwrap_or(0.0),
            self.network_delay_max.unwrap_or(0.0),
        ))
    }

    /// Message saving every used output and the network statistics
    pub fn save_request(&self, identifier: &str) -> CalibrationStoreRequest {
        let audio: AudioCorrections = self
            .audio
            .iter()
            .map(|(output, correction)| (output.to_string(), correction.record()))
            .collect();
        CalibrationStoreRequest {
            identifier: identifier.to_string(),
            audio: (!audio.is_empty()).then_some(audio),
            network: self.network(),
        }
    }

    /// Save locally, then return the message saving to the server
    ///
    /// A failed local save is logged; the server copy is still sent.
    pub fn save(
        &self,
        identifier: &str,
        local: &mut dyn LocalCalibrationStore,
    ) -> CalibrationStoreRequest {
        let request = self.save_request(identifier);
        let mut saved = match local.load() {
            Ok(saved) => saved.unwrap_or_default(),
            Err(e) => {
                warn!("Unreadable local calibration, overwriting: {}", e);
                LocalCalibration::default()
            }
        };
        saved.merge(LocalCalibration {
            audio: request.audio.clone(),
            network: request.network,
        });
        if let Err(e) = local.save(&saved) {
            warn!("Failed to save calibration locally: {}", e);
        }
        request
    }

    /// Restore audio values saved on the device
    ///
    /// Returns false when there are none, in which case the server should
    /// be asked with a calibration request.
    pub fn restore_local(&mut self, local: &dyn LocalCalibrationStore) -> bool {
        let audio = match local.load() {
            Ok(Some(LocalCalibration { audio: Some(audio), .. })) => audio,
            Ok(_) => {
                debug!("No local audio calibration");
                return false;
            }
            Err(e) => {
                warn!("Ignoring unreadable local calibration: {}", e);
                return false;
            }
        };
        self.restore(&CalibrationResponse {
            audio: Some(audio),
            network: None,
        });
        true
    }

    /// Apply stored values for the known outputs present in `response`
    ///
    /// Network statistics are measured live and never restored.
    pub fn restore(&mut self, response: &CalibrationResponse) {
        let Some(audio) = &response.audio else {
            debug!("No audio calibration to restore");
            return;
        };
        for (output, record) in audio {
            match known_output(output) {
                Some(output) => {
                    self.audio.insert(
                        output,
                        OutputCorrection {
                            delay: Some(record.delay),
                            gain: Some(record.gain),
                        },
                    );
                    debug!("Restored {}: {:?}", output, record);
                }
                None => debug!("Ignoring calibration for unknown output {:?}", output),
            }
        }
    }

    fn selected(&self) -> Option<&OutputCorrection> {
        self.audio.get(self.output)
    }

    fn selected_mut(&mut self) -> &mut OutputCorrection {
        self.audio.entry(self.output).or_default()
    }
}

fn known_output(name: &str) -> Option<&'static str> {
    KNOWN_OUTPUTS.into_iter().find(|known| *known == name)
}
