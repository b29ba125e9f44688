//! Calibration record types
//!
//! A device stores, per audio output, the *intrinsic* delay and gain it
//! measured. Playback compensation applies the additive inverse of these
//! values. Both record types are snapshots, never deltas.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the built-in speaker output
pub const OUTPUT_INTERNAL: &str = "internal";

/// Name of the external (headphone/line) output
pub const OUTPUT_EXTERNAL: &str = "external";

/// Outputs known to the player, in display order
pub const KNOWN_OUTPUTS: [&str; 2] = [OUTPUT_INTERNAL, OUTPUT_EXTERNAL];

/// Intrinsic audio correction for one output
///
/// Fields missing from stored or submitted JSON default to 0, since a
/// client may save an output before any value was tuned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrectionRecord {
    /// Intrinsic output latency in seconds
    #[serde(default)]
    pub delay: f64,
    /// Intrinsic output gain in decibels
    #[serde(default)]
    pub gain: f64,
}

impl CorrectionRecord {
    pub fn new(delay: f64, gain: f64) -> Self {
        Self { delay, gain }
    }
}

/// Network statistics reported by the synchronization layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkStats {
    /// Typical one-way travel duration in seconds
    #[serde(default)]
    pub delay: f64,
    /// Maximum observed travel duration in seconds
    #[serde(default, rename = "delayMax")]
    pub delay_max: f64,
}

impl NetworkStats {
    pub fn new(delay: f64, delay_max: f64) -> Self {
        Self { delay, delay_max }
    }
}

/// Audio corrections keyed by output name
pub type AudioCorrections = BTreeMap<String, CorrectionRecord>;
