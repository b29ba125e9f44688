//! Calibration store with fuzzy device lookup

use chrono::{DateTime, Utc};
use clicksync_common::calibration::{AudioCorrections, NetworkStats};
use clicksync_common::protocol::CalibrationResponse;
use clicksync_common::Levenshtein;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use super::history::{CalibrationData, DeviceCalibration};
use crate::error::{Error, Result};

/// Outcome of a calibration lookup
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// The identifier is stored as-is
    Exact(CalibrationResponse),
    /// Closest stored identifier
    Fuzzy {
        key: String,
        distance: usize,
        calibration: CalibrationResponse,
    },
    /// Store empty, or no identifier close enough
    NotFound,
}

impl Lookup {
    /// Wire response; `NotFound` is an empty response
    pub fn into_response(self) -> CalibrationResponse {
        match self {
            Lookup::Exact(calibration) | Lookup::Fuzzy { calibration, .. } => calibration,
            Lookup::NotFound => CalibrationResponse::default(),
        }
    }
}

/// What an append recorded
#[derive(Debug, Clone, PartialEq)]
pub struct AppendSummary {
    /// Outputs that received a new audio record
    pub outputs: Vec<String>,
    /// Whether network statistics were recorded
    pub network: bool,
    pub recorded_at: DateTime<Utc>,
}

impl AppendSummary {
    pub fn changed(&self) -> bool {
        !self.outputs.is_empty() || self.network
    }
}

/// Device calibration histories, persisted as one JSON document
///
/// The in-memory copy is authoritative: a failed flush is logged and the
/// store keeps serving what it holds.
#[derive(Debug)]
pub struct CalibrationStore {
    path: Option<PathBuf>,
    data: CalibrationData,
    matcher: Levenshtein,
    max_match_distance: Option<usize>,
}

impl CalibrationStore {
    /// Load the store persisted at `path`
    ///
    /// A missing or corrupt file yields an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<CalibrationData>(&content) {
                Ok(data) => {
                    info!(
                        "Loaded calibration for {} device(s) from {}",
                        data.len(),
                        path.display()
                    );
                    if data.foreign_len() > 0 {
                        warn!(
                            "{} unreadable entries in {} will be written back as found",
                            data.foreign_len(),
                            path.display()
                        );
                    }
                    data
                }
                Err(e) => {
                    error!(
                        "Corrupt calibration file {}, starting empty: {}",
                        path.display(),
                        e
                    );
                    CalibrationData::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "No calibration file at {}, starting empty",
                    path.display()
                );
                CalibrationData::new()
            }
            Err(e) => {
                error!(
                    "Cannot read calibration file {}, starting empty: {}",
                    path.display(),
                    e
                );
                CalibrationData::new()
            }
        };

        Self {
            path: Some(path),
            data,
            matcher: Levenshtein::new(),
            max_match_distance: None,
        }
    }

    /// Store that is never flushed
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: CalibrationData::new(),
            matcher: Levenshtein::new(),
            max_match_distance: None,
        }
    }

    /// Reject fuzzy matches further than `max` edits (`None`: accept all)
    pub fn with_max_match_distance(mut self, max: Option<usize>) -> Self {
        self.max_match_distance = max;
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append new values for `identifier` and flush
    pub fn append(
        &mut self,
        identifier: &str,
        audio: Option<&AudioCorrections>,
        network: Option<&NetworkStats>,
    ) -> AppendSummary {
        self.append_at(clicksync_common::time::now(), identifier, audio, network)
    }

    /// [`append`](Self::append) with an explicit timestamp
    pub fn append_at(
        &mut self,
        recorded_at: DateTime<Utc>,
        identifier: &str,
        audio: Option<&AudioCorrections>,
        network: Option<&NetworkStats>,
    ) -> AppendSummary {
        let mut summary = AppendSummary {
            outputs: Vec::new(),
            network: false,
            recorded_at,
        };
        if audio.map_or(true, |a| a.is_empty()) && network.is_none() {
            debug!("Nothing to store for {:?}", identifier);
            return summary;
        }

        let device = self.data.get_or_insert(identifier);
        for (output, record) in audio.into_iter().flatten() {
            device.push_audio(recorded_at.into(), output, *record);
            summary.outputs.push(output.clone());
        }
        if let Some(stats) = network {
            device.push_network(recorded_at.into(), *stats);
            summary.network = true;
        }

        if let Err(e) = self.flush() {
            error!("Failed to persist calibration: {}", e);
        }
        summary
    }

    /// Current calibration for `identifier`, exact or closest
    pub fn lookup(&mut self, identifier: &str) -> Lookup {
        if let Some(device) = self.data.get(identifier) {
            return Lookup::Exact(device.current());
        }

        let found = self.matcher.closest_key(self.data.keys(), identifier);
        let Some(key) = found.key else {
            debug!("No calibration stored, nothing to match {:?}", identifier);
            return Lookup::NotFound;
        };

        if let Some(max) = self.max_match_distance {
            if found.distance > max {
                debug!(
                    "{:?} -> {:?} ({}) exceeds max distance {}",
                    identifier, key, found.distance, max
                );
                return Lookup::NotFound;
            }
        }

        debug!("{:?} -> {:?} ({})", identifier, key, found.distance);
        let key = key.to_string();
        let calibration = self
            .data
            .get(&key)
            .map(DeviceCalibration::current)
            .unwrap_or_default();
        Lookup::Fuzzy {
            key,
            distance: found.distance,
            calibration,
        }
    }

    /// Known identifiers in insertion order
    pub fn devices(&self) -> Vec<String> {
        self.data.keys().map(str::to_string).collect()
    }

    pub fn history(&self, identifier: &str) -> Option<&DeviceCalibration> {
        self.data.get(identifier)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Rewrite the whole file (temporary file, then rename)
    pub fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(&self.data)?;
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path).map_err(|e| {
            warn!("Rename {} failed, leaving it behind", tmp.display());
            Error::Store(format!("cannot replace {}: {}", path.display(), e))
        })?;
        debug!("Flushed {} device(s) to {}", self.data.len(), path.display());
        Ok(())
    }
}
