//! Calibration kept on the device itself
//!
//! A player saves its values locally as well as on the server. On startup
//! the local copy is tried first and the server is only asked when there
//! is none.

use clicksync_common::calibration::{AudioCorrections, NetworkStats};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Result;

/// Values persisted on the device
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalCalibration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioCorrections>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkStats>,
}

impl LocalCalibration {
    /// Overwrite the values present in `update`, keep the others
    pub fn merge(&mut self, update: LocalCalibration) {
        if update.audio.is_some() {
            self.audio = update.audio;
        }
        if update.network.is_some() {
            self.network = update.network;
        }
    }
}

/// Device-local storage for calibration values
pub trait LocalCalibrationStore {
    /// Stored values, `None` when nothing was saved yet
    fn load(&self) -> Result<Option<LocalCalibration>>;

    fn save(&mut self, calibration: &LocalCalibration) -> Result<()>;
}

/// Store kept in a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LocalCalibrationStore for JsonFileStore {
    fn load(&self) -> Result<Option<LocalCalibration>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No local calibration at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&mut self, calibration: &LocalCalibration) -> Result<()> {
        let json = serde_json::to_string_pretty(calibration)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!("Saved local calibration to {}", self.path.display());
        Ok(())
    }
}

/// Store living only as long as the value, for embedders without a
/// filesystem and for tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Option<LocalCalibration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalCalibrationStore for MemoryStore {
    fn load(&self) -> Result<Option<LocalCalibration>> {
        Ok(self.saved.clone())
    }

    fn save(&mut self, calibration: &LocalCalibration) -> Result<()> {
        self.saved = Some(calibration.clone());
        Ok(())
    }
}
