//! Persisted calibration histories
//!
//! File layout, one entry per device identifier in insertion order:
//!
//! ```json
//! {
//!   "Mozilla/5.0 (X11; Linux x86_64)": {
//!     "audio": { "internal": [["2024-05-01T10:00:00.000Z", {"delay": 0.012, "gain": -3}]] },
//!     "network": [["2024-05-01T10:00:00.000Z", {"delay": 0.004, "delayMax": 0.02}]]
//!   }
//! }
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use clicksync_common::calibration::{AudioCorrections, CorrectionRecord, NetworkStats};
use clicksync_common::protocol::CalibrationResponse;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// Timestamp of a history entry
///
/// Written as RFC 3339 with milliseconds. A hand-edited value that does not
/// parse is kept as found and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedAt {
    At(DateTime<Utc>),
    Raw(String),
}

impl RecordedAt {
    pub fn now() -> Self {
        RecordedAt::At(clicksync_common::time::now())
    }

    /// Parsed instant, `None` for a raw value
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            RecordedAt::At(at) => Some(*at),
            RecordedAt::Raw(_) => None,
        }
    }
}

impl From<DateTime<Utc>> for RecordedAt {
    fn from(at: DateTime<Utc>) -> Self {
        RecordedAt::At(at)
    }
}

impl Serialize for RecordedAt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RecordedAt::At(at) => {
                serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            RecordedAt::Raw(raw) => serializer.serialize_str(raw),
        }
    }
}

impl<'de> Deserialize<'de> for RecordedAt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match DateTime::parse_from_rfc3339(&raw) {
            Ok(at) => RecordedAt::At(at.with_timezone(&Utc)),
            Err(_) => RecordedAt::Raw(raw),
        })
    }
}

pub type AudioHistory = Vec<(RecordedAt, CorrectionRecord)>;
pub type NetworkHistory = Vec<(RecordedAt, NetworkStats)>;

/// Append-only calibration history of one device
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceCalibration {
    /// Per-output audio corrections, oldest first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<BTreeMap<String, AudioHistory>>,
    /// Network statistics, oldest first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkHistory>,
}

impl DeviceCalibration {
    pub fn push_audio(&mut self, at: RecordedAt, output: &str, record: CorrectionRecord) {
        self.audio
            .get_or_insert_with(BTreeMap::new)
            .entry(output.to_string())
            .or_default()
            .push((at, record));
    }

    pub fn push_network(&mut self, at: RecordedAt, stats: NetworkStats) {
        self.network.get_or_insert_with(Vec::new).push((at, stats));
    }

    /// Last record of each output with a non-empty history
    pub fn current_audio(&self) -> Option<AudioCorrections> {
        let current: AudioCorrections = self
            .audio
            .as_ref()?
            .iter()
            .filter_map(|(output, history)| {
                history.last().map(|(_, record)| (output.clone(), *record))
            })
            .collect();
        (!current.is_empty()).then_some(current)
    }

    pub fn current_network(&self) -> Option<NetworkStats> {
        self.network
            .as_ref()
            .and_then(|history| history.last())
            .map(|(_, stats)| *stats)
    }

    /// Current values in wire form
    pub fn current(&self) -> CalibrationResponse {
        CalibrationResponse {
            audio: self.current_audio(),
            network: self.current_network(),
        }
    }
}

/// Device histories keyed by identifier, in insertion order
///
/// Insertion order decides which identifier wins a fuzzy-match tie, so it
/// survives a save/load cycle. Entries that are not device histories
/// (a format version, a hand-edit gone wrong) are invisible to lookups and
/// written back as found, after the devices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationData {
    entries: Vec<(String, DeviceCalibration)>,
    foreign: Vec<(String, serde_json::Value)>,
}

impl CalibrationData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of device histories
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries kept verbatim because they are not device histories
    pub fn foreign_len(&self) -> usize {
        self.foreign.len()
    }

    pub fn get(&self, identifier: &str) -> Option<&DeviceCalibration> {
        self.entries
            .iter()
            .find(|(key, _)| key == identifier)
            .map(|(_, device)| device)
    }

    /// History of `identifier`, created at the end if absent
    ///
    /// An unreadable entry under the same identifier is replaced; its raw
    /// content is logged so it can be recovered by hand.
    pub fn get_or_insert(&mut self, identifier: &str) -> &mut DeviceCalibration {
        let index = match self.entries.iter().position(|(key, _)| key == identifier) {
            Some(index) => index,
            None => {
                if let Some(pos) = self.foreign.iter().position(|(key, _)| key == identifier) {
                    let (_, raw) = self.foreign.remove(pos);
                    warn!("Replacing unreadable calibration of {:?}: {}", identifier, raw);
                }
                self.entries
                    .push((identifier.to_string(), DeviceCalibration::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }

    /// Device identifiers, in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DeviceCalibration)> {
        self.entries
            .iter()
            .map(|(key, device)| (key.as_str(), device))
    }

    fn insert_parsed(&mut self, identifier: String, value: serde_json::Value) {
        // Last occurrence of a duplicated key wins, as with a plain map
        self.entries.retain(|(key, _)| *key != identifier);
        self.foreign.retain(|(key, _)| *key != identifier);
        match serde_json::from_value::<DeviceCalibration>(value.clone()) {
            Ok(device) => self.entries.push((identifier, device)),
            Err(e) => {
                warn!("Keeping unreadable calibration entry {:?} as is: {}", identifier, e);
                self.foreign.push((identifier, value));
            }
        }
    }
}

impl Serialize for CalibrationData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len() + self.foreign.len()))?;
        for (identifier, device) in &self.entries {
            map.serialize_entry(identifier, device)?;
        }
        for (identifier, raw) in &self.foreign {
            map.serialize_entry(identifier, raw)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CalibrationData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(CalibrationDataVisitor)
    }
}

struct CalibrationDataVisitor;

impl<'de> Visitor<'de> for CalibrationDataVisitor {
    type Value = CalibrationData;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of device identifiers to calibration histories")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut data = CalibrationData::new();
        while let Some((identifier, value)) = access.next_entry::<String, serde_json::Value>()? {
            data.insert_parsed(identifier, value);
        }
        Ok(data)
    }
}
