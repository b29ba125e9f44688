//! Status reports from the clock synchronization layer

use serde::{Deserialize, Serialize};

/// Synchronization state of the local clock
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    New,
    /// Estimating offset; good enough to play
    Training,
    /// Synchronized
    Sync,
    /// Any status this player does not know
    #[serde(other)]
    Other,
}

impl SyncStatus {
    /// Clicks are only played on a usable clock
    pub fn can_play(&self) -> bool {
        matches!(self, SyncStatus::Training | SyncStatus::Sync)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Offline,
    Online,
}

/// Partial status report; absent fields leave the previous value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SyncStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnectionStatus>,
    /// Typical one-way travel duration, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_duration: Option<f64>,
    /// Maximum observed travel duration, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_duration_max: Option<f64>,
}
