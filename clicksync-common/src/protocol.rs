//! Wire messages exchanged between control clients, the server and players
//!
//! | Direction | Message | Type |
//! |---|---|---|
//! | control → server | reconfigure | [`SchedulerPatch`] |
//! | server → all | parameters broadcast | [`SchedulerConfig`] |
//! | server → players | click | [`ScheduledClick`] |
//! | player → server | calibration store | [`CalibrationStoreRequest`] |
//! | player → server | calibration request | [`CalibrationRequest`] |
//! | server → player | calibration response | [`CalibrationResponse`] |
//!
//! Times and durations are synchronized seconds (`f64`), the unit of the
//! [`SyncClock`](crate::clock::SyncClock).

use serde::{Deserialize, Serialize};

use crate::calibration::{AudioCorrections, NetworkStats};
use crate::{Error, Result};

/// `remaining` value meaning "click forever"
pub const UNBOUNDED: i64 = -1;

/// Click scheduler parameters
///
/// `remaining == -1` is unbounded, `remaining == 0` is stopped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Whether the scheduler is running
    pub active: bool,
    /// Emission window ahead of each target, in seconds (positive)
    pub lookahead: f64,
    /// Spacing between clicks, in seconds
    pub period: f64,
    /// Clicks left to emit (-1 unbounded)
    #[serde(alias = "number")]
    pub remaining: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            active: true,
            lookahead: 1.0,
            period: 1.0,
            remaining: UNBOUNDED,
        }
    }
}

impl SchedulerConfig {
    /// True when `remaining` is the unbounded sentinel
    pub fn is_unbounded(&self) -> bool {
        self.remaining == UNBOUNDED
    }

    /// Merge the fields present in `patch`, leaving the others untouched
    pub fn apply(&mut self, patch: &SchedulerPatch) {
        if let Some(active) = patch.active {
            self.active = active;
        }
        if let Some(lookahead) = patch.lookahead {
            self.lookahead = lookahead;
        }
        if let Some(period) = patch.period {
            self.period = period;
        }
        if let Some(remaining) = patch.remaining {
            self.remaining = remaining;
        }
    }

    /// Check that the parameters can drive a scheduler
    pub fn validate(&self) -> Result<()> {
        validate_lookahead(self.lookahead)?;
        validate_period(self.period)?;
        validate_remaining(self.remaining)
    }
}

/// Partial scheduler reconfiguration
///
/// Absent fields are left unchanged. Unknown fields are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookahead: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<f64>,
    #[serde(default, alias = "number", skip_serializing_if = "Option::is_none")]
    pub remaining: Option<i64>,
}

impl SchedulerPatch {
    /// Reject values that would break the scheduler
    pub fn validate(&self) -> Result<()> {
        if let Some(lookahead) = self.lookahead {
            validate_lookahead(lookahead)?;
        }
        if let Some(period) = self.period {
            validate_period(period)?;
        }
        if let Some(remaining) = self.remaining {
            validate_remaining(remaining)?;
        }
        Ok(())
    }

    /// True when no field is present
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn validate_lookahead(lookahead: f64) -> Result<()> {
    // A zero window finds every target late and drains a bounded count
    if !lookahead.is_finite() || lookahead <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "lookahead must be a positive number of seconds, got {}",
            lookahead
        )));
    }
    Ok(())
}

fn validate_period(period: f64) -> Result<()> {
    if !period.is_finite() || period <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "period must be a positive number of seconds, got {}",
            period
        )));
    }
    Ok(())
}

fn validate_remaining(remaining: i64) -> Result<()> {
    if remaining < UNBOUNDED {
        return Err(Error::InvalidInput(format!(
            "remaining must be -1 (unbounded) or a count >= 0, got {}",
            remaining
        )));
    }
    Ok(())
}

/// A click to play at an exact synchronized instant
///
/// Emitted once, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledClick {
    /// Target synchronized time in seconds
    #[serde(rename = "start")]
    pub target_time: f64,
}

impl ScheduledClick {
    pub fn new(target_time: f64) -> Self {
        Self { target_time }
    }
}

/// Player → server: persist calibration values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationStoreRequest {
    /// Device identifier (usually the user-agent string)
    #[serde(alias = "userAgent")]
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioCorrections>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkStats>,
}

/// Player → server: ask for the calibration of a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRequest {
    #[serde(alias = "userAgent")]
    pub identifier: String,
}

/// Server → player: current calibration values
///
/// Absent fields mean "no correction known".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioCorrections>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkStats>,
}

impl CalibrationResponse {
    /// True when neither audio nor network values are known
    pub fn is_empty(&self) -> bool {
        self.audio.is_none() && self.network.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CorrectionRecord;

    #[test]
    fn test_default_config_runs_unbounded() {
        let config = SchedulerConfig::default();
        assert!(config.active);
        assert_eq!(config.lookahead, 1.0);
        assert_eq!(config.period, 1.0);
        assert!(config.is_unbounded());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_patch_merges_only_present_fields() {
        let mut config = SchedulerConfig::default();
        let patch: SchedulerPatch = serde_json::from_str(r#"{"period": 0.5}"#).unwrap();
        config.apply(&patch);

        assert_eq!(config.period, 0.5);
        assert!(config.active);
        assert_eq!(config.lookahead, 1.0);
        assert_eq!(config.remaining, UNBOUNDED);
    }

    #[test]
    fn test_patch_ignores_unknown_fields_and_accepts_number_alias() {
        let patch: SchedulerPatch =
            serde_json::from_str(r#"{"number": 4, "clickType": "clack"}"#).unwrap();
        assert_eq!(patch.remaining, Some(4));
        assert_eq!(patch.active, None);
        assert!(!patch.is_empty());

        let empty: SchedulerPatch = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_patch_validation() {
        let bad_period = SchedulerPatch {
            period: Some(0.0),
            ..Default::default()
        };
        assert!(bad_period.validate().is_err());

        let bad_lookahead = SchedulerPatch {
            lookahead: Some(-0.1),
            ..Default::default()
        };
        assert!(bad_lookahead.validate().is_err());

        let zero_lookahead = SchedulerPatch {
            lookahead: Some(0.0),
            remaining: Some(4),
            ..Default::default()
        };
        assert!(zero_lookahead.validate().is_err());

        let bad_remaining = SchedulerPatch {
            remaining: Some(-2),
            ..Default::default()
        };
        assert!(bad_remaining.validate().is_err());

        let ok = SchedulerPatch {
            active: Some(false),
            lookahead: Some(0.05),
            period: Some(0.25),
            remaining: Some(0),
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_click_wire_format() {
        let click = ScheduledClick::new(12.5);
        assert_eq!(serde_json::to_string(&click).unwrap(), r#"{"start":12.5}"#);
    }

    #[test]
    fn test_store_request_accepts_user_agent_alias() {
        let request: CalibrationStoreRequest = serde_json::from_str(
            r#"{"userAgent": "Mozilla/5.0 (A)", "audio": {"internal": {"delay": 0.012, "gain": -3}}}"#,
        )
        .unwrap();
        assert_eq!(request.identifier, "Mozilla/5.0 (A)");
        let audio = request.audio.unwrap();
        assert_eq!(audio["internal"], CorrectionRecord::new(0.012, -3.0));
        assert!(request.network.is_none());
    }

    #[test]
    fn test_empty_response_serializes_to_empty_object() {
        let response = CalibrationResponse::default();
        assert!(response.is_empty());
        assert_eq!(serde_json::to_string(&response).unwrap(), "{}");
    }
}
