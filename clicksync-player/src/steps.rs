//! Calibration walkthrough steps

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::audio::SoundType;
use crate::error::Error;

/// Step of the calibration walkthrough shown to the user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationStep {
    /// Sync report and device identifier
    Details,
    /// Instructions
    #[default]
    Info,
    /// Delay tuning
    Delay,
    /// Gain tuning
    Gain,
    /// Save to the server
    Validation,
    /// Restore from the server
    Restore,
}

impl CalibrationStep {
    pub const ALL: [CalibrationStep; 6] = [
        CalibrationStep::Details,
        CalibrationStep::Info,
        CalibrationStep::Delay,
        CalibrationStep::Gain,
        CalibrationStep::Validation,
        CalibrationStep::Restore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CalibrationStep::Details => "details",
            CalibrationStep::Info => "info",
            CalibrationStep::Delay => "delay",
            CalibrationStep::Gain => "gain",
            CalibrationStep::Validation => "validation",
            CalibrationStep::Restore => "restore",
        }
    }

    /// Sound used while on this step; `None` keeps the current one
    pub fn sound(&self) -> Option<SoundType> {
        match self {
            CalibrationStep::Details => None,
            CalibrationStep::Info | CalibrationStep::Restore => Some(SoundType::Clack),
            CalibrationStep::Delay | CalibrationStep::Validation => Some(SoundType::Click),
            CalibrationStep::Gain => Some(SoundType::Noise),
        }
    }
}

impl FromStr for CalibrationStep {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CalibrationStep::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| Error::UnknownStep(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_sounds() {
        assert_eq!(CalibrationStep::Details.sound(), None);
        assert_eq!(CalibrationStep::Info.sound(), Some(SoundType::Clack));
        assert_eq!(CalibrationStep::Delay.sound(), Some(SoundType::Click));
        assert_eq!(CalibrationStep::Gain.sound(), Some(SoundType::Noise));
        assert_eq!(CalibrationStep::Validation.sound(), Some(SoundType::Click));
        assert_eq!(CalibrationStep::Restore.sound(), Some(SoundType::Clack));
    }

    #[test]
    fn test_step_names() {
        for step in CalibrationStep::ALL {
            assert_eq!(step.as_str().parse::<CalibrationStep>().unwrap(), step);
        }
        assert!("calibrate".parse::<CalibrationStep>().is_err());
    }
}
