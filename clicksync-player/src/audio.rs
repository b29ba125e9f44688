//! Sound types and gain conversion

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Duration of the fallback sound played for a late click, in seconds
pub const FALLBACK_DURATION: f64 = 0.1;

/// Sound played for a click
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundType {
    /// Two-sample impulse, for precise delay matching
    Click,
    /// Short square burst, easier to hear
    Clack,
    /// Half a second of white noise, for loudness matching
    Noise,
}

impl SoundType {
    pub const ALL: [SoundType; 3] = [SoundType::Click, SoundType::Clack, SoundType::Noise];

    pub fn as_str(&self) -> &'static str {
        match self {
            SoundType::Click => "click",
            SoundType::Clack => "clack",
            SoundType::Noise => "noise",
        }
    }
}

impl fmt::Display for SoundType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SoundType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SoundType::ALL
            .into_iter()
            .find(|sound| sound.as_str() == s)
            .ok_or_else(|| Error::UnknownSound(s.to_string()))
    }
}

/// Convert decibels to a linear gain factor (1e-3 for -60 dB)
pub fn db_to_lin(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}
