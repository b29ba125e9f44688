//! # ClickSync Player Library (clicksync-player)
//!
//! Client side of ClickSync: turns scheduled clicks into playback
//! decisions compensated for the device's measured output delay and gain,
//! and holds the calibration values the user tunes and saves.
//!
//! Audio synthesis and the transport delivering clicks are left to the
//! embedding application.

pub mod audio;
pub mod calibration;
pub mod compensator;
pub mod error;
pub mod local;
pub mod steps;
pub mod sync;

pub use audio::{db_to_lin, SoundType};
pub use calibration::ClientCalibration;
pub use compensator::{PlayDecision, PlaybackCompensator};
pub use error::{Error, Result};
pub use local::{JsonFileStore, LocalCalibration, LocalCalibrationStore, MemoryStore};
pub use steps::CalibrationStep;
pub use sync::{ConnectionStatus, SyncReport, SyncStatus};
