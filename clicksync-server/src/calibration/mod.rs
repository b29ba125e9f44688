//! Calibration persistence
//!
//! Devices save the delay and gain they measured per audio output; on
//! reconnect they get back the values stored under their identifier, or
//! under the closest stored identifier when theirs changed slightly.

pub mod history;
pub mod store;

pub use history::{CalibrationData, DeviceCalibration, RecordedAt};
pub use store::{AppendSummary, CalibrationStore, Lookup};
