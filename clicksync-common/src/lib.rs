//! # ClickSync Common Library
//!
//! Shared code for the ClickSync server and player including:
//! - Synchronized clock abstraction
//! - Levenshtein matcher for device identifiers
//! - Calibration record types and wire messages
//! - Event types (ClickSyncEvent enum) and EventBus
//! - Bootstrap configuration loading
//! - Time utilities

pub mod calibration;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod levenshtein;
pub mod protocol;
pub mod time;

pub use error::{Error, Result};
pub use levenshtein::{Levenshtein, MatchResult};
