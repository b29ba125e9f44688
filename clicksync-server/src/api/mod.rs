//! HTTP API module
//!
//! Control endpoints, calibration endpoints and the SSE event stream.

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{build_router, run, AppContext};
