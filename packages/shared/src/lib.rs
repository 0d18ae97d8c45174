//! Shared utilities for the study-room workspace.
//!
//! - `logger`: tracing subscriber setup for the binaries
//! - `time`: clock abstraction and timestamp rendering

pub mod logger;
pub mod time;
