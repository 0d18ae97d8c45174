//! Interactive terminal client for simulated study rooms.

pub mod error;
mod formatter;
pub mod runner;
mod session;
mod ui;

pub use error::ClientError;
pub use runner::{ClientOptions, run_client};
