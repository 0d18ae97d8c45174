//! Error types for the terminal client.

use thiserror::Error;

use studyroom_session::{config::ConfigError, usecase::JoinError};

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Command-line tunables did not pass validation
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The join request itself is invalid; retrying would not help
    #[error("Cannot join: {0}")]
    InvalidJoin(JoinError),

    /// Every join attempt failed
    #[error("Failed to join room '{room}' after {attempts} attempts")]
    JoinFailed { room: String, attempts: u32 },
}
