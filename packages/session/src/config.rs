//! Configuration for the room coordinator and the activity simulator.
//!
//! Defaults reproduce the behaviour of the hosted study rooms: a 500 ms join
//! handshake, roster churn every 10 seconds and replies arriving 2 to 5 seconds
//! after a message is sent.

use std::time::Duration;

use thiserror::Error;

use crate::domain::Passage;

/// Invalid configuration values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("churn probability must be within 0.0..=1.0, got {0}")]
    ChurnProbabilityOutOfRange(f64),

    #[error("roster floor ({min}) must not exceed roster cap ({max})")]
    RosterBounds { min: usize, max: usize },

    #[error("reply delay range is empty ({min:?}..{max:?})")]
    EmptyReplyDelay { min: Duration, max: Duration },

    #[error("churn interval must be greater than zero")]
    ZeroChurnInterval,

    #[error("join timeout must be greater than zero")]
    ZeroJoinTimeout,
}

/// Room coordinator settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Upper bound on the transport handshake; a join that exceeds it fails closed.
    pub join_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            join_timeout: Duration::from_secs(10),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.join_timeout.is_zero() {
            return Err(ConfigError::ZeroJoinTimeout);
        }
        Ok(())
    }
}

/// Participant present when the local user joins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedParticipant {
    pub id: String,
    pub name: String,
    pub is_host: bool,
}

/// Message already posted when the local user joins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedMessage {
    pub sender: String,
    pub text: String,
    /// How long before the join the message was posted
    pub age: Duration,
}

/// Activity simulator settings
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub join_delay: Duration,
    pub churn_interval: Duration,
    /// Chance that a tick changes the roster at all
    pub churn_probability: f64,
    /// Churn never removes a participant when the roster is at or below this size
    pub min_roster: usize,
    /// Churn never adds a participant when the roster is at or above this size
    pub max_roster: usize,
    /// Inclusive lower bound of the reply delay
    pub reply_delay_min: Duration,
    /// Exclusive upper bound of the reply delay
    pub reply_delay_max: Duration,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
    pub initial_participants: Vec<SeedParticipant>,
    pub initial_messages: Vec<SeedMessage>,
    pub name_pool: Vec<String>,
    pub reply_pool: Vec<String>,
    pub passage: Passage,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            join_delay: Duration::from_millis(500),
            churn_interval: Duration::from_secs(10),
            churn_probability: 0.3,
            min_roster: 3,
            max_roster: 15,
            reply_delay_min: Duration::from_secs(2),
            reply_delay_max: Duration::from_secs(5),
            seed: None,
            initial_participants: vec![
                SeedParticipant {
                    id: "host-1".to_string(),
                    name: "Pastor Michael".to_string(),
                    is_host: true,
                },
                SeedParticipant {
                    id: "user-2".to_string(),
                    name: "Sarah".to_string(),
                    is_host: false,
                },
                SeedParticipant {
                    id: "user-3".to_string(),
                    name: "David".to_string(),
                    is_host: false,
                },
            ],
            initial_messages: vec![
                SeedMessage {
                    sender: "Pastor Michael".to_string(),
                    text: "Welcome everyone! Let's begin our study of John 3.".to_string(),
                    age: Duration::from_secs(300),
                },
                SeedMessage {
                    sender: "Sarah".to_string(),
                    text: "The Greek word for \"again\" here is fascinating.".to_string(),
                    age: Duration::from_secs(240),
                },
            ],
            name_pool: ["Ruth", "James", "Mary", "Peter", "John", "Martha"]
                .into_iter()
                .map(String::from)
                .collect(),
            reply_pool: [
                "That's a great point!",
                "I never thought of it that way.",
                "Can you elaborate on that?",
                "The original Greek really clarifies this.",
                "This connects to what we studied last week.",
                "Amen to that!",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            passage: Passage::new("John", 3, 1, 21),
        }
    }
}

impl SimulatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.churn_probability) {
            return Err(ConfigError::ChurnProbabilityOutOfRange(
                self.churn_probability,
            ));
        }
        if self.min_roster > self.max_roster {
            return Err(ConfigError::RosterBounds {
                min: self.min_roster,
                max: self.max_roster,
            });
        }
        if self.reply_delay_min >= self.reply_delay_max {
            return Err(ConfigError::EmptyReplyDelay {
                min: self.reply_delay_min,
                max: self.reply_delay_max,
            });
        }
        if self.churn_interval.is_zero() {
            return Err(ConfigError::ZeroChurnInterval);
        }
        Ok(())
    }
}
