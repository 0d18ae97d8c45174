//! Study-room session engine.
//!
//! Keeps a participant's view of one live study room consistent: the
//! connection lifecycle, the roster, the ordered chat log and the observers
//! subscribed to each of them. Room activity arrives through an
//! [`EventSource`](domain::EventSource); the bundled
//! [`ActivitySimulator`](infrastructure::ActivitySimulator) drives it with
//! timers.

// layers
pub mod domain;
pub mod infrastructure;
pub mod usecase;

pub mod config;

pub use config::{SessionConfig, SimulatorConfig};
pub use usecase::{RoomCoordinator, Subscription};
