//! Infrastructure 層
//!
//! Domain 層が定義する trait の具体的な実装。

pub mod assistant;
pub mod passage;
pub mod repository;
pub mod simulator;

pub use assistant::OfflineStudyAssistant;
pub use passage::SamplePassageProvider;
pub use repository::inmemory::{InMemoryKeyValueStore, InMemoryRoomCatalog};
pub use simulator::ActivitySimulator;
