//! インメモリ実装

pub mod key_value;
pub mod room_catalog;

pub use key_value::InMemoryKeyValueStore;
pub use room_catalog::InMemoryRoomCatalog;
