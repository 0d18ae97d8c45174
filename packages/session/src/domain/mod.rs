//! Domain layer for the study-room session engine.
//!
//! This module contains the session model and the interfaces the rest of the
//! crate depends on, independent of any transport or storage backend.

pub mod collaborator;
pub mod connection;
pub mod entity;
pub mod error;
pub mod event_source;
pub mod study;
pub mod value_object;

pub use collaborator::{KeyValueStore, PassageProvider, RoomCatalog, StudyAssistant};
pub use connection::{ConnectionLifecycle, ConnectionState};
pub use entity::{Message, Participant, Passage, RoomSession};
pub use error::{
    AssistantError, EventSourceError, PassageError, RoomError, StorageError, TransitionError,
    ValueObjectError,
};
pub use event_source::{EventSink, EventSource, InboundEvent, SessionSeed};
pub use study::{
    Bookmark, ClonedVoice, Highlight, Language, Note, StudyGuide, StudyRoom, StudyRoomDraft, Verse,
};
pub use value_object::{DisplayName, MessageId, MessageText, ParticipantId, RoomId, Timestamp};
