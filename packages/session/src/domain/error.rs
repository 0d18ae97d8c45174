//! ドメイン層のエラー型

use thiserror::Error;

use super::connection::ConnectionState;

/// Value Object の生成エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("room id must not be empty")]
    RoomIdEmpty,

    #[error("participant id must not be empty")]
    ParticipantIdEmpty,

    #[error("display name must not be empty")]
    DisplayNameEmpty,

    #[error("display name is {length} characters long (max {max})")]
    DisplayNameTooLong { length: usize, max: usize },

    #[error("message id must not be empty")]
    MessageIdEmpty,

    #[error("message text must not be empty")]
    MessageTextEmpty,
}

/// RoomSession 操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("participant '{0}' is already in the room")]
    DuplicateParticipant(String),
}

/// 接続状態の不正な遷移
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal connection transition from {from} to {to}")]
pub struct TransitionError {
    pub from: ConnectionState,
    pub to: ConnectionState,
}

/// イベントソース（トランスポート）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventSourceError {
    #[error("failed to connect to room '{room_id}': {reason}")]
    ConnectFailed { room_id: String, reason: String },

    #[error("event source is not connected")]
    NotConnected,

    #[error("failed to publish message: {0}")]
    PublishFailed(String),
}

/// KeyValueStore のエラー
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("failed to encode record for key '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// PassageProvider のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PassageError {
    #[error("passage {book} {chapter} not found")]
    NotFound { book: String, chapter: u32 },

    #[error("passage provider unavailable: {0}")]
    Unavailable(String),
}

/// StudyAssistant のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssistantError {
    #[error("prompt must not be empty")]
    EmptyPrompt,

    #[error("assistant request failed: {0}")]
    RequestFailed(String),

    #[error(transparent)]
    Passage(#[from] PassageError),
}
