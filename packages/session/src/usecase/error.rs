//! UseCase 層のエラー型

use std::time::Duration;

use thiserror::Error;

use crate::domain::{EventSourceError, RoomError, TransitionError, ValueObjectError};

/// ルーム参加の失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("invalid join request: {0}")]
    InvalidRequest(#[from] ValueObjectError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Transport(#[from] EventSourceError),

    #[error("room did not accept the join within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Room(#[from] RoomError),
}

/// メッセージ送信の拒否理由
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("not connected to a room")]
    NotConnected,

    #[error("message text is empty")]
    EmptyText,
}
