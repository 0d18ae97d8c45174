//! Entity 定義
//!
//! - `Participant`: ルームの参加者
//! - `Message`: チャットメッセージ（生成後は不変）
//! - `Passage`: 学習中の聖書箇所
//! - `RoomSession`: 1つの学習ルームのセッション状態（名簿とメッセージログ）

use std::fmt;

use super::{
    error::RoomError,
    value_object::{DisplayName, MessageId, MessageText, ParticipantId, RoomId, Timestamp},
};

/// 参加者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub display_name: DisplayName,
    pub is_host: bool,
    pub joined_at: Timestamp,
}

impl Participant {
    pub fn new(
        id: ParticipantId,
        display_name: DisplayName,
        is_host: bool,
        joined_at: Timestamp,
    ) -> Self {
        Self {
            id,
            display_name,
            is_host,
            joined_at,
        }
    }
}

/// チャットメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub text: MessageText,
    pub sender: DisplayName,
    pub timestamp: Timestamp,
    /// ローカル参加者が送信したメッセージか
    pub is_own: bool,
}

impl Message {
    /// ローカル参加者が送信したメッセージを作成
    pub fn outgoing(text: MessageText, sender: DisplayName, timestamp: Timestamp) -> Self {
        Self {
            id: MessageId::generate(),
            text,
            sender,
            timestamp,
            is_own: true,
        }
    }

    /// 他の参加者から受信したメッセージを作成
    pub fn incoming(text: MessageText, sender: DisplayName, timestamp: Timestamp) -> Self {
        Self {
            id: MessageId::generate(),
            text,
            sender,
            timestamp,
            is_own: false,
        }
    }
}

/// 聖書箇所（書名・章・節の範囲）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passage {
    pub book: String,
    pub chapter: u32,
    pub first_verse: u32,
    pub last_verse: u32,
}

impl Passage {
    pub fn new(book: impl Into<String>, chapter: u32, first_verse: u32, last_verse: u32) -> Self {
        Self {
            book: book.into(),
            chapter,
            first_verse: first_verse.min(last_verse),
            last_verse: first_verse.max(last_verse),
        }
    }

    pub fn contains_verse(&self, verse: u32) -> bool {
        (self.first_verse..=self.last_verse).contains(&verse)
    }
}

impl fmt::Display for Passage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first_verse == self.last_verse {
            write!(f, "{} {}:{}", self.book, self.chapter, self.first_verse)
        } else {
            write!(
                f,
                "{} {}:{}-{}",
                self.book, self.chapter, self.first_verse, self.last_verse
            )
        }
    }
}

/// 1つの学習ルームのセッション状態
///
/// 参加者は ID で一意、メッセージログは追加のみ（並べ替え・変更しない）。
#[derive(Debug, Clone)]
pub struct RoomSession {
    pub room_id: RoomId,
    participants: Vec<Participant>,
    messages: Vec<Message>,
    pub current_passage: Passage,
}

impl RoomSession {
    pub fn new(room_id: RoomId, current_passage: Passage) -> Self {
        Self {
            room_id,
            participants: Vec::new(),
            messages: Vec::new(),
            current_passage,
        }
    }

    /// 参加者を追加（ID が重複する場合はエラー）
    pub fn add_participant(&mut self, participant: Participant) -> Result<(), RoomError> {
        if self.contains_participant(&participant.id) {
            return Err(RoomError::DuplicateParticipant(
                participant.id.as_str().to_string(),
            ));
        }
        self.participants.push(participant);
        Ok(())
    }

    /// 参加者を削除（存在しない場合は None）
    pub fn remove_participant(&mut self, id: &ParticipantId) -> Option<Participant> {
        let index = self.participants.iter().position(|p| &p.id == id)?;
        Some(self.participants.remove(index))
    }

    pub fn contains_participant(&self, id: &ParticipantId) -> bool {
        self.participants.iter().any(|p| &p.id == id)
    }

    pub fn contains_display_name(&self, name: &DisplayName) -> bool {
        self.participants.iter().any(|p| &p.display_name == name)
    }

    /// メッセージをログの末尾に追加
    pub fn append_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}
