//! Value Object 定義
//!
//! 生成時にバリデーションを行い、不正な値を持つインスタンスが存在しないことを保証します。

use std::fmt;

use uuid::Uuid;

use super::error::ValueObjectError;

/// 表示名の最大文字数
pub const MAX_DISPLAY_NAME_CHARS: usize = 64;

/// 学習ルーム ID
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId(String);

impl RoomId {
    /// 新しい RoomId を作成（前後の空白は除去される）
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::RoomIdEmpty);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// `room-<uuid>` 形式の ID を生成
    pub fn generate() -> Self {
        Self(format!("room-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 参加者 ID（セッション内で一意）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// 新しい ParticipantId を作成
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::ParticipantIdEmpty);
        }
        Ok(Self(value))
    }

    /// `user-<uuid>` 形式の ID を生成
    pub fn generate() -> Self {
        Self(format!("user-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 表示名
///
/// 前後の空白を除去したうえで空でなく、[`MAX_DISPLAY_NAME_CHARS`] 文字以下であること。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::DisplayNameEmpty);
        }
        let length = trimmed.chars().count();
        if length > MAX_DISPLAY_NAME_CHARS {
            return Err(ValueObjectError::DisplayNameTooLong {
                length,
                max: MAX_DISPLAY_NAME_CHARS,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for DisplayName {
    type Error = ValueObjectError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// メッセージ ID
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::MessageIdEmpty);
        }
        Ok(Self(value))
    }

    /// `msg-<uuid>` 形式の ID を生成
    pub fn generate() -> Self {
        Self(format!("msg-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// メッセージ本文
///
/// 空白のみの本文は拒否する。本文そのものは入力どおりに保持する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageText(String);

impl MessageText {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::MessageTextEmpty);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for MessageText {
    type Error = ValueObjectError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

/// Unix タイムスタンプ（ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_id_trims_whitespace() {
        // テスト項目: RoomId は前後の空白を除去して保持する
        // given (前提条件):
        let raw = "  room-1 ".to_string();

        // when (操作):
        let room_id = RoomId::new(raw);

        // then (期待する結果):
        assert_eq!(room_id.unwrap().as_str(), "room-1");
    }

    #[test]
    fn test_room_id_rejects_blank() {
        // テスト項目: 空白のみの RoomId はエラーになる
        // given (前提条件):
        let raw = "   ".to_string();

        // when (操作):
        let result = RoomId::new(raw);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::RoomIdEmpty));
    }

    #[test]
    fn test_generated_ids_are_prefixed_and_unique() {
        // テスト項目: 生成された ID はプレフィックス付きで重複しない
        // given (前提条件):

        // when (操作):
        let first = MessageId::generate();
        let second = MessageId::generate();
        let participant = ParticipantId::generate();
        let room = RoomId::generate();

        // then (期待する結果):
        assert!(first.as_str().starts_with("msg-"));
        assert_ne!(first, second);
        assert!(participant.as_str().starts_with("user-"));
        assert!(room.as_str().starts_with("room-"));
    }

    #[test]
    fn test_display_name_rejects_too_long() {
        // テスト項目: 上限を超える表示名はエラーになる
        // given (前提条件):
        let raw = "a".repeat(MAX_DISPLAY_NAME_CHARS + 1);

        // when (操作):
        let result = DisplayName::new(raw);

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ValueObjectError::DisplayNameTooLong {
                length: MAX_DISPLAY_NAME_CHARS + 1,
                max: MAX_DISPLAY_NAME_CHARS,
            })
        );
    }

    #[test]
    fn test_display_name_counts_characters_not_bytes() {
        // テスト項目: 表示名の長さはバイト数ではなく文字数で判定される
        // given (前提条件):
        let raw = "あ".repeat(MAX_DISPLAY_NAME_CHARS);

        // when (操作):
        let result = DisplayName::new(raw);

        // then (期待する結果):
        assert!(result.is_ok());
    }

    #[test]
    fn test_message_text_keeps_original_content() {
        // テスト項目: MessageText は本文を入力どおりに保持する
        // given (前提条件):
        let raw = "  Hello  ".to_string();

        // when (操作):
        let text = MessageText::new(raw).unwrap();

        // then (期待する結果):
        assert_eq!(text.as_str(), "  Hello  ");
    }

    #[test]
    fn test_message_text_rejects_whitespace_only() {
        // テスト項目: 空白のみの本文はエラーになる
        // given (前提条件):
        let raw = " \n\t ".to_string();

        // when (操作):
        let result = MessageText::new(raw);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::MessageTextEmpty));
    }
}
