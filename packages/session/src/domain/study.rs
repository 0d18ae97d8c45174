//! 学習機能まわりのレコード型
//!
//! ノート・ハイライト・ブックマーク・クローン音声のメタデータは KeyValueStore に JSON で保存される。

use serde::{Deserialize, Serialize};

/// 原語
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Hebrew,
    Greek,
    Aramaic,
}

/// 1節分の本文
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    pub number: u32,
    pub original_text: String,
    pub english_text: String,
    pub language: Language,
}

/// AI アシスタントが生成する学習ガイド
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StudyGuide {
    pub summary: String,
    pub key_themes: Vec<String>,
    pub questions: Vec<String>,
}

/// 公開ルーム一覧に載る学習ルーム
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyRoom {
    pub id: String,
    pub name: String,
    pub description: String,
    pub host: String,
    pub participants: u32,
    pub schedule: Option<String>,
    pub is_public: bool,
}

/// ルーム作成時の入力（ID は作成時に採番される）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyRoomDraft {
    pub name: String,
    pub description: String,
    pub host: String,
    pub schedule: Option<String>,
    pub is_public: bool,
}

/// 節に付けたノート
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// 節のハイライト（書名・章・節ごとに1つ）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub id: String,
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
    pub color: String,
    pub created_at: i64,
}

impl Highlight {
    pub fn is_at(&self, book: &str, chapter: u32, verse: u32) -> bool {
        self.book == book && self.chapter == chapter && self.verse == verse
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub book: String,
    pub chapter: u32,
    pub verse: Option<u32>,
    pub label: Option<String>,
    pub created_at: i64,
}

/// クローン音声のメタデータ（音声ファイル本体は外部に保存される）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClonedVoice {
    pub id: String,
    pub name: String,
    pub sample_uri: String,
    pub created_at: i64,
}
