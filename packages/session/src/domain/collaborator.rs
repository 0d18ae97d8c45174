//! 外部コラボレーターの trait 定義
//!
//! 永続化・本文取得・AI アシスタント・ルーム一覧はいずれも単純な要求/応答で利用する。
//! 具体的な実装は Infrastructure 層が提供する（依存性の逆転）。

use async_trait::async_trait;

use super::{
    error::{AssistantError, PassageError, StorageError},
    study::{StudyGuide, StudyRoom, Verse},
};

/// キー単位の読み書きを提供するストア
///
/// レコードはキーごとに独立しており、後勝ちで上書きされる。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// 書名・章から節の並びを返す本文プロバイダー
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PassageProvider: Send + Sync {
    /// 節番号の昇順で返す
    async fn chapter(&self, book: &str, chapter: u32) -> Result<Vec<Verse>, PassageError>;
}

/// AI アシスタント
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StudyAssistant: Send + Sync {
    /// 箇所の本文（context）から学習ガイドを生成する
    async fn study_guide(&self, reference: &str, context: &str)
    -> Result<StudyGuide, AssistantError>;

    /// 会話形式の応答を返す
    async fn reply(&self, prompt: &str, context: Option<String>) -> Result<String, AssistantError>;
}

/// 学習ルームの一覧を管理するカタログ
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomCatalog: Send + Sync {
    async fn list(&self) -> Vec<StudyRoom>;

    async fn insert(&self, room: StudyRoom);
}
