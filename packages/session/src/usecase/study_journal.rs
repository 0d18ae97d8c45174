//! UseCase: 学習ジャーナル（ノート・ハイライト・ブックマーク・クローン音声）
//!
//! 各コレクションは KeyValueStore の固定キーに JSON 配列として保存される。
//! 保存済みの JSON が壊れている場合は空として扱い、警告ログを出す。

use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use studyroom_shared::time::Clock;

use crate::domain::{Bookmark, ClonedVoice, Highlight, KeyValueStore, Note, StorageError};

pub const NOTES_KEY: &str = "studyroom_notes";
pub const HIGHLIGHTS_KEY: &str = "studyroom_highlights";
pub const BOOKMARKS_KEY: &str = "studyroom_bookmarks";
pub const CLONED_VOICES_KEY: &str = "studyroom_cloned_voices";

const ALL_KEYS: [&str; 4] = [NOTES_KEY, HIGHLIGHTS_KEY, BOOKMARKS_KEY, CLONED_VOICES_KEY];

/// 学習ジャーナルのユースケース
pub struct StudyJournal {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl StudyJournal {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    // ---- notes ----

    /// ノートを保存する
    ///
    /// 同じ ID のノートがあれば内容を置き換え、作成日時を引き継いで更新日時を進める。
    pub async fn save_note(&self, note: Note) -> Result<Note, StorageError> {
        let now = self.clock.now_millis();
        let mut notes: Vec<Note> = self.load(NOTES_KEY).await?;

        let saved = match notes.iter_mut().find(|existing| existing.id == note.id) {
            Some(existing) => {
                *existing = Note {
                    created_at: existing.created_at,
                    updated_at: now,
                    ..note
                };
                existing.clone()
            }
            None => {
                let created = Note {
                    created_at: now,
                    updated_at: now,
                    ..note
                };
                notes.push(created.clone());
                created
            }
        };

        self.store_list(NOTES_KEY, &notes).await?;
        Ok(saved)
    }

    pub async fn notes(&self) -> Result<Vec<Note>, StorageError> {
        self.load(NOTES_KEY).await
    }

    /// 指定した書名・章のノート
    pub async fn notes_for_passage(
        &self,
        book: &str,
        chapter: u32,
    ) -> Result<Vec<Note>, StorageError> {
        let notes: Vec<Note> = self.load(NOTES_KEY).await?;
        Ok(notes
            .into_iter()
            .filter(|note| note.book == book && note.chapter == chapter)
            .collect())
    }

    pub async fn delete_note(&self, note_id: &str) -> Result<(), StorageError> {
        let mut notes: Vec<Note> = self.load(NOTES_KEY).await?;
        notes.retain(|note| note.id != note_id);
        self.store_list(NOTES_KEY, &notes).await
    }

    // ---- highlights ----

    /// ハイライトを保存する（同じ節のハイライトは置き換える）
    pub async fn save_highlight(&self, highlight: Highlight) -> Result<Highlight, StorageError> {
        let mut highlights: Vec<Highlight> = self.load(HIGHLIGHTS_KEY).await?;

        let saved = match highlights
            .iter_mut()
            .find(|existing| existing.is_at(&highlight.book, highlight.chapter, highlight.verse))
        {
            Some(existing) => {
                *existing = highlight;
                existing.clone()
            }
            None => {
                let created = Highlight {
                    created_at: self.clock.now_millis(),
                    ..highlight
                };
                highlights.push(created.clone());
                created
            }
        };

        self.store_list(HIGHLIGHTS_KEY, &highlights).await?;
        Ok(saved)
    }

    pub async fn highlights(&self) -> Result<Vec<Highlight>, StorageError> {
        self.load(HIGHLIGHTS_KEY).await
    }

    pub async fn highlights_for_passage(
        &self,
        book: &str,
        chapter: u32,
    ) -> Result<Vec<Highlight>, StorageError> {
        let highlights: Vec<Highlight> = self.load(HIGHLIGHTS_KEY).await?;
        Ok(highlights
            .into_iter()
            .filter(|highlight| highlight.book == book && highlight.chapter == chapter)
            .collect())
    }

    pub async fn remove_highlight(
        &self,
        book: &str,
        chapter: u32,
        verse: u32,
    ) -> Result<(), StorageError> {
        let mut highlights: Vec<Highlight> = self.load(HIGHLIGHTS_KEY).await?;
        highlights.retain(|highlight| !highlight.is_at(book, chapter, verse));
        self.store_list(HIGHLIGHTS_KEY, &highlights).await
    }

    // ---- bookmarks ----

    pub async fn add_bookmark(&self, bookmark: Bookmark) -> Result<Bookmark, StorageError> {
        let mut bookmarks: Vec<Bookmark> = self.load(BOOKMARKS_KEY).await?;
        let created = Bookmark {
            created_at: self.clock.now_millis(),
            ..bookmark
        };
        bookmarks.push(created.clone());
        self.store_list(BOOKMARKS_KEY, &bookmarks).await?;
        Ok(created)
    }

    pub async fn bookmarks(&self) -> Result<Vec<Bookmark>, StorageError> {
        self.load(BOOKMARKS_KEY).await
    }

    pub async fn remove_bookmark(&self, bookmark_id: &str) -> Result<(), StorageError> {
        let mut bookmarks: Vec<Bookmark> = self.load(BOOKMARKS_KEY).await?;
        bookmarks.retain(|bookmark| bookmark.id != bookmark_id);
        self.store_list(BOOKMARKS_KEY, &bookmarks).await
    }

    // ---- cloned voices ----

    pub async fn save_cloned_voice(&self, voice: ClonedVoice) -> Result<ClonedVoice, StorageError> {
        let mut voices: Vec<ClonedVoice> = self.load(CLONED_VOICES_KEY).await?;
        let created = ClonedVoice {
            created_at: self.clock.now_millis(),
            ..voice
        };
        voices.push(created.clone());
        self.store_list(CLONED_VOICES_KEY, &voices).await?;
        Ok(created)
    }

    pub async fn cloned_voices(&self) -> Result<Vec<ClonedVoice>, StorageError> {
        self.load(CLONED_VOICES_KEY).await
    }

    pub async fn delete_cloned_voice(&self, voice_id: &str) -> Result<(), StorageError> {
        let mut voices: Vec<ClonedVoice> = self.load(CLONED_VOICES_KEY).await?;
        voices.retain(|voice| voice.id != voice_id);
        self.store_list(CLONED_VOICES_KEY, &voices).await
    }

    /// ジャーナルの全データを削除する
    pub async fn clear_all(&self) -> Result<(), StorageError> {
        for key in ALL_KEYS {
            self.store.remove(key).await?;
        }
        tracing::info!("Cleared all study journal data");
        Ok(())
    }

    async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, StorageError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(records) => Ok(records),
            Err(e) => {
                tracing::warn!("Discarding unreadable records under '{}': {}", key, e);
                Ok(Vec::new())
            }
        }
    }

    async fn store_list<T: Serialize>(&self, key: &str, records: &[T]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(records).map_err(|source| StorageError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.store.set(key, raw).await
    }
}
