//! InMemory RoomCatalog 実装

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{RoomCatalog, StudyRoom};

/// インメモリのルームカタログ（登録順を保持する）
#[derive(Debug, Default)]
pub struct InMemoryRoomCatalog {
    rooms: Mutex<Vec<StudyRoom>>,
}

impl InMemoryRoomCatalog {
    pub fn new(rooms: Vec<StudyRoom>) -> Self {
        Self {
            rooms: Mutex::new(rooms),
        }
    }

    /// 3つのサンプル公開ルームを登録したカタログ
    pub fn with_sample_rooms() -> Self {
        Self::new(sample_rooms())
    }
}

#[async_trait]
impl RoomCatalog for InMemoryRoomCatalog {
    async fn list(&self) -> Vec<StudyRoom> {
        self.rooms.lock().await.clone()
    }

    async fn insert(&self, room: StudyRoom) {
        let mut rooms = self.rooms.lock().await;
        match rooms.iter_mut().find(|existing| existing.id == room.id) {
            Some(existing) => *existing = room,
            None => rooms.push(room),
        }
    }
}

fn sample_rooms() -> Vec<StudyRoom> {
    vec![
        StudyRoom {
            id: "room-1".to_string(),
            name: "Romans Deep Study".to_string(),
            description: "Exploring Paul's letter to the Romans".to_string(),
            host: "Pastor Michael".to_string(),
            participants: 12,
            schedule: Some("Mondays 7pm".to_string()),
            is_public: true,
        },
        StudyRoom {
            id: "room-2".to_string(),
            name: "Psalms for Today".to_string(),
            description: "Finding comfort and wisdom in the Psalms".to_string(),
            host: "Sarah Johnson".to_string(),
            participants: 8,
            schedule: Some("Wednesdays 6pm".to_string()),
            is_public: true,
        },
        StudyRoom {
            id: "room-3".to_string(),
            name: "Gospel of John".to_string(),
            description: "Verse by verse study of John's Gospel".to_string(),
            host: "David Chen".to_string(),
            participants: 15,
            schedule: Some("Fridays 8pm".to_string()),
            is_public: true,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sample_catalog_lists_three_rooms() {
        // テスト項目: サンプルカタログには3つの公開ルームがある
        // given (前提条件):
        let catalog = InMemoryRoomCatalog::with_sample_rooms();

        // when (操作):
        let rooms = catalog.list().await;

        // then (期待する結果):
        let names: Vec<&str> = rooms.iter().map(|room| room.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Romans Deep Study", "Psalms for Today", "Gospel of John"]
        );
        assert!(rooms.iter().all(|room| room.is_public));
    }

    #[tokio::test]
    async fn test_insert_replaces_room_with_same_id() {
        // テスト項目: 同じ ID のルームは置き換えられる
        // given (前提条件):
        let catalog = InMemoryRoomCatalog::with_sample_rooms();
        let mut renamed = catalog.list().await[0].clone();
        renamed.name = "Romans, Slowly".to_string();

        // when (操作):
        catalog.insert(renamed).await;

        // then (期待する結果):
        let rooms = catalog.list().await;
        assert_eq!(rooms.len(), 3);
        assert_eq!(rooms[0].name, "Romans, Slowly");
    }
}
