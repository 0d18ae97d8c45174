//! UseCase: 学習ルームの一覧と作成

use std::sync::Arc;

use crate::domain::{RoomCatalog, RoomId, StudyRoom, StudyRoomDraft};

/// ルーム一覧のユースケース
pub struct RoomDirectory {
    catalog: Arc<dyn RoomCatalog>,
}

impl RoomDirectory {
    pub fn new(catalog: Arc<dyn RoomCatalog>) -> Self {
        Self { catalog }
    }

    /// 公開ルームの一覧
    pub async fn list_public_rooms(&self) -> Vec<StudyRoom> {
        self.catalog
            .list()
            .await
            .into_iter()
            .filter(|room| room.is_public)
            .collect()
    }

    /// ルームを作成する（ID を採番し、作成者だけが参加している状態で登録）
    pub async fn create_room(&self, draft: StudyRoomDraft) -> StudyRoom {
        let room = StudyRoom {
            id: RoomId::generate().into_string(),
            name: draft.name,
            description: draft.description,
            host: draft.host,
            participants: 1,
            schedule: draft.schedule,
            is_public: draft.is_public,
        };
        self.catalog.insert(room.clone()).await;
        tracing::info!("Created study room '{}' ({})", room.name, room.id);
        room
    }
}
