//! UseCase 層
//!
//! Domain 層の trait にのみ依存し、具体的な実装はコンストラクタで注入される。

pub mod coordinator;
pub mod error;
pub mod room_directory;
pub mod study_guide;
pub mod study_journal;
pub mod subscription;

pub use coordinator::RoomCoordinator;
pub use error::{JoinError, SendError};
pub use room_directory::RoomDirectory;
pub use study_guide::StudyGuideUseCase;
pub use study_journal::StudyJournal;
pub use subscription::{Subscription, SubscriptionId, SubscriptionRegistry};
