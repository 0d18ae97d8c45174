//! StudyAssistant 実装

pub mod offline;

pub use offline::OfflineStudyAssistant;
