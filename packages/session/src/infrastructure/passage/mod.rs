//! PassageProvider 実装

pub mod sample;

pub use sample::SamplePassageProvider;
