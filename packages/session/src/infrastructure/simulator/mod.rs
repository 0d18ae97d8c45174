//! シミュレーターによる EventSource 実装

pub mod activity;

pub use activity::ActivitySimulator;
