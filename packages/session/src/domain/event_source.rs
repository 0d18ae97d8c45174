//! EventSource trait 定義
//!
//! ルームのリアルタイムなイベント（参加・退出・メッセージ受信）を届けるトランスポートの抽象化。
//! タイマーによるシミュレーターでも WebSocket クライアントでもメッセージブローカーでも、
//! この trait を実装すれば RoomCoordinator の契約は変わらない。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{
    entity::{Message, Participant, Passage},
    error::EventSourceError,
    value_object::{ParticipantId, RoomId},
};

/// トランスポートから届くイベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// 参加者がルームに入った
    ParticipantJoined(Participant),
    /// 参加者がルームを出た
    ParticipantLeft(ParticipantId),
    /// 他の参加者からメッセージが届いた
    MessageReceived(Message),
}

/// 接続成功時にトランスポートが返すルームの初期状態
#[derive(Debug, Clone)]
pub struct SessionSeed {
    /// ローカル参加者以外の初期参加者
    pub participants: Vec<Participant>,
    /// 参加前に投稿されていたメッセージ
    pub messages: Vec<Message>,
    pub passage: Passage,
}

/// イベントの送り先
///
/// 1セッションにつき1つ作られ、セッション終了とともに受信側が閉じられる。
#[derive(Debug, Clone)]
pub struct EventSink {
    sender: mpsc::UnboundedSender<InboundEvent>,
}

impl EventSink {
    pub fn new(sender: mpsc::UnboundedSender<InboundEvent>) -> Self {
        Self { sender }
    }

    /// イベントを送る（受信側が閉じていれば false）
    pub fn emit(&self, event: InboundEvent) -> bool {
        self.sender.send(event).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// ルームのイベントソース
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventSource: Send + Sync {
    /// ルームに接続し、初期状態を取得する
    async fn connect(
        &self,
        room_id: &RoomId,
        local: &Participant,
    ) -> Result<SessionSeed, EventSourceError>;

    /// イベントの配信を開始する
    fn start(&self, sink: EventSink);

    /// ローカル参加者のメッセージをルームに送る
    async fn publish(&self, message: &Message) -> Result<(), EventSourceError>;

    /// 配信を停止し、保留中のタイマーやストリームをすべて破棄する（冪等）
    fn stop(&self);
}
