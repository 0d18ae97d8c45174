//! UseCase: 学習ルームのセッション管理（Room Coordinator）
//!
//! ルームへの参加・退出・メッセージ送信を受け付け、接続ライフサイクル・セッション状態・
//! 購読レジストリを協調させる公開ファサード。
//!
//! ## 並行性モデル
//!
//! - 状態の変更と通知はすべて1つの非同期ロック（writer）の内側で直列に行う。
//!   これにより、どのハンドラもメッセージを追加順に受け取る。
//! - スナップショット取得と購読登録は writer を待たない。
//! - トランスポートからのイベントはセッションごとのチャンネルで dispatcher タスクに届き、
//!   writer を取ってから1件ずつ適用される。
//! - セッションには世代番号があり、退出後に届いた古い世代のイベントは捨てられる。
//!   `leave_room()` が返った後に状態変更や通知が起きることはない。

use std::sync::{
    Arc, Weak,
    atomic::{AtomicBool, Ordering},
};

use parking_lot::{Mutex, RwLock};
use studyroom_shared::time::Clock;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    config::SessionConfig,
    domain::{
        ConnectionLifecycle, ConnectionState, DisplayName, EventSink, EventSource, InboundEvent,
        Message, MessageText, Participant, ParticipantId, Passage, RoomId, RoomSession, Timestamp,
    },
};

use super::{
    error::{JoinError, SendError},
    subscription::{Subscription, SubscriptionRegistry},
};

/// Coordinator が排他的に所有するセッション状態
#[derive(Debug, Default)]
struct SessionState {
    lifecycle: ConnectionLifecycle,
    session: Option<RoomSession>,
    local: Option<Participant>,
    /// 参加・退出のたびに進む世代番号
    generation: u64,
}

/// イベント適用後に配信する通知
enum Notification {
    Roster(Vec<Participant>),
    Message(Message),
}

struct CoordinatorInner {
    config: SessionConfig,
    clock: Arc<dyn Clock>,
    event_source: Arc<dyn EventSource>,
    registry: SubscriptionRegistry,
    /// 状態変更と通知を直列化する
    writer: tokio::sync::Mutex<()>,
    state: RwLock<SessionState>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

/// 学習ルームの Room Coordinator
///
/// 1つのインスタンスが同時に持つセッションは1つだけ。`Clone` は同じセッションへのハンドルを複製する。
/// イベントソースは1つの Coordinator 専用として渡すこと。
///
/// # Example
///
/// ```ignore
/// let coordinator = RoomCoordinator::new(event_source, Arc::new(SystemClock), SessionConfig::default());
/// let messages = coordinator.on_message(|message| println!("{}", message.text.as_str()));
/// if coordinator.join_room("room-1", "Alice").await {
///     coordinator.send_message("Hello", "Alice").await;
/// }
/// messages.unsubscribe();
/// coordinator.leave_room().await;
/// ```
#[derive(Clone)]
pub struct RoomCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl RoomCoordinator {
    /// 新しい RoomCoordinator を作成（`Disconnected` から開始）
    pub fn new(
        event_source: Arc<dyn EventSource>,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                config,
                clock,
                event_source,
                registry: SubscriptionRegistry::new(),
                writer: tokio::sync::Mutex::new(()),
                state: RwLock::new(SessionState::default()),
                dispatcher: Mutex::new(None),
            }),
        }
    }

    /// ルームに参加する
    ///
    /// 接続済みの場合は先に現在のセッションを終了する。失敗した場合は `Disconnected` に戻り false を返す。
    pub async fn join_room(&self, room_id: &str, display_name: &str) -> bool {
        match self.try_join_room(room_id, display_name).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    "Failed to join room '{}' as '{}': {}",
                    room_id,
                    display_name,
                    e
                );
                false
            }
        }
    }

    /// [`join_room`](Self::join_room) の失敗理由を返す版
    pub async fn try_join_room(&self, room_id: &str, display_name: &str) -> Result<(), JoinError> {
        let room_id = RoomId::new(room_id.to_string())?;
        let display_name = DisplayName::new(display_name.to_string())?;

        let _writer = self.inner.writer.lock().await;

        if self.inner.teardown() {
            tracing::info!("Left previous room before joining '{}'", room_id);
        }

        let connecting = { self.inner.state.write().lifecycle.begin_connect()? };
        self.inner.registry.notify_connection(connecting);

        // 失敗時も、呼び出し側が future を破棄した場合も Disconnected に戻す
        let pending = PendingJoin::new(&self.inner);

        let local = Participant::new(
            ParticipantId::generate(),
            display_name,
            false,
            self.inner.now(),
        );
        self.connect(room_id, local).await?;
        pending.complete();
        Ok(())
    }

    /// `Connecting` 中の処理: トランスポートへの接続、セッションの初期化、`Connected` への遷移
    async fn connect(&self, room_id: RoomId, local: Participant) -> Result<(), JoinError> {
        let timeout = self.inner.config.join_timeout;
        let seed = tokio::time::timeout(
            timeout,
            self.inner.event_source.connect(&room_id, &local),
        )
        .await
        .map_err(|_| JoinError::Timeout(timeout))??;

        let mut session = RoomSession::new(room_id.clone(), seed.passage);
        session.add_participant(local.clone())?;
        for participant in seed.participants {
            if let Err(e) = session.add_participant(participant) {
                tracing::warn!("Skipping seeded participant: {}", e);
            }
        }
        for mut message in seed.messages {
            message.is_own = false;
            session.append_message(message);
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        let (connected, roster, generation) = {
            let mut state = self.inner.state.write();
            let connected = state.lifecycle.complete_connect()?;
            state.generation += 1;
            let roster = session.participants().to_vec();
            state.session = Some(session);
            state.local = Some(local);
            (connected, roster, state.generation)
        };

        self.inner.registry.notify_connection(connected);
        self.inner.registry.notify_participants(&roster);

        let dispatcher = tokio::spawn(dispatch_events(
            Arc::downgrade(&self.inner),
            generation,
            receiver,
        ));
        if let Some(previous) = self.inner.dispatcher.lock().replace(dispatcher) {
            previous.abort();
        }
        self.inner.event_source.start(EventSink::new(sender));

        tracing::info!(
            "Joined room '{}' with {} participants",
            room_id,
            roster.len()
        );
        Ok(())
    }

    /// ルームから退出する（未接続なら何もしない）
    ///
    /// 返る前に保留中のタイマーをすべて止める。
    pub async fn leave_room(&self) {
        let _writer = self.inner.writer.lock().await;
        if self.inner.teardown() {
            tracing::info!("Left room");
        } else {
            tracing::debug!("leave_room called while not connected");
        }
    }

    /// メッセージを送信する
    ///
    /// 未接続、または本文が空白のみの場合は何もせず false を返す。
    /// `sender_name` が空白のみの場合はローカル参加者の表示名を使う。
    pub async fn send_message(&self, text: &str, sender_name: &str) -> bool {
        match self.try_send_message(text, sender_name).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("Message rejected: {}", e);
                false
            }
        }
    }

    /// [`send_message`](Self::send_message) の拒否理由と、追加されたメッセージを返す版
    pub async fn try_send_message(
        &self,
        text: &str,
        sender_name: &str,
    ) -> Result<Message, SendError> {
        let _writer = self.inner.writer.lock().await;

        let message = {
            let mut guard = self.inner.state.write();
            let state = &mut *guard;
            if !state.lifecycle.is_connected() {
                return Err(SendError::NotConnected);
            }
            let (Some(session), Some(local)) = (state.session.as_mut(), state.local.as_ref())
            else {
                return Err(SendError::NotConnected);
            };
            let text = MessageText::new(text.to_string()).map_err(|_| SendError::EmptyText)?;
            let sender = DisplayName::new(sender_name.to_string())
                .unwrap_or_else(|_| local.display_name.clone());

            let message = Message::outgoing(text, sender, self.inner.now());
            session.append_message(message.clone());
            message
        };

        self.inner.registry.notify_message(&message);

        if let Err(e) = self.inner.event_source.publish(&message).await {
            tracing::warn!(
                "Message {} was added locally but not published: {}",
                message.id,
                e
            );
        }
        Ok(message)
    }

    /// 新着メッセージを購読する（過去のメッセージは再送しない）
    pub fn on_message<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        self.inner.registry.subscribe_messages(handler)
    }

    /// 名簿の変更を購読する（登録時に現在の名簿で1回呼ばれる）
    ///
    /// 登録直後の呼び出しより先に新しい通知が届いた場合、古い名簿では呼ばない。
    pub fn on_participants_change<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&[Participant]) + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        let notified = Arc::new(AtomicBool::new(false));

        let (roster, subscription) = {
            let state = self.inner.state.read_recursive();
            let registered = handler.clone();
            let superseded = notified.clone();
            let subscription =
                self.inner
                    .registry
                    .subscribe_participants(move |roster: &[Participant]| {
                        superseded.store(true, Ordering::Release);
                        (*registered)(roster)
                    });
            let roster = state
                .session
                .as_ref()
                .map(|session| session.participants().to_vec())
                .unwrap_or_default();
            (roster, subscription)
        };

        if !notified.load(Ordering::Acquire) {
            (*handler)(&roster);
        }
        subscription
    }

    /// 接続状態の変更を購読する（登録時に現在の状態で1回呼ばれる）
    ///
    /// 登録直後の呼び出しより先に新しい通知が届いた場合、古い状態では呼ばない。
    pub fn on_connection_change<F>(&self, handler: F) -> Subscription
    where
        F: Fn(ConnectionState) + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        let notified = Arc::new(AtomicBool::new(false));

        let (current, subscription) = {
            let state = self.inner.state.read_recursive();
            let registered = handler.clone();
            let superseded = notified.clone();
            let subscription = self.inner.registry.subscribe_connection(move |state| {
                superseded.store(true, Ordering::Release);
                (*registered)(state)
            });
            (state.lifecycle.state(), subscription)
        };

        if !notified.load(Ordering::Acquire) {
            (*handler)(current);
        }
        subscription
    }

    /// メッセージログのスナップショット
    pub fn get_messages(&self) -> Vec<Message> {
        self.inner
            .state
            .read_recursive()
            .session
            .as_ref()
            .map(|session| session.messages().to_vec())
            .unwrap_or_default()
    }

    /// 名簿のスナップショット
    pub fn get_participants(&self) -> Vec<Participant> {
        self.inner
            .state
            .read_recursive()
            .session
            .as_ref()
            .map(|session| session.participants().to_vec())
            .unwrap_or_default()
    }

    pub fn get_connection_state(&self) -> ConnectionState {
        self.inner.state.read_recursive().lifecycle.state()
    }

    pub fn get_current_passage(&self) -> Option<Passage> {
        self.inner
            .state
            .read_recursive()
            .session
            .as_ref()
            .map(|session| session.current_passage.clone())
    }

    pub fn get_room_id(&self) -> Option<RoomId> {
        self.inner
            .state
            .read_recursive()
            .session
            .as_ref()
            .map(|session| session.room_id.clone())
    }

    /// 参加中のローカル参加者
    pub fn local_participant(&self) -> Option<Participant> {
        self.inner.state.read_recursive().local.clone()
    }
}

impl CoordinatorInner {
    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    /// 接続中のセッションを終了する（writer を保持した状態で呼ぶ）
    ///
    /// 終了した場合は true。未接続なら何もせず false。
    fn teardown(&self) -> bool {
        if !self.state.read().lifecycle.is_connected() {
            return false;
        }

        self.event_source.stop();
        if let Some(dispatcher) = self.dispatcher.lock().take() {
            dispatcher.abort();
        }

        let disconnected = {
            let mut state = self.state.write();
            state.generation += 1;
            state.session = None;
            state.local = None;
            state.lifecycle.disconnect()
        };

        match disconnected {
            Ok(state) => {
                self.registry.notify_connection(state);
                true
            }
            Err(e) => {
                tracing::warn!("Teardown left the lifecycle untouched: {}", e);
                false
            }
        }
    }

    /// 参加失敗時の後始末: `Connecting -> Disconnected`
    fn fail_join(&self) {
        self.event_source.stop();

        let failed = {
            let mut state = self.state.write();
            state.session = None;
            state.local = None;
            state.lifecycle.fail_connect()
        };

        match failed {
            Ok(state) => {
                self.registry.notify_connection(state);
            }
            Err(e) => tracing::warn!("Join failure cleanup skipped the transition: {}", e),
        }
    }

    /// トランスポートからのイベントを1件適用する
    async fn apply_inbound(&self, generation: u64, event: InboundEvent) {
        let _writer = self.writer.lock().await;

        let notification = {
            let mut guard = self.state.write();
            let state = &mut *guard;
            if state.generation != generation || !state.lifecycle.is_connected() {
                tracing::debug!("Dropping event from stale session {}", generation);
                return;
            }
            let local_id = state.local.as_ref().map(|local| &local.id);
            let Some(session) = state.session.as_mut() else {
                return;
            };

            match event {
                InboundEvent::ParticipantJoined(participant) => {
                    let name = participant.display_name.clone();
                    match session.add_participant(participant) {
                        Ok(()) => {
                            tracing::debug!("{} joined the room", name);
                            Some(Notification::Roster(session.participants().to_vec()))
                        }
                        Err(e) => {
                            tracing::warn!("Ignoring join event: {}", e);
                            None
                        }
                    }
                }
                InboundEvent::ParticipantLeft(id) => {
                    if local_id == Some(&id) {
                        tracing::warn!("Ignoring leave event for the local participant");
                        None
                    } else if let Some(removed) = session.remove_participant(&id) {
                        tracing::debug!("{} left the room", removed.display_name);
                        Some(Notification::Roster(session.participants().to_vec()))
                    } else {
                        tracing::debug!("Ignoring leave event for unknown participant {}", id);
                        None
                    }
                }
                InboundEvent::MessageReceived(mut message) => {
                    message.is_own = false;
                    session.append_message(message.clone());
                    Some(Notification::Message(message))
                }
            }
        };

        match notification {
            Some(Notification::Roster(roster)) => {
                self.registry.notify_participants(&roster);
            }
            Some(Notification::Message(message)) => {
                self.registry.notify_message(&message);
            }
            None => {}
        }
    }
}

/// `Connecting` 中の参加処理
///
/// `complete()` されずに drop された場合は参加失敗として後始末する。
struct PendingJoin<'a> {
    inner: &'a CoordinatorInner,
    completed: bool,
}

impl<'a> PendingJoin<'a> {
    fn new(inner: &'a CoordinatorInner) -> Self {
        Self {
            inner,
            completed: false,
        }
    }

    fn complete(mut self) {
        self.completed = true;
    }
}

impl Drop for PendingJoin<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.inner.fail_join();
        }
    }
}

impl Drop for CoordinatorInner {
    fn drop(&mut self) {
        self.event_source.stop();
        if let Some(dispatcher) = self.dispatcher.get_mut().take() {
            dispatcher.abort();
        }
    }
}

/// セッション1つ分のイベントを受信し、順に適用する
async fn dispatch_events(
    inner: Weak<CoordinatorInner>,
    generation: u64,
    mut events: mpsc::UnboundedReceiver<InboundEvent>,
) {
    while let Some(event) = events.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        inner.apply_inbound(generation, event).await;
    }
    tracing::debug!("Event dispatcher for session {} finished", generation);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventSourceError, SessionSeed, event_source::MockEventSource};
    use async_trait::async_trait;
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };
    use studyroom_shared::time::FixedClock;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - RoomCoordinator の参加・退出・送信と、各購読への通知
    // - 接続状態の遷移が必ず Connecting を経由すること
    // - トランスポート失敗・タイムアウト時に Disconnected へ戻ること
    // - 退出後に古いセッションのイベントが捨てられること
    //
    // 【なぜこのテストが必要か】
    // - Coordinator は UI から呼ばれる唯一の公開ファサードで、失敗を bool で返す契約を守る必要がある
    // - タイマーやイベントの取りこぼし・漏れはテストでしか検出できない
    // ========================================

    /// テスト用のイベントソース: 固定の初期状態を返し、受け取った sink を保持する
    #[derive(Default)]
    struct ScriptedEventSource {
        sink: Mutex<Option<EventSink>>,
        published: Mutex<Vec<Message>>,
        stops: AtomicUsize,
    }

    impl ScriptedEventSource {
        fn emit(&self, event: InboundEvent) -> bool {
            self.sink
                .lock()
                .as_ref()
                .map(|sink| sink.emit(event))
                .unwrap_or(false)
        }

        /// 停止後も古い sink に送れるよう、停止前に複製を取っておく
        fn take_sink(&self) -> Option<EventSink> {
            self.sink.lock().clone()
        }
    }

    #[async_trait]
    impl EventSource for ScriptedEventSource {
        async fn connect(
            &self,
            _room_id: &RoomId,
            _local: &Participant,
        ) -> Result<SessionSeed, EventSourceError> {
            Ok(SessionSeed {
                participants: vec![
                    remote_participant("host-1", "Pastor Michael", true),
                    remote_participant("user-2", "Sarah", false),
                ],
                messages: vec![Message::incoming(
                    MessageText::try_from("Welcome!").unwrap(),
                    DisplayName::try_from("Pastor Michael").unwrap(),
                    Timestamp::new(500),
                )],
                passage: Passage::new("John", 3, 1, 21),
            })
        }

        fn start(&self, sink: EventSink) {
            *self.sink.lock() = Some(sink);
        }

        async fn publish(&self, message: &Message) -> Result<(), EventSourceError> {
            self.published.lock().push(message.clone());
            Ok(())
        }

        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
            self.sink.lock().take();
        }
    }

    /// 接続が完了しないイベントソース
    struct StalledEventSource;

    #[async_trait]
    impl EventSource for StalledEventSource {
        async fn connect(
            &self,
            _room_id: &RoomId,
            _local: &Participant,
        ) -> Result<SessionSeed, EventSourceError> {
            std::future::pending::<Result<SessionSeed, EventSourceError>>().await
        }

        fn start(&self, _sink: EventSink) {}

        async fn publish(&self, _message: &Message) -> Result<(), EventSourceError> {
            Ok(())
        }

        fn stop(&self) {}
    }

    fn remote_participant(id: &str, name: &str, is_host: bool) -> Participant {
        Participant::new(
            ParticipantId::new(id.to_string()).unwrap(),
            DisplayName::try_from(name).unwrap(),
            is_host,
            Timestamp::new(100),
        )
    }

    fn incoming(sender: &str, text: &str) -> Message {
        Message::incoming(
            MessageText::try_from(text).unwrap(),
            DisplayName::try_from(sender).unwrap(),
            Timestamp::new(2000),
        )
    }

    fn create_test_coordinator() -> (RoomCoordinator, Arc<ScriptedEventSource>) {
        let source = Arc::new(ScriptedEventSource::default());
        let coordinator = RoomCoordinator::new(
            source.clone(),
            Arc::new(FixedClock::new(1000)),
            SessionConfig::default(),
        );
        (coordinator, source)
    }

    /// dispatcher タスクが受信済みのイベントを処理し終えるまで待つ
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_room_success() {
        // テスト項目: 参加に成功すると名簿に自分が含まれ、Connected になる
        // given (前提条件):
        let (coordinator, _source) = create_test_coordinator();

        // when (操作):
        let joined = coordinator.join_room("room-1", "Alice").await;

        // then (期待する結果):
        assert!(joined);
        assert_eq!(coordinator.get_connection_state(), ConnectionState::Connected);
        let names: Vec<String> = coordinator
            .get_participants()
            .iter()
            .map(|p| p.display_name.as_str().to_string())
            .collect();
        assert_eq!(names, vec!["Alice", "Pastor Michael", "Sarah"]);
        assert_eq!(coordinator.get_messages().len(), 1);
        assert_eq!(
            coordinator.get_room_id().map(RoomId::into_string),
            Some("room-1".to_string())
        );
        assert_eq!(
            coordinator.get_current_passage().map(|p| p.to_string()),
            Some("John 3:1-21".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_notifies_connecting_before_connected() {
        // テスト項目: 参加時の接続状態通知は Disconnected → Connecting → Connected の順
        // given (前提条件):
        let (coordinator, _source) = create_test_coordinator();
        let states = Arc::new(Mutex::new(Vec::new()));
        let states_for_handler = states.clone();
        coordinator.on_connection_change(move |state| states_for_handler.lock().push(state));

        // when (操作):
        coordinator.join_room("room-1", "Alice").await;

        // then (期待する結果):
        assert_eq!(
            *states.lock(),
            vec![
                ConnectionState::Disconnected,
                ConnectionState::Connecting,
                ConnectionState::Connected,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_with_blank_name_is_rejected_without_transition() {
        // テスト項目: 空白の表示名では参加できず、接続状態も変わらない
        // given (前提条件):
        let (coordinator, _source) = create_test_coordinator();
        let states = Arc::new(Mutex::new(Vec::new()));
        let states_for_handler = states.clone();
        coordinator.on_connection_change(move |state| states_for_handler.lock().push(state));

        // when (操作):
        let result = coordinator.try_join_room("room-1", "   ").await;

        // then (期待する結果):
        assert!(matches!(result, Err(JoinError::InvalidRequest(_))));
        assert_eq!(*states.lock(), vec![ConnectionState::Disconnected]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_failure_returns_to_disconnected() {
        // テスト項目: トランスポートの接続失敗時は false を返し Disconnected に戻る
        // given (前提条件):
        let mut source = MockEventSource::new();
        source.expect_connect().returning(|room_id, _| {
            Err(EventSourceError::ConnectFailed {
                room_id: room_id.as_str().to_string(),
                reason: "refused".to_string(),
            })
        });
        source.expect_stop().return_const(());
        source.expect_start().never();
        let coordinator = RoomCoordinator::new(
            Arc::new(source),
            Arc::new(FixedClock::new(1000)),
            SessionConfig::default(),
        );
        let states = Arc::new(Mutex::new(Vec::new()));
        let states_for_handler = states.clone();
        coordinator.on_connection_change(move |state| states_for_handler.lock().push(state));

        // when (操作):
        let joined = coordinator.join_room("room-1", "Alice").await;

        // then (期待する結果):
        assert!(!joined);
        assert_eq!(coordinator.get_connection_state(), ConnectionState::Disconnected);
        assert!(coordinator.get_participants().is_empty());
        assert_eq!(
            *states.lock(),
            vec![
                ConnectionState::Disconnected,
                ConnectionState::Connecting,
                ConnectionState::Disconnected,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_timeout_fails_closed() {
        // テスト項目: 接続がタイムアウトした場合は Disconnected に戻り Timeout エラーになる
        // given (前提条件):
        let coordinator = RoomCoordinator::new(
            Arc::new(StalledEventSource),
            Arc::new(FixedClock::new(1000)),
            SessionConfig {
                join_timeout: Duration::from_secs(3),
            },
        );

        // when (操作):
        let result = coordinator.try_join_room("room-1", "Alice").await;

        // then (期待する結果):
        assert_eq!(result, Err(JoinError::Timeout(Duration::from_secs(3))));
        assert_eq!(coordinator.get_connection_state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_join_returns_to_disconnected() {
        // テスト項目: 参加処理の future を途中で破棄しても Connecting に留まらず、再度参加を試みられる
        // given (前提条件):
        let coordinator = RoomCoordinator::new(
            Arc::new(StalledEventSource),
            Arc::new(FixedClock::new(1000)),
            SessionConfig {
                join_timeout: Duration::from_secs(3),
            },
        );
        let states = Arc::new(Mutex::new(Vec::new()));
        let states_for_handler = states.clone();
        coordinator.on_connection_change(move |state| states_for_handler.lock().push(state));

        // when (操作):
        let cancelled = tokio::time::timeout(
            Duration::from_millis(100),
            coordinator.join_room("room-1", "Alice"),
        )
        .await;

        // then (期待する結果):
        assert!(cancelled.is_err());
        assert_eq!(coordinator.get_connection_state(), ConnectionState::Disconnected);
        assert_eq!(
            *states.lock(),
            vec![
                ConnectionState::Disconnected,
                ConnectionState::Connecting,
                ConnectionState::Disconnected,
            ]
        );
        let retry = coordinator.try_join_room("room-1", "Alice").await;
        assert_eq!(retry, Err(JoinError::Timeout(Duration::from_secs(3))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_message_while_disconnected_is_rejected() {
        // テスト項目: 未接続でメッセージを送ると false が返り、ログは変わらない
        // given (前提条件):
        let (coordinator, source) = create_test_coordinator();

        // when (操作):
        let result = coordinator.try_send_message("Hello", "Alice").await;

        // then (期待する結果):
        assert_eq!(result, Err(SendError::NotConnected));
        assert!(coordinator.get_messages().is_empty());
        assert!(source.published.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_message_appends_own_message() {
        // テスト項目: 接続中の送信でメッセージが末尾に1件追加され、購読者とトランスポートに届く
        // given (前提条件):
        let (coordinator, source) = create_test_coordinator();
        coordinator.join_room("room-1", "Alice").await;
        let received = Arc::new(Mutex::new(Vec::new()));
        let received_for_handler = received.clone();
        coordinator.on_message(move |message| received_for_handler.lock().push(message.clone()));
        let before = coordinator.get_messages().len();

        // when (操作):
        let sent = coordinator.send_message("Hello", "Alice").await;

        // then (期待する結果):
        assert!(sent);
        let messages = coordinator.get_messages();
        assert_eq!(messages.len(), before + 1);
        let last = messages.last().unwrap();
        assert_eq!(last.text.as_str(), "Hello");
        assert!(last.is_own);
        assert_eq!(last.sender.as_str(), "Alice");
        assert_eq!(received.lock().len(), 1);
        assert_eq!(source.published.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_blank_message_is_rejected() {
        // テスト項目: 空白のみの本文は拒否され、副作用がない
        // given (前提条件):
        let (coordinator, source) = create_test_coordinator();
        coordinator.join_room("room-1", "Alice").await;
        let before = coordinator.get_messages();

        // when (操作):
        let result = coordinator.try_send_message("   ", "Alice").await;

        // then (期待する結果):
        assert_eq!(result, Err(SendError::EmptyText));
        assert_eq!(coordinator.get_messages(), before);
        assert!(source.published.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_sender_falls_back_to_local_name() {
        // テスト項目: 送信者名が空白の場合はローカル参加者の表示名が使われる
        // given (前提条件):
        let (coordinator, _source) = create_test_coordinator();
        coordinator.join_room("room-1", "Alice").await;

        // when (操作):
        let message = coordinator.try_send_message("Hi", " ").await.unwrap();

        // then (期待する結果):
        assert_eq!(message.sender.as_str(), "Alice");
    }

    #[tokio::test(start_paused = true)]
    async fn test_message_handler_does_not_replay_history() {
        // テスト項目: 購読前のメッセージは再送されず、購読後のメッセージだけが届く
        // given (前提条件):
        let (coordinator, source) = create_test_coordinator();
        coordinator.join_room("room-1", "Alice").await;
        coordinator.send_message("before", "Alice").await;
        let received = Arc::new(Mutex::new(Vec::new()));
        let received_for_handler = received.clone();
        coordinator.on_message(move |message| {
            received_for_handler
                .lock()
                .push(message.text.as_str().to_string())
        });

        // when (操作):
        source.emit(InboundEvent::MessageReceived(incoming("Sarah", "after")));
        settle().await;

        // then (期待する結果):
        assert_eq!(*received.lock(), vec!["after".to_string()]);
        let last = coordinator.get_messages().last().cloned().unwrap();
        assert!(!last.is_own);
    }

    #[tokio::test(start_paused = true)]
    async fn test_participants_handler_receives_snapshot_on_subscribe() {
        // テスト項目: 名簿の購読時に現在の名簿で1回呼ばれる
        // given (前提条件):
        let (coordinator, _source) = create_test_coordinator();
        coordinator.join_room("room-1", "Alice").await;
        let sizes = Arc::new(Mutex::new(Vec::new()));
        let sizes_for_handler = sizes.clone();

        // when (操作):
        coordinator.on_participants_change(move |roster| sizes_for_handler.lock().push(roster.len()));

        // then (期待する結果):
        assert_eq!(*sizes.lock(), vec![3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inbound_roster_events_update_participants() {
        // テスト項目: 参加・退出イベントで名簿が更新され、名簿全体が通知される
        // given (前提条件):
        let (coordinator, source) = create_test_coordinator();
        coordinator.join_room("room-1", "Alice").await;
        let sizes = Arc::new(Mutex::new(Vec::new()));
        let sizes_for_handler = sizes.clone();
        coordinator.on_participants_change(move |roster| sizes_for_handler.lock().push(roster.len()));

        // when (操作):
        source.emit(InboundEvent::ParticipantJoined(remote_participant(
            "user-9", "Ruth", false,
        )));
        source.emit(InboundEvent::ParticipantLeft(
            ParticipantId::new("user-2".to_string()).unwrap(),
        ));
        settle().await;

        // then (期待する結果):
        assert_eq!(*sizes.lock(), vec![3, 4, 3]);
        let names: Vec<String> = coordinator
            .get_participants()
            .iter()
            .map(|p| p.display_name.as_str().to_string())
            .collect();
        assert_eq!(names, vec!["Alice", "Pastor Michael", "Ruth"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_join_event_is_ignored() {
        // テスト項目: 既存 ID の参加イベントは無視され、通知もされない
        // given (前提条件):
        let (coordinator, source) = create_test_coordinator();
        coordinator.join_room("room-1", "Alice").await;
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        coordinator.on_participants_change(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        // when (操作):
        source.emit(InboundEvent::ParticipantJoined(remote_participant(
            "user-2", "Sarah", false,
        )));
        settle().await;

        // then (期待する結果):
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(coordinator.get_participants().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_local_participant_is_never_removed_by_events() {
        // テスト項目: ローカル参加者の退出イベントは無視される
        // given (前提条件):
        let (coordinator, source) = create_test_coordinator();
        coordinator.join_room("room-1", "Alice").await;
        let local = coordinator.local_participant().unwrap();

        // when (操作):
        source.emit(InboundEvent::ParticipantLeft(local.id.clone()));
        settle().await;

        // then (期待する結果):
        assert!(coordinator.get_participants().iter().any(|p| p.id == local.id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_leave_room_is_idempotent() {
        // テスト項目: leave_room を2回呼んでも Disconnected の通知は1回だけ
        // given (前提条件):
        let (coordinator, source) = create_test_coordinator();
        coordinator.join_room("room-1", "Alice").await;
        let states = Arc::new(Mutex::new(Vec::new()));
        let states_for_handler = states.clone();
        coordinator.on_connection_change(move |state| states_for_handler.lock().push(state));

        // when (操作):
        coordinator.leave_room().await;
        coordinator.leave_room().await;

        // then (期待する結果):
        assert_eq!(
            *states.lock(),
            vec![ConnectionState::Connected, ConnectionState::Disconnected]
        );
        assert_eq!(source.stops.load(Ordering::SeqCst), 1);
        assert!(coordinator.get_messages().is_empty());
        assert!(coordinator.get_participants().is_empty());
        assert!(coordinator.local_participant().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_from_previous_session_are_dropped() {
        // テスト項目: 退出後に古いセッションの sink へ送られたイベントは適用されない
        // given (前提条件):
        let (coordinator, source) = create_test_coordinator();
        coordinator.join_room("room-1", "Alice").await;
        let stale_sink = source.take_sink().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        coordinator.on_message(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        // when (操作):
        coordinator.leave_room().await;
        coordinator.join_room("room-2", "Alice").await;
        stale_sink.emit(InboundEvent::MessageReceived(incoming("Sarah", "late")));
        settle().await;

        // then (期待する結果):
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(
            coordinator
                .get_messages()
                .iter()
                .all(|m| m.text.as_str() != "late")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejoin_tears_down_previous_session() {
        // テスト項目: 接続中に再参加すると、前のセッションを終了してから接続し直す
        // given (前提条件):
        let (coordinator, source) = create_test_coordinator();
        coordinator.join_room("room-1", "Alice").await;
        coordinator.send_message("old", "Alice").await;
        let states = Arc::new(Mutex::new(Vec::new()));
        let states_for_handler = states.clone();
        coordinator.on_connection_change(move |state| states_for_handler.lock().push(state));

        // when (操作):
        let joined = coordinator.join_room("room-2", "Alice").await;

        // then (期待する結果):
        assert!(joined);
        assert_eq!(
            *states.lock(),
            vec![
                ConnectionState::Connected,
                ConnectionState::Disconnected,
                ConnectionState::Connecting,
                ConnectionState::Connected,
            ]
        );
        assert_eq!(source.stops.load(Ordering::SeqCst), 1);
        assert!(coordinator.get_messages().iter().all(|m| m.text.as_str() != "old"));
        assert_eq!(
            coordinator.get_room_id().map(RoomId::into_string),
            Some("room-2".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_handler_can_read_snapshot_during_notification() {
        // テスト項目: ハンドラ内からスナップショットを取得してもデッドロックしない
        // given (前提条件):
        let (coordinator, _source) = create_test_coordinator();
        coordinator.join_room("room-1", "Alice").await;
        let observed = Arc::new(Mutex::new(Vec::new()));
        let observed_for_handler = observed.clone();
        let reader = coordinator.clone();
        coordinator.on_message(move |_| {
            observed_for_handler.lock().push(reader.get_messages().len());
        });
        let before = coordinator.get_messages().len();

        // when (操作):
        coordinator.send_message("Hello", "Alice").await;

        // then (期待する結果): 通知時点でメッセージはログに追加済み
        assert_eq!(*observed.lock(), vec![before + 1]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_slow_initial_handler_does_not_block_leave() {
        // テスト項目: 登録直後のハンドラ呼び出しが終わらなくても、別タスクの退出は待たされない
        // given (前提条件):
        let (coordinator, _source) = create_test_coordinator();
        coordinator.join_room("room-1", "Alice").await;
        let (entered_tx, entered_rx) = tokio::sync::oneshot::channel::<()>();
        let entered_tx = Mutex::new(Some(entered_tx));
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        let release_rx = Mutex::new(release_rx);
        let first_call = AtomicBool::new(true);
        let subscriber = coordinator.clone();
        let subscribing = tokio::task::spawn_blocking(move || {
            subscriber.on_connection_change(move |_| {
                if first_call.swap(false, Ordering::SeqCst) {
                    if let Some(entered) = entered_tx.lock().take() {
                        entered.send(()).ok();
                    }
                    release_rx.lock().recv_timeout(Duration::from_secs(5)).ok();
                }
            })
        });
        entered_rx.await.unwrap();

        // when (操作):
        let started = std::time::Instant::now();
        coordinator.leave_room().await;
        let elapsed = started.elapsed();
        release_tx.send(()).ok();
        let subscription = subscribing.await.unwrap();

        // then (期待する結果):
        assert!(elapsed < Duration::from_secs(2), "leave_room waited {:?}", elapsed);
        assert_eq!(
            coordinator.get_connection_state(),
            ConnectionState::Disconnected
        );
        subscription.unsubscribe();
    }
}
