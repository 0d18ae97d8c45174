//! Activity Simulator
//!
//! タイマーでルームの動きを模擬する EventSource 実装。
//!
//! - 接続: `join_delay` 待ってから、設定の初期参加者と初期メッセージを返す
//! - 参加者の入れ替わり: `churn_interval` ごとに `churn_probability` の確率で参加または退出（半々）
//! - 返信: `publish` されたメッセージ1件につき、`[reply_delay_min, reply_delay_max)` の遅延後に1件返信
//!
//! `stop()` で保留中のタイマーはすべて abort される。

use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use studyroom_shared::time::Clock;
use tokio::{task::JoinHandle, time::Instant};

use crate::{
    config::{ConfigError, SimulatorConfig},
    domain::{
        DisplayName, EventSink, EventSource, EventSourceError, InboundEvent, Message, MessageText,
        Participant, ParticipantId, RoomId, SessionSeed, Timestamp,
    },
};

/// シミュレーターの可変状態
struct SimulatorState {
    rng: StdRng,
    /// ローカル参加者を含む名簿のミラー
    roster: Vec<Participant>,
    local_id: Option<ParticipantId>,
    sink: Option<EventSink>,
    churn: Option<JoinHandle<()>>,
    replies: Vec<JoinHandle<()>>,
}

impl SimulatorState {
    fn emit(&self, event: InboundEvent) {
        match &self.sink {
            Some(sink) => {
                if !sink.emit(event) {
                    tracing::debug!("Event sink closed; dropping simulated event");
                }
            }
            None => tracing::debug!("Simulator not started; dropping simulated event"),
        }
    }

    /// 1ティック分の入れ替わりを試みる
    fn churn(&mut self, config: &SimulatorConfig, now: Timestamp) -> Option<InboundEvent> {
        if !self.rng.gen_bool(config.churn_probability) {
            return None;
        }
        if self.rng.gen_bool(0.5) {
            self.churn_join(config, now)
        } else {
            self.churn_leave(config)
        }
    }

    fn churn_join(&mut self, config: &SimulatorConfig, now: Timestamp) -> Option<InboundEvent> {
        if self.roster.len() >= config.max_roster {
            return None;
        }
        let available: Vec<&String> = config
            .name_pool
            .iter()
            .filter(|name| {
                !self
                    .roster
                    .iter()
                    .any(|participant| participant.display_name.as_str() == name.trim())
            })
            .collect();
        let name = available.choose(&mut self.rng)?;
        let display_name = DisplayName::new(name.to_string()).ok()?;

        let participant = Participant::new(ParticipantId::generate(), display_name, false, now);
        tracing::debug!("Simulated join: {}", participant.display_name);
        self.roster.push(participant.clone());
        Some(InboundEvent::ParticipantJoined(participant))
    }

    fn churn_leave(&mut self, config: &SimulatorConfig) -> Option<InboundEvent> {
        if self.roster.len() <= config.min_roster {
            return None;
        }
        let candidates: Vec<usize> = self
            .roster
            .iter()
            .enumerate()
            .filter(|(_, participant)| {
                !participant.is_host && Some(&participant.id) != self.local_id.as_ref()
            })
            .map(|(index, _)| index)
            .collect();
        let index = *candidates.choose(&mut self.rng)?;

        let removed = self.roster.remove(index);
        tracing::debug!("Simulated leave: {}", removed.display_name);
        Some(InboundEvent::ParticipantLeft(removed.id))
    }

    /// ローカル参加者以外の誰かからの返信を作る
    fn reply(&mut self, config: &SimulatorConfig, now: Timestamp) -> Option<Message> {
        let senders: Vec<&Participant> = self
            .roster
            .iter()
            .filter(|participant| Some(&participant.id) != self.local_id.as_ref())
            .collect();
        let sender = senders.choose(&mut self.rng)?.display_name.clone();
        let text = config.reply_pool.choose(&mut self.rng)?;
        match MessageText::new(text.clone()) {
            Ok(text) => Some(Message::incoming(text, sender, now)),
            Err(e) => {
                tracing::warn!("Skipping unusable reply text: {}", e);
                None
            }
        }
    }

    fn halt(&mut self) {
        self.sink = None;
        if let Some(churn) = self.churn.take() {
            churn.abort();
        }
        for reply in self.replies.drain(..) {
            reply.abort();
        }
        self.roster.clear();
        self.local_id = None;
    }
}

/// タイマーでルームの動きを模擬する EventSource
///
/// 1つの RoomCoordinator 専用。
pub struct ActivitySimulator {
    config: Arc<SimulatorConfig>,
    clock: Arc<dyn Clock>,
    state: Arc<Mutex<SimulatorState>>,
}

impl ActivitySimulator {
    pub fn new(config: SimulatorConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            config: Arc::new(config),
            clock,
            state: Arc::new(Mutex::new(SimulatorState {
                rng,
                roster: Vec::new(),
                local_id: None,
                sink: None,
                churn: None,
                replies: Vec::new(),
            })),
        })
    }

    /// 保留中の返信タイマーの数
    pub fn pending_replies(&self) -> usize {
        let mut state = self.state.lock();
        state.replies.retain(|reply| !reply.is_finished());
        state.replies.len()
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    fn build_seed(&self, room_id: &RoomId, now: Timestamp) -> Result<SessionSeed, EventSourceError> {
        let invalid = |e: crate::domain::ValueObjectError| EventSourceError::ConnectFailed {
            room_id: room_id.as_str().to_string(),
            reason: format!("invalid seed content: {}", e),
        };

        let participants = self
            .config
            .initial_participants
            .iter()
            .map(|seed| {
                Ok(Participant::new(
                    ParticipantId::new(seed.id.clone()).map_err(invalid)?,
                    DisplayName::new(seed.name.clone()).map_err(invalid)?,
                    seed.is_host,
                    now,
                ))
            })
            .collect::<Result<Vec<_>, EventSourceError>>()?;

        let messages = self
            .config
            .initial_messages
            .iter()
            .map(|seed| {
                let age = i64::try_from(seed.age.as_millis()).unwrap_or(i64::MAX);
                Ok(Message::incoming(
                    MessageText::new(seed.text.clone()).map_err(invalid)?,
                    DisplayName::new(seed.sender.clone()).map_err(invalid)?,
                    Timestamp::new(now.value().saturating_sub(age)),
                ))
            })
            .collect::<Result<Vec<_>, EventSourceError>>()?;

        Ok(SessionSeed {
            participants,
            messages,
            passage: self.config.passage.clone(),
        })
    }
}

#[async_trait]
impl EventSource for ActivitySimulator {
    async fn connect(
        &self,
        room_id: &RoomId,
        local: &Participant,
    ) -> Result<SessionSeed, EventSourceError> {
        tokio::time::sleep(self.config.join_delay).await;

        let seed = self.build_seed(room_id, self.now())?;

        let mut state = self.state.lock();
        state.halt();
        state.local_id = Some(local.id.clone());
        state.roster.push(local.clone());
        // Coordinator と同じく、ID が重複する参加者は最初の1人だけ名簿に入れる
        for participant in &seed.participants {
            if state.roster.iter().any(|p| p.id == participant.id) {
                tracing::warn!("Skipping duplicate seeded participant {}", participant.id);
                continue;
            }
            state.roster.push(participant.clone());
        }
        tracing::debug!(
            "Simulated room '{}' ready with {} participants",
            room_id,
            state.roster.len()
        );
        Ok(seed)
    }

    fn start(&self, sink: EventSink) {
        let churn = tokio::spawn(run_churn(
            Arc::downgrade(&self.state),
            self.config.clone(),
            self.clock.clone(),
        ));

        let mut state = self.state.lock();
        if let Some(previous) = state.churn.replace(churn) {
            previous.abort();
        }
        state.sink = Some(sink);
    }

    async fn publish(&self, message: &Message) -> Result<(), EventSourceError> {
        let mut state = self.state.lock();
        if state.sink.is_none() {
            return Err(EventSourceError::NotConnected);
        }

        let min = duration_millis(self.config.reply_delay_min);
        let max = duration_millis(self.config.reply_delay_max);
        let delay = Duration::from_millis(state.rng.gen_range(min..max));
        tracing::debug!("Reply to {} scheduled in {:?}", message.id, delay);

        let reply = tokio::spawn(deliver_reply(
            Arc::downgrade(&self.state),
            delay,
            self.config.clone(),
            self.clock.clone(),
        ));
        state.replies.retain(|reply| !reply.is_finished());
        state.replies.push(reply);
        Ok(())
    }

    fn stop(&self) {
        self.state.lock().halt();
    }
}

impl Drop for ActivitySimulator {
    fn drop(&mut self) {
        self.state.lock().halt();
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

async fn run_churn(
    state: Weak<Mutex<SimulatorState>>,
    config: Arc<SimulatorConfig>,
    clock: Arc<dyn Clock>,
) {
    let period = config.churn_interval;
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    loop {
        ticker.tick().await;
        let Some(state) = state.upgrade() else {
            break;
        };
        churn_tick(&state, &config, Timestamp::new(clock.now_millis()));
    }
}

fn churn_tick(state: &Mutex<SimulatorState>, config: &SimulatorConfig, now: Timestamp) {
    let mut state = state.lock();
    if let Some(event) = state.churn(config, now) {
        state.emit(event);
    }
}

async fn deliver_reply(
    state: Weak<Mutex<SimulatorState>>,
    delay: Duration,
    config: Arc<SimulatorConfig>,
    clock: Arc<dyn Clock>,
) {
    tokio::time::sleep(delay).await;
    let Some(state) = state.upgrade() else {
        return;
    };
    let mut state = state.lock();
    if let Some(reply) = state.reply(&config, Timestamp::new(clock.now_millis())) {
        state.emit(InboundEvent::MessageReceived(reply));
    }
}
