//! Subscription Registry
//!
//! メッセージ・名簿・接続状態の3種類のイベントについて、独立したハンドラ集合を管理し通知を配信する。
//!
//! ## 設計ノート
//!
//! - 通知中はロックを保持しない（ハンドラの一覧を複製してから呼び出す）。
//!   そのためハンドラ内からスナップショット取得や購読解除を行っても詰まらない。
//! - 各ハンドラは `active` フラグを持ち、購読解除後に新たな呼び出しが始まることはない。

use std::{
    fmt,
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use parking_lot::Mutex;

use crate::domain::{ConnectionState, Message, Participant};

/// 購読を識別する ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Entry<T: ?Sized> {
    id: SubscriptionId,
    active: Arc<AtomicBool>,
    handler: Handler<T>,
}

impl<T: ?Sized> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            active: self.active.clone(),
            handler: self.handler.clone(),
        }
    }
}

/// 1種類のイベントに対するハンドラ集合
struct HandlerSet<T: ?Sized> {
    entries: Arc<Mutex<Vec<Entry<T>>>>,
}

impl<T: ?Sized + 'static> HandlerSet<T> {
    fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn add(&self, id: SubscriptionId, handler: Handler<T>) -> Subscription {
        let active = Arc::new(AtomicBool::new(true));
        self.entries.lock().push(Entry {
            id,
            active: active.clone(),
            handler,
        });

        let entries: Weak<Mutex<Vec<Entry<T>>>> = Arc::downgrade(&self.entries);
        Subscription {
            id,
            active,
            detach: Box::new(move |id| {
                if let Some(entries) = entries.upgrade() {
                    entries.lock().retain(|entry| entry.id != id);
                }
            }),
        }
    }

    /// 登録順にハンドラを呼び出し、呼び出した数を返す
    fn notify(&self, value: &T) -> usize {
        let entries: Vec<Entry<T>> = self.entries.lock().clone();
        let mut delivered = 0;
        for entry in entries {
            if entry.active.load(Ordering::Acquire) {
                (entry.handler)(value);
                delivered += 1;
            }
        }
        delivered
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

/// 購読トークン
///
/// `unsubscribe()` は何度呼んでもよい（2回目以降は何もしない）。
/// トークンを drop しても購読は解除されない。
pub struct Subscription {
    id: SubscriptionId,
    active: Arc<AtomicBool>,
    detach: Box<dyn Fn(SubscriptionId) + Send + Sync>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// ハンドラを登録解除する
    pub fn unsubscribe(&self) {
        if self.active.swap(false, Ordering::AcqRel) {
            (self.detach)(self.id);
            tracing::trace!("Subscription {} removed", self.id.0);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// 3種類のイベントのハンドラ集合をまとめたレジストリ
pub struct SubscriptionRegistry {
    next_id: AtomicU64,
    messages: HandlerSet<Message>,
    participants: HandlerSet<[Participant]>,
    connection: HandlerSet<ConnectionState>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            messages: HandlerSet::new(),
            participants: HandlerSet::new(),
            connection: HandlerSet::new(),
        }
    }

    pub fn subscribe_messages<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        self.messages.add(self.allocate_id(), Arc::new(handler))
    }

    pub fn subscribe_participants<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&[Participant]) + Send + Sync + 'static,
    {
        self.participants.add(self.allocate_id(), Arc::new(handler))
    }

    pub fn subscribe_connection<F>(&self, handler: F) -> Subscription
    where
        F: Fn(ConnectionState) + Send + Sync + 'static,
    {
        self.connection.add(
            self.allocate_id(),
            Arc::new(move |state: &ConnectionState| handler(*state)),
        )
    }

    pub fn notify_message(&self, message: &Message) -> usize {
        self.messages.notify(message)
    }

    /// 名簿は差分ではなく常に全体を渡す
    pub fn notify_participants(&self, participants: &[Participant]) -> usize {
        self.participants.notify(participants)
    }

    pub fn notify_connection(&self, state: ConnectionState) -> usize {
        self.connection.notify(&state)
    }

    pub fn message_subscriber_count(&self) -> usize {
        self.messages.len()
    }

    pub fn participant_subscriber_count(&self) -> usize {
        self.participants.len()
    }

    pub fn connection_subscriber_count(&self) -> usize {
        self.connection.len()
    }

    fn allocate_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
