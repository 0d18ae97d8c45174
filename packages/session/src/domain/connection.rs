//! 接続ライフサイクル（状態機械）
//!
//! ```text
//! Disconnected --begin_connect--> Connecting
//! Connecting   --complete-------> Connected
//! Connecting   --fail-----------> Disconnected
//! Connected    --disconnect-----> Disconnected
//! ```
//!
//! 上記以外の遷移は [`TransitionError`] として拒否され、状態は変化しない。

use std::fmt;

use super::error::TransitionError;

/// 接続状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 接続状態の遷移を管理する状態機械
#[derive(Debug, Default)]
pub struct ConnectionLifecycle {
    state: ConnectionState,
}

impl ConnectionLifecycle {
    /// `Disconnected` から開始する
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// `Disconnected -> Connecting`
    pub fn begin_connect(&mut self) -> Result<ConnectionState, TransitionError> {
        self.transition(ConnectionState::Connecting)
    }

    /// `Connecting -> Connected`
    pub fn complete_connect(&mut self) -> Result<ConnectionState, TransitionError> {
        if self.state != ConnectionState::Connecting {
            return Err(self.rejected(ConnectionState::Connected));
        }
        self.transition(ConnectionState::Connected)
    }

    /// `Connecting -> Disconnected`
    pub fn fail_connect(&mut self) -> Result<ConnectionState, TransitionError> {
        if self.state != ConnectionState::Connecting {
            return Err(self.rejected(ConnectionState::Disconnected));
        }
        self.transition(ConnectionState::Disconnected)
    }

    /// `Connected -> Disconnected`
    pub fn disconnect(&mut self) -> Result<ConnectionState, TransitionError> {
        if self.state != ConnectionState::Connected {
            return Err(self.rejected(ConnectionState::Disconnected));
        }
        self.transition(ConnectionState::Disconnected)
    }

    /// 遷移が状態機械上で許可されているか
    pub fn is_legal(from: ConnectionState, to: ConnectionState) -> bool {
        use ConnectionState::{Connected, Connecting, Disconnected};

        matches!(
            (from, to),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Disconnected)
                | (Connected, Disconnected)
        )
    }

    fn transition(&mut self, to: ConnectionState) -> Result<ConnectionState, TransitionError> {
        if !Self::is_legal(self.state, to) {
            return Err(self.rejected(to));
        }
        tracing::debug!("Connection state: {} -> {}", self.state, to);
        self.state = to;
        Ok(to)
    }

    fn rejected(&self, to: ConnectionState) -> TransitionError {
        TransitionError {
            from: self.state,
            to,
        }
    }
}
