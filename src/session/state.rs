//! Session connectivity state machine.
//!
//! # States
//! - Disconnected: no usable connection (before startup, after exhaustion, after shutdown)
//! - Connecting: a startup connection attempt is in progress
//! - Connected: the last probe or operation succeeded
//! - Degraded: connectivity is impaired but the session has not given up
//!
//! # State Transitions
//! ```text
//! Disconnected → Connected: initialize() succeeds
//! Connected → Degraded: probe fails / operation hits a connection error
//! Degraded → Connected: probe succeeds / operation succeeds
//! Degraded → Disconnected: operation exhausts its retries
//! any → Disconnected: shutdown()
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::Serialize;

/// Connectivity state of a session.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
    Degraded = 3,
}

impl From<u8> for SessionState {
    fn from(val: u8) -> Self {
        match val {
            1 => SessionState::Connecting,
            2 => SessionState::Connected,
            3 => SessionState::Degraded,
            _ => SessionState::Disconnected,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::Connected => "connected",
            SessionState::Degraded => "degraded",
        };
        f.write_str(name)
    }
}

/// Lock-free cell holding a [`SessionState`].
#[derive(Debug)]
pub struct AtomicSessionState(AtomicU8);

impl AtomicSessionState {
    pub fn new(state: SessionState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub fn load(&self) -> SessionState {
        SessionState::from(self.0.load(Ordering::Acquire))
    }

    /// Store `state`, returning the previous one.
    pub fn swap(&self, state: SessionState) -> SessionState {
        SessionState::from(self.0.swap(state as u8, Ordering::AcqRel))
    }

    /// Move from `from` to `to` only if the current state is `from`.
    ///
    /// Returns true when this call performed the transition, so exactly one
    /// caller observes (and logs) it.
    pub fn transition(&self, from: SessionState, to: SessionState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Point-in-time view of a session, for status output.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub state: SessionState,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub probe_running: bool,
    pub closed: bool,
}
