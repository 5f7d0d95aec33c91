//! Session lifecycle state machine.
//!
//! A streaming session moves through exactly three states. Every teardown
//! path (client disconnect, build completion, sink failure, shutdown) funnels
//! into the same Closed state instead of toggling ad-hoc flags.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a log streaming session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Registered but not yet polling the log sink.
    Open,

    /// Worker is polling the sink and emitting messages.
    Streaming,

    /// Torn down. No messages may be produced after this.
    Closed,
}

impl StateMachine for SessionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SessionState::*;
        matches!(
            (self, target),
            (Open, Streaming) | (Open, Closed) | (Streaming, Closed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SessionState::*;
        match self {
            Open => vec![Streaming, Closed],
            Streaming => vec![Closed],
            Closed => vec![],
        }
    }
}

/// Why a session was closed. Recorded for logging and teardown decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The client went away; no terminal event is owed.
    Disconnected,

    /// The build reached a terminal state and the final status was delivered.
    Completed,

    /// The sink failed permanently and an error event was delivered.
    Failed,

    /// The server is shutting down.
    Shutdown,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CloseReason::Disconnected => "disconnected",
            CloseReason::Completed => "completed",
            CloseReason::Failed => "failed",
            CloseReason::Shutdown => "shutdown",
        };
        write!(f, "{}", s)
    }
}
