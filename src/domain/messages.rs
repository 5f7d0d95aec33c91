//! Messages delivered through a session's ordered channel.
//!
//! A session emits exactly two kinds of payload: raw log lines and status
//! events. The wire distinguishes them by shape alone (plain text vs. a
//! single-key JSON object), so the two are kept as separate types here and
//! only merged into one ordered stream by the channel.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One line of build log output, without its trailing newline.
///
/// Empty lines are meaningful in console output and are preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine(String);

impl LogLine {
    /// Creates a log line from already-terminator-stripped text.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the line, returning the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Out-of-band notification about a session's build.
///
/// Serializes to the single-key object the push channel uses:
/// `{"status": "..."}` or `{"error": "..."}`. The two variants are
/// mutually exclusive by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusEvent {
    /// Progress or completion notification. A completion status is the
    /// last message of its session, but a status by itself does not
    /// terminate anything.
    #[serde(rename = "status")]
    Status(String),

    /// Failure notification. Always the last message of its session.
    #[serde(rename = "error")]
    Error(String),
}

impl StatusEvent {
    /// Creates a status notification.
    pub fn status(message: impl Into<String>) -> Self {
        StatusEvent::Status(message.into())
    }

    /// Creates an error notification.
    pub fn error(message: impl Into<String>) -> Self {
        StatusEvent::Error(message.into())
    }
}

/// Ordered unit flowing through a session's channel.
///
/// `seq` is the position in the session's total order, starting at 0.
/// Subscribers observe strictly increasing values with no gaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMessage {
    pub seq: u64,
    pub payload: MessagePayload,
}

/// The two payload kinds a session can emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagePayload {
    Line(LogLine),
    Event(StatusEvent),
}

impl SessionMessage {
    /// Creates a log line message.
    pub fn line(seq: u64, line: LogLine) -> Self {
        Self {
            seq,
            payload: MessagePayload::Line(line),
        }
    }

    /// Creates a status event message.
    pub fn event(seq: u64, event: StatusEvent) -> Self {
        Self {
            seq,
            payload: MessagePayload::Event(event),
        }
    }

    /// Returns the log line payload, if this message carries one.
    pub fn as_line(&self) -> Option<&LogLine> {
        match &self.payload {
            MessagePayload::Line(line) => Some(line),
            MessagePayload::Event(_) => None,
        }
    }

    /// Returns the status event payload, if this message carries one.
    pub fn as_event(&self) -> Option<&StatusEvent> {
        match &self.payload {
            MessagePayload::Event(event) => Some(event),
            MessagePayload::Line(_) => None,
        }
    }
}
