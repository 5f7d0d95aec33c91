//! Status notifier: pushes build status events into live sessions.
//!
//! Status events ride the same ordered channel as log lines, so a
//! subscriber sees them exactly where they were enqueued relative to the
//! surrounding lines. Completion and failure are terminal; they seal the
//! channel and close the session through the registry, the same path the
//! session worker uses.

use std::sync::Arc;
use thiserror::Error;

use crate::domain::foundation::SessionId;

use super::registry::SessionRegistry;

/// Why a status event could not be delivered.
#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    /// No session with this id is registered.
    #[error("no session registered for {0}")]
    UnknownSession(SessionId),

    /// The session's channel is already sealed.
    #[error("session channel already closed")]
    Closed,
}

/// Cloneable handle for pushing status events into sessions.
#[derive(Clone)]
pub struct StatusNotifier {
    registry: Arc<SessionRegistry>,
}

impl StatusNotifier {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Delivers a non-terminal status event. The session keeps streaming.
    pub async fn notify(
        &self,
        session_id: SessionId,
        status: impl Into<String>,
    ) -> Result<(), NotifyError> {
        self.registry.notify(session_id, status).await
    }

    /// Delivers the final status and closes the session. The status event
    /// is the last message the subscriber receives.
    pub async fn complete(
        &self,
        session_id: SessionId,
        status: impl Into<String>,
    ) -> Result<(), NotifyError> {
        self.registry.complete(session_id, status).await
    }

    /// Delivers a terminal error event and closes the session. Nothing
    /// follows an error event.
    pub async fn fail(
        &self,
        session_id: SessionId,
        message: impl Into<String>,
    ) -> Result<(), NotifyError> {
        self.registry.fail(session_id, message).await
    }
}
