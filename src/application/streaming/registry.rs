//! Session registry: owns every live streaming session.
//!
//! One registry per process. Each session gets one entry in the map, one
//! bounded ordered channel, and one dedicated worker task driving a tailer.
//! Closing signals the worker through a watch channel and never joins it
//! from the close path, because workers close their own sessions on
//! completion and failure.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::foundation::{
    BuildNumber, BuildRef, JobName, SessionId, StateMachine, Timestamp,
};
use crate::domain::lifecycle::{CloseReason, SessionState};
use crate::domain::messages::StatusEvent;
use crate::ports::{LogSink, SinkError};

use super::notifier::NotifyError;
use super::session::{SessionChannel, SessionStream};
use super::tailer::{LogTailer, RetryPolicy, TailPoll};

/// Terminal status sent when the upstream finishes a build without
/// reporting a result string.
const FALLBACK_TERMINAL_STATUS: &str = "FINISHED";

/// Tuning for session workers and their channels.
#[derive(Debug, Clone)]
pub struct StreamSettings {
    /// Pause between sink polls once caught up.
    pub poll_interval: Duration,

    /// Buffered messages per session before producers wait.
    pub channel_capacity: usize,

    pub retry: RetryPolicy,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            channel_capacity: 256,
            retry: RetryPolicy::default(),
        }
    }
}

impl StreamSettings {
    /// Sets the pause between sink polls.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Sets the per-session channel capacity.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Sets the transient failure retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Why a session could not be opened.
#[derive(Debug, Clone, Error)]
pub enum OpenError {
    /// The sink has no such build. Nothing was registered.
    #[error("build {0} not found")]
    BuildNotFound(BuildRef),

    /// The sink failed while validating the build.
    #[error(transparent)]
    Sink(SinkError),
}

struct SessionEntry {
    build: BuildRef,
    state: Mutex<SessionState>,
    channel: Arc<SessionChannel>,
    cancel: watch::Sender<bool>,
    worker: Option<JoinHandle<()>>,
    opened_at: Timestamp,
}

enum StreamOutcome {
    Completed(Option<String>),
    Failed(SinkError),
    SubscriberGone,
    Cancelled,
}

/// Tracks live sessions and owns their workers.
pub struct SessionRegistry {
    sink: Arc<dyn LogSink>,
    settings: StreamSettings,
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
    draining: AtomicBool,
}

impl SessionRegistry {
    /// Creates a registry reading from the given sink.
    pub fn new(sink: Arc<dyn LogSink>, settings: StreamSettings) -> Self {
        Self {
            sink,
            settings,
            sessions: RwLock::new(HashMap::new()),
            draining: AtomicBool::new(false),
        }
    }

    /// Opens a streaming session for one build.
    ///
    /// Validates the build against the sink first; nothing is registered
    /// for a build the sink does not know. On success the caller receives
    /// the session id and the subscriber half of the session's channel,
    /// and a worker starts tailing from the beginning of the log.
    pub async fn open(
        self: &Arc<Self>,
        job: JobName,
        number: BuildNumber,
    ) -> Result<(SessionId, SessionStream), OpenError> {
        let build = BuildRef::new(job, number);
        if self.draining.load(Ordering::Acquire) {
            return Err(Self::refused_while_draining());
        }

        // 1. Verify the build exists before registering anything
        let build_state = self.sink.build_state(&build).await.map_err(|err| match err {
            SinkError::NotFound(missing) => OpenError::BuildNotFound(missing),
            other => OpenError::Sink(other),
        })?;

        // 2. Register the session with its ordered channel
        let session_id = SessionId::new();
        let (channel, stream) = SessionChannel::new(self.settings.channel_capacity);
        let channel = Arc::new(channel);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let entry = SessionEntry {
            build: build.clone(),
            state: Mutex::new(SessionState::Open),
            channel: Arc::clone(&channel),
            cancel: cancel_tx,
            worker: None,
            opened_at: Timestamp::now(),
        };
        {
            // Re-checked under the map lock: shutdown sets the flag before
            // draining, so an entry inserted here is guaranteed to be seen
            // by the drain.
            let mut sessions = self.sessions.write().await;
            if self.draining.load(Ordering::Acquire) {
                return Err(Self::refused_while_draining());
            }
            sessions.insert(session_id, entry);
        }

        // 3. Spawn the dedicated worker
        let tailer = LogTailer::new(
            Arc::clone(&self.sink),
            build.clone(),
            self.settings.retry.clone(),
        );
        let registry = Arc::clone(self);
        let handle = tokio::spawn(async move {
            registry
                .run_worker(session_id, tailer, channel, cancel_rx)
                .await;
        });
        if let Some(entry) = self.sessions.write().await.get_mut(&session_id) {
            entry.worker = Some(handle);
        }

        info!(
            session_id = %session_id,
            build = %build,
            running = build_state.is_running(),
            "session opened"
        );
        Ok((session_id, stream))
    }

    /// Closes a session. Idempotent; unknown ids are ignored.
    ///
    /// Seals the channel (buffered messages still drain), cancels the
    /// worker cooperatively, and removes the entry.
    pub async fn close(&self, session_id: SessionId, reason: CloseReason) {
        let entry = match self.sessions.write().await.remove(&session_id) {
            Some(entry) => entry,
            None => return,
        };
        self.teardown(session_id, entry, reason).await;
    }

    /// Closes every session and waits for their workers to finish. New
    /// sessions are refused from this point on.
    pub async fn shutdown(&self) {
        self.draining.store(true, Ordering::Release);
        let entries: Vec<(SessionId, SessionEntry)> =
            self.sessions.write().await.drain().collect();
        if entries.is_empty() {
            return;
        }
        info!(count = entries.len(), "closing all sessions");

        let mut workers = Vec::new();
        for (session_id, mut entry) in entries {
            if let Some(handle) = entry.worker.take() {
                workers.push(handle);
            }
            self.teardown(session_id, entry, CloseReason::Shutdown).await;
        }
        for handle in workers {
            if let Err(err) = handle.await {
                warn!(error = %err, "session worker ended abnormally");
            }
        }
    }

    /// Number of live sessions.
    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Current lifecycle state of a session, if it is still registered.
    pub async fn session_state(&self, session_id: SessionId) -> Option<SessionState> {
        let sessions = self.sessions.read().await;
        let entry = sessions.get(&session_id)?;
        let state = entry.state.lock().await;
        Some(*state)
    }

    // ════════════════════════════════════════════════════════════════
    // Notification entry points (shared by StatusNotifier and workers)
    // ════════════════════════════════════════════════════════════════

    /// Enqueues a non-terminal status event on the session's channel.
    pub(super) async fn notify(
        &self,
        session_id: SessionId,
        status: impl Into<String>,
    ) -> Result<(), NotifyError> {
        let channel = self
            .channel_of(session_id)
            .await
            .ok_or(NotifyError::UnknownSession(session_id))?;
        channel
            .send_event(StatusEvent::status(status))
            .await
            .map_err(|_| NotifyError::Closed)
    }

    /// Enqueues the terminal completion status, seals the channel, and
    /// closes the session.
    pub(super) async fn complete(
        &self,
        session_id: SessionId,
        status: impl Into<String>,
    ) -> Result<(), NotifyError> {
        let channel = self
            .channel_of(session_id)
            .await
            .ok_or(NotifyError::UnknownSession(session_id))?;
        channel
            .send_terminal(StatusEvent::status(status))
            .await
            .map_err(|_| NotifyError::Closed)?;
        self.close(session_id, CloseReason::Completed).await;
        Ok(())
    }

    /// Enqueues the terminal error event, seals the channel, and closes
    /// the session. Nothing can be enqueued afterwards.
    pub(super) async fn fail(
        &self,
        session_id: SessionId,
        message: impl Into<String>,
    ) -> Result<(), NotifyError> {
        let channel = self
            .channel_of(session_id)
            .await
            .ok_or(NotifyError::UnknownSession(session_id))?;
        channel
            .send_terminal(StatusEvent::error(message))
            .await
            .map_err(|_| NotifyError::Closed)?;
        self.close(session_id, CloseReason::Failed).await;
        Ok(())
    }

    // ════════════════════════════════════════════════════════════════
    // Internals
    // ════════════════════════════════════════════════════════════════

    fn refused_while_draining() -> OpenError {
        OpenError::Sink(SinkError::Gone("server is shutting down".to_string()))
    }

    async fn channel_of(&self, session_id: SessionId) -> Option<Arc<SessionChannel>> {
        self.sessions
            .read()
            .await
            .get(&session_id)
            .map(|entry| Arc::clone(&entry.channel))
    }

    async fn teardown(&self, session_id: SessionId, entry: SessionEntry, reason: CloseReason) {
        {
            let mut state = entry.state.lock().await;
            if let Ok(next) = state.transition_to(SessionState::Closed) {
                *state = next;
            }
        }
        entry.channel.seal().await;
        let _ = entry.cancel.send(true);

        let lifetime = Timestamp::now().duration_since(&entry.opened_at);
        info!(
            session_id = %session_id,
            build = %entry.build,
            reason = %reason,
            lifetime_ms = lifetime.num_milliseconds(),
            "session closed"
        );
    }

    /// Marks the session as streaming. False if it was closed before the
    /// worker got here.
    async fn mark_streaming(&self, session_id: SessionId) -> bool {
        let sessions = self.sessions.read().await;
        let entry = match sessions.get(&session_id) {
            Some(entry) => entry,
            None => return false,
        };
        let mut state = entry.state.lock().await;
        match state.transition_to(SessionState::Streaming) {
            Ok(next) => {
                *state = next;
                true
            }
            Err(_) => false,
        }
    }

    async fn run_worker(
        self: Arc<Self>,
        session_id: SessionId,
        mut tailer: LogTailer,
        channel: Arc<SessionChannel>,
        mut cancel: watch::Receiver<bool>,
    ) {
        if !self.mark_streaming(session_id).await {
            debug!(session_id = %session_id, "session closed before streaming began");
            return;
        }
        debug!(session_id = %session_id, build = %tailer.build(), "worker streaming");

        let outcome = tokio::select! {
            _ = cancel.changed() => StreamOutcome::Cancelled,
            outcome = Self::drive(&mut tailer, &channel, self.settings.poll_interval) => outcome,
        };

        match outcome {
            StreamOutcome::Completed(result) => {
                let status =
                    result.unwrap_or_else(|| FALLBACK_TERMINAL_STATUS.to_string());
                if let Err(err) = self.complete(session_id, status).await {
                    debug!(session_id = %session_id, error = %err, "completion not delivered");
                }
            }
            StreamOutcome::Failed(sink_err) => {
                warn!(
                    session_id = %session_id,
                    build = %tailer.build(),
                    error = %sink_err,
                    "stream failed"
                );
                if let Err(err) = self.fail(session_id, sink_err.to_string()).await {
                    debug!(session_id = %session_id, error = %err, "failure not delivered");
                }
            }
            StreamOutcome::SubscriberGone => {
                debug!(session_id = %session_id, "subscriber dropped the stream");
                self.close(session_id, CloseReason::Disconnected).await;
            }
            StreamOutcome::Cancelled => {
                debug!(session_id = %session_id, "worker cancelled");
            }
        }
    }

    /// Polls the tailer and forwards lines until the build completes,
    /// the sink fails permanently, or the subscriber goes away.
    async fn drive(
        tailer: &mut LogTailer,
        channel: &SessionChannel,
        poll_interval: Duration,
    ) -> StreamOutcome {
        loop {
            match tailer.next_batch().await {
                Ok(TailPoll::Progress(lines)) => {
                    for line in lines {
                        if channel.send_line(line).await.is_err() {
                            return StreamOutcome::SubscriberGone;
                        }
                    }
                    tokio::time::sleep(poll_interval).await;
                }
                Ok(TailPoll::Complete { lines, result }) => {
                    for line in lines {
                        if channel.send_line(line).await.is_err() {
                            return StreamOutcome::SubscriberGone;
                        }
                    }
                    return StreamOutcome::Completed(result);
                }
                Err(err) => return StreamOutcome::Failed(err),
            }
        }
    }
}
