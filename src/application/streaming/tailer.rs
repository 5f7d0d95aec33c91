//! Incremental log reading with retry.
//!
//! One tailer per session. It owns the session's cursor and asks the sink
//! for text at the cursor's offset; transient sink failures are retried
//! with exponential backoff before being promoted to permanent ones.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use crate::domain::cursor::LineCursor;
use crate::domain::foundation::BuildRef;
use crate::domain::messages::LogLine;
use crate::ports::{BuildState, LogChunk, LogSink, SinkError};

/// Backoff schedule for transient sink failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first failure before promotion.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: u32,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based). Grows geometrically
    /// and saturates at `max_backoff`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            multiplier: 2,
            max_backoff: Duration::from_secs(5),
        }
    }
}

/// Outcome of one poll of the sink.
#[derive(Debug)]
pub enum TailPoll {
    /// New complete lines, possibly none. The build is still running.
    Progress(Vec<LogLine>),

    /// The build reached a terminal state. `lines` carries the rest of
    /// the log, including a flushed partial last line.
    Complete {
        lines: Vec<LogLine>,
        result: Option<String>,
    },
}

/// Reads one build's console output incrementally.
pub struct LogTailer {
    sink: Arc<dyn LogSink>,
    build: BuildRef,
    cursor: LineCursor,
    retry: RetryPolicy,
}

impl LogTailer {
    /// Creates a tailer positioned at the start of the build's log.
    pub fn new(sink: Arc<dyn LogSink>, build: BuildRef, retry: RetryPolicy) -> Self {
        Self {
            sink,
            build,
            cursor: LineCursor::new(),
            retry,
        }
    }

    /// The build this tailer reads.
    pub fn build(&self) -> &BuildRef {
        &self.build
    }

    /// Current byte offset into the build's console text.
    pub fn offset(&self) -> u64 {
        self.cursor.offset()
    }

    /// Performs one poll: read new text, then check the build state.
    ///
    /// Text is read before state on purpose. When the state read says the
    /// build finished, one more text read picks up whatever landed between
    /// the two, so the final lines are never dropped.
    pub async fn next_batch(&mut self) -> Result<TailPoll, SinkError> {
        let chunk = self.read_with_retry().await?;
        self.reject_truncation(&chunk)?;
        let mut lines = self.cursor.advance(&chunk.data);

        match self.state_with_retry().await? {
            BuildState::Running => Ok(TailPoll::Progress(lines)),
            BuildState::Finished { result } => {
                let tail = self.read_with_retry().await?;
                self.reject_truncation(&tail)?;
                lines.extend(self.cursor.advance(&tail.data));
                if let Some(last) = self.cursor.flush() {
                    lines.push(last);
                }
                Ok(TailPoll::Complete { lines, result })
            }
        }
    }

    async fn read_with_retry(&self) -> Result<LogChunk, SinkError> {
        let mut attempt = 0;
        loop {
            match self.sink.read_from(&self.build, self.cursor.offset()).await {
                Ok(chunk) => return Ok(chunk),
                Err(err) if err.is_transient() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    attempt += 1;
                    warn!(
                        build = %self.build,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient sink read failure, backing off"
                    );
                    sleep(delay).await;
                }
                Err(err) if err.is_transient() => {
                    return Err(SinkError::Gone(format!(
                        "giving up after {} retries: {}",
                        attempt, err
                    )));
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn state_with_retry(&self) -> Result<BuildState, SinkError> {
        let mut attempt = 0;
        loop {
            match self.sink.build_state(&self.build).await {
                Ok(state) => return Ok(state),
                Err(err) if err.is_transient() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    attempt += 1;
                    warn!(
                        build = %self.build,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient build state failure, backing off"
                    );
                    sleep(delay).await;
                }
                Err(err) if err.is_transient() => {
                    return Err(SinkError::Gone(format!(
                        "giving up after {} retries: {}",
                        attempt, err
                    )));
                }
                Err(err) => return Err(err),
            }
        }
    }

    // The sink is append-only. A total length behind the cursor means the
    // upstream log was truncated or replaced; re-reading would duplicate
    // or corrupt output, so the session must die instead.
    fn reject_truncation(&self, chunk: &LogChunk) -> Result<(), SinkError> {
        if chunk.total_len < self.cursor.offset() {
            return Err(SinkError::Gone(format!(
                "log truncated upstream: length {} fell below read offset {}",
                chunk.total_len,
                self.cursor.offset()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{BuildNumber, JobName};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn test_build() -> BuildRef {
        BuildRef::new(JobName::new("web").unwrap(), BuildNumber::new(1))
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            multiplier: 2,
            max_backoff: Duration::from_millis(4),
        }
    }

    fn chunk(data: &str, total_len: u64) -> LogChunk {
        LogChunk {
            data: data.to_string(),
            total_len,
        }
    }

    /// Sink that replays scripted responses in order. Once a script runs
    /// out it repeats its last configured fallback.
    struct ScriptedSink {
        reads: Mutex<VecDeque<Result<LogChunk, SinkError>>>,
        states: Mutex<VecDeque<Result<BuildState, SinkError>>>,
        read_calls: AtomicUsize,
    }

    impl ScriptedSink {
        fn new(
            reads: Vec<Result<LogChunk, SinkError>>,
            states: Vec<Result<BuildState, SinkError>>,
        ) -> Self {
            Self {
                reads: Mutex::new(reads.into()),
                states: Mutex::new(states.into()),
                read_calls: AtomicUsize::new(0),
            }
        }

        fn read_calls(&self) -> usize {
            self.read_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LogSink for ScriptedSink {
        async fn build_state(&self, _build: &BuildRef) -> Result<BuildState, SinkError> {
            self.states
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(BuildState::Running))
        }

        async fn read_from(&self, _build: &BuildRef, _offset: u64) -> Result<LogChunk, SinkError> {
            self.read_calls.fetch_add(1, Ordering::SeqCst);
            self.reads
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(chunk("", 0)))
        }
    }

    #[tokio::test]
    async fn running_build_yields_complete_lines_and_buffers_the_rest() {
        let sink = Arc::new(ScriptedSink::new(
            vec![Ok(chunk("one\ntwo", 7))],
            vec![Ok(BuildState::Running)],
        ));
        let mut tailer = LogTailer::new(sink, test_build(), fast_retry());

        match tailer.next_batch().await.unwrap() {
            TailPoll::Progress(lines) => {
                let texts: Vec<_> = lines.iter().map(|l| l.as_str().to_string()).collect();
                assert_eq!(texts, vec!["one"]);
            }
            other => panic!("expected Progress, got {:?}", other),
        }
        assert_eq!(tailer.offset(), 7);
    }

    #[tokio::test]
    async fn finished_build_reads_the_tail_and_flushes_the_partial_line() {
        let sink = Arc::new(ScriptedSink::new(
            vec![Ok(chunk("one\n", 4)), Ok(chunk("two\nend", 11))],
            vec![Ok(BuildState::Finished {
                result: Some("SUCCESS".into()),
            })],
        ));
        let mut tailer = LogTailer::new(sink, test_build(), fast_retry());

        match tailer.next_batch().await.unwrap() {
            TailPoll::Complete { lines, result } => {
                let texts: Vec<_> = lines.iter().map(|l| l.as_str().to_string()).collect();
                assert_eq!(texts, vec!["one", "two", "end"]);
                assert_eq!(result.as_deref(), Some("SUCCESS"));
            }
            other => panic!("expected Complete, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn transient_read_failures_are_retried_until_success() {
        let sink = Arc::new(ScriptedSink::new(
            vec![
                Err(SinkError::Transient("timeout".into())),
                Err(SinkError::Transient("timeout".into())),
                Ok(chunk("late\n", 5)),
            ],
            vec![Ok(BuildState::Running)],
        ));
        let mut tailer = LogTailer::new(Arc::clone(&sink) as Arc<dyn LogSink>, test_build(), fast_retry());

        match tailer.next_batch().await.unwrap() {
            TailPoll::Progress(lines) => assert_eq!(lines.len(), 1),
            other => panic!("expected Progress, got {:?}", other),
        }
        assert_eq!(sink.read_calls(), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_promote_to_gone() {
        let transient = || Err(SinkError::Transient("flaky".into()));
        let sink = Arc::new(ScriptedSink::new(
            vec![transient(), transient(), transient(), transient()],
            vec![],
        ));
        let mut tailer = LogTailer::new(Arc::clone(&sink) as Arc<dyn LogSink>, test_build(), fast_retry());

        let err = tailer.next_batch().await.unwrap_err();
        match err {
            SinkError::Gone(message) => assert!(message.contains("giving up after 3 retries")),
            other => panic!("expected Gone, got {:?}", other),
        }
        // initial read + max_attempts retries
        assert_eq!(sink.read_calls(), 4);
    }

    #[tokio::test]
    async fn gone_is_fatal_without_retry() {
        let sink = Arc::new(ScriptedSink::new(
            vec![Err(SinkError::Gone("rotated".into()))],
            vec![],
        ));
        let mut tailer = LogTailer::new(Arc::clone(&sink) as Arc<dyn LogSink>, test_build(), fast_retry());

        assert!(matches!(
            tailer.next_batch().await,
            Err(SinkError::Gone(_))
        ));
        assert_eq!(sink.read_calls(), 1);
    }

    #[tokio::test]
    async fn not_found_mid_stream_is_fatal_without_retry() {
        let sink = Arc::new(ScriptedSink::new(
            vec![Err(SinkError::NotFound(test_build()))],
            vec![],
        ));
        let mut tailer = LogTailer::new(Arc::clone(&sink) as Arc<dyn LogSink>, test_build(), fast_retry());

        assert!(matches!(
            tailer.next_batch().await,
            Err(SinkError::NotFound(_))
        ));
        assert_eq!(sink.read_calls(), 1);
    }

    #[tokio::test]
    async fn shrinking_sink_is_treated_as_gone() {
        let sink = Arc::new(ScriptedSink::new(
            vec![Ok(chunk("abcdef\n", 7)), Ok(chunk("", 3))],
            vec![Ok(BuildState::Running), Ok(BuildState::Running)],
        ));
        let mut tailer = LogTailer::new(sink, test_build(), fast_retry());

        tailer.next_batch().await.unwrap();
        let err = tailer.next_batch().await.unwrap_err();
        match err {
            SinkError::Gone(message) => assert!(message.contains("truncated")),
            other => panic!("expected Gone, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn transient_state_failures_are_retried_too() {
        let sink = Arc::new(ScriptedSink::new(
            vec![Ok(chunk("a\n", 2))],
            vec![
                Err(SinkError::Transient("hiccup".into())),
                Ok(BuildState::Running),
            ],
        ));
        let mut tailer = LogTailer::new(sink, test_build(), fast_retry());

        assert!(matches!(
            tailer.next_batch().await,
            Ok(TailPoll::Progress(_))
        ));
    }

    #[test]
    fn retry_delay_grows_geometrically_and_saturates() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(500),
            multiplier: 2,
            max_backoff: Duration::from_secs(3),
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(3));
        assert_eq!(policy.delay_for(10), Duration::from_secs(3));
    }
}
