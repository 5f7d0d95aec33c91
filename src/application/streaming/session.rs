//! The per-session ordered channel.
//!
//! Every message a session emits, log line or status event, passes through
//! one bounded channel. Producers serialize their enqueues through a mutex,
//! so the sequence numbers stamped here are the session's total order.
//!
//! Sealing drops the sender half while leaving buffered messages intact:
//! the subscriber drains what was already enqueued and then sees the end
//! of the stream. A terminal event and the seal happen under one lock
//! acquisition, which is what guarantees nothing ever follows an error.

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};

use crate::domain::messages::{LogLine, MessagePayload, SessionMessage, StatusEvent};

/// Returned when a message cannot be enqueued because the channel has
/// been sealed (terminal event delivered, subscriber gone, or closed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("session channel sealed")]
pub struct ChannelSealed;

struct ChannelInner {
    tx: Option<mpsc::Sender<SessionMessage>>,
    next_seq: u64,
}

/// Producer half of a session's channel. Shared by the session worker
/// and the status notifier.
pub struct SessionChannel {
    inner: Mutex<ChannelInner>,
}

impl SessionChannel {
    /// Creates a channel pair with the given buffer capacity.
    pub fn new(capacity: usize) -> (Self, SessionStream) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let channel = Self {
            inner: Mutex::new(ChannelInner {
                tx: Some(tx),
                next_seq: 0,
            }),
        };
        (channel, SessionStream { rx })
    }

    /// Enqueues a log line, waiting for buffer capacity.
    pub async fn send_line(&self, line: LogLine) -> Result<(), ChannelSealed> {
        self.enqueue(MessagePayload::Line(line), false).await
    }

    /// Enqueues a status event without sealing.
    pub async fn send_event(&self, event: StatusEvent) -> Result<(), ChannelSealed> {
        self.enqueue(MessagePayload::Event(event), false).await
    }

    /// Enqueues a final event and seals in the same lock acquisition.
    /// The subscriber receives the event as its last message.
    pub async fn send_terminal(&self, event: StatusEvent) -> Result<(), ChannelSealed> {
        self.enqueue(MessagePayload::Event(event), true).await
    }

    /// Seals without a final event. Used when the subscriber went away
    /// or the server is shutting down.
    pub async fn seal(&self) {
        self.inner.lock().await.tx = None;
    }

    /// True once no further messages can be enqueued.
    pub async fn is_sealed(&self) -> bool {
        self.inner.lock().await.tx.is_none()
    }

    async fn enqueue(&self, payload: MessagePayload, seal_after: bool) -> Result<(), ChannelSealed> {
        // The lock is held across the send so competing producers cannot
        // interleave between taking a sequence number and delivering it.
        let mut inner = self.inner.lock().await;
        let tx = match inner.tx.clone() {
            Some(tx) => tx,
            None => return Err(ChannelSealed),
        };

        let message = SessionMessage {
            seq: inner.next_seq,
            payload,
        };
        if tx.send(message).await.is_err() {
            // Subscriber dropped its half; nothing can be delivered anymore.
            inner.tx = None;
            return Err(ChannelSealed);
        }

        inner.next_seq += 1;
        if seal_after {
            inner.tx = None;
        }
        Ok(())
    }
}

/// Subscriber half of a session's channel.
///
/// Handed to exactly one consumer (the WebSocket task, or a test).
pub struct SessionStream {
    rx: mpsc::Receiver<SessionMessage>,
}

impl SessionStream {
    /// Receives the next message in session order.
    ///
    /// Returns `None` once the channel is sealed and every buffered
    /// message has been drained.
    pub async fn recv(&mut self) -> Option<SessionMessage> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn messages_arrive_in_enqueue_order_with_dense_seqs() {
        let (channel, mut stream) = SessionChannel::new(8);

        channel.send_line(LogLine::new("first")).await.unwrap();
        channel
            .send_event(StatusEvent::status("halfway"))
            .await
            .unwrap();
        channel.send_line(LogLine::new("second")).await.unwrap();

        let m0 = stream.recv().await.unwrap();
        let m1 = stream.recv().await.unwrap();
        let m2 = stream.recv().await.unwrap();

        assert_eq!(m0.seq, 0);
        assert_eq!(m0.as_line().map(LogLine::as_str), Some("first"));
        assert_eq!(m1.seq, 1);
        assert_eq!(m1.as_event(), Some(&StatusEvent::status("halfway")));
        assert_eq!(m2.seq, 2);
        assert_eq!(m2.as_line().map(LogLine::as_str), Some("second"));
    }

    #[tokio::test]
    async fn terminal_event_is_the_last_message() {
        let (channel, mut stream) = SessionChannel::new(8);

        channel.send_line(LogLine::new("one")).await.unwrap();
        channel.send_line(LogLine::new("two")).await.unwrap();
        channel
            .send_terminal(StatusEvent::error("sink gone"))
            .await
            .unwrap();

        assert!(channel.is_sealed().await);
        assert!(channel.send_line(LogLine::new("late")).await.is_err());

        // Buffered messages drain before the stream ends.
        assert_eq!(stream.recv().await.unwrap().seq, 0);
        assert_eq!(stream.recv().await.unwrap().seq, 1);
        let last = stream.recv().await.unwrap();
        assert_eq!(last.as_event(), Some(&StatusEvent::error("sink gone")));
        assert!(stream.recv().await.is_none());
    }

    #[tokio::test]
    async fn seal_without_event_ends_stream_silently() {
        let (channel, mut stream) = SessionChannel::new(4);

        channel.send_line(LogLine::new("only")).await.unwrap();
        channel.seal().await;

        assert_eq!(
            stream.recv().await.unwrap().as_line().map(LogLine::as_str),
            Some("only")
        );
        assert!(stream.recv().await.is_none());
        assert!(channel.send_event(StatusEvent::status("x")).await.is_err());
    }

    #[tokio::test]
    async fn dropped_subscriber_fails_and_seals_the_channel() {
        let (channel, stream) = SessionChannel::new(4);
        drop(stream);

        assert!(channel.send_line(LogLine::new("x")).await.is_err());
        assert!(channel.is_sealed().await);
    }

    #[tokio::test]
    async fn concurrent_producers_get_one_dense_total_order() {
        let (channel, mut stream) = SessionChannel::new(64);
        let channel = Arc::new(channel);

        let lines = {
            let channel = Arc::clone(&channel);
            tokio::spawn(async move {
                for i in 0..10 {
                    channel
                        .send_line(LogLine::new(format!("line {}", i)))
                        .await
                        .unwrap();
                }
            })
        };
        let events = {
            let channel = Arc::clone(&channel);
            tokio::spawn(async move {
                for i in 0..10 {
                    channel
                        .send_event(StatusEvent::status(format!("event {}", i)))
                        .await
                        .unwrap();
                }
            })
        };
        lines.await.unwrap();
        events.await.unwrap();
        channel.seal().await;

        // Whatever interleaving the scheduler chose, delivery order and
        // sequence numbers must agree, with no gaps.
        let mut expected_seq = 0;
        while let Some(message) = stream.recv().await {
            assert_eq!(message.seq, expected_seq);
            expected_seq += 1;
        }
        assert_eq!(expected_seq, 20);
    }
}
