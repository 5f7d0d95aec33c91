//! WebSocket endpoint for live build logs.
//!
//! Connection lifecycle:
//! 1. Upgrade the HTTP request
//! 2. Open a session for the (job, build) pair
//! 3. Forward session messages as frames until the session ends or the
//!    client leaves
//! 4. Close the session
//!
//! A build that cannot be streamed still gets its upgrade: the socket is
//! accepted, one `{"error"}` frame is sent, and the socket closes. That is
//! the contract the dashboard expects.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::debug;

use crate::application::streaming::{OpenError, SessionStream};
use crate::domain::foundation::{BuildNumber, JobName, SessionId};
use crate::domain::lifecycle::CloseReason;
use crate::domain::messages::{MessagePayload, SessionMessage, StatusEvent};

use super::handlers::AppState;

/// `GET /ws/logs/:job_name/:build_number`
pub async fn stream_build(
    ws: WebSocketUpgrade,
    Path((job_name, build_number)): Path<(String, u32)>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, job_name, build_number))
}

async fn handle_socket(socket: WebSocket, state: AppState, job_name: String, build_number: u32) {
    let job = match JobName::new(job_name) {
        Ok(job) => job,
        Err(err) => {
            refuse(socket, err.to_string()).await;
            return;
        }
    };
    let number = BuildNumber::new(build_number);

    let (session_id, stream) = match state.registry.open(job, number).await {
        Ok(opened) => opened,
        Err(err) => {
            let message = match &err {
                OpenError::BuildNotFound(build) => format!("Build {} not found", build),
                OpenError::Sink(sink_err) => sink_err.to_string(),
            };
            debug!(error = %err, "stream refused");
            refuse(socket, message).await;
            return;
        }
    };

    debug!(session_id = %session_id, "websocket attached");
    pump(socket, session_id, stream).await;

    // Idempotent: a session that already completed is simply gone.
    state
        .registry
        .close(session_id, CloseReason::Disconnected)
        .await;
}

/// Forwards session messages to the client until the session ends or the
/// client goes away.
async fn pump(socket: WebSocket, session_id: SessionId, mut stream: SessionStream) {
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            message = stream.recv() => {
                match message {
                    Some(message) => {
                        if sender.send(render_frame(&message)).await.is_err() {
                            debug!(session_id = %session_id, "send failed, client gone");
                            break;
                        }
                    }
                    None => {
                        // Session over and fully drained.
                        let _ = sender.close().await;
                        break;
                    }
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(session_id = %session_id, "client closed the stream");
                        break;
                    }
                    Some(Ok(_)) => {
                        // Inbound frames carry nothing for us.
                    }
                    Some(Err(err)) => {
                        debug!(session_id = %session_id, error = %err, "receive error");
                        break;
                    }
                }
            }
        }
    }
}

/// Accepts the socket just long enough to deliver one error event.
async fn refuse(mut socket: WebSocket, message: String) {
    let frame = Message::Text(encode_event(&StatusEvent::error(message)));
    if socket.send(frame).await.is_err() {
        return;
    }
    let _ = socket.send(Message::Close(None)).await;
}

/// Log lines go out as raw text, events as their JSON encoding.
fn render_frame(message: &SessionMessage) -> Message {
    match &message.payload {
        MessagePayload::Line(line) => Message::Text(line.as_str().to_string()),
        MessagePayload::Event(event) => Message::Text(encode_event(event)),
    }
}

fn encode_event(event: &StatusEvent) -> String {
    serde_json::to_string(event).expect("status event serialization should not fail")
}
