//! Voice relay WebSocket handler
//!
//! One client socket drives one relay session. Binary frames carry 16-bit
//! mono PCM from the microphone. The session's notifications are forwarded
//! back as JSON text frames until either side ends the conversation.

use axum::{
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::{select, time::Duration};
use tracing::{debug, error, info, warn};

use crate::core::realtime::{RealtimeError, RealtimeResult};
use crate::core::relay::{
    RelaySession, SessionSummary, ShutdownReason, audio_ingress, event_channel,
};
use crate::state::AppState;

use super::messages::{RealtimeIncomingMessage, RealtimeMessageRoute, RealtimeOutgoingMessage};

/// Optimized channel buffer size for audio workloads
const CHANNEL_BUFFER_SIZE: usize = 1024;

/// Maximum WebSocket frame size (10 MB)
const MAX_WS_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Maximum WebSocket message size (10 MB)
const MAX_WS_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// Time allowed for queued notifications to drain after the session ends
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Normal closure
const CLOSE_NORMAL: u16 = 1000;

/// Internal error closure
const CLOSE_INTERNAL_ERROR: u16 = 1011;

/// Voice relay WebSocket handler
///
/// Upgrades the HTTP connection and starts a Gemini Live relay session for
/// the lifetime of the socket.
pub async fn realtime_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    debug!("Voice relay WebSocket upgrade requested");

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_realtime_socket(socket, state))
}

/// Close code and reason for a finished session
fn close_for(outcome: &RealtimeResult<SessionSummary>) -> (u16, String) {
    match outcome {
        Ok(_) => (CLOSE_NORMAL, "session ended".to_string()),
        Err(e) if e.is_configuration() => (
            CLOSE_INTERNAL_ERROR,
            "Gemini API key not configured".to_string(),
        ),
        Err(_) => (CLOSE_INTERNAL_ERROR, "Gemini session failed".to_string()),
    }
}

async fn handle_realtime_socket(socket: WebSocket, app_state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (message_tx, mut message_rx) = mpsc::channel::<RealtimeMessageRoute>(CHANNEL_BUFFER_SIZE);

    // Sender task for outgoing messages
    let sender_task = tokio::spawn(async move {
        while let Some(route) = message_rx.recv().await {
            let should_close = matches!(route, RealtimeMessageRoute::Close { .. });

            let result = match route {
                RealtimeMessageRoute::Outgoing(message) => match serde_json::to_string(&message) {
                    Ok(json_str) => sender.send(Message::Text(json_str.into())).await,
                    Err(e) => {
                        error!("Failed to serialize outgoing message: {}", e);
                        continue;
                    }
                },
                RealtimeMessageRoute::Close { code, reason } => {
                    debug!(code, %reason, "Closing voice relay WebSocket");
                    sender
                        .send(Message::Close(Some(CloseFrame {
                            code,
                            reason: reason.into(),
                        })))
                        .await
                }
            };

            if let Err(e) = result {
                debug!("Failed to send WebSocket message: {}", e);
                break;
            }

            if should_close {
                break;
            }
        }
    });

    let (events, mut events_rx) = event_channel();
    let (ingress, ingress_rx) = audio_ingress();
    let session = RelaySession::new(
        app_state.config.relay_config(),
        app_state.connector.clone(),
        events,
    );
    let session_id = session.id().to_string();
    let shutdown = session.shutdown_signal();
    info!(session_id = %session_id, "Voice relay connection established");

    // A session without credentials reports its error instead
    if app_state.config.gemini_configured() {
        let started = RealtimeOutgoingMessage::SessionStarted {
            session_id: session_id.clone(),
        };
        let _ = message_tx
            .send(RealtimeMessageRoute::Outgoing(started))
            .await;
    }

    let mut session_task = tokio::spawn(session.run(ingress_rx));

    // Forward relay notifications until the session drops its sender
    let forward_tx = message_tx.clone();
    let forwarder = tokio::spawn(async move {
        while let Some(notification) = events_rx.recv().await {
            let message = RealtimeOutgoingMessage::from(notification);
            if forward_tx
                .send(RealtimeMessageRoute::Outgoing(message))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    let mut finished = None;
    let mut chunks: u64 = 0;

    loop {
        select! {
            msg_result = receiver.next() => {
                match msg_result {
                    Some(Ok(Message::Binary(data))) => {
                        chunks += 1;
                        if !ingress.push(data) {
                            debug!("Audio ingress closed, dropping client audio");
                            break;
                        }
                    }
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<RealtimeIncomingMessage>(text.as_str()) {
                            Ok(RealtimeIncomingMessage::EndSession) => {
                                info!(session_id = %session_id, "Client ended session");
                                break;
                            }
                            Ok(RealtimeIncomingMessage::Unknown) => {
                                debug!("Ignoring unsupported message type");
                            }
                            Err(e) => {
                                warn!("Invalid JSON from client: {}", e);
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!(session_id = %session_id, "Client disconnected");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(session_id = %session_id, "WebSocket receive error: {}", e);
                        break;
                    }
                }
            }
            result = &mut session_task => {
                finished = Some(result);
                break;
            }
        }
    }

    // The end marker only wakes the send loop; nothing is drained after this.
    shutdown.trigger(ShutdownReason::Requested);
    ingress.finish();

    let joined = match finished {
        Some(result) => result,
        None => session_task.await,
    };
    let outcome = joined.unwrap_or_else(|e| {
        error!(session_id = %session_id, "Relay session task failed: {}", e);
        Err(RealtimeError::TaskFailed(e.to_string()))
    });

    if tokio::time::timeout(DRAIN_TIMEOUT, forwarder).await.is_err() {
        warn!(session_id = %session_id, "Timed out draining relay notifications");
    }

    let (code, reason) = close_for(&outcome);
    let _ = message_tx
        .send(RealtimeMessageRoute::Close { code, reason })
        .await;
    drop(message_tx);
    let _ = tokio::time::timeout(DRAIN_TIMEOUT, sender_task).await;

    match outcome {
        Ok(summary) => info!(
            session_id = %session_id,
            reason = %summary.reason,
            client_chunks = chunks,
            chunks_sent = summary.chunks_sent,
            turns = summary.turns_completed,
            "Voice relay connection closed"
        ),
        Err(e) => warn!(
            session_id = %session_id,
            client_chunks = chunks,
            "Voice relay connection closed after error: {}",
            e
        ),
    }
}
