//! Gemini Live client implementation.
//!
//! This module provides the Gemini Live client that implements the `BaseRealtime` trait
//! using the BidiGenerateContent WebSocket API.
//!
//! # API Reference
//!
//! - Endpoint: `wss://generativelanguage.googleapis.com/ws/...BidiGenerateContent?key=<key>`
//! - Protocol: WebSocket with JSON messages (text or binary frames)
//! - Input audio: PCM 16-bit mono, base64 encoded, `audio/pcm;rate=<rate>`
//! - Output audio: PCM 16-bit mono at 24kHz, base64 encoded
//!
//! The socket is split once at connect time. The sink half serves `send_audio`
//! and the stream half serves `next_event`, each behind its own lock.

use std::collections::VecDeque;
use std::io::ErrorKind;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{self, Message, Utf8Bytes};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use super::config::{
    GEMINI_LIVE_URL, GeminiVoice, effective_system_instruction, model_resource_name,
};
use super::messages::{ClientMessage, ServerMessage, Setup};
use crate::core::realtime::base::{
    BaseRealtime, ConnectionState, RealtimeConfig, RealtimeConnector, RealtimeError,
    RealtimeResult, RemoteEvent, SharedRealtime,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Bound on sending the close frame during teardown.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Classify a transport error.
///
/// Anything that means the socket is gone maps to `ConnectionClosed`; the rest
/// stays a transient `WebSocketError`.
fn classify_ws_error(err: tungstenite::Error) -> RealtimeError {
    let closed = match &err {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => true,
        tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake) => true,
        tungstenite::Error::Io(io) => matches!(
            io.kind(),
            ErrorKind::BrokenPipe
                | ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::UnexpectedEof
        ),
        _ => false,
    };

    if closed {
        RealtimeError::ConnectionClosed(err.to_string())
    } else {
        RealtimeError::WebSocketError(err.to_string())
    }
}

fn describe_close(frame: Option<&CloseFrame>) -> String {
    match frame {
        Some(frame) if frame.code == CloseCode::Policy => {
            format!("policy violation (1008): {}", frame.reason)
        }
        Some(frame) => format!("{} {}", u16::from(frame.code), frame.reason),
        None => "closed without close frame".to_string(),
    }
}

// =============================================================================
// Gemini Live Client
// =============================================================================

struct ReceiverState {
    stream: SplitStream<WsStream>,
    pending: VecDeque<RemoteEvent>,
    turn_ended: bool,
}

/// One live Gemini session.
pub struct GeminiLive {
    sink: Mutex<SplitSink<WsStream, Message>>,
    receiver: Mutex<ReceiverState>,
    state: RwLock<ConnectionState>,
    /// Set once the socket is known to be unusable
    closed: AtomicBool,
    /// Set once `close()` has run
    close_requested: AtomicBool,
    model: String,
}

impl GeminiLive {
    /// Connect, send setup and wait for `setupComplete`.
    pub async fn connect(config: &RealtimeConfig) -> RealtimeResult<Self> {
        config.validate_credential()?;

        let url = Self::build_ws_url(config)?;
        let model = model_resource_name(&config.model);
        let voice = GeminiVoice::from_str_or_default(config.voice.as_deref().unwrap_or_default());
        let setup = ClientMessage::Setup(Setup::audio(
            model.clone(),
            voice.as_str(),
            effective_system_instruction(config.system_instruction.as_deref()),
        ));

        tracing::info!(model = %model, voice = %voice, "Connecting to Gemini Live");

        let ws = tokio::time::timeout(config.setup_timeout, Self::handshake(url, setup))
            .await
            .map_err(|_| {
                RealtimeError::Timeout(format!(
                    "Gemini setup did not complete within {:?}",
                    config.setup_timeout
                ))
            })??;

        tracing::info!(model = %model, "Connected to Gemini Live");

        let (sink, stream) = ws.split();
        Ok(Self {
            sink: Mutex::new(sink),
            receiver: Mutex::new(ReceiverState {
                stream,
                pending: VecDeque::new(),
                turn_ended: false,
            }),
            state: RwLock::new(ConnectionState::Connected),
            closed: AtomicBool::new(false),
            close_requested: AtomicBool::new(false),
            model,
        })
    }

    fn build_ws_url(config: &RealtimeConfig) -> RealtimeResult<Url> {
        let base = config.endpoint.as_deref().unwrap_or(GEMINI_LIVE_URL);
        let mut url = Url::parse(base)
            .map_err(|e| RealtimeError::InvalidConfiguration(format!("Invalid endpoint: {e}")))?;
        url.query_pairs_mut().append_pair("key", config.api_key.trim());
        Ok(url)
    }

    async fn handshake(url: Url, setup: ClientMessage) -> RealtimeResult<WsStream> {
        let (mut ws, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| match e {
                tungstenite::Error::Http(ref response)
                    if matches!(response.status().as_u16(), 401 | 403) =>
                {
                    RealtimeError::AuthenticationFailed(format!(
                        "Gemini rejected the API key (HTTP {})",
                        response.status()
                    ))
                }
                other => RealtimeError::ConnectionFailed(other.to_string()),
            })?;

        let json = serde_json::to_string(&setup)
            .map_err(|e| RealtimeError::SerializationError(e.to_string()))?;
        ws.send(Message::Text(json.into()))
            .await
            .map_err(|e| RealtimeError::ConnectionFailed(e.to_string()))?;

        while let Some(msg) = ws.next().await {
            let payload = match msg {
                Ok(Message::Text(text)) => Bytes::copy_from_slice(text.as_bytes()),
                Ok(Message::Binary(data)) => data,
                Ok(Message::Close(frame)) => {
                    return Err(RealtimeError::ConnectionFailed(format!(
                        "Gemini closed the connection during setup: {}",
                        describe_close(frame.as_ref())
                    )));
                }
                Ok(_) => continue,
                Err(e) => return Err(RealtimeError::ConnectionFailed(e.to_string())),
            };

            match serde_json::from_slice::<ServerMessage>(&payload) {
                Ok(message) if message.is_setup_complete() => return Ok(ws),
                Ok(_) => tracing::debug!("Ignoring Gemini message received before setupComplete"),
                Err(e) => tracing::warn!("Failed to parse Gemini setup reply: {}", e),
            }
        }

        Err(RealtimeError::ConnectionFailed(
            "Gemini stream ended before setupComplete".to_string(),
        ))
    }

    fn mark_closed(&self) {
        self.closed.store(true, Ordering::SeqCst);
        *self.state.write() = ConnectionState::Closed;
    }

    fn closed_error(&self) -> RealtimeError {
        RealtimeError::ConnectionClosed("Gemini connection is closed".to_string())
    }

    /// Parse one server payload into pending events.
    fn handle_payload(
        &self,
        payload: &[u8],
        pending: &mut VecDeque<RemoteEvent>,
    ) -> RealtimeResult<()> {
        let message: ServerMessage = serde_json::from_slice(payload)
            .map_err(|e| RealtimeError::SerializationError(e.to_string()))?;

        if let Some(go_away) = message.go_away {
            tracing::warn!(
                time_left = ?go_away.time_left,
                "Gemini announced it will close the connection"
            );
        }

        if let Some(content) = message.server_content {
            pending.extend(content.into_events());
        }
        Ok(())
    }
}

#[async_trait]
impl BaseRealtime for GeminiLive {
    async fn send_audio(&self, audio: Bytes, sample_rate: u32) -> RealtimeResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(self.closed_error());
        }

        let json = serde_json::to_string(&ClientMessage::audio(&audio, sample_rate))
            .map_err(|e| RealtimeError::SerializationError(e.to_string()))?;

        let result = self.sink.lock().await.send(Message::Text(json.into())).await;
        result.map_err(|e| {
            let err = classify_ws_error(e);
            if err.is_connection_closed() {
                self.mark_closed();
            }
            err
        })
    }

    async fn next_event(&self) -> RealtimeResult<Option<RemoteEvent>> {
        let mut guard = self.receiver.lock().await;
        let rx = &mut *guard;

        loop {
            if let Some(event) = rx.pending.pop_front() {
                if event == RemoteEvent::TurnComplete {
                    rx.turn_ended = true;
                }
                return Ok(Some(event));
            }

            if rx.turn_ended {
                rx.turn_ended = false;
                return Ok(None);
            }

            if self.closed.load(Ordering::SeqCst) {
                return Err(self.closed_error());
            }

            match rx.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    self.handle_payload(text.as_bytes(), &mut rx.pending)?
                }
                Some(Ok(Message::Binary(data))) => self.handle_payload(&data, &mut rx.pending)?,
                Some(Ok(Message::Close(frame))) => {
                    let reason = describe_close(frame.as_ref());
                    tracing::info!(reason = %reason, "Gemini closed the connection");
                    self.mark_closed();
                    return Err(RealtimeError::ConnectionClosed(reason));
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    let err = classify_ws_error(e);
                    if err.is_connection_closed() {
                        self.mark_closed();
                    }
                    return Err(err);
                }
                None => {
                    self.mark_closed();
                    return Err(RealtimeError::ConnectionClosed(
                        "Gemini stream ended".to_string(),
                    ));
                }
            }
        }
    }

    async fn close(&self) -> RealtimeResult<()> {
        if self.close_requested.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let already_closed = self.closed.load(Ordering::SeqCst);
        self.mark_closed();

        let shutdown = async {
            let mut sink = self.sink.lock().await;
            if !already_closed {
                let frame = CloseFrame {
                    code: CloseCode::Normal,
                    reason: Utf8Bytes::from_static("session ended"),
                };
                if let Err(e) = sink.send(Message::Close(Some(frame))).await {
                    tracing::debug!("Failed to send close frame to Gemini: {}", e);
                }
            }
            let _ = sink.close().await;
        };

        if tokio::time::timeout(CLOSE_TIMEOUT, shutdown).await.is_err() {
            tracing::warn!("Timed out closing Gemini connection");
        }

        tracing::info!(model = %self.model, "Disconnected from Gemini Live");
        Ok(())
    }

    fn connection_state(&self) -> ConnectionState {
        *self.state.read()
    }
}

// =============================================================================
// Connector
// =============================================================================

/// Opens `GeminiLive` sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeminiConnector;

#[async_trait]
impl RealtimeConnector for GeminiConnector {
    async fn connect(&self, config: &RealtimeConfig) -> RealtimeResult<SharedRealtime> {
        let live = GeminiLive::connect(config).await?;
        Ok(std::sync::Arc::new(live))
    }
}

// =============================================================================
// Tests
// =============================================================================
