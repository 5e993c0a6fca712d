//! Base traits and types for remote streaming speech models.
//!
//! This module defines the seam between the session relay and a remote model:
//! a connector that opens one bidirectional stream per session, and the
//! connection handle that sends audio upstream and yields typed events
//! downstream.
//!
//! # Audio Format
//!
//! Upstream audio is PCM 16-bit signed little-endian mono at the configured
//! input rate (16kHz by default). Downstream audio is PCM 16-bit mono at 24kHz.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Default sample rate of audio sent to the remote model.
pub const DEFAULT_INPUT_SAMPLE_RATE: u32 = 16000;

/// Sample rate of audio produced by native-audio models.
pub const DEFAULT_OUTPUT_SAMPLE_RATE: u32 = 24000;

/// Default bound on the setup handshake.
pub const DEFAULT_SETUP_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while talking to a remote model.
///
/// The variants fall into four classes which callers act on differently:
/// configuration errors (never retried), a closed connection (fatal to the
/// session), cancellation (expected during teardown) and everything else
/// (transient, absorbed locally).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RealtimeError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Connection to the provider failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The remote transport has been closed
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    /// WebSocket error that did not close the connection
    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    /// Provider-specific error
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Operation timeout
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// The operation was cancelled by session teardown
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// Too many consecutive receive failures
    #[error("Receive retries exhausted after {0} consecutive failures")]
    RetriesExhausted(u32),

    /// A relay task panicked
    #[error("Task failed: {0}")]
    TaskFailed(String),
}

impl RealtimeError {
    /// Whether this error means the remote connection is gone.
    pub fn is_connection_closed(&self) -> bool {
        matches!(self, RealtimeError::ConnectionClosed(_))
    }

    /// Whether this error was caused by cancellation during teardown.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, RealtimeError::Cancelled(_))
    }

    /// Whether this error is a configuration problem that must not be retried.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            RealtimeError::InvalidConfiguration(_) | RealtimeError::AuthenticationFailed(_)
        )
    }
}

/// Result type for realtime operations.
pub type RealtimeResult<T> = Result<T, RealtimeError>;

// =============================================================================
// Configuration Types
// =============================================================================

/// Configuration for one remote model session.
#[derive(Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// API key for authentication
    pub api_key: String,

    /// Model to use (e.g., "gemini-2.5-flash-preview-native-audio-dialog")
    #[serde(default)]
    pub model: String,

    /// Prebuilt voice name
    #[serde(default)]
    pub voice: Option<String>,

    /// System instructions for the assistant
    #[serde(default)]
    pub system_instruction: Option<String>,

    /// Sample rate declared on upstream audio chunks
    #[serde(default = "default_input_sample_rate")]
    pub input_sample_rate: u32,

    /// Sample rate of downstream audio
    #[serde(default = "default_output_sample_rate")]
    pub output_sample_rate: u32,

    /// Endpoint override (tests and proxies)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bound on the connect + setup handshake
    #[serde(skip, default = "default_setup_timeout")]
    pub setup_timeout: Duration,
}

fn default_input_sample_rate() -> u32 {
    DEFAULT_INPUT_SAMPLE_RATE
}

fn default_output_sample_rate() -> u32 {
    DEFAULT_OUTPUT_SAMPLE_RATE
}

fn default_setup_timeout() -> Duration {
    DEFAULT_SETUP_TIMEOUT
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: String::new(),
            voice: None,
            system_instruction: None,
            input_sample_rate: DEFAULT_INPUT_SAMPLE_RATE,
            output_sample_rate: DEFAULT_OUTPUT_SAMPLE_RATE,
            endpoint: None,
            setup_timeout: DEFAULT_SETUP_TIMEOUT,
        }
    }
}

impl fmt::Debug for RealtimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealtimeConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("voice", &self.voice)
            .field(
                "system_instruction",
                &self.system_instruction.as_ref().map(|s| s.len()),
            )
            .field("input_sample_rate", &self.input_sample_rate)
            .field("output_sample_rate", &self.output_sample_rate)
            .field("endpoint", &self.endpoint)
            .field("setup_timeout", &self.setup_timeout)
            .finish()
    }
}

impl RealtimeConfig {
    /// Check the credential before any network activity.
    pub fn validate_credential(&self) -> RealtimeResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(RealtimeError::InvalidConfiguration(
                "API key is required".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Connection State
// =============================================================================

/// Connection state for realtime providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Not connected to the provider
    #[default]
    Disconnected,
    /// Currently connecting
    Connecting,
    /// Connected and ready
    Connected,
    /// Connection closed by either side
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Connected => write!(f, "Connected"),
            ConnectionState::Closed => write!(f, "Closed"),
        }
    }
}

// =============================================================================
// Remote Events
// =============================================================================

/// One typed event produced by the remote model, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEvent {
    /// The user barged in; the current model turn was cut short
    Interrupted,
    /// Inline PCM audio for the current turn
    Audio(Bytes),
    /// Inline text for the current turn
    Text(String),
    /// The model finished its turn
    TurnComplete,
}

// =============================================================================
// Base Traits
// =============================================================================

/// Handle to one live bidirectional stream with a remote model.
///
/// Sending and receiving take `&self` so the relay can drive both directions
/// from independent tasks. Implementations keep the two halves behind
/// separate locks so a pending receive never blocks a send.
#[async_trait]
pub trait BaseRealtime: Send + Sync {
    /// Send one chunk of PCM audio declared at `sample_rate`.
    ///
    /// Returns `RealtimeError::ConnectionClosed` once the connection has been
    /// torn down.
    async fn send_audio(&self, audio: Bytes, sample_rate: u32) -> RealtimeResult<()>;

    /// Receive the next event of the current turn stream.
    ///
    /// `Ok(None)` means the turn stream ended while the connection is still
    /// open; calling again re-enters the stream.
    async fn next_event(&self) -> RealtimeResult<Option<RemoteEvent>>;

    /// Close the connection. Idempotent.
    async fn close(&self) -> RealtimeResult<()>;

    /// Get the current connection state.
    fn connection_state(&self) -> ConnectionState;

    /// Check if the connection is open.
    fn is_ready(&self) -> bool {
        self.connection_state() == ConnectionState::Connected
    }
}

/// Shared handle to a remote model connection.
pub type SharedRealtime = Arc<dyn BaseRealtime>;

/// Opens remote model connections.
#[async_trait]
pub trait RealtimeConnector: Send + Sync {
    /// Open one connection configured by `config`.
    async fn connect(&self, config: &RealtimeConfig) -> RealtimeResult<SharedRealtime>;
}
