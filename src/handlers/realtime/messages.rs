//! Voice relay WebSocket message types
//!
//! Client audio arrives as binary frames. Everything else in both directions
//! is a JSON text frame tagged by `type`.

use base64::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::relay::{LogLevel, RelayEvent, RelayNotification};

/// Speaker label attached to assistant transcripts
pub const ASSISTANT_SPEAKER: &str = "assistant";

// =============================================================================
// Incoming Messages (Client -> Server)
// =============================================================================

/// Incoming control messages from the client
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RealtimeIncomingMessage {
    /// End the session and close the connection
    EndSession,

    /// Any other message type; ignored
    #[serde(other)]
    Unknown,
}

// =============================================================================
// Outgoing Messages (Server -> Client)
// =============================================================================

/// Outgoing WebSocket messages to client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RealtimeOutgoingMessage {
    /// Session accepted; audio may be streamed
    SessionStarted { session_id: String },

    /// Base64 WAV block of assistant audio
    Audio { data: String, timestamp_ms: u64 },

    /// Assistant text
    Transcript {
        text: String,
        speaker: String,
        timestamp_ms: u64,
    },

    /// The assistant finished speaking its turn
    AssistantSilent { timestamp_ms: u64 },

    /// The assistant was interrupted by the user
    Interrupted { timestamp_ms: u64 },

    /// Session failure
    Error { message: String, timestamp_ms: u64 },

    /// Session progress message
    ServerLog { message: String, level: LogLevel },
}

impl From<RelayNotification> for RealtimeOutgoingMessage {
    fn from(notification: RelayNotification) -> Self {
        let timestamp_ms = notification.timestamp_ms;
        match notification.event {
            RelayEvent::Audio(wav) => Self::Audio {
                data: BASE64_STANDARD.encode(&wav),
                timestamp_ms,
            },
            RelayEvent::Transcript(text) => Self::Transcript {
                text,
                speaker: ASSISTANT_SPEAKER.to_string(),
                timestamp_ms,
            },
            RelayEvent::TurnComplete => Self::AssistantSilent { timestamp_ms },
            RelayEvent::Interrupted => Self::Interrupted { timestamp_ms },
            RelayEvent::Error(message) => Self::Error {
                message,
                timestamp_ms,
            },
            RelayEvent::Log { level, message } => Self::ServerLog { message, level },
        }
    }
}

// =============================================================================
// Message Routing
// =============================================================================

/// Items for the socket writer task
#[derive(Debug)]
pub enum RealtimeMessageRoute {
    /// JSON text message
    Outgoing(RealtimeOutgoingMessage),
    /// Close the connection with a status code
    Close { code: u16, reason: String },
}
