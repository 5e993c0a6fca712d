//! Gemini Live WebSocket message types.
//!
//! All messages are JSON objects with camelCase keys, keyed by message kind.
//!
//! # Protocol Overview
//!
//! Client messages (sent to server):
//! - setup - First message; model, voice and system instruction
//! - realtimeInput - Base64 PCM media chunks
//!
//! Server messages (received from server):
//! - setupComplete - Session is ready
//! - serverContent - Model turn parts, turn completion and interruption
//! - goAway - Server will disconnect soon

use base64::prelude::*;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::config::pcm_mime_type;
use crate::core::realtime::base::RemoteEvent;

// =============================================================================
// Shared Content Types
// =============================================================================

/// Inline binary payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    /// MIME type, e.g. `audio/pcm;rate=24000`
    #[serde(default)]
    pub mime_type: String,
    /// Base64-encoded bytes
    pub data: String,
}

impl Blob {
    /// Wrap raw PCM bytes declared at `sample_rate`.
    pub fn pcm(audio: &[u8], sample_rate: u32) -> Self {
        Self {
            mime_type: pcm_mime_type(sample_rate),
            data: BASE64_STANDARD.encode(audio),
        }
    }
}

/// One part of a content message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<Blob>,
}

/// Content made of ordered parts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Content holding a single text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![Part {
                text: Some(text.into()),
                inline_data: None,
            }],
        }
    }
}

// =============================================================================
// Client Messages
// =============================================================================

/// Messages sent from the relay to Gemini.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientMessage {
    Setup(Setup),
    RealtimeInput(RealtimeInput),
}

impl ClientMessage {
    /// Upstream audio chunk message.
    pub fn audio(audio: &[u8], sample_rate: u32) -> Self {
        Self::RealtimeInput(RealtimeInput {
            media_chunks: vec![Blob::pcm(audio, sample_rate)],
        })
    }
}

/// Session setup, sent once right after the socket opens.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Setup {
    /// Fully-qualified model resource (`models/...`)
    pub model: String,
    pub generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
    pub speech_config: SpeechConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    pub voice_config: VoiceConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

impl Setup {
    /// Audio-only setup for `model` speaking with `voice`.
    pub fn audio(model: String, voice: &str, system_instruction: &str) -> Self {
        Self {
            model,
            generation_config: GenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: voice.to_string(),
                        },
                    },
                },
            },
            system_instruction: Some(Content::text(system_instruction)),
        }
    }
}

/// Realtime media input.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeInput {
    pub media_chunks: Vec<Blob>,
}

// =============================================================================
// Server Messages
// =============================================================================

/// Any message received from Gemini. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    #[serde(default)]
    pub setup_complete: Option<serde_json::Value>,
    #[serde(default)]
    pub server_content: Option<ServerContent>,
    #[serde(default)]
    pub go_away: Option<GoAway>,
}

impl ServerMessage {
    pub fn is_setup_complete(&self) -> bool {
        self.setup_complete.is_some()
    }
}

/// Incremental model output for the current turn.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerContent {
    #[serde(default)]
    pub model_turn: Option<Content>,
    #[serde(default)]
    pub turn_complete: bool,
    #[serde(default)]
    pub interrupted: bool,
}

/// Notice that the server will close the connection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoAway {
    #[serde(default)]
    pub time_left: Option<String>,
}

impl ServerContent {
    /// Translate into relay events in arrival order.
    ///
    /// An interrupted message yields only `Interrupted`. Otherwise each part
    /// yields its audio then its text, followed by `TurnComplete` when the
    /// turn is done. Parts with undecodable audio are skipped.
    pub fn into_events(self) -> Vec<RemoteEvent> {
        if self.interrupted {
            return vec![RemoteEvent::Interrupted];
        }

        let mut events = Vec::new();
        if let Some(turn) = self.model_turn {
            for part in turn.parts {
                if let Some(blob) = part.inline_data {
                    match BASE64_STANDARD.decode(blob.data.as_bytes()) {
                        Ok(audio) if !audio.is_empty() => {
                            events.push(RemoteEvent::Audio(Bytes::from(audio)))
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::warn!(
                                mime_type = %blob.mime_type,
                                "Dropping undecodable inline audio: {}",
                                e
                            );
                        }
                    }
                }
                if let Some(text) = part.text
                    && !text.is_empty()
                {
                    events.push(RemoteEvent::Text(text));
                }
            }
        }

        if self.turn_complete {
            events.push(RemoteEvent::TurnComplete);
        }
        events
    }
}
