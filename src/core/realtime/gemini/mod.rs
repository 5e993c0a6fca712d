//! Gemini Live module.
//!
//! This module provides real-time audio-to-audio streaming using Gemini's
//! native-audio models over the Live (BidiGenerateContent) WebSocket API.
//!
//! # Supported Voices
//!
//! Aoede, Charon, Fenrir, Kore, Puck (default)
//!
//! # Audio Format
//!
//! Input audio is PCM 16-bit signed little-endian mono, 16kHz by default.
//! Output audio is PCM 16-bit mono at 24kHz.
//!
//! # Example
//!
//! ```rust,ignore
//! use voice_relay::core::realtime::{BaseRealtime, RealtimeConfig, RealtimeConnector};
//! use voice_relay::core::realtime::gemini::GeminiConnector;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = RealtimeConfig {
//!         api_key: "AIza...".to_string(),
//!         voice: Some("Kore".to_string()),
//!         ..Default::default()
//!     };
//!
//!     let live = GeminiConnector.connect(&config).await.unwrap();
//!     live.send_audio(pcm_chunk, 16000).await.unwrap();
//!
//!     while let Ok(Some(event)) = live.next_event().await {
//!         println!("{event:?}");
//!     }
//! }
//! ```

mod client;
mod config;
mod messages;

pub use client::{GeminiConnector, GeminiLive};
pub use config::{
    DEFAULT_GEMINI_MODEL, DEFAULT_SYSTEM_PROMPT, GEMINI_LIVE_URL, GeminiVoice,
    effective_system_instruction, model_resource_name, pcm_mime_type,
};
pub use messages::{
    Blob, ClientMessage, Content, GenerationConfig, GoAway, Part, RealtimeInput, ServerContent,
    ServerMessage, Setup,
};
