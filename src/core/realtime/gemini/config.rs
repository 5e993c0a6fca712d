//! Gemini Live configuration types.
//!
//! This module contains configuration types for the Gemini Live API:
//! - Endpoint and model naming
//! - Prebuilt voice selection
//! - The built-in persona prompt

use serde::{Deserialize, Serialize};

/// Gemini Live WebSocket endpoint (BidiGenerateContent).
pub const GEMINI_LIVE_URL: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

/// Default native-audio model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-preview-native-audio-dialog";

/// Resource prefix the Live API expects on model names.
const MODEL_RESOURCE_PREFIX: &str = "models/";

/// Persona used when no system instruction is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful, friendly AI assistant with a warm conversational style.

Voice characteristics:
- Warm, direct, and natural
- Use contractions naturally (I'm, you're, let's)
- Be conversational, not robotic
- Keep responses concise for voice - no one wants to listen to paragraphs

You can help with:
- Answering questions
- Having conversations
- Brainstorming ideas
- Explaining concepts

Keep it natural - you're having a conversation, not reading a script.
";

/// Qualify a model name as a `models/...` resource.
pub fn model_resource_name(model: &str) -> String {
    let model = model.trim();
    let model = if model.is_empty() {
        DEFAULT_GEMINI_MODEL
    } else {
        model
    };

    if model.starts_with(MODEL_RESOURCE_PREFIX) {
        model.to_string()
    } else {
        format!("{MODEL_RESOURCE_PREFIX}{model}")
    }
}

/// Return the configured instruction, or the built-in persona if blank.
pub fn effective_system_instruction(instruction: Option<&str>) -> &str {
    match instruction {
        Some(text) if !text.trim().is_empty() => text,
        _ => DEFAULT_SYSTEM_PROMPT,
    }
}

// =============================================================================
// Voices
// =============================================================================

/// Prebuilt voices for native-audio models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GeminiVoice {
    Aoede,
    Charon,
    Fenrir,
    Kore,
    /// Puck voice (default)
    #[default]
    Puck,
}

impl GeminiVoice {
    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aoede => "Aoede",
            Self::Charon => "Charon",
            Self::Fenrir => "Fenrir",
            Self::Kore => "Kore",
            Self::Puck => "Puck",
        }
    }

    /// Parse from string, with fallback to default.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "aoede" => Self::Aoede,
            "charon" => Self::Charon,
            "fenrir" => Self::Fenrir,
            "kore" => Self::Kore,
            "puck" => Self::Puck,
            other => {
                if !other.is_empty() {
                    tracing::warn!(voice = %s, "Unknown Gemini voice, falling back to Puck");
                }
                Self::default()
            }
        }
    }

    /// Get all available voices.
    pub fn all() -> &'static [GeminiVoice] {
        &[Self::Aoede, Self::Charon, Self::Fenrir, Self::Kore, Self::Puck]
    }
}

impl std::fmt::Display for GeminiVoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Build the MIME type declared on upstream PCM chunks.
#[inline]
pub fn pcm_mime_type(sample_rate: u32) -> String {
    format!("audio/pcm;rate={sample_rate}")
}
