//! Environment variable loading

use std::env;
use std::str::FromStr;

use super::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_VOICE, ServerConfig};
use crate::core::realtime::gemini::DEFAULT_GEMINI_MODEL;
use crate::core::realtime::{DEFAULT_INPUT_SAMPLE_RATE, DEFAULT_OUTPUT_SAMPLE_RATE};
use crate::core::relay::{DEFAULT_MAX_RECEIVE_FAILURES, DEFAULT_PLAYBACK_TARGET_BYTES};

/// Read a variable, treating empty values as unset.
pub(super) fn env_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Read and parse a variable, falling back to `default` when unset.
pub(super) fn env_parse<T>(name: &str, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_string(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| format!("Invalid value for {name} ({raw:?}): {e}")),
        None => Ok(default),
    }
}

/// Build a configuration from environment variables and defaults.
pub(super) fn load_from_env() -> Result<ServerConfig, Box<dyn std::error::Error>> {
    Ok(ServerConfig {
        host: env_string("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: env_parse("PORT", DEFAULT_PORT)?,
        gemini_api_key: env_string("GEMINI_API_KEY"),
        gemini_model: env_string("GEMINI_MODEL")
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
        gemini_voice: env_string("GEMINI_VOICE").unwrap_or_else(|| DEFAULT_VOICE.to_string()),
        system_instruction: env_string("SYSTEM_INSTRUCTION"),
        input_sample_rate: env_parse("INPUT_SAMPLE_RATE", DEFAULT_INPUT_SAMPLE_RATE)?,
        output_sample_rate: env_parse("OUTPUT_SAMPLE_RATE", DEFAULT_OUTPUT_SAMPLE_RATE)?,
        playback_buffer_bytes: env_parse("PLAYBACK_BUFFER_BYTES", DEFAULT_PLAYBACK_TARGET_BYTES)?,
        max_receive_retries: env_parse("MAX_RECEIVE_RETRIES", DEFAULT_MAX_RECEIVE_FAILURES)?,
        cors_allowed_origins: env_string("CORS_ALLOWED_ORIGINS"),
    })
}
