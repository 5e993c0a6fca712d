//! Configuration module for the voice relay server
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use voice_relay::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from a YAML file; unset keys fall back to the environment
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use crate::core::realtime::RealtimeConfig;
use crate::core::relay::RelayConfig;

mod env;
mod merge;
mod validation;
mod yaml;

pub use yaml::{GeminiYaml, RelayYaml, SecurityYaml, ServerYaml, YamlConfig};

/// Default bind host
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default bind port
pub const DEFAULT_PORT: u16 = 8765;
/// Default prebuilt voice
pub const DEFAULT_VOICE: &str = "Puck";

/// Server configuration
///
/// Contains all configuration needed to run the voice relay, including:
/// - Server settings (host, port)
/// - Gemini Live credential, model, voice and system instruction
/// - Relay settings (sample rates, playback buffer, receive retry ceiling)
/// - Security settings (CORS)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // Gemini settings
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_voice: String,
    /// Falls back to the built-in persona when unset
    pub system_instruction: Option<String>,

    // Relay settings
    pub input_sample_rate: u32,
    pub output_sample_rate: u32,
    /// Playback flush threshold in bytes
    /// Default: 48000 (about one second at 24kHz 16-bit mono)
    pub playback_buffer_bytes: usize,
    /// Consecutive receive failures tolerated before the session ends
    /// Default: 10
    pub max_receive_retries: u32,

    // Security settings
    /// Allowed CORS origins (comma-separated list or "*" for all)
    /// Default: None (same-origin only)
    pub cors_allowed_origins: Option<String>,
}

/// Implement Drop to zeroize the credential when ServerConfig is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.gemini_api_key {
            key.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// The `.env` file, if any, is loaded in `main.rs` before this runs.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = merge::merge_config(None)?;
        validation::validate_server_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate_server_config(&config)?;
        Ok(config)
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether a non-blank Gemini credential is configured
    pub fn gemini_configured(&self) -> bool {
        self.gemini_api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    /// Remote model settings for one session
    pub fn realtime_config(&self) -> RealtimeConfig {
        RealtimeConfig {
            api_key: self.gemini_api_key.clone().unwrap_or_default(),
            model: self.gemini_model.clone(),
            voice: Some(self.gemini_voice.clone()),
            system_instruction: self.system_instruction.clone(),
            input_sample_rate: self.input_sample_rate,
            output_sample_rate: self.output_sample_rate,
            ..Default::default()
        }
    }

    /// Relay settings for one session
    pub fn relay_config(&self) -> RelayConfig {
        let mut relay = RelayConfig::new(self.realtime_config());
        relay.playback_target_bytes = self.playback_buffer_bytes;
        relay.max_consecutive_receive_failures = self.max_receive_retries;
        relay
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 8765,
        gemini_api_key: Some("test-key".to_string()),
        gemini_model: "gemini-2.5-flash-preview-native-audio-dialog".to_string(),
        gemini_voice: DEFAULT_VOICE.to_string(),
        system_instruction: None,
        input_sample_rate: 16000,
        output_sample_rate: 24000,
        playback_buffer_bytes: 48000,
        max_receive_retries: 10,
        cors_allowed_origins: None,
    }
}
