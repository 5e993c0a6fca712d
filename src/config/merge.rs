//! Merging YAML overrides onto the environment-derived configuration

use super::ServerConfig;
use super::env::load_from_env;
use super::yaml::YamlConfig;

/// Start from environment variables and apply any values present in YAML.
pub(super) fn merge_config(
    yaml: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = load_from_env()?;

    let Some(yaml) = yaml else {
        return Ok(config);
    };

    if let Some(server) = yaml.server {
        if let Some(host) = server.host {
            config.host = host;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
    }

    if let Some(gemini) = yaml.gemini {
        if let Some(api_key) = gemini.api_key {
            config.gemini_api_key = Some(api_key);
        }
        if let Some(model) = gemini.model {
            config.gemini_model = model;
        }
        if let Some(voice) = gemini.voice {
            config.gemini_voice = voice;
        }
        if let Some(instruction) = gemini.system_instruction {
            config.system_instruction = Some(instruction);
        }
    }

    if let Some(relay) = yaml.relay {
        if let Some(rate) = relay.input_sample_rate {
            config.input_sample_rate = rate;
        }
        if let Some(rate) = relay.output_sample_rate {
            config.output_sample_rate = rate;
        }
        if let Some(bytes) = relay.playback_buffer_bytes {
            config.playback_buffer_bytes = bytes;
        }
        if let Some(retries) = relay.max_receive_retries {
            config.max_receive_retries = retries;
        }
    }

    if let Some(security) = yaml.security
        && let Some(origins) = security.cors_allowed_origins
    {
        config.cors_allowed_origins = Some(origins);
    }

    Ok(config)
}
