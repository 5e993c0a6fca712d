use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present in
/// YAML override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 8765
///
/// gemini:
///   api_key: "your-gemini-key"
///   model: "gemini-2.5-flash-preview-native-audio-dialog"
///   voice: "Puck"
///   system_instruction: "You are a concise assistant."
///
/// relay:
///   input_sample_rate: 16000
///   output_sample_rate: 24000
///   playback_buffer_bytes: 48000
///   max_receive_retries: 10
///
/// security:
///   cors_allowed_origins: "https://app.example.com"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub gemini: Option<GeminiYaml>,
    pub relay: Option<RelayYaml>,
    pub security: Option<SecurityYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Gemini Live configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeminiYaml {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub voice: Option<String>,
    pub system_instruction: Option<String>,
}

/// Relay configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RelayYaml {
    pub input_sample_rate: Option<u32>,
    pub output_sample_rate: Option<u32>,
    pub playback_buffer_bytes: Option<usize>,
    pub max_receive_retries: Option<u32>,
}

/// Security configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    pub cors_allowed_origins: Option<String>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Required fields have invalid types
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_yaml_config_full() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 9000

gemini:
  api_key: "key"
  model: "gemini-2.0-flash-live-001"
  voice: "Aoede"
  system_instruction: "Speak slowly."

relay:
  input_sample_rate: 8000
  output_sample_rate: 24000
  playback_buffer_bytes: 96000
  max_receive_retries: 3

security:
  cors_allowed_origins: "*"
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();

        let server = config.server.unwrap();
        assert_eq!(server.host, Some("127.0.0.1".to_string()));
        assert_eq!(server.port, Some(9000));

        let gemini = config.gemini.unwrap();
        assert_eq!(gemini.api_key, Some("key".to_string()));
        assert_eq!(gemini.model, Some("gemini-2.0-flash-live-001".to_string()));
        assert_eq!(gemini.voice, Some("Aoede".to_string()));
        assert_eq!(gemini.system_instruction, Some("Speak slowly.".to_string()));

        let relay = config.relay.unwrap();
        assert_eq!(relay.input_sample_rate, Some(8000));
        assert_eq!(relay.output_sample_rate, Some(24000));
        assert_eq!(relay.playback_buffer_bytes, Some(96000));
        assert_eq!(relay.max_receive_retries, Some(3));

        assert_eq!(
            config.security.unwrap().cors_allowed_origins,
            Some("*".to_string())
        );
    }

    #[test]
    fn test_yaml_config_partial() {
        let yaml = r#"
gemini:
  voice: "Kore"
"#;
        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();

        assert!(config.server.is_none());
        assert!(config.relay.is_none());
        let gemini = config.gemini.unwrap();
        assert_eq!(gemini.voice, Some("Kore".to_string()));
        assert!(gemini.api_key.is_none());
    }

    #[test]
    fn test_yaml_config_empty() {
        let config: YamlConfig = serde_yaml::from_str("{}").unwrap();
        assert!(config.server.is_none());
        assert!(config.gemini.is_none());
        assert!(config.relay.is_none());
        assert!(config.security.is_none());
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let yaml_content = r#"
server:
  host: "localhost"
  port: 3000
"#;

        fs::write(&config_path, yaml_content).unwrap();

        let config = YamlConfig::from_file(&config_path).unwrap();

        assert_eq!(
            config.server.as_ref().unwrap().host,
            Some("localhost".to_string())
        );
        assert_eq!(config.server.as_ref().unwrap().port, Some(3000));
    }

    #[test]
    fn test_from_file_not_found() {
        let path = PathBuf::from("/nonexistent/config.yaml");
        let result = YamlConfig::from_file(&path);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }

    #[test]
    fn test_from_file_wrong_type() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad.yaml");

        fs::write(&config_path, "relay:\n  playback_buffer_bytes: lots\n").unwrap();

        let result = YamlConfig::from_file(&config_path);
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse YAML")
        );
    }
}
