//! Configuration validation logic

use super::ServerConfig;

/// Highest PCM sample rate accepted for either direction.
const MAX_SAMPLE_RATE: u32 = 192_000;

/// Reject values the relay cannot run with.
pub(super) fn validate_server_config(config: &ServerConfig) -> Result<(), String> {
    if config.host.trim().is_empty() {
        return Err("host must not be empty".to_string());
    }
    if config.port == 0 {
        return Err("port must be non-zero".to_string());
    }
    if config.input_sample_rate == 0 {
        return Err("input_sample_rate must be non-zero".to_string());
    }
    if config.output_sample_rate == 0 {
        return Err("output_sample_rate must be non-zero".to_string());
    }
    for (name, rate) in [
        ("input_sample_rate", config.input_sample_rate),
        ("output_sample_rate", config.output_sample_rate),
    ] {
        if rate > MAX_SAMPLE_RATE {
            return Err(format!(
                "{name} must be at most {MAX_SAMPLE_RATE} Hz, got {rate}"
            ));
        }
    }
    if config.playback_buffer_bytes == 0 {
        return Err("playback_buffer_bytes must be non-zero".to_string());
    }
    if config.playback_buffer_bytes % 2 != 0 {
        return Err(format!(
            "playback_buffer_bytes must be a whole number of 16-bit samples, got {}",
            config.playback_buffer_bytes
        ));
    }
    if config.gemini_model.trim().is_empty() {
        return Err("gemini model must not be empty".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    #[test]
    fn test_valid_config() {
        assert!(validate_server_config(&test_config()).is_ok());
    }

    #[test]
    fn test_rejects_zero_values() {
        let mut config = test_config();
        config.port = 0;
        assert!(validate_server_config(&config).unwrap_err().contains("port"));

        let mut config = test_config();
        config.input_sample_rate = 0;
        assert!(
            validate_server_config(&config)
                .unwrap_err()
                .contains("input_sample_rate")
        );

        let mut config = test_config();
        config.output_sample_rate = 0;
        assert!(
            validate_server_config(&config)
                .unwrap_err()
                .contains("output_sample_rate")
        );
    }

    #[test]
    fn test_rejects_oversized_sample_rates() {
        let mut config = test_config();
        config.output_sample_rate = 3_000_000_000;
        let err = validate_server_config(&config).unwrap_err();
        assert!(err.contains("output_sample_rate"), "{err}");
        assert!(err.contains("192000"), "{err}");

        let mut config = test_config();
        config.input_sample_rate = MAX_SAMPLE_RATE + 1;
        assert!(
            validate_server_config(&config)
                .unwrap_err()
                .contains("input_sample_rate")
        );

        let mut config = test_config();
        config.input_sample_rate = MAX_SAMPLE_RATE;
        config.output_sample_rate = MAX_SAMPLE_RATE;
        assert!(validate_server_config(&config).is_ok());
    }

    #[test]
    fn test_rejects_odd_buffer() {
        let mut config = test_config();
        config.playback_buffer_bytes = 48001;
        assert!(
            validate_server_config(&config)
                .unwrap_err()
                .contains("16-bit samples")
        );
    }

    #[test]
    fn test_missing_credential_is_valid() {
        let mut config = test_config();
        config.gemini_api_key = None;
        assert!(validate_server_config(&config).is_ok());
    }
}
