//! Validation of the merged server configuration
//!
//! Runs after YAML and environment values are combined so every check sees
//! the final values the server will actually use.

use url::Url;

use super::TlsConfig;

/// Recognition providers the server can construct
const SUPPORTED_STT_PROVIDERS: &[&str] = &["deepgram"];

/// Synthesis providers the server can construct
const SUPPORTED_TTS_PROVIDERS: &[&str] = &["openai", "elevenlabs"];

/// Validate the recognition and synthesis provider chains
///
/// Both chains must be non-empty and may only name providers this server
/// knows how to build. Ordering within a chain is preserved as configured.
pub(super) fn validate_provider_chains(
    stt_providers: &[String],
    tts_providers: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    if stt_providers.is_empty() {
        return Err("The recognition provider chain must contain at least one provider".into());
    }
    if tts_providers.is_empty() {
        return Err("The synthesis provider chain must contain at least one provider".into());
    }

    for provider in stt_providers {
        if !SUPPORTED_STT_PROVIDERS.contains(&provider.as_str()) {
            return Err(format!(
                "Unsupported recognition provider '{provider}' (supported: {})",
                SUPPORTED_STT_PROVIDERS.join(", ")
            )
            .into());
        }
    }
    for provider in tts_providers {
        if !SUPPORTED_TTS_PROVIDERS.contains(&provider.as_str()) {
            return Err(format!(
                "Unsupported synthesis provider '{provider}' (supported: {})",
                SUPPORTED_TTS_PROVIDERS.join(", ")
            )
            .into());
        }
    }

    Ok(())
}

/// Validate the agent base URL
///
/// Must parse as an absolute http or https URL.
pub(super) fn validate_agent_base_url(base_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let url = Url::parse(base_url)
        .map_err(|e| format!("Invalid agent base URL '{base_url}': {e}"))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(format!(
            "Invalid agent base URL '{base_url}': unsupported scheme '{scheme}'"
        )
        .into()),
    }
}

/// Validate configured sample rates
///
/// Rates outside the 8 kHz to 48 kHz range are rejected, nothing in the
/// pipeline produces or consumes audio beyond that.
pub(super) fn validate_sample_rates(
    capture_sample_rate: u32,
    synthesis_sample_rate: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    for (name, rate) in [
        ("capture_sample_rate", capture_sample_rate),
        ("synthesis_sample_rate", synthesis_sample_rate),
    ] {
        if !(8000..=48000).contains(&rate) {
            return Err(format!(
                "Invalid {name}: {rate} (must be between 8000 and 48000 Hz)"
            )
            .into());
        }
    }
    Ok(())
}

/// Validate TLS configuration when present
///
/// Certificate and key files must exist at startup. Readability and format
/// problems surface later when the listener binds.
pub(super) fn validate_tls(tls: &Option<TlsConfig>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(tls) = tls {
        if !tls.cert_path.exists() {
            return Err(format!(
                "TLS certificate file not found: {}",
                tls.cert_path.display()
            )
            .into());
        }
        if !tls.key_path.exists() {
            return Err(format!(
                "TLS private key file not found: {}",
                tls.key_path.display()
            )
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_validate_provider_chains_ok() {
        let stt = vec!["deepgram".to_string()];
        let tts = vec!["openai".to_string(), "elevenlabs".to_string()];
        assert!(validate_provider_chains(&stt, &tts).is_ok());
    }

    #[test]
    fn test_validate_provider_chains_empty_stt() {
        let tts = vec!["openai".to_string()];
        let result = validate_provider_chains(&[], &tts);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("recognition provider chain")
        );
    }

    #[test]
    fn test_validate_provider_chains_unknown_tts() {
        let stt = vec!["deepgram".to_string()];
        let tts = vec!["polly".to_string()];
        let result = validate_provider_chains(&stt, &tts);
        assert!(result.is_err());
        let message = result.unwrap_err().to_string();
        assert!(message.contains("Unsupported synthesis provider 'polly'"));
        assert!(message.contains("openai, elevenlabs"));
    }

    #[test]
    fn test_validate_agent_base_url() {
        assert!(validate_agent_base_url("http://localhost:8100").is_ok());
        assert!(validate_agent_base_url("https://agent.example.com/api").is_ok());
        assert!(validate_agent_base_url("not a url").is_err());
        assert!(validate_agent_base_url("ftp://agent.example.com").is_err());
    }

    #[test]
    fn test_validate_sample_rates() {
        assert!(validate_sample_rates(16000, 24000).is_ok());
        assert!(validate_sample_rates(8000, 48000).is_ok());
        assert!(validate_sample_rates(0, 24000).is_err());
        assert!(validate_sample_rates(16000, 96000).is_err());
    }

    #[test]
    fn test_validate_tls_missing_files() {
        let tls = Some(TlsConfig {
            cert_path: PathBuf::from("/nonexistent/cert.pem"),
            key_path: PathBuf::from("/nonexistent/key.pem"),
        });
        let result = validate_tls(&tls);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("TLS certificate file not found")
        );
    }

    #[test]
    fn test_validate_tls_none_is_ok() {
        assert!(validate_tls(&None).is_ok());
    }
}
