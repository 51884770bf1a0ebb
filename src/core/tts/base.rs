//! Base types shared by all TTS providers.

use bytes::Bytes;
use thiserror::Error;

/// Result type for TTS operations
pub type TTSResult<T> = Result<T, TTSError>;

/// Errors surfaced by TTS providers.
#[derive(Error, Debug)]
pub enum TTSError {
    /// The provider rejected the API key
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The provider configuration is invalid or incomplete
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Transport-level failure talking to the provider
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The provider accepted the request but failed to produce audio
    #[error("Synthesis failed: {0}")]
    SynthesisFailed(String),
}

/// Configuration shared by all TTS providers.
#[derive(Debug, Clone)]
pub struct TTSConfig {
    /// Provider name ("openai", "elevenlabs")
    pub provider: String,

    /// API key for the provider
    pub api_key: String,

    /// Voice identifier. `None` selects the provider's default voice.
    pub voice_id: Option<String>,

    /// Model name. Empty selects the provider's default model.
    pub model: String,

    /// Output audio format. `None` selects the provider default.
    pub audio_format: Option<String>,

    /// Output sample rate in Hz, for formats that carry one.
    pub sample_rate: Option<u32>,

    /// Speaking rate multiplier. `None` leaves the provider default.
    pub speaking_rate: Option<f32>,
}

impl Default for TTSConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            api_key: String::new(),
            voice_id: None,
            model: String::new(),
            audio_format: None,
            sample_rate: None,
            speaking_rate: None,
        }
    }
}

/// Capability trait implemented by synthesis providers.
///
/// Providers are request/response: one call produces one complete audio
/// buffer. Instances are shared read-only across turns, so synthesis
/// borrows immutably.
#[async_trait::async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Create a new instance with the given configuration.
    fn new(config: TTSConfig) -> TTSResult<Self>
    where
        Self: Sized;

    /// Synthesize text into a complete audio buffer.
    async fn synthesize(&self, text: &str) -> TTSResult<Bytes>;

    /// Client-facing format tag for the produced audio ("mp3", "pcm").
    fn audio_format(&self) -> &'static str;

    /// Provider name used for logging and error attribution.
    fn provider_name(&self) -> &'static str;

    /// Get the active configuration.
    fn get_config(&self) -> &TTSConfig;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TTSConfig::default();

        assert_eq!(config.provider, "openai");
        assert!(config.api_key.is_empty());
        assert!(config.voice_id.is_none());
        assert!(config.model.is_empty());
        assert!(config.audio_format.is_none());
    }

    #[test]
    fn test_error_display() {
        let err = TTSError::SynthesisFailed("status 500".to_string());
        assert_eq!(err.to_string(), "Synthesis failed: status 500");

        let err = TTSError::AuthenticationFailed("bad key".to_string());
        assert_eq!(err.to_string(), "Authentication failed: bad key");
    }
}
