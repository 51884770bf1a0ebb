//! Speech-to-Text provider layer.
//!
//! Exposes the [`SpeechToText`] trait along with the streaming providers
//! that implement it, and a factory for constructing a provider from its
//! configured name.

mod base;

pub mod deepgram;

pub use base::{
    STTConfig, STTError, STTErrorCallback, SpeechToText, TranscriptCallback, TranscriptFragment,
};

use deepgram::DeepgramSTT;

/// Supported STT providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum STTProvider {
    /// Deepgram real-time streaming API
    Deepgram,
}

impl std::fmt::Display for STTProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deepgram => write!(f, "deepgram"),
        }
    }
}

impl std::str::FromStr for STTProvider {
    type Err = STTError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deepgram" => Ok(Self::Deepgram),
            _ => Err(STTError::ConfigurationError(format!(
                "Unsupported STT provider: {s}. Supported providers: {}",
                get_supported_stt_providers().join(", ")
            ))),
        }
    }
}

/// Create an STT provider instance by name.
///
/// The returned provider is not yet connected; callers drive the connection
/// lifecycle through the [`SpeechToText`] trait.
pub fn create_stt_provider(
    provider: &str,
    config: STTConfig,
) -> Result<Box<dyn SpeechToText>, STTError> {
    let provider: STTProvider = provider.parse()?;

    match provider {
        STTProvider::Deepgram => Ok(Box::new(DeepgramSTT::new(config)?)),
    }
}

/// List of provider names accepted by [`create_stt_provider`].
pub fn get_supported_stt_providers() -> Vec<&'static str> {
    vec!["deepgram"]
}

#[cfg(test)]
mod factory_tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!(
            "deepgram".parse::<STTProvider>().unwrap(),
            STTProvider::Deepgram
        );
        assert_eq!(
            "Deepgram".parse::<STTProvider>().unwrap(),
            STTProvider::Deepgram
        );
    }

    #[test]
    fn test_provider_from_str_unsupported() {
        let err = "whisper".parse::<STTProvider>().unwrap_err();

        let message = err.to_string();
        assert!(message.contains("Unsupported STT provider: whisper"));
        assert!(message.contains("deepgram"));
    }

    #[test]
    fn test_provider_display() {
        assert_eq!(STTProvider::Deepgram.to_string(), "deepgram");
    }

    #[test]
    fn test_create_provider() {
        let config = STTConfig {
            api_key: "test_key".to_string(),
            ..Default::default()
        };

        let provider = create_stt_provider("deepgram", config).unwrap();
        assert_eq!(provider.get_provider_info(), "Deepgram Streaming STT");
    }

    #[test]
    fn test_create_provider_rejects_invalid_config() {
        // Provider name resolves but the empty API key fails construction
        let result = create_stt_provider("deepgram", STTConfig::default());

        assert!(matches!(result, Err(STTError::ConfigurationError(_))));
    }

    #[test]
    fn test_supported_providers_list() {
        let providers = get_supported_stt_providers();

        assert_eq!(providers, vec!["deepgram"]);
    }
}
