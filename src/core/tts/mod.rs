//! Text-to-Speech provider layer.
//!
//! Exposes the [`TextToSpeech`] trait, the synthesis providers implementing
//! it, and a factory for constructing a provider from its configured name.
//! Providers are request/response: one call yields one complete audio buffer.

mod base;
mod provider;

pub mod elevenlabs;
pub mod openai;

pub use base::{TTSConfig, TTSError, TTSResult, TextToSpeech};
pub use elevenlabs::{ELEVENLABS_TTS_URL, ElevenLabsTTS};
pub use openai::{AudioOutputFormat, OPENAI_TTS_URL, OpenAITTS, OpenAITTSModel, OpenAIVoice};

/// Factory function to create a TTS provider.
///
/// # Supported Providers
///
/// - `"openai"` - OpenAI audio speech API (tts-1, tts-1-hd, gpt-4o-mini-tts)
/// - `"elevenlabs"` - ElevenLabs TTS API
pub fn create_tts_provider(
    provider_type: &str,
    config: TTSConfig,
) -> TTSResult<Box<dyn TextToSpeech>> {
    match provider_type.to_lowercase().as_str() {
        "openai" => Ok(Box::new(OpenAITTS::new(config)?)),
        "elevenlabs" | "eleven-labs" | "eleven_labs" | "11labs" => {
            Ok(Box::new(ElevenLabsTTS::new(config)?))
        }
        _ => Err(TTSError::InvalidConfiguration(format!(
            "Unsupported TTS provider: {provider_type}. Supported providers: openai, elevenlabs"
        ))),
    }
}

/// List of provider names accepted by [`create_tts_provider`].
pub fn get_supported_tts_providers() -> Vec<&'static str> {
    vec!["openai", "elevenlabs"]
}
