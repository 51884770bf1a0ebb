//! ElevenLabs TTS provider module.
//!
//! Request/response text-to-speech using the ElevenLabs API. The voice id
//! travels in the URL path and authentication uses the `xi-api-key` header.
//!
//! # Supported Models
//!
//! - `eleven_multilingual_v2` - Highest quality
//! - `eleven_turbo_v2_5` - Low latency
//! - `eleven_flash_v2_5` - Lowest latency
//!
//! # Audio Formats
//!
//! mp3 (44.1kHz/128kbps), pcm (16kHz, 22.05kHz, 24kHz)

mod config;
mod provider;

pub use config::{DEFAULT_VOICE_ID, ElevenLabsModel, ElevenLabsOutputFormat, MAX_TEXT_LENGTH};
pub use provider::{ELEVENLABS_TTS_URL, ElevenLabsTTS};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tts::base::{TTSConfig, TextToSpeech};

    #[test]
    fn test_with_config() {
        let config = TTSConfig {
            provider: "elevenlabs".to_string(),
            api_key: "test_key".to_string(),
            model: "flash".to_string(),
            audio_format: Some("mp3".to_string()),
            ..Default::default()
        };

        let tts = ElevenLabsTTS::new(config).unwrap();

        assert_eq!(tts.model(), ElevenLabsModel::FlashV25);
        assert_eq!(tts.output_format(), ElevenLabsOutputFormat::Mp3);
    }

    #[test]
    fn test_model_parsing() {
        assert_eq!(
            ElevenLabsModel::from_str_or_default("flash"),
            ElevenLabsModel::FlashV25
        );
        // Unknown defaults to multilingual v2
        assert_eq!(
            ElevenLabsModel::from_str_or_default("unknown"),
            ElevenLabsModel::MultilingualV2
        );
    }
}
