//! OpenAI TTS provider.
//!
//! Request/response synthesis against OpenAI's audio speech API.
//!
//! # API Reference
//!
//! - Endpoint: `POST https://api.openai.com/v1/audio/speech`
//! - Models: tts-1, tts-1-hd, gpt-4o-mini-tts
//! - Voices: alloy, ash, ballad, coral, echo, fable, onyx, nova, sage, shimmer, verse
//! - Output: mp3, opus, aac, flac, wav, pcm (24kHz)
//! - Speed: 0.25 to 4.0

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;

use super::super::base::{TTSConfig, TTSError, TTSResult, TextToSpeech};
use super::super::provider::{TTSProvider, TTSRequestBuilder};
use super::config::{AudioOutputFormat, MAX_TEXT_LENGTH, OpenAITTSModel, OpenAIVoice};

/// OpenAI TTS API endpoint
pub const OPENAI_TTS_URL: &str = "https://api.openai.com/v1/audio/speech";

// =============================================================================
// Request Builder
// =============================================================================

/// OpenAI-specific synthesis request builder
struct OpenAIRequestBuilder {
    /// Base TTS configuration
    config: TTSConfig,
    /// Parsed model
    model: OpenAITTSModel,
    /// Parsed voice
    voice: OpenAIVoice,
    /// Parsed output format
    response_format: AudioOutputFormat,
    /// Speaking speed (0.25 to 4.0)
    speed: f32,
}

impl TTSRequestBuilder for OpenAIRequestBuilder {
    fn build_http_request(&self, client: &reqwest::Client, text: &str) -> reqwest::RequestBuilder {
        let mut body = json!({
            "model": self.model.as_str(),
            "input": text,
            "voice": self.voice.as_str(),
            "response_format": self.response_format.as_str(),
        });

        // Add speed only when it deviates from the API default
        if (self.speed - 1.0).abs() > 0.001 {
            body["speed"] = json!(self.speed);
        }

        client
            .post(OPENAI_TTS_URL)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
    }

    fn max_text_length(&self) -> usize {
        MAX_TEXT_LENGTH
    }

    fn get_config(&self) -> &TTSConfig {
        &self.config
    }
}

// =============================================================================
// Provider
// =============================================================================

/// OpenAI TTS provider using the audio speech endpoint.
pub struct OpenAITTS {
    /// Shared HTTP engine
    provider: TTSProvider,
    /// Request builder with parsed configuration
    request_builder: OpenAIRequestBuilder,
}

impl OpenAITTS {
    /// Get the configured model
    pub fn model(&self) -> OpenAITTSModel {
        self.request_builder.model
    }

    /// Get the configured voice
    pub fn voice(&self) -> OpenAIVoice {
        self.request_builder.voice
    }

    /// Get the configured output format
    pub fn output_format(&self) -> AudioOutputFormat {
        self.request_builder.response_format
    }
}

#[async_trait]
impl TextToSpeech for OpenAITTS {
    fn new(config: TTSConfig) -> TTSResult<Self> {
        if config.api_key.is_empty() {
            return Err(TTSError::InvalidConfiguration(
                "OpenAI API key is required".to_string(),
            ));
        }

        let model = if config.model.is_empty() {
            OpenAITTSModel::default()
        } else {
            OpenAITTSModel::from_str_or_default(&config.model)
        };

        let voice = config
            .voice_id
            .as_deref()
            .map(OpenAIVoice::from_str_or_default)
            .unwrap_or_default();

        let response_format = config
            .audio_format
            .as_deref()
            .map(AudioOutputFormat::from_str_or_default)
            .unwrap_or_default();

        // Clamp to the API's accepted range
        let speed = config.speaking_rate.unwrap_or(1.0).clamp(0.25, 4.0);

        let request_builder = OpenAIRequestBuilder {
            config,
            model,
            voice,
            response_format,
            speed,
        };

        Ok(Self {
            provider: TTSProvider::new()?,
            request_builder,
        })
    }

    async fn synthesize(&self, text: &str) -> TTSResult<Bytes> {
        self.provider
            .synthesize(&self.request_builder, "openai", text)
            .await
    }

    fn audio_format(&self) -> &'static str {
        self.request_builder.response_format.as_str()
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn get_config(&self) -> &TTSConfig {
        &self.request_builder.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation() {
        let config = TTSConfig {
            provider: "openai".to_string(),
            api_key: "test_key".to_string(),
            voice_id: Some("nova".to_string()),
            model: "tts-1-hd".to_string(),
            audio_format: Some("pcm".to_string()),
            speaking_rate: Some(1.2),
            ..Default::default()
        };

        let tts = OpenAITTS::new(config).unwrap();

        assert_eq!(tts.model(), OpenAITTSModel::Tts1Hd);
        assert_eq!(tts.voice(), OpenAIVoice::Nova);
        assert_eq!(tts.output_format(), AudioOutputFormat::Pcm);
        assert_eq!(tts.audio_format(), "pcm");
        assert_eq!(tts.provider_name(), "openai");
    }

    #[test]
    fn test_creation_requires_api_key() {
        let result = OpenAITTS::new(TTSConfig::default());

        assert!(matches!(result, Err(TTSError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_default_values() {
        let config = TTSConfig {
            api_key: "test_key".to_string(),
            ..Default::default()
        };

        let tts = OpenAITTS::new(config).unwrap();

        assert_eq!(tts.model(), OpenAITTSModel::Tts1);
        assert_eq!(tts.voice(), OpenAIVoice::Alloy);
        assert_eq!(tts.output_format(), AudioOutputFormat::Mp3);
    }

    #[test]
    fn test_http_request_building() {
        let builder = OpenAIRequestBuilder {
            config: TTSConfig {
                api_key: "test_key".to_string(),
                ..Default::default()
            },
            model: OpenAITTSModel::Tts1,
            voice: OpenAIVoice::Nova,
            response_format: AudioOutputFormat::Mp3,
            speed: 1.5,
        };

        let client = reqwest::Client::new();
        let built = builder
            .build_http_request(&client, "Hello world")
            .build()
            .unwrap();

        assert_eq!(built.url().as_str(), OPENAI_TTS_URL);

        let auth_header = built.headers().get("Authorization").unwrap();
        assert_eq!(auth_header, "Bearer test_key");

        let body: serde_json::Value =
            serde_json::from_slice(built.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(body["model"], "tts-1");
        assert_eq!(body["input"], "Hello world");
        assert_eq!(body["voice"], "nova");
        assert_eq!(body["speed"], 1.5);
    }

    #[test]
    fn test_default_speed_omitted_from_body() {
        let builder = OpenAIRequestBuilder {
            config: TTSConfig {
                api_key: "test_key".to_string(),
                ..Default::default()
            },
            model: OpenAITTSModel::Tts1,
            voice: OpenAIVoice::Alloy,
            response_format: AudioOutputFormat::Mp3,
            speed: 1.0,
        };

        let client = reqwest::Client::new();
        let built = builder
            .build_http_request(&client, "hi")
            .build()
            .unwrap();

        let body: serde_json::Value =
            serde_json::from_slice(built.body().unwrap().as_bytes().unwrap()).unwrap();
        assert!(body.get("speed").is_none());
    }

    #[test]
    fn test_speed_clamping() {
        let config = TTSConfig {
            api_key: "test_key".to_string(),
            speaking_rate: Some(0.1),
            ..Default::default()
        };
        let tts = OpenAITTS::new(config).unwrap();
        assert!((tts.request_builder.speed - 0.25).abs() < 0.001);

        let config = TTSConfig {
            api_key: "test_key".to_string(),
            speaking_rate: Some(5.0),
            ..Default::default()
        };
        let tts = OpenAITTS::new(config).unwrap();
        assert!((tts.request_builder.speed - 4.0).abs() < 0.001);
    }
}
