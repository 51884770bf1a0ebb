//! ElevenLabs TTS provider.
//!
//! Request/response synthesis against the ElevenLabs text-to-speech API.
//!
//! # API Reference
//!
//! - Endpoint: `POST https://api.elevenlabs.io/v1/text-to-speech/{voice_id}`
//! - Auth: `xi-api-key` header
//! - Output format and sample rate travel in the `output_format` query parameter

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;

use super::super::base::{TTSConfig, TTSError, TTSResult, TextToSpeech};
use super::super::provider::{TTSProvider, TTSRequestBuilder};
use super::config::{DEFAULT_VOICE_ID, ElevenLabsModel, ElevenLabsOutputFormat, MAX_TEXT_LENGTH};

/// ElevenLabs TTS API base URL (voice id is appended as a path segment)
pub const ELEVENLABS_TTS_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";

// =============================================================================
// Request Builder
// =============================================================================

/// ElevenLabs-specific synthesis request builder
struct ElevenLabsRequestBuilder {
    /// Base TTS configuration
    config: TTSConfig,
    /// Voice id placed in the URL path
    voice_id: String,
    /// Parsed model
    model: ElevenLabsModel,
    /// Parsed output format
    output_format: ElevenLabsOutputFormat,
    /// Speaking speed (0.7 to 1.2), omitted when default
    speed: Option<f32>,
}

impl TTSRequestBuilder for ElevenLabsRequestBuilder {
    fn build_http_request(&self, client: &reqwest::Client, text: &str) -> reqwest::RequestBuilder {
        let url = format!(
            "{ELEVENLABS_TTS_URL}/{}?output_format={}",
            self.voice_id,
            self.output_format.as_str()
        );

        let mut body = json!({
            "text": text,
            "model_id": self.model.as_str(),
        });

        if let Some(speed) = self.speed {
            body["voice_settings"] = json!({ "speed": speed });
        }

        client
            .post(url)
            .header("xi-api-key", &self.config.api_key)
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

/// ElevenLabs TTS provider.
pub struct ElevenLabsTTS {
    /// Shared HTTP engine
    provider: TTSProvider,
    /// Request builder with parsed configuration
    request_builder: ElevenLabsRequestBuilder,
}

impl ElevenLabsTTS {
    /// Get the configured voice id
    pub fn voice_id(&self) -> &str {
        &self.request_builder.voice_id
    }

    /// Get the configured model
    pub fn model(&self) -> ElevenLabsModel {
        self.request_builder.model
    }

    /// Get the configured output format
    pub fn output_format(&self) -> ElevenLabsOutputFormat {
        self.request_builder.output_format
    }
}

#[async_trait]
impl TextToSpeech for ElevenLabsTTS {
    fn new(config: TTSConfig) -> TTSResult<Self> {
        if config.api_key.is_empty() {
            return Err(TTSError::InvalidConfiguration(
                "ElevenLabs API key is required".to_string(),
            ));
        }

        let voice_id = config
            .voice_id
            .clone()
            .unwrap_or_else(|| DEFAULT_VOICE_ID.to_string());

        let model = if config.model.is_empty() {
            ElevenLabsModel::default()
        } else {
            ElevenLabsModel::from_str_or_default(&config.model)
        };

        // The sample rate narrows PCM to the matching API variant
        let output_format = match config.audio_format.as_deref() {
            Some(format) => {
                let parsed = ElevenLabsOutputFormat::from_str_or_default(format);
                match (parsed.codec(), config.sample_rate) {
                    ("pcm", Some(rate)) => ElevenLabsOutputFormat::pcm_for_rate(rate),
                    _ => parsed,
                }
            }
            None => ElevenLabsOutputFormat::default(),
        };

        let speed = config.speaking_rate.map(|rate| rate.clamp(0.7, 1.2));

        let request_builder = ElevenLabsRequestBuilder {
            config,
            voice_id,
            model,
            output_format,
            speed,
        };

        Ok(Self {
            provider: TTSProvider::new()?,
            request_builder,
        })
    }

    async fn synthesize(&self, text: &str) -> TTSResult<Bytes> {
        self.provider
            .synthesize(&self.request_builder, "elevenlabs", text)
            .await
    }

    fn audio_format(&self) -> &'static str {
        self.request_builder.output_format.codec()
    }

    fn provider_name(&self) -> &'static str {
        "elevenlabs"
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
            provider: "elevenlabs".to_string(),
            api_key: "test_key".to_string(),
            voice_id: Some("custom_voice".to_string()),
            model: "turbo".to_string(),
            audio_format: Some("pcm".to_string()),
            sample_rate: Some(16000),
            ..Default::default()
        };

        let tts = ElevenLabsTTS::new(config).unwrap();

        assert_eq!(tts.voice_id(), "custom_voice");
        assert_eq!(tts.model(), ElevenLabsModel::TurboV25);
        assert_eq!(tts.output_format(), ElevenLabsOutputFormat::Pcm16k);
        assert_eq!(tts.audio_format(), "pcm");
        assert_eq!(tts.provider_name(), "elevenlabs");
    }

    #[test]
    fn test_creation_requires_api_key() {
        let config = TTSConfig {
            provider: "elevenlabs".to_string(),
            ..Default::default()
        };

        let result = ElevenLabsTTS::new(config);

        assert!(matches!(result, Err(TTSError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_default_voice_and_format() {
        let config = TTSConfig {
            provider: "elevenlabs".to_string(),
            api_key: "test_key".to_string(),
            ..Default::default()
        };

        let tts = ElevenLabsTTS::new(config).unwrap();

        assert_eq!(tts.voice_id(), DEFAULT_VOICE_ID);
        assert_eq!(tts.model(), ElevenLabsModel::MultilingualV2);
        assert_eq!(tts.output_format(), ElevenLabsOutputFormat::Mp3);
        assert_eq!(tts.audio_format(), "mp3");
    }

    #[test]
    fn test_http_request_building() {
        let builder = ElevenLabsRequestBuilder {
            config: TTSConfig {
                api_key: "test_key".to_string(),
                ..Default::default()
            },
            voice_id: "test_voice".to_string(),
            model: ElevenLabsModel::MultilingualV2,
            output_format: ElevenLabsOutputFormat::Mp3,
            speed: None,
        };

        let client = reqwest::Client::new();
        let built = builder
            .build_http_request(&client, "Hello world")
            .build()
            .unwrap();

        assert_eq!(
            built.url().as_str(),
            "https://api.elevenlabs.io/v1/text-to-speech/test_voice?output_format=mp3_44100_128"
        );

        let key_header = built.headers().get("xi-api-key").unwrap();
        assert_eq!(key_header, "test_key");
        assert!(built.headers().get("Authorization").is_none());

        let body: serde_json::Value =
            serde_json::from_slice(built.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(body["text"], "Hello world");
        assert_eq!(body["model_id"], "eleven_multilingual_v2");
        assert!(body.get("voice_settings").is_none());
    }

    #[test]
    fn test_speed_in_voice_settings() {
        let builder = ElevenLabsRequestBuilder {
            config: TTSConfig {
                api_key: "test_key".to_string(),
                ..Default::default()
            },
            voice_id: "test_voice".to_string(),
            model: ElevenLabsModel::FlashV25,
            output_format: ElevenLabsOutputFormat::Pcm24k,
            speed: Some(1.1),
        };

        let client = reqwest::Client::new();
        let built = builder
            .build_http_request(&client, "hi")
            .build()
            .unwrap();

        let body: serde_json::Value =
            serde_json::from_slice(built.body().unwrap().as_bytes().unwrap()).unwrap();
        let speed = body["voice_settings"]["speed"].as_f64().unwrap();
        assert!((speed - 1.1).abs() < 0.001);
    }

    #[test]
    fn test_speed_clamping() {
        let config = TTSConfig {
            api_key: "test_key".to_string(),
            speaking_rate: Some(2.0),
            ..Default::default()
        };

        let tts = ElevenLabsTTS::new(config).unwrap();

        assert!((tts.request_builder.speed.unwrap() - 1.2).abs() < 0.001);
    }
}
