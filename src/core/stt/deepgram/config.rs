//! Configuration types for the Deepgram streaming STT API.
//!
//! This module contains all configuration-related types including:
//! - Audio encoding specifications
//! - Recognition model selection
//! - Provider-specific streaming options

use std::str::FromStr;

use super::super::base::STTConfig;

/// WebSocket base URL for the Deepgram streaming API.
pub const DEEPGRAM_WS_URL: &str = "wss://api.deepgram.com/v1/listen";

/// Host name for HTTP headers on the streaming connection.
pub const DEEPGRAM_HOST: &str = "api.deepgram.com";

// =============================================================================
// Audio Encoding
// =============================================================================

/// Supported audio encodings for the Deepgram streaming API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeepgramEncoding {
    /// PCM signed 16-bit little-endian (default, most common)
    #[default]
    Linear16,
    /// PCM mu-law (telephony, 8kHz)
    Mulaw,
}

impl DeepgramEncoding {
    /// Convert to the API query parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linear16 => "linear16",
            Self::Mulaw => "mulaw",
        }
    }
}

impl FromStr for DeepgramEncoding {
    type Err = ();

    /// Parse from encoding string (case-insensitive).
    /// Returns Ok(Self::Linear16) as default for unknown values.
    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "mulaw" | "ulaw" | "pcm_mulaw" => Self::Mulaw,
            _ => Self::Linear16, // Default to PCM linear16
        })
    }
}

// =============================================================================
// Recognition Model
// =============================================================================

/// Deepgram streaming recognition models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeepgramModel {
    /// Nova-2 general-purpose streaming model (default)
    #[default]
    Nova2,
    /// Nova-3 streaming model
    Nova3,
}

impl DeepgramModel {
    /// Convert to the API query parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nova2 => "nova-2",
            Self::Nova3 => "nova-3",
        }
    }
}

impl FromStr for DeepgramModel {
    type Err = ();

    /// Parse from model string (case-insensitive).
    /// Returns Ok(Self::Nova2) as default for unknown values.
    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "nova-3" | "nova3" => Self::Nova3,
            _ => Self::Nova2, // Default to nova-2
        })
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Configuration specific to the Deepgram streaming STT API.
///
/// This configuration extends the base `STTConfig` with Deepgram-specific
/// parameters for the WebSocket streaming API.
#[derive(Debug, Clone)]
pub struct DeepgramSTTConfig {
    /// Base STT configuration (shared across all providers).
    pub base: STTConfig,

    /// Recognition model to use.
    pub model: DeepgramModel,

    /// Audio encoding format.
    ///
    /// Must match the format of audio data sent to the API.
    pub encoding: DeepgramEncoding,

    /// Whether the provider should emit interim (non-final) results.
    ///
    /// The pipeline only consumes finalized fragments, so interim results
    /// are off by default to keep the stream quiet.
    pub interim_results: bool,

    /// Endpointing silence threshold in milliseconds.
    ///
    /// Controls how much trailing silence finalizes an utterance span.
    /// `None` leaves the provider default in place.
    pub endpointing_ms: Option<u32>,
}

impl Default for DeepgramSTTConfig {
    fn default() -> Self {
        Self {
            base: STTConfig::default(),
            model: DeepgramModel::default(),
            encoding: DeepgramEncoding::default(),
            interim_results: false,
            endpointing_ms: Some(300),
        }
    }
}

impl DeepgramSTTConfig {
    /// Build the WebSocket URL with query parameters.
    ///
    /// Constructs the full WebSocket URL including the API path and all
    /// configuration query parameters. `encoding` and `sample_rate` are
    /// always present since the bridge negotiates them per session.
    pub fn build_websocket_url(&self) -> String {
        // Pre-allocate with estimated capacity
        let mut url = String::with_capacity(256);

        url.push_str(DEEPGRAM_WS_URL);

        // Required: encoding
        url.push_str("?encoding=");
        url.push_str(self.encoding.as_str());

        // Required: sample_rate
        url.push_str("&sample_rate=");
        url.push_str(&self.base.sample_rate.to_string());

        // Channel count
        url.push_str("&channels=");
        url.push_str(&self.base.channels.to_string());

        // Recognition model
        url.push_str("&model=");
        url.push_str(self.model.as_str());

        // Language
        if !self.base.language.is_empty() {
            url.push_str("&language=");
            url.push_str(&self.base.language);
        }

        // Punctuation
        url.push_str("&punctuate=");
        url.push_str(if self.base.punctuation { "true" } else { "false" });

        // Interim results
        url.push_str("&interim_results=");
        url.push_str(if self.interim_results { "true" } else { "false" });

        // Endpointing threshold
        if let Some(ms) = self.endpointing_ms {
            url.push_str("&endpointing=");
            url.push_str(&ms.to_string());
        }

        url
    }

    /// Create a new configuration from base STTConfig.
    ///
    /// Automatically determines the encoding and model from config.
    pub fn from_base(base: STTConfig) -> Self {
        // Both FromStr impls never fail, unknown values map to defaults
        let encoding = base.encoding.parse().unwrap_or_default();
        let model = base.model.parse().unwrap_or_default();

        Self {
            base,
            model,
            encoding,
            ..Default::default()
        }
    }
}
