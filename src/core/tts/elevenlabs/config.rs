//! Configuration types for the ElevenLabs TTS API.

/// Default voice ("Rachel") used when no voice id is configured.
pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

/// Maximum input length for a single synthesis request in characters.
/// Upstream quotas vary by plan; this is the standard-tier request cap.
pub const MAX_TEXT_LENGTH: usize = 5000;

// =============================================================================
// Models
// =============================================================================

/// Supported ElevenLabs models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElevenLabsModel {
    /// Multilingual v2 - highest quality (default)
    #[default]
    MultilingualV2,
    /// Turbo v2.5 - low latency
    TurboV25,
    /// Flash v2.5 - lowest latency
    FlashV25,
}

impl ElevenLabsModel {
    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MultilingualV2 => "eleven_multilingual_v2",
            Self::TurboV25 => "eleven_turbo_v2_5",
            Self::FlashV25 => "eleven_flash_v2_5",
        }
    }

    /// Parse from string, with fallback to default.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "eleven_multilingual_v2" | "multilingual" => Self::MultilingualV2,
            "eleven_turbo_v2_5" | "turbo" => Self::TurboV25,
            "eleven_flash_v2_5" | "flash" => Self::FlashV25,
            _ => Self::default(),
        }
    }
}

// =============================================================================
// Output Format
// =============================================================================

/// Supported output formats for ElevenLabs TTS.
///
/// The API encodes format and sample rate together in a single
/// `output_format` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElevenLabsOutputFormat {
    /// MP3 at 44.1kHz, 128kbps (default)
    #[default]
    Mp3,
    /// Raw PCM at 16kHz
    Pcm16k,
    /// Raw PCM at 22.05kHz
    Pcm22k,
    /// Raw PCM at 24kHz
    Pcm24k,
}

impl ElevenLabsOutputFormat {
    /// Convert to the API query parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3_44100_128",
            Self::Pcm16k => "pcm_16000",
            Self::Pcm22k => "pcm_22050",
            Self::Pcm24k => "pcm_24000",
        }
    }

    /// Client-facing format tag, without the rate suffix.
    #[inline]
    pub fn codec(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Pcm16k | Self::Pcm22k | Self::Pcm24k => "pcm",
        }
    }

    /// Parse from string, with fallback to default.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "mp3" | "mp3_44100_128" => Self::Mp3,
            "pcm_16000" => Self::Pcm16k,
            "pcm_22050" => Self::Pcm22k,
            "pcm" | "pcm_24000" | "linear16" | "raw" => Self::Pcm24k,
            _ => Self::default(),
        }
    }

    /// Pick the PCM variant matching a configured sample rate.
    pub fn pcm_for_rate(rate: u32) -> Self {
        match rate {
            16000 => Self::Pcm16k,
            22050 => Self::Pcm22k,
            _ => Self::Pcm24k,
        }
    }
}
