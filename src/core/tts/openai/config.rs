//! Configuration types for the OpenAI speech API.

/// Maximum input length for a single synthesis request in characters.
pub const MAX_TEXT_LENGTH: usize = 4096;

// =============================================================================
// Models
// =============================================================================

/// Supported OpenAI TTS models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenAITTSModel {
    /// Standard quality, lowest latency (default)
    #[default]
    Tts1,
    /// High definition quality, higher latency
    Tts1Hd,
    /// GPT-4o mini TTS model
    Gpt4oMiniTts,
}

impl OpenAITTSModel {
    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tts1 => "tts-1",
            Self::Tts1Hd => "tts-1-hd",
            Self::Gpt4oMiniTts => "gpt-4o-mini-tts",
        }
    }

    /// Parse from string, with fallback to default.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "tts-1" | "tts1" => Self::Tts1,
            "tts-1-hd" | "tts1-hd" | "tts1hd" => Self::Tts1Hd,
            "gpt-4o-mini-tts" | "gpt4o-mini-tts" => Self::Gpt4oMiniTts,
            _ => Self::default(),
        }
    }
}

// =============================================================================
// Voices
// =============================================================================

/// Available voices for OpenAI TTS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenAIVoice {
    #[default]
    Alloy,
    Ash,
    Ballad,
    Coral,
    Echo,
    Fable,
    Onyx,
    Nova,
    Sage,
    Shimmer,
    Verse,
}

impl OpenAIVoice {
    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alloy => "alloy",
            Self::Ash => "ash",
            Self::Ballad => "ballad",
            Self::Coral => "coral",
            Self::Echo => "echo",
            Self::Fable => "fable",
            Self::Onyx => "onyx",
            Self::Nova => "nova",
            Self::Sage => "sage",
            Self::Shimmer => "shimmer",
            Self::Verse => "verse",
        }
    }

    /// Parse from string, with fallback to default.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "alloy" => Self::Alloy,
            "ash" => Self::Ash,
            "ballad" => Self::Ballad,
            "coral" => Self::Coral,
            "echo" => Self::Echo,
            "fable" => Self::Fable,
            "onyx" => Self::Onyx,
            "nova" => Self::Nova,
            "sage" => Self::Sage,
            "shimmer" => Self::Shimmer,
            "verse" => Self::Verse,
            _ => Self::default(),
        }
    }
}

// =============================================================================
// Output Format
// =============================================================================

/// Supported output formats for OpenAI TTS.
///
/// MP3 is the default; PCM output is 24kHz 16-bit mono little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioOutputFormat {
    /// MP3 (default)
    #[default]
    Mp3,
    Opus,
    Aac,
    Flac,
    Wav,
    /// Raw PCM, 24kHz 16-bit mono
    Pcm,
}

impl AudioOutputFormat {
    /// Convert to the API parameter value. Doubles as the client-facing
    /// format tag on audio responses.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Opus => "opus",
            Self::Aac => "aac",
            Self::Flac => "flac",
            Self::Wav => "wav",
            Self::Pcm => "pcm",
        }
    }

    /// Parse from string, with fallback to default.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "mp3" | "mpeg" => Self::Mp3,
            "opus" => Self::Opus,
            "aac" => Self::Aac,
            "flac" => Self::Flac,
            "wav" => Self::Wav,
            "pcm" | "linear16" | "raw" => Self::Pcm,
            _ => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_text_length() {
        assert_eq!(MAX_TEXT_LENGTH, 4096);
    }

    #[test]
    fn test_model_as_str() {
        assert_eq!(OpenAITTSModel::Tts1.as_str(), "tts-1");
        assert_eq!(OpenAITTSModel::Tts1Hd.as_str(), "tts-1-hd");
        assert_eq!(OpenAITTSModel::Gpt4oMiniTts.as_str(), "gpt-4o-mini-tts");
    }

    #[test]
    fn test_model_from_str() {
        assert_eq!(
            OpenAITTSModel::from_str_or_default("tts-1-hd"),
            OpenAITTSModel::Tts1Hd
        );
        assert_eq!(
            OpenAITTSModel::from_str_or_default("unknown"),
            OpenAITTSModel::Tts1
        );
    }

    #[test]
    fn test_voice_from_str() {
        assert_eq!(OpenAIVoice::from_str_or_default("nova"), OpenAIVoice::Nova);
        assert_eq!(OpenAIVoice::from_str_or_default("ALLOY"), OpenAIVoice::Alloy);
        assert_eq!(OpenAIVoice::from_str_or_default("unknown"), OpenAIVoice::Alloy);
    }

    #[test]
    fn test_audio_format_from_str() {
        assert_eq!(
            AudioOutputFormat::from_str_or_default("pcm"),
            AudioOutputFormat::Pcm
        );
        assert_eq!(
            AudioOutputFormat::from_str_or_default("linear16"),
            AudioOutputFormat::Pcm
        );
        assert_eq!(
            AudioOutputFormat::from_str_or_default("unknown"),
            AudioOutputFormat::Mp3
        );
    }
}
