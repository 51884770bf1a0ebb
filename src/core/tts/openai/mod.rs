//! OpenAI TTS provider module.
//!
//! Request/response text-to-speech using OpenAI's audio speech API.
//!
//! # Supported Models
//!
//! - `tts-1` - Standard quality, lower latency
//! - `tts-1-hd` - High definition quality, higher latency
//! - `gpt-4o-mini-tts` - Latest model with improved quality
//!
//! # Supported Voices
//!
//! alloy, ash, ballad, coral, echo, fable, onyx, nova, sage, shimmer, verse
//!
//! # Audio Formats
//!
//! mp3, opus, aac, flac, wav, pcm (24kHz 16-bit mono little-endian)

mod config;
mod provider;

pub use config::{AudioOutputFormat, MAX_TEXT_LENGTH, OpenAITTSModel, OpenAIVoice};
pub use provider::{OPENAI_TTS_URL, OpenAITTS};
