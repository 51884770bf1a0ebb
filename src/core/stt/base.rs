//! Base types and capability trait for streaming speech recognition.
//!
//! Every STT provider implements the [`SpeechToText`] trait so the rest of
//! the pipeline can open bridges, stream audio, and receive finalized
//! transcript fragments without knowing which vendor is behind the socket.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;

/// Errors surfaced by STT providers.
#[derive(Error, Debug)]
pub enum STTError {
    /// API key missing or rejected by the provider
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Streaming connection could not be established
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Provider configuration is invalid or incomplete
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Transport-level failure on an established connection
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The provider reported an error event
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// Audio data was rejected before transmission
    #[error("Invalid audio format: {0}")]
    InvalidAudioFormat(String),
}

/// Base configuration shared across all STT providers.
#[derive(Debug, Clone)]
pub struct STTConfig {
    /// Provider name (e.g., "deepgram")
    pub provider: String,
    /// Provider API key
    pub api_key: String,
    /// Recognition language (BCP-47, e.g., "en-US")
    pub language: String,
    /// Sample rate of the audio stream in Hz
    pub sample_rate: u32,
    /// Number of audio channels
    pub channels: u16,
    /// Whether the provider should punctuate transcripts
    pub punctuation: bool,
    /// Audio encoding name (e.g., "linear16")
    pub encoding: String,
    /// Provider model identifier
    pub model: String,
}

impl Default for STTConfig {
    fn default() -> Self {
        Self {
            provider: "deepgram".to_string(),
            api_key: String::new(),
            language: "en-US".to_string(),
            sample_rate: 16000,
            channels: 1,
            punctuation: true,
            encoding: "linear16".to_string(),
            model: "nova-2".to_string(),
        }
    }
}

/// A finalized span of recognized text reported by the provider.
///
/// Fragments are turn-scoped: the session aggregates all fragments that
/// share a turn into one utterance before the agent is invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptFragment {
    /// Recognized text for this span
    pub text: String,
    /// Provider-reported turn index the span belongs to
    pub turn_index: u64,
}

impl TranscriptFragment {
    pub fn new(text: impl Into<String>, turn_index: u64) -> Self {
        Self {
            text: text.into(),
            turn_index,
        }
    }
}

/// Async callback invoked for each finalized transcript fragment.
pub type TranscriptCallback = Arc<
    dyn Fn(TranscriptFragment) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync,
>;

/// Async callback invoked when the provider reports an error.
pub type STTErrorCallback =
    Arc<dyn Fn(STTError) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Capability trait for streaming speech recognition providers.
///
/// Lifecycle: construct with [`new`](Self::new), register callbacks, then
/// [`connect`](Self::connect). Audio flows through
/// [`send_audio`](Self::send_audio) while the bridge is open;
/// [`disconnect`](Self::disconnect) closes the stream gracefully and
/// releases the connection task.
#[async_trait::async_trait]
pub trait SpeechToText: Send + Sync {
    /// Create a new provider instance from configuration.
    ///
    /// Validates the configuration without opening a connection.
    fn new(config: STTConfig) -> Result<Self, STTError>
    where
        Self: Sized;

    /// Establish the streaming connection.
    async fn connect(&mut self) -> Result<(), STTError>;

    /// Close the streaming connection gracefully.
    async fn disconnect(&mut self) -> Result<(), STTError>;

    /// Whether the bridge is open and accepting audio.
    fn is_ready(&self) -> bool;

    /// Queue one audio frame for transmission, preserving arrival order.
    async fn send_audio(&mut self, audio_data: Bytes) -> Result<(), STTError>;

    /// Register the callback for finalized transcript fragments.
    async fn on_transcript(&mut self, callback: TranscriptCallback) -> Result<(), STTError>;

    /// Register the callback for provider errors.
    async fn on_error(&mut self, callback: STTErrorCallback) -> Result<(), STTError>;

    /// The active configuration, if any.
    fn get_config(&self) -> Option<&STTConfig>;

    /// Human-readable provider identification.
    fn get_provider_info(&self) -> &'static str;
}
