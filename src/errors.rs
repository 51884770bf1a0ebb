//! Crate-level error taxonomy.
//!
//! Provider-level failures (`STTError`, `TTSError`) are folded into
//! [`VoiceError`] at the session boundary, which decides what crosses the
//! wire to the client as an `error` message.

use thiserror::Error;

/// Result type for session-boundary operations
pub type VoiceResult<T> = Result<T, VoiceError>;

/// Error taxonomy for the voice pipeline.
///
/// Only `Connection`, `Provider`, and `Resource` errors are surfaced to the
/// client; `Protocol` errors are logged and the offending message dropped
/// without a state change.
#[derive(Error, Debug)]
pub enum VoiceError {
    /// Transport upgrade or STT bridge establishment failure. Fatal to the
    /// current turn only; the session returns to idle.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A provider invocation failed and the fallback chain is exhausted.
    #[error("Provider '{provider}' error: {error}")]
    Provider { provider: String, error: String },

    /// Malformed JSON or unrecognized message type from the client.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Audio device acquisition failure or server capacity exhaustion.
    #[error("Resource error: {0}")]
    Resource(String),
}

impl VoiceError {
    /// Create a provider error
    pub fn provider(provider: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self::Provider {
            provider: provider.into(),
            error: error.to_string(),
        }
    }

    /// Whether this error is reported to the client as an `error` message
    pub fn crosses_session_boundary(&self) -> bool {
        !matches!(self, Self::Protocol(_))
    }

    /// Whether the session can accept a new turn after this error
    pub fn is_turn_recoverable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Provider { .. })
    }
}
