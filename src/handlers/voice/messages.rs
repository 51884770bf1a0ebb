//! Voice session WebSocket message types
//!
//! This module defines the JSON envelope exchanged with voice clients. Every
//! text frame is an object tagged by `type`; raw binary frames are treated as
//! audio payloads and never appear here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum allowed size for a base64 audio payload (512 KB)
pub const MAX_AUDIO_PAYLOAD_SIZE: usize = 512 * 1024;

// =============================================================================
// Incoming Messages (Client -> Server)
// =============================================================================

/// Incoming WebSocket messages from the voice client
#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum VoiceIncomingMessage {
    /// Open a recognition bridge and begin accepting audio
    #[serde(rename = "start-listening")]
    StartListening,

    /// One capture frame, base64-encoded PCM16
    #[serde(rename = "audio-chunk")]
    AudioChunk {
        /// Base64-encoded audio bytes
        audio: String,
    },

    /// Finalize the current turn and dispatch it to the agent
    #[serde(rename = "stop-listening")]
    StopListening,

    /// Abort the current turn and return to idle
    #[serde(rename = "cancel")]
    Cancel,

    /// Application-level keepalive; server replies with `pong`
    #[serde(rename = "ping")]
    Ping,
}

// =============================================================================
// Outgoing Messages (Server -> Client)
// =============================================================================

/// Outgoing WebSocket messages to the voice client
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum VoiceOutgoingMessage {
    /// Session accepted; first message on every connection
    #[serde(rename = "session-start")]
    SessionStart {
        /// Session ID assigned to this connection
        #[serde(rename = "sessionId")]
        session_id: String,
    },

    /// Recognition bridge is open and audio is being accepted
    #[serde(rename = "listening")]
    Listening {
        /// Status text
        message: String,
    },

    /// A finalized recognition fragment, relayed as it arrives
    #[serde(rename = "transcript")]
    Transcript {
        /// Recognized text
        text: String,
    },

    /// Turn dispatched to the agent
    #[serde(rename = "processing")]
    Processing {
        /// Status text
        message: String,
    },

    /// Agent reply text, sent before synthesis begins
    #[serde(rename = "response-text")]
    ResponseText {
        /// Reply text
        text: String,
    },

    /// Synthesized reply audio
    #[serde(rename = "audio-response")]
    AudioResponse {
        /// Base64-encoded audio bytes
        audio: String,
        /// Audio format of the payload (e.g., "mp3", "pcm")
        format: String,
    },

    /// Turn finished; the session is idle again
    #[serde(rename = "complete")]
    Complete {
        /// Status text
        message: String,
    },

    /// Turn-level failure; the session is idle again
    #[serde(rename = "error")]
    Error {
        /// Error description
        error: String,
    },

    /// Turn aborted at the client's request
    #[serde(rename = "cancelled")]
    Cancelled {
        /// Status text
        message: String,
    },

    /// Reply to a client `ping`
    #[serde(rename = "pong")]
    Pong,
}

// =============================================================================
// Message Routing
// =============================================================================

/// Message routing for the per-session sender task
pub enum VoiceMessageRoute {
    /// JSON text message
    Outgoing(VoiceOutgoingMessage),
    /// Close connection
    Close,
}

// =============================================================================
// Validation
// =============================================================================

/// Error type for message validation failures
#[derive(Debug, Clone, Error)]
pub enum VoiceValidationError {
    /// Audio payload exceeds maximum allowed size
    #[error("Audio payload too large: {size} bytes (max: {max} bytes)")]
    AudioTooLarge { size: usize, max: usize },
}

impl VoiceIncomingMessage {
    /// Validates message field sizes to prevent resource exhaustion attacks.
    pub fn validate_size(&self) -> Result<(), VoiceValidationError> {
        match self {
            VoiceIncomingMessage::AudioChunk { audio } => {
                let size = audio.len();
                if size > MAX_AUDIO_PAYLOAD_SIZE {
                    return Err(VoiceValidationError::AudioTooLarge {
                        size,
                        max: MAX_AUDIO_PAYLOAD_SIZE,
                    });
                }
                Ok(())
            }
            VoiceIncomingMessage::StartListening
            | VoiceIncomingMessage::StopListening
            | VoiceIncomingMessage::Cancel
            | VoiceIncomingMessage::Ping => Ok(()),
        }
    }
}
