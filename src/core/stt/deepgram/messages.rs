//! Message types for the Deepgram streaming WebSocket protocol.
//!
//! This module contains all message structures for communication
//! with the streaming API, both incoming and outgoing.

use serde::{Deserialize, Serialize};

// =============================================================================
// Incoming Messages (from the provider)
// =============================================================================

/// Finalized utterance event.
///
/// Emitted when the provider has finished recognizing a span of speech.
/// This is the only event the pipeline consumes; everything else on the
/// stream is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct FinalizedEvent {
    /// Event type (always "Finalized")
    pub event: String,

    /// Recognized text for this utterance span
    pub transcript: String,

    /// Monotonic index of the utterance within the stream
    pub turn_index: u64,
}

// =============================================================================
// Outgoing Messages (to the provider)
// =============================================================================

/// Message to gracefully end the audio stream.
///
/// Sent as a text frame before closing the WebSocket so the provider can
/// flush any pending recognition results.
#[derive(Debug, Serialize)]
pub struct CloseStreamMessage {
    #[serde(rename = "type")]
    pub message_type: &'static str,
}

impl Default for CloseStreamMessage {
    fn default() -> Self {
        Self {
            message_type: "CloseStream",
        }
    }
}

// =============================================================================
// Message Parsing
// =============================================================================

/// Parsed incoming WebSocket message.
#[derive(Debug, Clone)]
pub enum DeepgramEvent {
    /// Finalized utterance with transcript text
    Finalized(FinalizedEvent),
    /// Well-formed event the pipeline does not consume (name retained for logging)
    Ignored(String),
    /// Unrecognized payload (raw text retained)
    Unknown(String),
}

impl DeepgramEvent {
    /// Parse a JSON text frame into the appropriate event type.
    pub fn parse(json: &str) -> Self {
        // Peek at the event field first
        #[derive(Deserialize)]
        struct EventPeek {
            event: String,
        }

        match serde_json::from_str::<EventPeek>(json) {
            Ok(peek) => match peek.event.as_str() {
                "Finalized" => match serde_json::from_str::<FinalizedEvent>(json) {
                    Ok(finalized) => Self::Finalized(finalized),
                    Err(_) => Self::Unknown(json.to_string()),
                },
                other => Self::Ignored(other.to_string()),
            },
            Err(_) => Self::Unknown(json.to_string()),
        }
    }

    /// Check if this is a finalized utterance event.
    #[inline]
    pub fn is_finalized(&self) -> bool {
        matches!(self, Self::Finalized(_))
    }
}
