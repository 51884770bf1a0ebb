//! Client-side audio for native consumers of the voice protocol
//!
//! Only built with the `client-audio` feature. [`AudioCapture`] records
//! microphone input as 16-bit little-endian PCM frames suitable for the
//! binary audio path, and [`AudioSink`] plays `audio-response` payloads
//! back strictly in arrival order.

mod capture;
mod playback;

pub use capture::{AudioCapture, CaptureConfig};
pub use playback::AudioSink;

use thiserror::Error;

use crate::errors::VoiceError;

/// Errors raised by the client audio layer.
#[derive(Error, Debug)]
pub enum ClientAudioError {
    /// No usable input or output device on this host.
    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The device was acquired but the stream could not be driven.
    #[error("Audio stream failed: {0}")]
    StreamFailed(String),

    /// The payload could not be decoded in the advertised format.
    #[error("Failed to decode audio: {0}")]
    DecodeFailed(String),
}

impl From<ClientAudioError> for VoiceError {
    fn from(error: ClientAudioError) -> Self {
        VoiceError::Resource(error.to_string())
    }
}
