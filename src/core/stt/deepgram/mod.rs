//! Deepgram streaming speech-to-text provider.
//!
//! Streams audio over a WebSocket to Deepgram's real-time API and surfaces
//! finalized utterances as transcript fragments. Interim results are not
//! consumed.
//!
//! Module organization:
//! - `client`: WebSocket client and `SpeechToText` implementation
//! - `config`: Provider configuration and URL construction
//! - `messages`: Wire message types and event parsing

mod client;
mod config;
mod messages;


// Client
pub use client::{DeepgramSTT, MAX_SAMPLE_RATE, MIN_SAMPLE_RATE};

// Configuration
pub use config::{DEEPGRAM_WS_URL, DeepgramEncoding, DeepgramModel, DeepgramSTTConfig};

// Messages
pub use messages::{CloseStreamMessage, DeepgramEvent, FinalizedEvent};
