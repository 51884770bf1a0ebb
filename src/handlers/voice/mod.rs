//! Voice session pipeline: WebSocket protocol, per-connection state machine,
//! transcript aggregation, and the connection loop that drives providers.

mod aggregator;
mod handler;
mod messages;
mod session;

pub use aggregator::TranscriptAggregator;
pub use handler::voice_handler;
pub use messages::{
    MAX_AUDIO_PAYLOAD_SIZE, VoiceIncomingMessage, VoiceMessageRoute, VoiceOutgoingMessage,
    VoiceValidationError,
};
pub use session::{Effect, SessionCore, SessionEvent, SessionState};
