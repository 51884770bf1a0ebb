pub mod agent;
pub mod fallback;
pub mod stt;
pub mod tts;

// Re-export commonly used types for convenience
pub use agent::{AgentClient, AgentError, SESSION_ID_HEADER};

pub use fallback::FallbackChain;

pub use stt::{
    STTConfig, STTError, STTErrorCallback, SpeechToText, TranscriptCallback, TranscriptFragment,
    create_stt_provider, get_supported_stt_providers,
};

pub use tts::{
    TTSConfig, TTSError, TTSResult, TextToSpeech, create_tts_provider,
    get_supported_tts_providers,
};
