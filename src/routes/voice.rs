//! Voice session WebSocket route configuration
//!
//! This module configures the WebSocket endpoint for interactive voice
//! sessions: streaming speech recognition, agent dispatch, and synthesized
//! audio replies.

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::voice::voice_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the voice session WebSocket router
///
/// # Endpoint
///
/// `GET /voice` - WebSocket upgrade for a voice session
///
/// # Protocol
///
/// After WebSocket upgrade, the server immediately sends `session-start`
/// with the assigned session ID. Clients then drive the turn cycle:
/// 1. `start-listening` to open the recognition bridge
/// 2. Audio as binary frames, or `audio-chunk` messages with base64 payloads
/// 3. `stop-listening` to finalize the utterance and dispatch it to the agent
///
/// Server responds with:
/// - `listening` when the recognition bridge is ready
/// - `transcript` for each finalized speech fragment
/// - `processing` when the utterance is dispatched
/// - `response-text` with the agent's reply
/// - `audio-response` with base64 synthesized audio, then `complete`
/// - `error` on failures; the session itself survives failed turns
///
/// `cancel` abandons the current turn at any point, and `ping` checks
/// connection health.
///
/// # Example
///
/// ```json
/// // Server opens the session
/// {"type": "session-start", "sessionId": "550e8400-..."}
///
/// // Client starts a turn
/// {"type": "start-listening"}
///
/// // Server acknowledges, client streams audio, server transcribes
/// {"type": "listening", "message": "Listening"}
/// {"type": "transcript", "text": "what is the weather"}
///
/// // Client ends the turn, server replies with text and audio
/// {"type": "stop-listening"}
/// {"type": "response-text", "text": "It is sunny today."}
/// {"type": "audio-response", "audio": "<base64>", "format": "mp3"}
/// ```
pub fn create_voice_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/voice", get(voice_handler))
        .layer(TraceLayer::new_for_http())
}
