//! Voice session WebSocket handler
//!
//! One tokio task per connection drives a single `select!` loop over the
//! client socket, the internal pipeline-event channel, and the idle check.
//! The loop feeds [`SessionCore`] and executes the effects it returns:
//! opening and closing the recognition bridge, forwarding audio, and
//! spawning the per-turn agent/synthesis task.

use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::Arc;

use axum::{
    Extension,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::{select, time::Duration};
use tracing::{debug, error, info, warn};

use crate::core::stt::{STTError, SpeechToText, TranscriptFragment, create_stt_provider};
use crate::core::tts::TTSError;
use crate::errors::VoiceError;
use crate::middleware::ClientIp;
use crate::state::AppState;

use super::messages::{VoiceIncomingMessage, VoiceMessageRoute, VoiceOutgoingMessage};
use super::session::{Effect, SessionCore, SessionEvent};

/// Optimized channel buffer size for audio workloads
const CHANNEL_BUFFER_SIZE: usize = 1024;

/// Buffer size for pipeline events (fragments, turn progress)
const PIPELINE_BUFFER_SIZE: usize = 256;

/// Maximum WebSocket frame size (2 MB)
const MAX_WS_FRAME_SIZE: usize = 2 * 1024 * 1024;

/// Maximum WebSocket message size (2 MB)
const MAX_WS_MESSAGE_SIZE: usize = 2 * 1024 * 1024;

/// How often the connection checks whether it has gone idle
const IDLE_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Voice WebSocket handler
///
/// Upgrades the HTTP connection to WebSocket and runs the voice session
/// pipeline: streaming recognition, agent dispatch, and synthesized replies.
///
/// # Arguments
/// * `ws` - The WebSocket upgrade request from Axum
/// * `state` - Application state containing configuration and provider chains
///
/// # Returns
/// * `Response` - HTTP response that upgrades the connection to WebSocket
pub async fn voice_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    client_ip: Option<Extension<ClientIp>>,
) -> Response {
    info!("Voice WebSocket connection upgrade requested");

    let client_ip = client_ip.map(|Extension(ClientIp(ip))| ip);

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_voice_socket(socket, state, client_ip))
}

/// Handle the voice WebSocket connection
async fn handle_voice_socket(socket: WebSocket, app_state: Arc<AppState>, client_ip: Option<IpAddr>) {
    let session_id = uuid::Uuid::new_v4().to_string();
    info!(session_id = %session_id, "Voice session established");

    let (mut sender, mut receiver) = socket.split();
    let (message_tx, mut message_rx) = mpsc::channel::<VoiceMessageRoute>(CHANNEL_BUFFER_SIZE);
    let (pipeline_tx, mut pipeline_rx) = mpsc::channel::<SessionEvent>(PIPELINE_BUFFER_SIZE);

    // Sender task for outgoing messages
    let sender_task = tokio::spawn(async move {
        while let Some(route) = message_rx.recv().await {
            let should_close = matches!(route, VoiceMessageRoute::Close);

            let result = match route {
                VoiceMessageRoute::Outgoing(message) => match serde_json::to_string(&message) {
                    Ok(json_str) => sender.send(Message::Text(json_str.into())).await,
                    Err(e) => {
                        error!("Failed to serialize outgoing message: {}", e);
                        continue;
                    }
                },
                VoiceMessageRoute::Close => {
                    info!("Closing voice WebSocket connection");
                    sender.send(Message::Close(None)).await
                }
            };

            if let Err(e) = result {
                error!("Failed to send WebSocket message: {}", e);
                break;
            }

            if should_close {
                break;
            }
        }
    });

    app_state
        .sessions
        .insert(session_id.clone(), crate::state::SessionHandle::new());

    let _ = message_tx
        .send(VoiceMessageRoute::Outgoing(
            VoiceOutgoingMessage::SessionStart {
                session_id: session_id.clone(),
            },
        ))
        .await;

    let mut runtime = SessionRuntime {
        session_id: session_id.clone(),
        core: SessionCore::new(session_id),
        bridge: None,
        turn_task: None,
        message_tx,
        pipeline_tx,
        app_state,
        client_ip,
    };

    // Maximum idle time before closing the connection, jittered so that many
    // simultaneous connections do not all expire on the same tick
    let idle_limit = idle_timeout(runtime.app_state.config.session_idle_timeout_seconds);

    // Track last activity time for idle connection detection
    let mut last_activity = std::time::Instant::now();

    loop {
        select! {
            msg_result = receiver.next() => {
                // Update activity time on any message
                last_activity = std::time::Instant::now();

                match msg_result {
                    Some(Ok(msg)) => {
                        if !runtime.process_client_message(msg).await {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        warn!(session_id = %runtime.session_id, "Voice WebSocket error: {}", e);
                        break;
                    }
                    None => {
                        info!(session_id = %runtime.session_id, "Voice WebSocket closed by client");
                        break;
                    }
                }
            }
            event = pipeline_rx.recv() => {
                last_activity = std::time::Instant::now();

                match event {
                    Some(event) => runtime.apply_event(event).await,
                    None => break,
                }
            }
            _ = tokio::time::sleep(IDLE_CHECK_INTERVAL) => {
                if let Some(limit) = idle_limit
                    && last_activity.elapsed() > limit
                {
                    warn!(
                        session_id = %runtime.session_id,
                        "Voice session idle for {}s, closing stale connection",
                        last_activity.elapsed().as_secs()
                    );
                    let _ = runtime.message_tx
                        .send(VoiceMessageRoute::Outgoing(VoiceOutgoingMessage::Error {
                            error: "Connection closed due to inactivity".to_string(),
                        }))
                        .await;
                    let _ = runtime.message_tx.send(VoiceMessageRoute::Close).await;
                    break;
                }
                debug!(session_id = %runtime.session_id, "Voice session idle check - still active");
            }
        }
    }

    runtime.shutdown().await;
    sender_task.abort();
}

/// Mutable per-connection state driven by the session loop.
struct SessionRuntime {
    session_id: String,
    core: SessionCore,
    bridge: Option<Box<dyn SpeechToText>>,
    turn_task: Option<JoinHandle<()>>,
    message_tx: mpsc::Sender<VoiceMessageRoute>,
    pipeline_tx: mpsc::Sender<SessionEvent>,
    app_state: Arc<AppState>,
    /// IP recorded by the connection-limit middleware, released at teardown.
    client_ip: Option<IpAddr>,
}

impl SessionRuntime {
    /// Process one incoming WebSocket message. Returns false when the
    /// connection should close.
    async fn process_client_message(&mut self, msg: Message) -> bool {
        match msg {
            Message::Text(text) => {
                debug!(
                    session_id = %self.session_id,
                    bytes = text.len(),
                    "Received text message"
                );

                let incoming: VoiceIncomingMessage = match serde_json::from_str(&text) {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!(
                            session_id = %self.session_id,
                            "Ignoring malformed client message: {}", e
                        );
                        return true;
                    }
                };

                if let Err(e) = incoming.validate_size() {
                    warn!(
                        session_id = %self.session_id,
                        "Ignoring oversized client message: {}", e
                    );
                    return true;
                }

                self.handle_incoming(incoming).await;
                true
            }
            // Raw binary frames carry audio verbatim
            Message::Binary(data) => {
                self.apply_event(SessionEvent::AudioFrame(data)).await;
                true
            }
            Message::Ping(_) | Message::Pong(_) => true,
            Message::Close(_) => {
                info!(session_id = %self.session_id, "Voice WebSocket close received");
                false
            }
        }
    }

    /// Translate a typed client message into a session event.
    async fn handle_incoming(&mut self, msg: VoiceIncomingMessage) {
        match msg {
            VoiceIncomingMessage::StartListening => {
                self.apply_event(SessionEvent::StartListening).await;
            }
            VoiceIncomingMessage::AudioChunk { audio } => match BASE64.decode(&audio) {
                Ok(frame) => {
                    self.apply_event(SessionEvent::AudioFrame(Bytes::from(frame)))
                        .await;
                }
                Err(e) => {
                    debug!(
                        session_id = %self.session_id,
                        "Dropping audio chunk with invalid base64: {}", e
                    );
                }
            },
            VoiceIncomingMessage::StopListening => {
                self.apply_event(SessionEvent::StopListening).await;
            }
            VoiceIncomingMessage::Cancel => {
                self.apply_event(SessionEvent::Cancel).await;
            }
            VoiceIncomingMessage::Ping => {
                self.apply_event(SessionEvent::Ping).await;
            }
        }
    }

    /// Apply one event to the session core and execute the resulting effects.
    async fn apply_event(&mut self, event: SessionEvent) {
        let effects = self.core.apply(event);
        self.execute(effects).await;
    }

    /// Execute session effects in order. Effects that report back into the
    /// core (bridge establishment, forwarding failures) extend the queue with
    /// their follow-up effects.
    async fn execute(&mut self, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();

        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::Send(message) => {
                    let _ = self
                        .message_tx
                        .send(VoiceMessageRoute::Outgoing(message))
                        .await;
                }
                Effect::OpenBridge => {
                    let event = match self.establish_bridge().await {
                        Ok(handle) => {
                            self.bridge = Some(handle);
                            SessionEvent::BridgeEstablished
                        }
                        Err(e) => {
                            let error = VoiceError::Connection(e.to_string());
                            warn!(session_id = %self.session_id, "{}", error);
                            SessionEvent::BridgeFailed {
                                error: e.to_string(),
                            }
                        }
                    };
                    queue.extend(self.core.apply(event));
                }
                Effect::ForwardAudio(frame) => {
                    let Some(bridge) = self.bridge.as_mut() else {
                        continue;
                    };
                    match bridge.send_audio(frame).await {
                        Ok(()) => {}
                        Err(STTError::InvalidAudioFormat(reason)) => {
                            warn!(
                                session_id = %self.session_id,
                                "Audio frame rejected by bridge: {}", reason
                            );
                        }
                        Err(e) => {
                            queue.extend(self.core.apply(SessionEvent::BridgeLost {
                                error: e.to_string(),
                            }));
                        }
                    }
                }
                Effect::CloseBridge => {
                    if let Some(mut bridge) = self.bridge.take()
                        && let Err(e) = bridge.disconnect().await
                    {
                        warn!(
                            session_id = %self.session_id,
                            "Failed to close recognition bridge: {}", e
                        );
                    }
                }
                Effect::DispatchTurn { turn, utterance } => {
                    let task = tokio::spawn(run_turn(
                        turn,
                        utterance,
                        self.session_id.clone(),
                        Arc::clone(&self.app_state),
                        self.pipeline_tx.clone(),
                    ));
                    if let Some(previous) = self.turn_task.replace(task) {
                        previous.abort();
                    }
                }
                Effect::AbortTurn => {
                    if let Some(task) = self.turn_task.take() {
                        task.abort();
                    }
                }
            }
        }
    }

    /// Open a recognition bridge through the configured provider chain.
    ///
    /// The first provider whose streaming connection opens wins; callbacks
    /// route fragments and bridge errors into the pipeline channel.
    async fn establish_bridge(&self) -> Result<Box<dyn SpeechToText>, STTError> {
        let session_id = &self.session_id;
        let pipeline_tx = &self.pipeline_tx;

        self.app_state
            .stt_chain
            .invoke(|_, config| {
                let config = config.clone();
                let session_id = session_id.clone();
                let pipeline_tx = pipeline_tx.clone();
                async move { open_stt_bridge(&session_id, config, pipeline_tx).await }
            })
            .await
    }

    /// Release per-session resources. Runs exactly once, when the loop exits.
    async fn shutdown(mut self) {
        if let Some(task) = self.turn_task.take() {
            task.abort();
        }

        if let Some(mut bridge) = self.bridge.take()
            && let Err(e) = bridge.disconnect().await
        {
            warn!(
                session_id = %self.session_id,
                "Failed to close recognition bridge: {}", e
            );
        }

        self.app_state.sessions.remove(&self.session_id);

        if let Some(ip) = self.client_ip {
            self.app_state.release_connection(ip);
        }

        info!(session_id = %self.session_id, "Voice session terminated");
    }
}

/// Create, wire, and connect one recognition provider.
async fn open_stt_bridge(
    session_id: &str,
    config: crate::core::stt::STTConfig,
    pipeline_tx: mpsc::Sender<SessionEvent>,
) -> Result<Box<dyn SpeechToText>, STTError> {
    let provider_name = config.provider.clone();
    let mut provider = create_stt_provider(&provider_name, config)?;

    let fragment_tx = pipeline_tx.clone();
    provider
        .on_transcript(Arc::new(move |fragment: TranscriptFragment| {
            let tx = fragment_tx.clone();
            Box::pin(async move {
                let _ = tx
                    .send(SessionEvent::Fragment {
                        text: fragment.text,
                        turn_index: fragment.turn_index,
                    })
                    .await;
            })
        }))
        .await?;

    let error_session = session_id.to_string();
    provider
        .on_error(Arc::new(move |error: STTError| {
            let tx = pipeline_tx.clone();
            let session_id = error_session.clone();
            Box::pin(async move {
                warn!(session_id = %session_id, "Recognition bridge error: {}", error);
                let _ = tx
                    .send(SessionEvent::BridgeLost {
                        error: error.to_string(),
                    })
                    .await;
            })
        }))
        .await?;

    provider.connect().await?;
    Ok(provider)
}

/// Run one turn: agent call first, then synthesis through the fallback chain.
///
/// Spawned per dispatched turn so the session loop stays responsive to
/// `cancel` and socket close; progress is reported through the pipeline
/// channel and guarded by the turn counter on the other side.
async fn run_turn(
    turn: u64,
    utterance: String,
    session_id: String,
    app_state: Arc<AppState>,
    pipeline_tx: mpsc::Sender<SessionEvent>,
) {
    let reply = match app_state.agent.send_message(&session_id, &utterance).await {
        Ok(text) => text,
        Err(e) => {
            let error = VoiceError::provider("agent", &e);
            warn!(session_id = %session_id, turn, "{}", error);
            let _ = pipeline_tx
                .send(SessionEvent::TurnFailed {
                    turn,
                    error: error.to_string(),
                })
                .await;
            return;
        }
    };

    let _ = pipeline_tx
        .send(SessionEvent::AgentReply {
            turn,
            text: reply.clone(),
        })
        .await;

    match synthesize_reply(&app_state, &reply).await {
        Ok((audio, format)) => {
            let _ = pipeline_tx
                .send(SessionEvent::SynthesisComplete {
                    turn,
                    audio,
                    format,
                })
                .await;
        }
        Err(e) => {
            let error = VoiceError::provider("synthesis", &e);
            warn!(session_id = %session_id, turn, "{}", error);
            let _ = pipeline_tx
                .send(SessionEvent::TurnFailed {
                    turn,
                    error: error.to_string(),
                })
                .await;
        }
    }
}

/// Synthesize reply text through the fallback chain, returning the audio and
/// the format of whichever provider succeeded.
async fn synthesize_reply(
    app_state: &Arc<AppState>,
    text: &str,
) -> Result<(Bytes, String), TTSError> {
    app_state
        .tts_chain
        .invoke(|_, provider| {
            let provider = Arc::clone(provider);
            let text = text.to_string();
            async move {
                let audio = provider.synthesize(&text).await?;
                Ok::<_, TTSError>((audio, provider.audio_format().to_string()))
            }
        })
        .await
}

/// Idle limit for a session, or None when idle teardown is disabled.
///
/// Applies ±10% jitter so simultaneous connections do not all expire on the
/// same check.
fn idle_timeout(base_secs: u64) -> Option<Duration> {
    if base_secs == 0 {
        return None;
    }

    let jitter_range = (base_secs / 10).max(1);
    let jitter_offset = (std::time::Instant::now().elapsed().as_nanos() as u64
        % (jitter_range * 2)) as i64
        - jitter_range as i64;
    Some(Duration::from_secs(
        (base_secs as i64 + jitter_offset).max(1) as u64,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_timeout_disabled_at_zero() {
        assert!(idle_timeout(0).is_none());
    }

    #[test]
    fn test_idle_timeout_within_jitter_band() {
        for _ in 0..32 {
            let limit = idle_timeout(300).expect("enabled");
            assert!(limit >= Duration::from_secs(270));
            assert!(limit <= Duration::from_secs(330));
        }
    }

    #[test]
    fn test_idle_timeout_never_below_one_second() {
        for _ in 0..32 {
            let limit = idle_timeout(1).expect("enabled");
            assert!(limit >= Duration::from_secs(1));
        }
    }
}
