//! Per-connection session state machine.
//!
//! [`SessionCore`] is transport-free: it consumes [`SessionEvent`]s (client
//! messages decoded by the connection loop plus pipeline events reported by
//! the recognition bridge and the turn task) and returns the [`Effect`]s the
//! loop must execute. Keeping the transitions pure makes the whole turn
//! lifecycle unit-testable without a live socket or provider.
//!
//! States: `Idle -> Listening -> Processing -> Speaking -> Idle`. Turn-level
//! failures emit an `error` message and return the session to `Idle`; they
//! never terminate the connection.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use bytes::Bytes;
use tracing::{debug, info, trace, warn};

use super::aggregator::TranscriptAggregator;
use super::messages::VoiceOutgoingMessage;

/// Session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No turn in progress; accepting `start-listening`
    Idle,
    /// Recognition bridge open; accepting audio frames
    Listening,
    /// Turn dispatched; waiting for the agent reply
    Processing,
    /// Agent replied; waiting for synthesized audio
    Speaking,
}

/// Everything that can happen to a session.
///
/// The first group arrives from the client transport, the second from the
/// recognition bridge and the spawned turn task via the pipeline channel.
#[derive(Debug)]
pub enum SessionEvent {
    /// Client requested a new listening turn
    StartListening,
    /// One decoded audio frame from the client
    AudioFrame(Bytes),
    /// Client ended the listening phase
    StopListening,
    /// Client aborted the current turn
    Cancel,
    /// Client keepalive
    Ping,

    /// Recognition bridge opened successfully
    BridgeEstablished,
    /// Recognition bridge could not be opened
    BridgeFailed { error: String },
    /// An open recognition bridge dropped or reported a fatal error
    BridgeLost { error: String },
    /// Finalized recognition fragment from the bridge
    Fragment { text: String, turn_index: u64 },
    /// Agent reply for the given turn
    AgentReply { turn: u64, text: String },
    /// Synthesized audio for the given turn
    SynthesisComplete {
        turn: u64,
        audio: Bytes,
        format: String,
    },
    /// The turn task failed at the agent or synthesis stage
    TurnFailed { turn: u64, error: String },
}

/// Actions the connection loop must carry out after applying an event.
#[derive(Debug)]
pub enum Effect {
    /// Send a message to the client
    Send(VoiceOutgoingMessage),
    /// Establish a recognition bridge, then report the outcome back
    OpenBridge,
    /// Forward one audio frame to the open bridge
    ForwardAudio(Bytes),
    /// Close and release the recognition bridge
    CloseBridge,
    /// Spawn the turn task (agent call, then synthesis) for this utterance
    DispatchTurn { turn: u64, utterance: String },
    /// Abort the in-flight turn task
    AbortTurn,
}

/// Transport-free session state machine.
///
/// Owns the state, the turn transcript buffer, and the turn counter. The
/// counter guards against events from aborted or superseded turns: pipeline
/// events carry the turn they belong to and are discarded unless it matches.
pub struct SessionCore {
    session_id: String,
    state: SessionState,
    aggregator: TranscriptAggregator,
    bridge_open: bool,
    turn: u64,
}

impl SessionCore {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            state: SessionState::Idle,
            aggregator: TranscriptAggregator::new(),
            bridge_open: false,
            turn: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Turn counter; the most recently dispatched turn carries this value.
    pub fn current_turn(&self) -> u64 {
        self.turn
    }

    /// Whether a recognition bridge is open.
    pub fn has_open_bridge(&self) -> bool {
        self.bridge_open
    }

    /// Apply one event and return the effects the connection loop must run.
    pub fn apply(&mut self, event: SessionEvent) -> Vec<Effect> {
        match event {
            SessionEvent::StartListening => self.on_start_listening(),
            SessionEvent::AudioFrame(frame) => self.on_audio_frame(frame),
            SessionEvent::StopListening => self.on_stop_listening(),
            SessionEvent::Cancel => self.on_cancel(),
            SessionEvent::Ping => vec![Effect::Send(VoiceOutgoingMessage::Pong)],
            SessionEvent::BridgeEstablished => self.on_bridge_established(),
            SessionEvent::BridgeFailed { error } => self.on_bridge_failed(error),
            SessionEvent::BridgeLost { error } => self.on_bridge_lost(error),
            SessionEvent::Fragment { text, turn_index } => self.on_fragment(text, turn_index),
            SessionEvent::AgentReply { turn, text } => self.on_agent_reply(turn, text),
            SessionEvent::SynthesisComplete {
                turn,
                audio,
                format,
            } => self.on_synthesis_complete(turn, audio, format),
            SessionEvent::TurnFailed { turn, error } => self.on_turn_failed(turn, error),
        }
    }

    fn on_start_listening(&mut self) -> Vec<Effect> {
        match self.state {
            SessionState::Idle => {
                self.aggregator.clear();
                debug!(session_id = %self.session_id, "Opening recognition bridge");
                vec![Effect::OpenBridge]
            }
            _ => {
                warn!(
                    session_id = %self.session_id,
                    state = ?self.state,
                    "Ignoring start-listening outside Idle"
                );
                Vec::new()
            }
        }
    }

    fn on_bridge_established(&mut self) -> Vec<Effect> {
        match self.state {
            SessionState::Idle => {
                self.state = SessionState::Listening;
                self.bridge_open = true;
                info!(session_id = %self.session_id, "Session listening");
                vec![Effect::Send(VoiceOutgoingMessage::Listening {
                    message: "Listening".to_string(),
                })]
            }
            _ => {
                warn!(
                    session_id = %self.session_id,
                    state = ?self.state,
                    "Bridge established in unexpected state, closing it"
                );
                vec![Effect::CloseBridge]
            }
        }
    }

    fn on_bridge_failed(&mut self, error: String) -> Vec<Effect> {
        self.bridge_open = false;
        warn!(session_id = %self.session_id, "Recognition bridge failed to open: {error}");
        vec![Effect::Send(VoiceOutgoingMessage::Error {
            error: format!("Speech recognition unavailable: {error}"),
        })]
    }

    fn on_bridge_lost(&mut self, error: String) -> Vec<Effect> {
        if self.state == SessionState::Listening {
            self.state = SessionState::Idle;
            self.bridge_open = false;
            warn!(session_id = %self.session_id, "Recognition bridge lost mid-turn: {error}");
            vec![
                Effect::CloseBridge,
                Effect::Send(VoiceOutgoingMessage::Error {
                    error: format!("Speech recognition interrupted: {error}"),
                }),
            ]
        } else {
            debug!(
                session_id = %self.session_id,
                state = ?self.state,
                "Ignoring bridge error outside Listening: {error}"
            );
            Vec::new()
        }
    }

    fn on_audio_frame(&mut self, frame: Bytes) -> Vec<Effect> {
        if self.state == SessionState::Listening && self.bridge_open {
            vec![Effect::ForwardAudio(frame)]
        } else {
            trace!(
                session_id = %self.session_id,
                state = ?self.state,
                bytes = frame.len(),
                "Dropping audio frame outside Listening"
            );
            Vec::new()
        }
    }

    fn on_fragment(&mut self, text: String, turn_index: u64) -> Vec<Effect> {
        if self.state == SessionState::Listening {
            debug!(
                session_id = %self.session_id,
                turn_index,
                chars = text.len(),
                "Transcript fragment received"
            );
            self.aggregator.push(&text);
            vec![Effect::Send(VoiceOutgoingMessage::Transcript { text })]
        } else {
            debug!(
                session_id = %self.session_id,
                state = ?self.state,
                "Dropping late transcript fragment"
            );
            Vec::new()
        }
    }

    fn on_stop_listening(&mut self) -> Vec<Effect> {
        match self.state {
            SessionState::Listening => {
                self.bridge_open = false;
                let mut effects = vec![Effect::CloseBridge];

                let utterance = self.aggregator.take();
                if utterance.is_empty() {
                    self.state = SessionState::Idle;
                    debug!(session_id = %self.session_id, "Empty turn, returning to Idle");
                } else {
                    self.state = SessionState::Processing;
                    self.turn += 1;
                    info!(
                        session_id = %self.session_id,
                        turn = self.turn,
                        chars = utterance.len(),
                        "Dispatching turn to agent"
                    );
                    effects.push(Effect::Send(VoiceOutgoingMessage::Processing {
                        message: "Processing your request".to_string(),
                    }));
                    effects.push(Effect::DispatchTurn {
                        turn: self.turn,
                        utterance,
                    });
                }
                effects
            }
            _ => {
                warn!(
                    session_id = %self.session_id,
                    state = ?self.state,
                    "Ignoring stop-listening outside Listening"
                );
                Vec::new()
            }
        }
    }

    fn on_agent_reply(&mut self, turn: u64, text: String) -> Vec<Effect> {
        if turn == self.turn && self.state == SessionState::Processing {
            self.state = SessionState::Speaking;
            info!(
                session_id = %self.session_id,
                turn,
                chars = text.len(),
                "Agent replied, synthesizing"
            );
            vec![Effect::Send(VoiceOutgoingMessage::ResponseText { text })]
        } else {
            debug!(
                session_id = %self.session_id,
                turn,
                current_turn = self.turn,
                state = ?self.state,
                "Discarding stale agent reply"
            );
            Vec::new()
        }
    }

    fn on_synthesis_complete(&mut self, turn: u64, audio: Bytes, format: String) -> Vec<Effect> {
        if turn == self.turn && self.state == SessionState::Speaking {
            self.state = SessionState::Idle;
            info!(
                session_id = %self.session_id,
                turn,
                bytes = audio.len(),
                format = %format,
                "Turn complete"
            );
            vec![
                Effect::Send(VoiceOutgoingMessage::AudioResponse {
                    audio: BASE64.encode(&audio),
                    format,
                }),
                Effect::Send(VoiceOutgoingMessage::Complete {
                    message: "Response complete".to_string(),
                }),
            ]
        } else {
            debug!(
                session_id = %self.session_id,
                turn,
                current_turn = self.turn,
                state = ?self.state,
                "Discarding stale synthesis result"
            );
            Vec::new()
        }
    }

    fn on_turn_failed(&mut self, turn: u64, error: String) -> Vec<Effect> {
        if turn == self.turn
            && matches!(self.state, SessionState::Processing | SessionState::Speaking)
        {
            self.state = SessionState::Idle;
            warn!(session_id = %self.session_id, turn, "Turn failed: {error}");
            vec![Effect::Send(VoiceOutgoingMessage::Error { error })]
        } else {
            debug!(
                session_id = %self.session_id,
                turn,
                current_turn = self.turn,
                "Discarding stale turn failure: {error}"
            );
            Vec::new()
        }
    }

    fn on_cancel(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if matches!(self.state, SessionState::Processing | SessionState::Speaking) {
            effects.push(Effect::AbortTurn);
        }
        if self.bridge_open {
            self.bridge_open = false;
            effects.push(Effect::CloseBridge);
        }
        self.aggregator.clear();
        self.state = SessionState::Idle;
        info!(session_id = %self.session_id, "Turn cancelled by client");
        effects.push(Effect::Send(VoiceOutgoingMessage::Cancelled {
            message: "Request cancelled".to_string(),
        }));
        effects
    }
}
