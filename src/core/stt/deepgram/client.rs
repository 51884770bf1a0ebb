//! Deepgram streaming STT client.
//!
//! WebSocket-based streaming speech-to-text using Deepgram's real-time API.
//! Audio is forwarded as binary frames; the provider answers with JSON
//! events, of which only finalized utterances are surfaced to the pipeline.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::sync::{Mutex, Notify, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use super::super::base::{
    STTConfig, STTError, STTErrorCallback, SpeechToText, TranscriptCallback, TranscriptFragment,
};
use super::config::{DEEPGRAM_HOST, DeepgramSTTConfig};
use super::messages::{CloseStreamMessage, DeepgramEvent};

/// Maximum audio chunk size (256KB)
const MAX_AUDIO_CHUNK_SIZE: usize = 256 * 1024;

/// Timeout for WebSocket messages
const WS_MESSAGE_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout for the initial connection handshake
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimum supported sample rate (Hz)
pub const MIN_SAMPLE_RATE: u32 = 8000;

/// Maximum supported sample rate (Hz)
pub const MAX_SAMPLE_RATE: u32 = 48000;

/// Connection state
#[derive(Debug, Clone, PartialEq)]
#[allow(dead_code)]
enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error(String),
}

/// Deepgram streaming STT client.
pub struct DeepgramSTT {
    /// Configuration
    config: Option<DeepgramSTTConfig>,

    /// Current connection state
    state: ConnectionState,

    /// Notify for state changes
    state_notify: Arc<Notify>,

    /// Channel for sending audio data to the WebSocket task
    ws_sender: Option<mpsc::Sender<Bytes>>,

    /// Channel for sending control messages to the WebSocket task
    control_tx: Option<mpsc::Sender<String>>,

    /// Shutdown signal for the WebSocket task
    shutdown_tx: Option<oneshot::Sender<()>>,

    /// Handle to the WebSocket connection task
    connection_handle: Option<JoinHandle<()>>,

    /// Handle to the fragment forwarding task
    fragment_receiver_handle: Option<JoinHandle<()>>,

    /// Handle to the error forwarding task
    error_receiver_handle: Option<JoinHandle<()>>,

    /// Callback for transcript fragments
    transcript_callback: Arc<Mutex<Option<TranscriptCallback>>>,

    /// Callback for errors
    error_callback: Arc<Mutex<Option<STTErrorCallback>>>,

    /// Whether the client is connected
    is_connected: Arc<AtomicBool>,
}

impl DeepgramSTT {
    /// Process an incoming WebSocket message.
    ///
    /// Returns `Ok(true)` to continue the read loop, `Ok(false)` when the
    /// stream should close.
    pub(super) fn handle_websocket_message(
        message: Message,
        fragment_tx: &mpsc::Sender<TranscriptFragment>,
    ) -> Result<bool, STTError> {
        match message {
            Message::Text(text) => {
                match DeepgramEvent::parse(&text) {
                    DeepgramEvent::Finalized(finalized) => {
                        debug!(
                            turn_index = finalized.turn_index,
                            "Received finalized utterance"
                        );
                        let fragment =
                            TranscriptFragment::new(finalized.transcript, finalized.turn_index);
                        if let Err(e) = fragment_tx.try_send(fragment) {
                            warn!("Failed to forward transcript fragment: {e}");
                        }
                    }
                    DeepgramEvent::Ignored(event) => {
                        debug!("Ignoring event: {event}");
                    }
                    DeepgramEvent::Unknown(raw) => {
                        debug!("Unrecognized message from provider: {raw}");
                    }
                }
                Ok(true)
            }
            Message::Binary(_) => {
                debug!("Unexpected binary message from provider");
                Ok(true)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(true),
            Message::Close(frame) => {
                info!("Provider closed the stream: {frame:?}");
                Ok(false)
            }
            Message::Frame(_) => Ok(true),
        }
    }

    /// Start the WebSocket connection and spawn the I/O tasks.
    async fn start_connection(
        &mut self,
        connected_tx: oneshot::Sender<()>,
    ) -> Result<(), STTError> {
        let config = self.config.as_ref().ok_or_else(|| {
            STTError::ConfigurationError("No configuration provided".to_string())
        })?;

        let url = config.build_websocket_url();
        let api_key = config.base.api_key.clone();

        debug!("Connecting to Deepgram streaming API");

        // Channels between the client API and the connection task
        let (ws_tx, mut ws_rx) = mpsc::channel::<Bytes>(32);
        let (control_tx, mut control_rx) = mpsc::channel::<String>(8);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let (fragment_tx, fragment_rx) = mpsc::channel::<TranscriptFragment>(256);
        let (error_tx, error_rx) = mpsc::channel::<STTError>(64);

        self.ws_sender = Some(ws_tx);
        self.control_tx = Some(control_tx);
        self.shutdown_tx = Some(shutdown_tx);

        let request = http::Request::builder()
            .method("GET")
            .uri(&url)
            .header("Host", DEEPGRAM_HOST)
            .header("Upgrade", "websocket")
            .header("Connection", "Upgrade")
            .header(
                "Sec-WebSocket-Key",
                tokio_tungstenite::tungstenite::handshake::client::generate_key(),
            )
            .header("Sec-WebSocket-Version", "13")
            .header("Authorization", format!("Token {api_key}"))
            .body(())
            .map_err(|e| {
                STTError::ConnectionFailed(format!("Failed to build request: {e}"))
            })?;

        let is_connected = self.is_connected.clone();

        let connection_handle = tokio::spawn(async move {
            let ws_stream = match connect_async(request).await {
                Ok((stream, _)) => stream,
                Err(e) => {
                    let error_msg = e.to_string();
                    let err = if error_msg.contains("401") || error_msg.contains("Unauthorized") {
                        STTError::AuthenticationFailed("Invalid API key".to_string())
                    } else {
                        STTError::ConnectionFailed(format!(
                            "WebSocket connection failed: {e}"
                        ))
                    };
                    error!("Deepgram connection failed: {error_msg}");
                    let _ = error_tx.try_send(err);
                    return;
                }
            };

            // No handshake message follows the upgrade, the stream is live now
            is_connected.store(true, Ordering::Relaxed);
            let _ = connected_tx.send(());

            let (mut ws_sink, mut ws_stream) = ws_stream.split();

            loop {
                tokio::select! {
                    Some(audio) = ws_rx.recv() => {
                        if let Err(e) = ws_sink.send(Message::Binary(audio)).await {
                            error!("Failed to send audio: {e}");
                            let _ = error_tx.try_send(STTError::NetworkError(format!(
                                "Failed to send audio: {e}"
                            )));
                            break;
                        }
                    }

                    Some(control) = control_rx.recv() => {
                        if let Err(e) = ws_sink.send(Message::Text(control.into())).await {
                            error!("Failed to send control message: {e}");
                            break;
                        }
                    }

                    result = timeout(WS_MESSAGE_TIMEOUT, ws_stream.next()) => {
                        match result {
                            Ok(Some(Ok(message))) => {
                                match Self::handle_websocket_message(message, &fragment_tx) {
                                    Ok(true) => {}
                                    Ok(false) => break,
                                    Err(e) => {
                                        let _ = error_tx.try_send(e);
                                    }
                                }
                            }
                            Ok(Some(Err(e))) => {
                                error!("WebSocket error: {e}");
                                let _ = error_tx.try_send(STTError::NetworkError(format!(
                                    "WebSocket error: {e}"
                                )));
                                break;
                            }
                            Ok(None) => {
                                info!("WebSocket stream ended");
                                break;
                            }
                            Err(_) => {
                                warn!("WebSocket message timeout");
                                let _ = error_tx.try_send(STTError::NetworkError(
                                    "WebSocket message timeout".to_string(),
                                ));
                                break;
                            }
                        }
                    }

                    _ = &mut shutdown_rx => {
                        debug!("Shutdown signal received, closing stream");
                        if let Ok(close) = serde_json::to_string(&CloseStreamMessage::default()) {
                            let _ = ws_sink.send(Message::Text(close.into())).await;
                        }
                        let _ = ws_sink.send(Message::Close(None)).await;
                        break;
                    }
                }
            }

            is_connected.store(false, Ordering::Relaxed);
            debug!("Deepgram connection task finished");
        });

        self.connection_handle = Some(connection_handle);

        // Forward fragments to the registered callback
        let transcript_callback = self.transcript_callback.clone();
        let fragment_receiver_handle = tokio::spawn(async move {
            let mut fragment_rx = fragment_rx;
            while let Some(fragment) = fragment_rx.recv().await {
                let callback_guard = transcript_callback.lock().await;
                if let Some(callback) = callback_guard.as_ref() {
                    callback(fragment).await;
                }
            }
        });
        self.fragment_receiver_handle = Some(fragment_receiver_handle);

        // Forward errors to the registered callback
        let error_callback = self.error_callback.clone();
        let error_receiver_handle = tokio::spawn(async move {
            let mut error_rx = error_rx;
            while let Some(err) = error_rx.recv().await {
                let callback_guard = error_callback.lock().await;
                if let Some(callback) = callback_guard.as_ref() {
                    callback(err).await;
                }
            }
        });
        self.error_receiver_handle = Some(error_receiver_handle);

        Ok(())
    }
}

#[async_trait::async_trait]
impl SpeechToText for DeepgramSTT {
    fn new(config: STTConfig) -> Result<Self, STTError> {
        if config.api_key.is_empty() {
            return Err(STTError::ConfigurationError(
                "Deepgram API key is required".to_string(),
            ));
        }

        if config.sample_rate < MIN_SAMPLE_RATE || config.sample_rate > MAX_SAMPLE_RATE {
            return Err(STTError::ConfigurationError(format!(
                "Sample rate must be between {MIN_SAMPLE_RATE} and {MAX_SAMPLE_RATE} Hz, got {}",
                config.sample_rate
            )));
        }

        Ok(Self {
            config: Some(DeepgramSTTConfig::from_base(config)),
            state: ConnectionState::Disconnected,
            state_notify: Arc::new(Notify::new()),
            ws_sender: None,
            control_tx: None,
            shutdown_tx: None,
            connection_handle: None,
            fragment_receiver_handle: None,
            error_receiver_handle: None,
            transcript_callback: Arc::new(Mutex::new(None)),
            error_callback: Arc::new(Mutex::new(None)),
            is_connected: Arc::new(AtomicBool::new(false)),
        })
    }

    async fn connect(&mut self) -> Result<(), STTError> {
        if self.is_connected.load(Ordering::Relaxed) {
            return Ok(());
        }

        self.state = ConnectionState::Connecting;

        let (connected_tx, connected_rx) = oneshot::channel();
        self.start_connection(connected_tx).await?;

        match timeout(CONNECT_TIMEOUT, connected_rx).await {
            Ok(Ok(())) => {
                self.state = ConnectionState::Connected;
                self.state_notify.notify_waiters();
                info!("Connected to Deepgram streaming API");
                Ok(())
            }
            Ok(Err(_)) => {
                let msg = "Connection task ended before handshake completed".to_string();
                self.state = ConnectionState::Error(msg.clone());
                Err(STTError::ConnectionFailed(msg))
            }
            Err(_) => {
                let msg = format!(
                    "Connection timeout after {} seconds",
                    CONNECT_TIMEOUT.as_secs()
                );
                self.state = ConnectionState::Error(msg.clone());
                Err(STTError::ConnectionFailed(msg))
            }
        }
    }

    async fn disconnect(&mut self) -> Result<(), STTError> {
        info!("Disconnecting from Deepgram streaming API");

        // Signal the connection task to close the stream gracefully
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }

        if let Some(handle) = self.connection_handle.take() {
            match timeout(Duration::from_secs(5), handle).await {
                Ok(Ok(())) => debug!("Connection task shut down cleanly"),
                Ok(Err(e)) => warn!("Connection task panicked: {e}"),
                Err(_) => warn!("Connection task did not shut down within 5 seconds"),
            }
        }

        if let Some(handle) = self.fragment_receiver_handle.take() {
            handle.abort();
        }
        if let Some(handle) = self.error_receiver_handle.take() {
            handle.abort();
        }

        self.ws_sender = None;
        self.control_tx = None;

        *self.transcript_callback.lock().await = None;
        *self.error_callback.lock().await = None;

        self.is_connected.store(false, Ordering::Relaxed);
        self.state = ConnectionState::Disconnected;
        self.state_notify.notify_waiters();

        info!("Disconnected from Deepgram streaming API");
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.is_connected.load(Ordering::Relaxed)
    }

    async fn send_audio(&mut self, audio_data: Bytes) -> Result<(), STTError> {
        if !self.is_connected.load(Ordering::Relaxed) {
            return Err(STTError::ConnectionFailed(
                "Not connected to Deepgram".to_string(),
            ));
        }

        if audio_data.len() > MAX_AUDIO_CHUNK_SIZE {
            return Err(STTError::InvalidAudioFormat(format!(
                "Audio chunk too large: {} bytes (max {MAX_AUDIO_CHUNK_SIZE})",
                audio_data.len()
            )));
        }

        let sender = self.ws_sender.as_ref().ok_or_else(|| {
            STTError::ConnectionFailed("Audio channel not available".to_string())
        })?;

        sender
            .send(audio_data)
            .await
            .map_err(|e| STTError::NetworkError(format!("Failed to queue audio: {e}")))
    }

    async fn on_transcript(&mut self, callback: TranscriptCallback) -> Result<(), STTError> {
        *self.transcript_callback.lock().await = Some(callback);
        Ok(())
    }

    async fn on_error(&mut self, callback: STTErrorCallback) -> Result<(), STTError> {
        *self.error_callback.lock().await = Some(callback);
        Ok(())
    }

    fn get_config(&self) -> Option<&STTConfig> {
        self.config.as_ref().map(|c| &c.base)
    }

    fn get_provider_info(&self) -> &'static str {
        "Deepgram Streaming STT"
    }
}

impl Drop for DeepgramSTT {
    fn drop(&mut self) {
        // Best-effort shutdown if disconnect() was never called
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
    }
}
