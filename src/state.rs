//! Shared application state
//!
//! [`AppState`] is built once at startup from the validated [`ServerConfig`]
//! and shared across all connections behind an `Arc`. It owns the agent HTTP
//! client, the provider fallback chains, the live session registry, and the
//! WebSocket connection counters enforced by the connection-limit middleware.

use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::info;

use crate::config::ServerConfig;
use crate::core::agent::AgentClient;
use crate::core::fallback::FallbackChain;
use crate::core::stt::STTConfig;
use crate::core::tts::{TTSConfig, TextToSpeech, create_tts_provider};
use crate::errors::VoiceError;

/// Registry entry for one live voice session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    /// When the WebSocket upgrade completed.
    pub connected_at: Instant,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self {
            connected_at: Instant::now(),
        }
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Reason a WebSocket connection slot could not be acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionLimitError {
    /// The server-wide `max_websocket_connections` cap is full.
    GlobalLimitReached,
    /// This client IP already holds `max_connections_per_ip` connections.
    PerIpLimitReached,
}

/// Application state shared by every handler and middleware layer.
pub struct AppState {
    /// Validated server configuration.
    pub config: ServerConfig,

    /// HTTP client for the conversational agent backend.
    pub agent: AgentClient,

    /// Speech recognition provider chain, in configured fallback order.
    /// Bridges are created per session from these configs.
    pub stt_chain: FallbackChain<STTConfig>,

    /// Synthesis provider chain, in configured fallback order. Providers are
    /// stateless HTTP clients and shared across sessions.
    pub tts_chain: FallbackChain<Arc<dyn TextToSpeech>>,

    /// Live sessions keyed by session ID.
    pub sessions: DashMap<String, SessionHandle>,

    /// When the server started, for health reporting.
    started_at: Instant,

    /// Total open WebSocket connections.
    ws_connections: AtomicUsize,

    /// Open WebSocket connections per client IP.
    ip_connections: DashMap<IpAddr, usize>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    /// Build the shared state from a validated configuration.
    ///
    /// Synthesis providers are constructed eagerly so that a missing API key
    /// or unsupported provider name fails startup instead of the first turn.
    /// Recognition providers connect per session, so only their configs are
    /// materialized here.
    pub fn new(config: ServerConfig) -> Result<Arc<Self>, VoiceError> {
        let agent = AgentClient::new(
            &config.agent_base_url,
            Duration::from_secs(config.agent_timeout_seconds),
        )
        .map_err(|e| VoiceError::provider("agent", e))?;

        let mut stt_configs = Vec::with_capacity(config.stt_providers.len());
        for provider in &config.stt_providers {
            let api_key = config
                .get_api_key(provider)
                .map_err(|e| VoiceError::provider(provider.clone(), e))?;

            stt_configs.push(STTConfig {
                provider: provider.clone(),
                api_key,
                sample_rate: config.capture_sample_rate,
                ..STTConfig::default()
            });
        }

        let stt_chain = FallbackChain::from_providers("stt", stt_configs)
            .ok_or_else(|| VoiceError::Connection("No STT providers configured".to_string()))?;

        let mut tts_providers: Vec<Arc<dyn TextToSpeech>> =
            Vec::with_capacity(config.tts_providers.len());
        for provider in &config.tts_providers {
            let api_key = config
                .get_api_key(provider)
                .map_err(|e| VoiceError::provider(provider.clone(), e))?;

            let tts_config = TTSConfig {
                provider: provider.clone(),
                api_key,
                sample_rate: Some(config.synthesis_sample_rate),
                ..TTSConfig::default()
            };

            let instance = create_tts_provider(provider, tts_config)
                .map_err(|e| VoiceError::provider(provider.clone(), e))?;
            tts_providers.push(Arc::from(instance));
        }

        let tts_chain = FallbackChain::from_providers("tts", tts_providers)
            .ok_or_else(|| VoiceError::Connection("No TTS providers configured".to_string()))?;

        info!(
            stt_providers = ?config.stt_providers,
            tts_providers = ?config.tts_providers,
            agent = %agent.endpoint(),
            "Provider chains initialized"
        );

        Ok(Arc::new(Self {
            config,
            agent,
            stt_chain,
            tts_chain,
            sessions: DashMap::new(),
            started_at: Instant::now(),
            ws_connections: AtomicUsize::new(0),
            ip_connections: DashMap::new(),
        }))
    }

    /// Number of currently registered voice sessions.
    pub fn active_session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Seconds since the state was constructed.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Try to reserve a WebSocket connection slot for `ip`.
    ///
    /// The global count is raised with a compare-and-swap so the cap is never
    /// exceeded; a per-IP rejection rolls the global count back.
    pub fn try_acquire_connection(&self, ip: IpAddr) -> Result<(), ConnectionLimitError> {
        let acquired =
            self.ws_connections
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                    match self.config.max_websocket_connections {
                        Some(limit) if count >= limit => None,
                        _ => Some(count + 1),
                    }
                });

        if acquired.is_err() {
            return Err(ConnectionLimitError::GlobalLimitReached);
        }

        let mut per_ip = self.ip_connections.entry(ip).or_insert(0);
        if *per_ip >= self.config.max_connections_per_ip as usize {
            drop(per_ip);
            self.ws_connections.fetch_sub(1, Ordering::AcqRel);
            return Err(ConnectionLimitError::PerIpLimitReached);
        }
        *per_ip += 1;

        Ok(())
    }

    /// Release a previously acquired connection slot for `ip`.
    pub fn release_connection(&self, ip: IpAddr) {
        let drained = match self.ip_connections.get_mut(&ip) {
            Some(mut count) => {
                *count = count.saturating_sub(1);
                *count == 0
            }
            None => false,
        };
        if drained {
            self.ip_connections.remove_if(&ip, |_, count| *count == 0);
        }

        let _ = self
            .ws_connections
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                Some(count.saturating_sub(1))
            });
    }

    /// Total open WebSocket connections.
    pub fn ws_connection_count(&self) -> usize {
        self.ws_connections.load(Ordering::Acquire)
    }

    /// Open WebSocket connections for one client IP.
    pub fn ip_connection_count(&self, ip: &IpAddr) -> usize {
        self.ip_connections.get(ip).map(|count| *count).unwrap_or(0)
    }
}
