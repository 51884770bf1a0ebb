//! Connection limit middleware for voice WebSocket connections
//!
//! Enforces two caps before a WebSocket upgrade is allowed to proceed:
//! - a server-wide maximum on concurrent WebSocket connections
//! - a per-client-IP maximum
//!
//! # Example
//!
//! ```ignore
//! use axum::Router;
//! use voicebridge::middleware::connection_limit_middleware;
//!
//! let app = Router::new()
//!     .route("/voice", get(voice_handler))
//!     .layer(axum::middleware::from_fn_with_state(
//!         state.clone(),
//!         connection_limit_middleware,
//!     ));
//! ```

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::state::{AppState, ConnectionLimitError};

/// Extension type carrying the client IP through to the handler so the
/// handler can release the acquired slot at session teardown.
#[derive(Clone, Debug)]
pub struct ClientIp(pub IpAddr);

/// Middleware that enforces connection limits for WebSocket upgrades.
///
/// Only requests carrying an `Upgrade: websocket` header are counted;
/// everything else passes through untouched. A request over the global cap
/// is rejected with 503 Service Unavailable, one over the per-IP cap with
/// 429 Too Many Requests. On success a [`ClientIp`] extension is injected
/// and the slot stays held until the session releases it.
pub async fn connection_limit_middleware(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let is_ws_upgrade = request
        .headers()
        .get("upgrade")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("websocket"))
        .unwrap_or(false);

    if !is_ws_upgrade {
        return next.run(request).await;
    }

    let client_ip = addr.ip();

    match state.try_acquire_connection(client_ip) {
        Ok(()) => {
            request.extensions_mut().insert(ClientIp(client_ip));
            next.run(request).await
        }
        Err(ConnectionLimitError::GlobalLimitReached) => {
            tracing::warn!(
                ip = %client_ip,
                "Rejecting connection: global limit reached"
            );
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Server at capacity. Please try again later.",
            )
                .into_response()
        }
        Err(ConnectionLimitError::PerIpLimitReached) => {
            tracing::warn!(
                ip = %client_ip,
                "Rejecting connection: per-IP limit reached"
            );
            (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many connections from your IP address.",
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    use crate::config::ServerConfig;

    fn test_config(global: Option<usize>, per_ip: u32) -> ServerConfig {
        ServerConfig {
            host: "localhost".to_string(),
            port: 3001,
            tls: None,
            deepgram_api_key: Some("test-deepgram-key".to_string()),
            openai_api_key: Some("test-openai-key".to_string()),
            elevenlabs_api_key: Some("test-elevenlabs-key".to_string()),
            agent_base_url: "http://localhost:8100".to_string(),
            agent_timeout_seconds: 30,
            stt_providers: vec!["deepgram".to_string()],
            tts_providers: vec!["openai".to_string(), "elevenlabs".to_string()],
            capture_sample_rate: 16000,
            synthesis_sample_rate: 24000,
            session_idle_timeout_seconds: 300,
            cors_allowed_origins: None,
            rate_limit_requests_per_second: 60,
            rate_limit_burst_size: 10,
            max_websocket_connections: global,
            max_connections_per_ip: per_ip,
        }
    }

    #[test]
    fn test_connection_limit_error_debug() {
        let global = ConnectionLimitError::GlobalLimitReached;
        let per_ip = ConnectionLimitError::PerIpLimitReached;

        assert_eq!(format!("{:?}", global), "GlobalLimitReached");
        assert_eq!(format!("{:?}", per_ip), "PerIpLimitReached");
    }

    #[test]
    fn test_connection_tracking_basic() {
        let state = AppState::new(test_config(Some(10), 3)).unwrap();
        let ip: IpAddr = Ipv4Addr::new(192, 168, 1, 100).into();

        // Should start with 0 connections
        assert_eq!(state.ws_connection_count(), 0);
        assert_eq!(state.ip_connection_count(&ip), 0);

        // Fill the per-IP allowance
        for expected in 1..=3 {
            assert!(state.try_acquire_connection(ip).is_ok());
            assert_eq!(state.ws_connection_count(), expected);
            assert_eq!(state.ip_connection_count(&ip), expected);
        }

        // Fourth connection should be rejected (per-IP limit)
        assert_eq!(
            state.try_acquire_connection(ip),
            Err(ConnectionLimitError::PerIpLimitReached)
        );

        // Release one connection
        state.release_connection(ip);
        assert_eq!(state.ws_connection_count(), 2);
        assert_eq!(state.ip_connection_count(&ip), 2);

        // Should be able to acquire again
        assert!(state.try_acquire_connection(ip).is_ok());
        assert_eq!(state.ws_connection_count(), 3);
    }

    #[test]
    fn test_global_connection_limit() {
        // Global limit of 5, per-IP limit higher than global
        let state = AppState::new(test_config(Some(5), 10)).unwrap();

        // Use different IPs to avoid the per-IP limit
        let ips: Vec<IpAddr> = (1..=6)
            .map(|i| Ipv4Addr::new(192, 168, 1, i).into())
            .collect();

        for ip in &ips[0..5] {
            assert!(state.try_acquire_connection(*ip).is_ok());
        }
        assert_eq!(state.ws_connection_count(), 5);

        // Sixth connection should be rejected (global limit)
        assert_eq!(
            state.try_acquire_connection(ips[5]),
            Err(ConnectionLimitError::GlobalLimitReached)
        );

        // Releasing frees a slot for any IP
        state.release_connection(ips[0]);
        assert!(state.try_acquire_connection(ips[5]).is_ok());
        assert_eq!(state.ws_connection_count(), 5);
    }

    #[test]
    fn test_unlimited_global_connections() {
        let state = AppState::new(test_config(None, 2)).unwrap();

        // No global cap: connections from distinct IPs keep succeeding
        for i in 1..=20 {
            let ip: IpAddr = Ipv4Addr::new(10, 0, 0, i).into();
            assert!(state.try_acquire_connection(ip).is_ok());
        }
        assert_eq!(state.ws_connection_count(), 20);
    }
}
