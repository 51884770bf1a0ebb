//! Health check endpoint

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub active_sessions: usize,
    pub uptime_seconds: u64,
}

/// Health check endpoint
///
/// Reports service liveness plus the number of active voice sessions.
///
/// # Endpoint
/// `GET /`
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        active_sessions: state.active_session_count(),
        uptime_seconds: state.uptime_seconds(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy",
            service: "voicebridge",
            version: "0.4.0",
            active_sessions: 2,
            uptime_seconds: 120,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["active_sessions"], 2);
        assert_eq!(json["uptime_seconds"], 120);
    }
}
