//! HTTP boundary to the conversational agent backend.
//!
//! One request per turn: the finalized utterance goes out as JSON, the
//! agent's reply text comes back. No retry or backoff; a failed call fails
//! the turn and the session returns to idle.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Header carrying the session id so multi-instance agent deployments can
/// route follow-up turns to the same conversation.
pub const SESSION_ID_HEADER: &str = "X-Session-Id";

/// Errors surfaced by the agent boundary.
#[derive(Error, Debug)]
pub enum AgentError {
    /// The HTTP client could not be constructed
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Transport-level failure or timeout
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The agent answered with a non-success status
    #[error("Agent returned {status}: {body}")]
    BadStatus { status: u16, body: String },

    /// The agent answered 200 but the body did not parse
    #[error("Malformed reply body: {0}")]
    MalformedReply(String),
}

/// Request body for a voice message
#[derive(Debug, Serialize)]
struct VoiceMessageRequest<'a> {
    text: &'a str,
}

/// Agent reply body
#[derive(Debug, Deserialize)]
struct VoiceMessageResponse {
    text: String,
}

/// HTTP client for the conversational agent backend.
#[derive(Clone)]
pub struct AgentClient {
    client: reqwest::Client,
    endpoint: String,
}

impl AgentClient {
    /// Create a client for the given base URL.
    ///
    /// The voice message path is appended here so each call only fills in
    /// the body and routing header.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AgentError::InvalidConfiguration(format!("Failed to build HTTP client: {e}"))
            })?;

        let endpoint = format!("{}/voice/message", base_url.trim_end_matches('/'));

        Ok(Self { client, endpoint })
    }

    /// Send an utterance and return the agent's reply text.
    pub async fn send_message(&self, session_id: &str, text: &str) -> Result<String, AgentError> {
        debug!(session_id, chars = text.len(), "Dispatching utterance to agent");

        let response = self
            .client
            .post(&self.endpoint)
            .header(SESSION_ID_HEADER, session_id)
            .json(&VoiceMessageRequest { text })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AgentError::RequestFailed("request timed out".to_string())
                } else {
                    AgentError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        let reply: VoiceMessageResponse = response
            .json()
            .await
            .map_err(|e| AgentError::MalformedReply(e.to_string()))?;

        debug!(session_id, chars = reply.text.len(), "Agent reply received");
        Ok(reply.text)
    }

    /// Full URL messages are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
