//! Shared HTTP plumbing for request/response TTS providers.
//!
//! Each provider supplies a [`TTSRequestBuilder`] that knows its endpoint,
//! auth scheme, and body shape; [`TTSProvider`] owns the HTTP client and
//! turns provider responses into audio payloads or typed errors.

use std::time::Duration;

use bytes::Bytes;
use tracing::debug;

use super::base::{TTSConfig, TTSError, TTSResult};

/// HTTP timeout for a single synthesis call
const SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the provider-specific HTTP request for a synthesis call.
pub trait TTSRequestBuilder: Send + Sync {
    /// Build the HTTP request carrying `text`.
    fn build_http_request(&self, client: &reqwest::Client, text: &str) -> reqwest::RequestBuilder;

    /// Maximum characters the provider accepts in a single request.
    fn max_text_length(&self) -> usize;

    /// Get the configuration.
    fn get_config(&self) -> &TTSConfig;
}

/// Generic HTTP engine shared by synthesis providers.
pub struct TTSProvider {
    client: reqwest::Client,
}

impl TTSProvider {
    pub fn new() -> TTSResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(SYNTHESIS_TIMEOUT)
            .build()
            .map_err(|e| {
                TTSError::InvalidConfiguration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client })
    }

    /// Execute a synthesis request and return the audio payload.
    ///
    /// Text is validated against the builder's limit before any network
    /// traffic; an oversized reply fails only the provider whose limit it
    /// breaks.
    pub async fn synthesize(
        &self,
        builder: &dyn TTSRequestBuilder,
        provider: &'static str,
        text: &str,
    ) -> TTSResult<Bytes> {
        if text.is_empty() {
            return Err(TTSError::SynthesisFailed(format!(
                "{provider} requires non-empty synthesis text"
            )));
        }

        let text_chars = text.chars().count();
        let max_chars = builder.max_text_length();
        if text_chars > max_chars {
            return Err(TTSError::SynthesisFailed(format!(
                "Text length {text_chars} characters exceeds the {provider} limit of {max_chars}"
            )));
        }

        debug!(provider, chars = text_chars, "Dispatching synthesis request");

        let request = builder.build_http_request(&self.client, text);

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                TTSError::NetworkError(format!("{provider} synthesis request timed out"))
            } else {
                TTSError::NetworkError(format!("{provider} synthesis request failed: {e}"))
            }
        })?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(TTSError::AuthenticationFailed(format!(
                "{provider} rejected the API key ({status})"
            )));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TTSError::SynthesisFailed(format!(
                "{provider} returned {status}: {body}"
            )));
        }

        let audio = response.bytes().await.map_err(|e| {
            TTSError::NetworkError(format!("{provider} response body read failed: {e}"))
        })?;

        if audio.is_empty() {
            return Err(TTSError::SynthesisFailed(format!(
                "{provider} returned an empty audio payload"
            )));
        }

        debug!(provider, bytes = audio.len(), "Synthesis complete");
        Ok(audio)
    }
}
