//! Environment variable loading for server configuration
//!
//! Reads every supported variable, applies defaults for anything unset, and
//! reports parse failures with the offending variable name.

use std::path::PathBuf;

use super::{ServerConfig, TlsConfig};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_AGENT_BASE_URL: &str = "http://localhost:8100";
const DEFAULT_AGENT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_CAPTURE_SAMPLE_RATE: u32 = 16000;
const DEFAULT_SYNTHESIS_SAMPLE_RATE: u32 = 24000;
const DEFAULT_SESSION_IDLE_TIMEOUT_SECONDS: u64 = 300;
const DEFAULT_RATE_LIMIT_REQUESTS_PER_SECOND: u32 = 60;
const DEFAULT_RATE_LIMIT_BURST_SIZE: u32 = 10;
const DEFAULT_MAX_CONNECTIONS_PER_IP: u32 = 100;

/// Read an optional environment variable, treating empty strings as unset
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read and parse an environment variable, falling back to a default when unset
fn parsed_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    match optional_var(name) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| format!("Invalid value for {name}: {e}")),
        None => Ok(default),
    }
}

/// Read and parse an optional environment variable without a default
fn parsed_optional_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, String>
where
    T::Err: std::fmt::Display,
{
    match optional_var(name) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid value for {name}: {e}")),
        None => Ok(None),
    }
}

/// Parse a comma-separated provider list, e.g. "openai,elevenlabs"
fn provider_list_var(name: &str, default: &[&str]) -> Vec<String> {
    match optional_var(name) {
        Some(raw) => raw
            .split(',')
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect(),
        None => default.iter().map(|p| p.to_string()).collect(),
    }
}

/// TLS is enabled only when both the certificate and key paths are set
fn tls_from_env() -> Option<TlsConfig> {
    let cert_path = optional_var("TLS_CERT_PATH")?;
    let key_path = optional_var("TLS_KEY_PATH")?;
    Some(TlsConfig {
        cert_path: PathBuf::from(cert_path),
        key_path: PathBuf::from(key_path),
    })
}

/// Build a [`ServerConfig`] from environment variables and defaults
pub(super) fn config_from_env() -> Result<ServerConfig, Box<dyn std::error::Error>> {
    Ok(ServerConfig {
        host: optional_var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: parsed_var("PORT", DEFAULT_PORT)?,
        tls: tls_from_env(),
        deepgram_api_key: optional_var("DEEPGRAM_API_KEY"),
        openai_api_key: optional_var("OPENAI_API_KEY"),
        elevenlabs_api_key: optional_var("ELEVENLABS_API_KEY"),
        agent_base_url: optional_var("AGENT_BASE_URL")
            .unwrap_or_else(|| DEFAULT_AGENT_BASE_URL.to_string()),
        agent_timeout_seconds: parsed_var("AGENT_TIMEOUT_SECONDS", DEFAULT_AGENT_TIMEOUT_SECONDS)?,
        stt_providers: provider_list_var("STT_PROVIDERS", &["deepgram"]),
        tts_providers: provider_list_var("TTS_PROVIDERS", &["openai", "elevenlabs"]),
        capture_sample_rate: parsed_var("CAPTURE_SAMPLE_RATE", DEFAULT_CAPTURE_SAMPLE_RATE)?,
        synthesis_sample_rate: parsed_var("SYNTHESIS_SAMPLE_RATE", DEFAULT_SYNTHESIS_SAMPLE_RATE)?,
        session_idle_timeout_seconds: parsed_var(
            "SESSION_IDLE_TIMEOUT_SECONDS",
            DEFAULT_SESSION_IDLE_TIMEOUT_SECONDS,
        )?,
        cors_allowed_origins: optional_var("CORS_ALLOWED_ORIGINS"),
        rate_limit_requests_per_second: parsed_var(
            "RATE_LIMIT_REQUESTS_PER_SECOND",
            DEFAULT_RATE_LIMIT_REQUESTS_PER_SECOND,
        )?,
        rate_limit_burst_size: parsed_var("RATE_LIMIT_BURST_SIZE", DEFAULT_RATE_LIMIT_BURST_SIZE)?,
        max_websocket_connections: parsed_optional_var("MAX_WEBSOCKET_CONNECTIONS")?,
        max_connections_per_ip: parsed_var(
            "MAX_CONNECTIONS_PER_IP",
            DEFAULT_MAX_CONNECTIONS_PER_IP,
        )?,
    })
}
