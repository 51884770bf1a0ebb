use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// This structure represents the full configuration that can be loaded from a YAML file.
/// All fields are optional to allow partial configuration. Environment variables can
/// provide any values not specified here.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 8080
///
/// providers:
///   deepgram_api_key: "your-deepgram-key"
///   openai_api_key: "your-openai-key"
///   elevenlabs_api_key: "your-elevenlabs-key"
///
/// agent:
///   base_url: "http://localhost:8100"
///   timeout_seconds: 30
///
/// pipeline:
///   stt_providers:
///     - "deepgram"
///   tts_providers:
///     - "openai"
///     - "elevenlabs"
///
/// audio:
///   capture_sample_rate: 16000
///   synthesis_sample_rate: 24000
///
/// session:
///   idle_timeout_seconds: 300
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub providers: Option<ProvidersYaml>,
    pub agent: Option<AgentYaml>,
    pub pipeline: Option<PipelineYaml>,
    pub audio: Option<AudioYaml>,
    pub session: Option<SessionYaml>,
    pub security: Option<SecurityYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls: Option<TlsYaml>,
}

/// TLS configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TlsYaml {
    pub enabled: Option<bool>,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

/// Provider API keys from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersYaml {
    /// Deepgram API key for streaming STT
    pub deepgram_api_key: Option<String>,
    /// OpenAI API key for TTS
    pub openai_api_key: Option<String>,
    /// ElevenLabs API key for TTS fallback
    pub elevenlabs_api_key: Option<String>,
}

/// Agent endpoint configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AgentYaml {
    /// Base URL of the conversational agent service
    pub base_url: Option<String>,
    /// Request timeout for agent calls, in seconds
    pub timeout_seconds: Option<u64>,
}

/// Provider chain configuration from YAML
///
/// # Example YAML structure
/// ```yaml
/// pipeline:
///   stt_providers:
///     - "deepgram"
///   tts_providers:
///     - "openai"
///     - "elevenlabs"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PipelineYaml {
    /// Ordered recognition provider chain (first entry is tried first)
    pub stt_providers: Option<Vec<String>>,
    /// Ordered synthesis provider chain (first entry is tried first)
    pub tts_providers: Option<Vec<String>>,
}

/// Audio configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AudioYaml {
    /// Sample rate expected on inbound capture audio (Hz)
    pub capture_sample_rate: Option<u32>,
    /// Sample rate requested for synthesized audio (Hz)
    pub synthesis_sample_rate: Option<u32>,
}

/// Session lifecycle configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SessionYaml {
    /// Seconds of client inactivity before a session is torn down
    pub idle_timeout_seconds: Option<u64>,
}

/// Security configuration from YAML
///
/// # Example YAML structure
/// ```yaml
/// security:
///   cors_allowed_origins: "https://example.com,https://app.example.com"
///   rate_limit_requests_per_second: 60
///   rate_limit_burst_size: 10
///   max_websocket_connections: 1000
///   max_connections_per_ip: 100
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    /// CORS allowed origins (comma-separated list or "*" for all)
    pub cors_allowed_origins: Option<String>,
    /// Maximum requests per second per IP address
    pub rate_limit_requests_per_second: Option<u32>,
    /// Maximum burst size for rate limiting
    pub rate_limit_burst_size: Option<u32>,
    /// Maximum concurrent WebSocket connections
    pub max_websocket_connections: Option<usize>,
    /// Maximum connections per IP address
    pub max_connections_per_ip: Option<u32>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Arguments
    /// * `path` - Path to the YAML configuration file
    ///
    /// # Returns
    /// * `Result<YamlConfig, Box<dyn std::error::Error>>` - The loaded configuration or an error
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Required fields have invalid types
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_yaml_config_full() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 8080
  tls:
    enabled: true
    cert_path: "/path/to/cert.pem"
    key_path: "/path/to/key.pem"

providers:
  deepgram_api_key: "dg-key"
  openai_api_key: "oai-key"
  elevenlabs_api_key: "el-key"

agent:
  base_url: "http://agent.internal:8100"
  timeout_seconds: 15

pipeline:
  stt_providers:
    - "deepgram"
  tts_providers:
    - "openai"
    - "elevenlabs"

audio:
  capture_sample_rate: 16000
  synthesis_sample_rate: 24000

session:
  idle_timeout_seconds: 120

security:
  cors_allowed_origins: "*"
  rate_limit_requests_per_second: 30
  max_connections_per_ip: 50
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(
            config.server.as_ref().unwrap().host,
            Some("127.0.0.1".to_string())
        );
        assert_eq!(config.server.as_ref().unwrap().port, Some(8080));
        let tls = config.server.as_ref().unwrap().tls.as_ref().unwrap();
        assert_eq!(tls.enabled, Some(true));
        assert_eq!(tls.cert_path, Some("/path/to/cert.pem".to_string()));
        assert_eq!(
            config.providers.as_ref().unwrap().deepgram_api_key,
            Some("dg-key".to_string())
        );
        assert_eq!(
            config.providers.as_ref().unwrap().elevenlabs_api_key,
            Some("el-key".to_string())
        );
        assert_eq!(
            config.agent.as_ref().unwrap().base_url,
            Some("http://agent.internal:8100".to_string())
        );
        assert_eq!(config.agent.as_ref().unwrap().timeout_seconds, Some(15));
        let pipeline = config.pipeline.as_ref().unwrap();
        assert_eq!(pipeline.stt_providers, Some(vec!["deepgram".to_string()]));
        assert_eq!(
            pipeline.tts_providers,
            Some(vec!["openai".to_string(), "elevenlabs".to_string()])
        );
        assert_eq!(
            config.audio.as_ref().unwrap().capture_sample_rate,
            Some(16000)
        );
        assert_eq!(
            config.session.as_ref().unwrap().idle_timeout_seconds,
            Some(120)
        );
        let security = config.security.as_ref().unwrap();
        assert_eq!(security.cors_allowed_origins, Some("*".to_string()));
        assert_eq!(security.rate_limit_requests_per_second, Some(30));
        assert_eq!(security.max_connections_per_ip, Some(50));
    }

    #[test]
    fn test_yaml_config_partial() {
        let yaml = r#"
server:
  port: 9000

session:
  idle_timeout_seconds: 60
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();

        assert!(config.server.as_ref().unwrap().host.is_none());
        assert_eq!(config.server.as_ref().unwrap().port, Some(9000));
        assert!(config.providers.is_none());
        assert!(config.agent.is_none());
        assert_eq!(
            config.session.as_ref().unwrap().idle_timeout_seconds,
            Some(60)
        );
    }

    #[test]
    fn test_yaml_config_empty() {
        let yaml = "";

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();

        assert!(config.server.is_none());
        assert!(config.providers.is_none());
        assert!(config.agent.is_none());
        assert!(config.pipeline.is_none());
        assert!(config.audio.is_none());
        assert!(config.session.is_none());
        assert!(config.security.is_none());
    }

    #[test]
    fn test_yaml_config_empty_provider_lists() {
        let yaml = r#"
pipeline:
  stt_providers: []
  tts_providers: []
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();

        let pipeline = config.pipeline.as_ref().unwrap();
        assert_eq!(pipeline.stt_providers, Some(Vec::new()));
        assert_eq!(pipeline.tts_providers, Some(Vec::new()));
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let yaml_content = r#"
server:
  host: "localhost"
  port: 3000
"#;

        fs::write(&config_path, yaml_content).unwrap();

        let config = YamlConfig::from_file(&config_path).unwrap();

        assert_eq!(
            config.server.as_ref().unwrap().host,
            Some("localhost".to_string())
        );
        assert_eq!(config.server.as_ref().unwrap().port, Some(3000));
    }

    #[test]
    fn test_from_file_not_found() {
        let path = PathBuf::from("/nonexistent/config.yaml");
        let result = YamlConfig::from_file(&path);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }

    #[test]
    fn test_from_file_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("invalid.yaml");

        fs::write(&config_path, "invalid: yaml: content:").unwrap();

        let result = YamlConfig::from_file(&config_path);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse YAML")
        );
    }
}
