//! Configuration module for the VoiceBridge server
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//! The configuration is split into logical submodules for maintainability and extensibility.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use voicebridge::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

mod env;
mod merge;
mod validation;
mod yaml;

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
///
/// Contains all configuration needed to run the VoiceBridge server, including:
/// - Server settings (host, port, TLS)
/// - Provider API keys (Deepgram, OpenAI, ElevenLabs)
/// - Agent endpoint settings
/// - Provider chain ordering for recognition and synthesis
/// - Audio settings (sample rates)
/// - Session lifecycle settings
/// - Security settings (CORS, rate limiting, connection limits)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    // Provider API keys
    /// Deepgram API key for streaming speech recognition
    pub deepgram_api_key: Option<String>,
    /// OpenAI API key for speech synthesis
    pub openai_api_key: Option<String>,
    /// ElevenLabs API key for speech synthesis fallback
    pub elevenlabs_api_key: Option<String>,

    // Agent endpoint
    /// Base URL of the conversational agent service
    /// Turn text is POSTed to `{agent_base_url}/voice/message`
    pub agent_base_url: String,
    /// Request timeout for agent calls, in seconds
    /// Default: 30
    pub agent_timeout_seconds: u64,

    // Provider chains
    /// Ordered recognition provider chain, first entry is tried first
    /// Default: ["deepgram"]
    pub stt_providers: Vec<String>,
    /// Ordered synthesis provider chain, first entry is tried first
    /// Default: ["openai", "elevenlabs"]
    pub tts_providers: Vec<String>,

    // Audio settings
    /// Sample rate expected on inbound capture audio (Hz)
    /// Default: 16000
    pub capture_sample_rate: u32,
    /// Sample rate requested for synthesized audio (Hz)
    /// Default: 24000
    pub synthesis_sample_rate: u32,

    // Session lifecycle
    /// Seconds of client inactivity before a session is torn down
    /// Default: 300
    pub session_idle_timeout_seconds: u64,

    // Security configuration
    /// CORS allowed origins (comma-separated list or "*" for all)
    /// Default: None (CORS disabled, same-origin only)
    pub cors_allowed_origins: Option<String>,

    // Rate limiting configuration
    /// Maximum requests per second per IP address
    /// Default: 60
    pub rate_limit_requests_per_second: u32,
    /// Maximum burst size for rate limiting
    /// Default: 10
    pub rate_limit_burst_size: u32,

    // Connection limits
    /// Maximum concurrent WebSocket connections
    /// Default: None (unlimited)
    pub max_websocket_connections: Option<usize>,
    /// Maximum connections per IP address
    /// Default: 100
    pub max_connections_per_ip: u32,
}

/// Implement Drop to zeroize all secret fields when ServerConfig is dropped.
/// This ensures sensitive data is cleared from memory immediately after use.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.deepgram_api_key {
            key.zeroize();
        }
        if let Some(ref mut key) = self.openai_api_key {
            key.zeroize();
        }
        if let Some(ref mut key) = self.elevenlabs_api_key {
            key.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable base
    ///
    /// Loads .env file (if present), then merges environment variables (with defaults),
    /// and finally applies YAML overrides. This allows .env and environment variables
    /// to provide base configuration while YAML can override specific values.
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// After loading and merging, performs validation on the final configuration.
    ///
    /// # Arguments
    /// * `path` - Path to the YAML configuration file
    ///
    /// # Returns
    /// * `Result<Self, Box<dyn std::error::Error>>` - The loaded configuration or an error
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    ///
    /// # Example
    /// ```rust,no_run
    /// use voicebridge::config::ServerConfig;
    /// use std::path::PathBuf;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config_path = PathBuf::from("config.yaml");
    /// let config = ServerConfig::from_file(&config_path)?;
    /// println!("Server listening on {}", config.address());
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        // The configuration priority is: YAML > Environment Variables (.env + actual ENV) > Defaults
        // Note: .env file is loaded in main.rs at application startup

        // Load YAML configuration
        let yaml_config = yaml::YamlConfig::from_file(path)?;

        // Merge environment variables (base) with YAML overrides
        let config = merge::merge_config(Some(yaml_config))?;

        // Validate configuration
        validation::validate_provider_chains(&config.stt_providers, &config.tts_providers)?;
        validation::validate_agent_base_url(&config.agent_base_url)?;
        validation::validate_sample_rates(config.capture_sample_rate, config.synthesis_sample_rate)?;
        validation::validate_tls(&config.tls)?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    ///
    /// Uses the same merge and validation path as [`from_file`](Self::from_file)
    /// but without a YAML layer. Missing values fall back to defaults.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = merge::merge_config(None)?;

        validation::validate_provider_chains(&config.stt_providers, &config.tts_providers)?;
        validation::validate_agent_base_url(&config.agent_base_url)?;
        validation::validate_sample_rates(config.capture_sample_rate, config.synthesis_sample_rate)?;
        validation::validate_tls(&config.tls)?;

        Ok(config)
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    ///
    /// # Example
    /// ```rust,no_run
    /// use voicebridge::config::ServerConfig;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = ServerConfig::from_env()?;
    /// println!("Listening on {}", config.address());
    /// # Ok(())
    /// # }
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    ///
    /// Returns true if TLS configuration is present
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Get API key for a specific provider
    ///
    /// # Arguments
    /// * `provider` - The name of the provider (e.g., "deepgram", "openai", "elevenlabs")
    ///
    /// # Returns
    /// * `Result<String, String>` - The API key on success, or an error message on failure
    ///
    /// # Example
    /// ```rust,no_run
    /// use voicebridge::config::ServerConfig;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = ServerConfig::from_env()?;
    /// let api_key = config.get_api_key("deepgram")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn get_api_key(&self, provider: &str) -> Result<String, String> {
        match provider.to_lowercase().as_str() {
            "deepgram" => {
                self.deepgram_api_key.as_ref().cloned().ok_or_else(|| {
                    "Deepgram API key not configured in server environment".to_string()
                })
            }
            "openai" => self.openai_api_key.as_ref().cloned().ok_or_else(|| {
                "OpenAI API key not configured in server environment".to_string()
            }),
            "elevenlabs" => self.elevenlabs_api_key.as_ref().cloned().ok_or_else(|| {
                "ElevenLabs API key not configured in server environment".to_string()
            }),
            _ => Err(format!("Unsupported provider: {provider}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::fs;
    use tempfile::TempDir;

    /// Helper function to create a test ServerConfig with defaults
    fn test_config() -> ServerConfig {
        ServerConfig {
            host: "localhost".to_string(),
            port: 8080,
            tls: None,
            deepgram_api_key: None,
            openai_api_key: None,
            elevenlabs_api_key: None,
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
            max_websocket_connections: None,
            max_connections_per_ip: 100,
        }
    }

    #[test]
    fn test_get_api_key_deepgram_success() {
        let mut config = test_config();
        config.deepgram_api_key = Some("test-deepgram-key".to_string());

        let result = config.get_api_key("deepgram");
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "test-deepgram-key");
    }

    #[test]
    fn test_get_api_key_openai_success() {
        let mut config = test_config();
        config.openai_api_key = Some("test-openai-key".to_string());

        let result = config.get_api_key("openai");
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "test-openai-key");
    }

    #[test]
    fn test_get_api_key_elevenlabs_success() {
        let mut config = test_config();
        config.elevenlabs_api_key = Some("test-elevenlabs-key".to_string());

        let result = config.get_api_key("elevenlabs");
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "test-elevenlabs-key");
    }

    #[test]
    fn test_get_api_key_deepgram_missing() {
        let config = test_config();

        let result = config.get_api_key("deepgram");
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err(),
            "Deepgram API key not configured in server environment"
        );
    }

    #[test]
    fn test_get_api_key_unsupported_provider() {
        let config = test_config();

        let result = config.get_api_key("whisper-local");
        assert!(result.is_err());
        assert_eq!(result.unwrap_err(), "Unsupported provider: whisper-local");
    }

    #[test]
    fn test_get_api_key_case_insensitive() {
        let mut config = test_config();
        config.deepgram_api_key = Some("test-key".to_string());

        assert!(config.get_api_key("Deepgram").is_ok());
        assert!(config.get_api_key("DEEPGRAM").is_ok());
        assert!(config.get_api_key("deepgram").is_ok());
    }

    #[test]
    fn test_address() {
        let mut config = test_config();
        config.host = "0.0.0.0".to_string();
        config.port = 9090;

        assert_eq!(config.address(), "0.0.0.0:9090");
    }

    #[test]
    fn test_is_tls_enabled() {
        let mut config = test_config();
        assert!(!config.is_tls_enabled());

        config.tls = Some(TlsConfig {
            cert_path: PathBuf::from("/path/to/cert.pem"),
            key_path: PathBuf::from("/path/to/key.pem"),
        });
        assert!(config.is_tls_enabled());
    }

    // Helper to clean up environment variables
    fn cleanup_env_vars() {
        unsafe {
            env::remove_var("HOST");
            env::remove_var("PORT");
            env::remove_var("TLS_CERT_PATH");
            env::remove_var("TLS_KEY_PATH");
            env::remove_var("DEEPGRAM_API_KEY");
            env::remove_var("OPENAI_API_KEY");
            env::remove_var("ELEVENLABS_API_KEY");
            env::remove_var("AGENT_BASE_URL");
            env::remove_var("AGENT_TIMEOUT_SECONDS");
            env::remove_var("STT_PROVIDERS");
            env::remove_var("TTS_PROVIDERS");
            env::remove_var("CAPTURE_SAMPLE_RATE");
            env::remove_var("SYNTHESIS_SAMPLE_RATE");
            env::remove_var("SESSION_IDLE_TIMEOUT_SECONDS");
            env::remove_var("CORS_ALLOWED_ORIGINS");
            env::remove_var("RATE_LIMIT_REQUESTS_PER_SECOND");
            env::remove_var("RATE_LIMIT_BURST_SIZE");
            env::remove_var("MAX_WEBSOCKET_CONNECTIONS");
            env::remove_var("MAX_CONNECTIONS_PER_IP");
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        cleanup_env_vars();

        let config = ServerConfig::from_env().unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert!(config.tls.is_none());
        assert!(config.deepgram_api_key.is_none());
        assert_eq!(config.agent_base_url, "http://localhost:8100");
        assert_eq!(config.agent_timeout_seconds, 30);
        assert_eq!(config.stt_providers, vec!["deepgram".to_string()]);
        assert_eq!(
            config.tts_providers,
            vec!["openai".to_string(), "elevenlabs".to_string()]
        );
        assert_eq!(config.capture_sample_rate, 16000);
        assert_eq!(config.synthesis_sample_rate, 24000);
        assert_eq!(config.session_idle_timeout_seconds, 300);
        assert_eq!(config.rate_limit_requests_per_second, 60);
        assert_eq!(config.rate_limit_burst_size, 10);
        assert!(config.max_websocket_connections.is_none());
        assert_eq!(config.max_connections_per_ip, 100);
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        cleanup_env_vars();
        unsafe {
            env::set_var("HOST", "127.0.0.1");
            env::set_var("PORT", "9000");
            env::set_var("DEEPGRAM_API_KEY", "env-dg-key");
            env::set_var("TTS_PROVIDERS", "elevenlabs,openai");
            env::set_var("SESSION_IDLE_TIMEOUT_SECONDS", "120");
        }

        let config = ServerConfig::from_env().unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
        assert_eq!(config.deepgram_api_key, Some("env-dg-key".to_string()));
        assert_eq!(
            config.tts_providers,
            vec!["elevenlabs".to_string(), "openai".to_string()]
        );
        assert_eq!(config.session_idle_timeout_seconds, 120);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_port() {
        cleanup_env_vars();
        unsafe {
            env::set_var("PORT", "not-a-port");
        }

        let result = ServerConfig::from_env();
        assert!(result.is_err());

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_yaml_only() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let yaml_content = r#"
server:
  host: "10.0.0.5"
  port: 3100

providers:
  deepgram_api_key: "yaml-dg-key"
  openai_api_key: "yaml-oai-key"

agent:
  base_url: "http://agent.internal:8100"
  timeout_seconds: 15

pipeline:
  tts_providers:
    - "elevenlabs"
"#;

        fs::write(&config_path, yaml_content).unwrap();

        let config = ServerConfig::from_file(&config_path).unwrap();

        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.port, 3100);
        assert_eq!(config.deepgram_api_key, Some("yaml-dg-key".to_string()));
        assert_eq!(config.openai_api_key, Some("yaml-oai-key".to_string()));
        assert_eq!(config.agent_base_url, "http://agent.internal:8100");
        assert_eq!(config.agent_timeout_seconds, 15);
        assert_eq!(config.tts_providers, vec!["elevenlabs".to_string()]);
        // Unspecified sections keep their defaults
        assert_eq!(config.stt_providers, vec!["deepgram".to_string()]);
        assert_eq!(config.capture_sample_rate, 16000);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_yaml_overrides_env() {
        cleanup_env_vars();
        unsafe {
            env::set_var("HOST", "0.0.0.0");
            env::set_var("DEEPGRAM_API_KEY", "env-key");
        }

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let yaml_content = r#"
server:
  host: "192.168.1.10"

providers:
  deepgram_api_key: "yaml-key"
"#;

        fs::write(&config_path, yaml_content).unwrap();

        let config = ServerConfig::from_file(&config_path).unwrap();

        // YAML wins over environment
        assert_eq!(config.host, "192.168.1.10");
        assert_eq!(config.deepgram_api_key, Some("yaml-key".to_string()));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_missing_file() {
        cleanup_env_vars();

        let path = PathBuf::from("/nonexistent/voicebridge.yaml");
        let result = ServerConfig::from_file(&path);

        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_from_file_rejects_unknown_provider() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let yaml_content = r#"
pipeline:
  stt_providers:
    - "whisper-local"
"#;

        fs::write(&config_path, yaml_content).unwrap();

        let result = ServerConfig::from_file(&config_path);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Unsupported recognition provider")
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_rejects_empty_tts_chain() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let yaml_content = r#"
pipeline:
  tts_providers: []
"#;

        fs::write(&config_path, yaml_content).unwrap();

        let result = ServerConfig::from_file(&config_path);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("synthesis provider chain")
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_rejects_invalid_agent_url() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let yaml_content = r#"
agent:
  base_url: "not a url"
"#;

        fs::write(&config_path, yaml_content).unwrap();

        let result = ServerConfig::from_file(&config_path);
        assert!(result.is_err());

        cleanup_env_vars();
    }
}
