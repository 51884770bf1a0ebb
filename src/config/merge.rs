//! Merging of YAML configuration over the environment variable base
//!
//! The environment (plus defaults) always produces a complete [`ServerConfig`].
//! YAML values, when present, override individual fields of that base.

use std::path::PathBuf;

use super::yaml::YamlConfig;
use super::{ServerConfig, TlsConfig, env};

/// Build the final configuration from the environment base and optional YAML overrides
pub(super) fn merge_config(
    yaml: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = env::config_from_env()?;

    if let Some(yaml) = yaml {
        apply_yaml(&mut config, yaml);
    }

    Ok(config)
}

fn apply_yaml(config: &mut ServerConfig, yaml: YamlConfig) {
    if let Some(server) = yaml.server {
        if let Some(host) = server.host {
            config.host = host;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
        if let Some(tls) = server.tls {
            // An explicit `enabled: false` turns TLS off even when the
            // environment supplied certificate paths
            if tls.enabled == Some(false) {
                config.tls = None;
            } else if let (Some(cert), Some(key)) = (tls.cert_path, tls.key_path) {
                config.tls = Some(TlsConfig {
                    cert_path: PathBuf::from(cert),
                    key_path: PathBuf::from(key),
                });
            }
        }
    }

    if let Some(providers) = yaml.providers {
        if let Some(key) = providers.deepgram_api_key {
            config.deepgram_api_key = Some(key);
        }
        if let Some(key) = providers.openai_api_key {
            config.openai_api_key = Some(key);
        }
        if let Some(key) = providers.elevenlabs_api_key {
            config.elevenlabs_api_key = Some(key);
        }
    }

    if let Some(agent) = yaml.agent {
        if let Some(base_url) = agent.base_url {
            config.agent_base_url = base_url;
        }
        if let Some(timeout) = agent.timeout_seconds {
            config.agent_timeout_seconds = timeout;
        }
    }

    if let Some(pipeline) = yaml.pipeline {
        if let Some(stt) = pipeline.stt_providers {
            config.stt_providers = stt.iter().map(|p| p.to_lowercase()).collect();
        }
        if let Some(tts) = pipeline.tts_providers {
            config.tts_providers = tts.iter().map(|p| p.to_lowercase()).collect();
        }
    }

    if let Some(audio) = yaml.audio {
        if let Some(rate) = audio.capture_sample_rate {
            config.capture_sample_rate = rate;
        }
        if let Some(rate) = audio.synthesis_sample_rate {
            config.synthesis_sample_rate = rate;
        }
    }

    if let Some(session) = yaml.session {
        if let Some(timeout) = session.idle_timeout_seconds {
            config.session_idle_timeout_seconds = timeout;
        }
    }

    if let Some(security) = yaml.security {
        if let Some(origins) = security.cors_allowed_origins {
            config.cors_allowed_origins = Some(origins);
        }
        if let Some(rps) = security.rate_limit_requests_per_second {
            config.rate_limit_requests_per_second = rps;
        }
        if let Some(burst) = security.rate_limit_burst_size {
            config.rate_limit_burst_size = burst;
        }
        if let Some(max) = security.max_websocket_connections {
            config.max_websocket_connections = Some(max);
        }
        if let Some(per_ip) = security.max_connections_per_ip {
            config.max_connections_per_ip = per_ip;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn base_config() -> ServerConfig {
        ServerConfig {
            host: "0.0.0.0".to_string(),
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
    fn test_apply_yaml_overrides_fields() {
        let yaml: YamlConfig = serde_yaml::from_str(
            r#"
server:
  host: "127.0.0.1"
  port: 4000

providers:
  elevenlabs_api_key: "el-key"

pipeline:
  tts_providers:
    - "ElevenLabs"

security:
  max_websocket_connections: 256
"#,
        )
        .unwrap();

        let mut config = base_config();
        apply_yaml(&mut config, yaml);

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 4000);
        assert_eq!(config.elevenlabs_api_key, Some("el-key".to_string()));
        // Provider names are normalized to lowercase
        assert_eq!(config.tts_providers, vec!["elevenlabs".to_string()]);
        assert_eq!(config.max_websocket_connections, Some(256));
        // Untouched fields keep their base values
        assert_eq!(config.agent_base_url, "http://localhost:8100");
        assert_eq!(config.stt_providers, vec!["deepgram".to_string()]);
    }

    #[test]
    fn test_apply_yaml_tls_disabled_clears_env_tls() {
        let yaml: YamlConfig = serde_yaml::from_str(
            r#"
server:
  tls:
    enabled: false
"#,
        )
        .unwrap();

        let mut config = base_config();
        config.tls = Some(TlsConfig {
            cert_path: PathBuf::from("/env/cert.pem"),
            key_path: PathBuf::from("/env/key.pem"),
        });

        apply_yaml(&mut config, yaml);
        assert!(config.tls.is_none());
    }

    #[test]
    fn test_apply_yaml_tls_paths() {
        let yaml: YamlConfig = serde_yaml::from_str(
            r#"
server:
  tls:
    enabled: true
    cert_path: "/yaml/cert.pem"
    key_path: "/yaml/key.pem"
"#,
        )
        .unwrap();

        let mut config = base_config();
        apply_yaml(&mut config, yaml);

        let tls = config.tls.as_ref().unwrap();
        assert_eq!(tls.cert_path, PathBuf::from("/yaml/cert.pem"));
        assert_eq!(tls.key_path, PathBuf::from("/yaml/key.pem"));
    }

    #[test]
    #[serial]
    fn test_merge_config_without_yaml_uses_env_base() {
        unsafe {
            std::env::remove_var("HOST");
            std::env::remove_var("PORT");
        }

        let config = merge_config(None).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
    }
}
