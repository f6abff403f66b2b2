//! Gateway configuration
//!
//! Loaded from `<config_dir>/neuropulse/np-gateway.toml` (or `--config`);
//! command-line/environment overrides are applied in `main`.

use np_common::config::LoggingConfig;
use np_common::fusion::{FusionEngine, LabelNormalizer, SourceWeights};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Default gateway port
pub const DEFAULT_PORT: u16 = 8000;

/// Gateway TOML root
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayToml {
    pub bind_addr: Option<String>,
    pub port: Option<u16>,
    /// Per-call timeout for classifier requests
    pub request_timeout_secs: u64,
    /// Per-probe timeout for health checks
    pub health_timeout_ms: u64,
    pub services: ServiceUrls,
    pub fusion: FusionToml,
    pub llm: LlmConfig,
    pub logging: LoggingConfig,
}

impl Default for GatewayToml {
    fn default() -> Self {
        Self {
            bind_addr: None,
            port: None,
            request_timeout_secs: 20,
            health_timeout_ms: 500,
            services: ServiceUrls::default(),
            fusion: FusionToml::default(),
            llm: LlmConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl GatewayToml {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }
}

/// Classifier service base URLs
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceUrls {
    pub text_url: String,
    pub audio_url: String,
    pub face_url: String,
}

impl Default for ServiceUrls {
    fn default() -> Self {
        Self {
            text_url: "http://127.0.0.1:5001".to_string(),
            audio_url: "http://127.0.0.1:5000".to_string(),
            face_url: "http://127.0.0.1:5002".to_string(),
        }
    }
}

/// `[fusion]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FusionToml {
    pub weights: SourceWeights,
    /// Optional label mapping, e.g. `sad = "sadness"`
    pub label_map: HashMap<String, String>,
}

impl FusionToml {
    /// Validate the weights and build the engine
    pub fn engine(&self) -> np_common::Result<FusionEngine> {
        self.weights.validate()?;
        Ok(FusionEngine::new(
            self.weights,
            LabelNormalizer::from_table(self.label_map.clone()),
        ))
    }
}

/// `[llm]` table: OpenAI-compatible chat completions
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub summary_temperature: f32,
    pub summary_max_tokens: u32,
    pub tips_temperature: f32,
    pub tips_max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout_secs: 30,
            api_key_env: "OPENAI_API_KEY".to_string(),
            summary_temperature: 0.7,
            summary_max_tokens: 300,
            tips_temperature: 0.6,
            tips_max_tokens: 500,
        }
    }
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use np_common::config::{load_toml_config, ConfigSource};
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_defaults_match_service_ports() {
        let config = GatewayToml::default();
        assert_eq!(config.services.text_url, "http://127.0.0.1:5001");
        assert_eq!(config.services.audio_url, "http://127.0.0.1:5000");
        assert_eq!(config.services.face_url, "http://127.0.0.1:5002");
        assert_eq!(config.request_timeout(), Duration::from_secs(20));
        assert_eq!(config.health_timeout(), Duration::from_millis(500));
        assert_eq!(config.fusion.weights, SourceWeights::default());
    }

    #[test]
    fn test_load_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
port = 9000
request_timeout_secs = 5

[services]
text_url = "http://text.internal:5001"

[fusion.weights]
audio = 0.0

[fusion.label_map]
sad = "sadness"

[llm]
model = "gpt-4o-mini"
"#
        )
        .unwrap();

        let loaded = load_toml_config::<GatewayToml>(Some(file.path())).unwrap();
        assert!(matches!(loaded.source, ConfigSource::File(_)));

        let config = loaded.config;
        assert_eq!(config.port, Some(9000));
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.health_timeout_ms, 500);
        assert_eq!(config.services.text_url, "http://text.internal:5001");
        assert_eq!(config.services.face_url, "http://127.0.0.1:5002");
        assert_eq!(config.fusion.weights.text, 0.4);
        assert_eq!(config.fusion.weights.audio, 0.0);
        assert_eq!(config.fusion.label_map.get("sad").map(String::as_str), Some("sadness"));
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("np-gateway.toml");
        let loaded = load_toml_config::<GatewayToml>(Some(&path)).unwrap();
        assert!(matches!(loaded.source, ConfigSource::Missing(_)));
        assert_eq!(loaded.config.port, None);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let fusion = FusionToml {
            weights: SourceWeights {
                text: -0.1,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(fusion.engine().is_err());
    }

    #[test]
    #[serial]
    fn test_api_key_from_env() {
        let config = LlmConfig {
            api_key_env: "NP_GATEWAY_TEST_LLM_KEY".to_string(),
            ..Default::default()
        };

        std::env::remove_var("NP_GATEWAY_TEST_LLM_KEY");
        assert_eq!(config.api_key(), None);

        std::env::set_var("NP_GATEWAY_TEST_LLM_KEY", "  ");
        assert_eq!(config.api_key(), None);

        std::env::set_var("NP_GATEWAY_TEST_LLM_KEY", "sk-test");
        assert_eq!(config.api_key().as_deref(), Some("sk-test"));

        std::env::remove_var("NP_GATEWAY_TEST_LLM_KEY");
    }
}
