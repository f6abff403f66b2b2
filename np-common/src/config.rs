//! Configuration loading
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (clap `env` fallbacks in each binary)
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error: the service starts on defaults.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "NP_CONFIG";

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from this file
    File(PathBuf),
    /// File was looked for here but does not exist
    Missing(PathBuf),
    /// No candidate path (e.g. no config directory on this platform)
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "config file {}", path.display()),
            ConfigSource::Missing(path) => {
                write!(f, "compiled defaults ({} not found)", path.display())
            }
            ConfigSource::Defaults => write!(f, "compiled defaults"),
        }
    }
}

/// Loaded configuration plus its provenance
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub config: T,
    pub source: ConfigSource,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` overrides it
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Per-platform default config file: `<config_dir>/neuropulse/<module>.toml`
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("neuropulse").join(format!("{}.toml", module_name)))
}

/// Pick the config file path: explicit argument first, then the platform default
pub fn resolve_config_path(cli_arg: Option<&Path>, module_name: &str) -> Option<PathBuf> {
    cli_arg
        .map(Path::to_path_buf)
        .or_else(|| default_config_path(module_name))
}

/// Load a TOML config file, falling back to `T::default()` when it is absent
pub fn load_toml_config<T>(path: Option<&Path>) -> Result<Loaded<T>>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        return Ok(Loaded {
            config: T::default(),
            source: ConfigSource::Defaults,
        });
    };

    if !path.exists() {
        return Ok(Loaded {
            config: T::default(),
            source: ConfigSource::Missing(path.to_path_buf()),
        });
    }

    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    Ok(Loaded {
        config,
        source: ConfigSource::File(path.to_path_buf()),
    })
}

/// Bootstrap TOML for a classifier service
///
/// Every field is optional; unset fields fall back to the service's compiled defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceToml {
    pub bind_addr: Option<String>,
    pub port: Option<u16>,
    pub model: ModelToml,
    pub logging: LoggingConfig,
}

/// `[model]` table of a classifier service config
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModelToml {
    pub name: Option<String>,
    pub endpoint: Option<String>,
    pub api_token_env: Option<String>,
    pub labels: Option<Vec<String>>,
    pub timeout_secs: Option<u64>,
}

/// Resolved model backend settings
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub name: String,
    pub endpoint: Option<String>,
    /// Name of the environment variable holding the inference token
    pub api_token_env: String,
    pub labels: Vec<String>,
    pub timeout_secs: u64,
}

/// Default inference token variable
pub const DEFAULT_API_TOKEN_ENV: &str = "HF_API_TOKEN";

/// Default inference request timeout
pub const DEFAULT_INFERENCE_TIMEOUT_SECS: u64 = 30;

impl ModelToml {
    /// Merge with the service defaults; `endpoint_override` comes from CLI/ENV
    pub fn resolve(
        self,
        default_name: &str,
        default_labels: &[&str],
        endpoint_override: Option<String>,
    ) -> ModelConfig {
        ModelConfig {
            name: self.name.unwrap_or_else(|| default_name.to_string()),
            endpoint: endpoint_override.or(self.endpoint),
            api_token_env: self
                .api_token_env
                .unwrap_or_else(|| DEFAULT_API_TOKEN_ENV.to_string()),
            labels: self
                .labels
                .unwrap_or_else(|| default_labels.iter().map(|l| l.to_string()).collect()),
            timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_INFERENCE_TIMEOUT_SECS),
        }
    }
}

impl ModelConfig {
    /// Read the inference token from the configured environment variable
    pub fn api_token(&self) -> Option<String> {
        std::env::var(&self.api_token_env)
            .ok()
            .filter(|token| !token.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_toml_defaults() {
        let config = ModelToml::default().resolve("some/model", &["joy", "anger"], None);
        assert_eq!(config.name, "some/model");
        assert_eq!(config.endpoint, None);
        assert_eq!(config.api_token_env, DEFAULT_API_TOKEN_ENV);
        assert_eq!(config.labels, vec!["joy", "anger"]);
        assert_eq!(config.timeout_secs, DEFAULT_INFERENCE_TIMEOUT_SECS);
    }

    #[test]
    fn test_endpoint_override_wins() {
        let toml = ModelToml {
            endpoint: Some("http://from-toml".to_string()),
            ..Default::default()
        };
        let config = toml.resolve("m", &[], Some("http://from-cli".to_string()));
        assert_eq!(config.endpoint.as_deref(), Some("http://from-cli"));
    }

    #[test]
    fn test_config_source_display() {
        let source = ConfigSource::Missing(PathBuf::from("/nope/np-text.toml"));
        assert!(source.to_string().contains("not found"));
    }
}
