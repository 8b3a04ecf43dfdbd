//! Application configuration management
//!
//! This module loads and validates configuration from the process
//! environment. A `.env` file, when present, is loaded into the environment
//! by `main` before this runs. All values are validated at startup so the
//! service never reaches the request path half-configured.

use crate::core::constants::defaults;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the Azure OpenAI endpoint URL
pub const ENV_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";

/// Environment variable holding the Azure OpenAI API key
pub const ENV_API_KEY: &str = "AZURE_OPENAI_API_KEY";

/// Environment variable holding the Azure OpenAI deployment name
pub const ENV_DEPLOYMENT: &str = "AZURE_OPENAI_DEPLOYMENT_NAME";

/// Placeholder prefix left in unedited `.env` templates
const PLACEHOLDER_PREFIX: &str = "YOUR_";

/// Configuration errors, all fatal at startup
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set. Set it in the environment or in a .env file")]
    Missing(&'static str),

    #[error("{0} still holds a placeholder value")]
    Placeholder(&'static str),

    #[error("Invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Application configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct Config {
    /// Azure OpenAI resource endpoint, without trailing slash
    pub endpoint: String,

    /// Azure OpenAI API key
    pub api_key: String,

    /// Deployment (model) name
    pub deployment: String,

    /// Azure REST API version
    pub api_version: String,

    /// Server host address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Logging level
    pub log_level: String,

    /// Outbound request timeout
    pub request_timeout: Duration,

    /// Sampling temperature
    pub temperature: f32,

    /// Completion token ceiling
    pub max_tokens: u32,

    /// Optional TOML file with extra substitution rules
    pub substitutions_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Any of the endpoint, API key or deployment name is missing or blank
    /// - One of those still holds a `YOUR_...` placeholder
    /// - A numeric setting cannot be parsed or is out of range
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = required(&lookup, ENV_ENDPOINT)?;
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(ConfigError::Invalid {
                key: ENV_ENDPOINT,
                value: endpoint,
                reason: "expected an http(s) URL".to_string(),
            });
        }
        let api_key = required(&lookup, ENV_API_KEY)?;
        let deployment = required(&lookup, ENV_DEPLOYMENT)?;

        let api_version = optional(&lookup, "AZURE_OPENAI_API_VERSION")
            .unwrap_or_else(|| defaults::API_VERSION.to_string());
        let host = optional(&lookup, "HOST").unwrap_or_else(|| defaults::HOST.to_string());
        let port = parsed(&lookup, "PORT", defaults::PORT)?;
        let log_level =
            optional(&lookup, "LOG_LEVEL").unwrap_or_else(|| defaults::LOG_LEVEL.to_string());
        let timeout_secs = parsed(&lookup, "REQUEST_TIMEOUT", defaults::REQUEST_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "REQUEST_TIMEOUT",
                value: "0".to_string(),
                reason: "must be at least one second".to_string(),
            });
        }
        let temperature = parsed(&lookup, "TEMPERATURE", defaults::TEMPERATURE)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::Invalid {
                key: "TEMPERATURE",
                value: temperature.to_string(),
                reason: "must be between 0 and 2".to_string(),
            });
        }
        let max_tokens = parsed(&lookup, "MAX_TOKENS", defaults::MAX_TOKENS)?;

        Ok(Config {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            deployment,
            api_version,
            host,
            port,
            log_level,
            request_timeout: Duration::from_secs(timeout_secs),
            temperature,
            max_tokens,
            substitutions_path: optional(&lookup, "SUBSTITUTIONS_PATH").map(PathBuf::from),
        })
    }
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = optional(lookup, key).ok_or(ConfigError::Missing(key))?;
    if value.starts_with(PLACEHOLDER_PREFIX) {
        return Err(ConfigError::Placeholder(key));
    }
    Ok(value)
}

fn parsed<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional(lookup, key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn complete_env() -> HashMap<String, String> {
        env(&[
            (ENV_ENDPOINT, "https://example.openai.azure.com/"),
            (ENV_API_KEY, "secret"),
            (ENV_DEPLOYMENT, "gpt-4o"),
        ])
    }

    fn load(vars: &HashMap<String, String>) -> Result<Config, ConfigError> {
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_load_config_with_defaults() {
        let config = load(&complete_env()).unwrap();
        assert_eq!(config.endpoint, "https://example.openai.azure.com");
        assert_eq!(config.deployment, "gpt-4o");
        assert_eq!(config.api_version, defaults::API_VERSION);
        assert_eq!(config.port, defaults::PORT);
        assert_eq!(config.max_tokens, 4000);
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert!(config.substitutions_path.is_none());
    }

    #[test]
    fn test_each_required_value_is_fatal_when_missing() {
        for key in [ENV_ENDPOINT, ENV_API_KEY, ENV_DEPLOYMENT] {
            let mut vars = complete_env();
            vars.remove(key);
            assert_eq!(load(&vars).unwrap_err(), ConfigError::Missing(key));
        }
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let mut vars = complete_env();
        vars.insert(ENV_API_KEY.to_string(), "   ".to_string());
        assert_eq!(load(&vars).unwrap_err(), ConfigError::Missing(ENV_API_KEY));
    }

    #[test]
    fn test_placeholder_rejected() {
        let mut vars = complete_env();
        vars.insert(ENV_DEPLOYMENT.to_string(), "YOUR_DEPLOYMENT_NAME".to_string());
        assert_eq!(
            load(&vars).unwrap_err(),
            ConfigError::Placeholder(ENV_DEPLOYMENT)
        );
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        let mut vars = complete_env();
        vars.insert("PORT".to_string(), "eighty".to_string());
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::Invalid { key: "PORT", .. }
        ));

        let mut vars = complete_env();
        vars.insert("TEMPERATURE".to_string(), "3.5".to_string());
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::Invalid { key: "TEMPERATURE", .. }
        ));
    }

    #[test]
    fn test_endpoint_must_be_url() {
        let mut vars = complete_env();
        vars.insert(ENV_ENDPOINT.to_string(), "example.openai.azure.com".to_string());
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::Invalid { key: ENV_ENDPOINT, .. }
        ));
    }

    #[test]
    fn test_optional_overrides() {
        let mut vars = complete_env();
        vars.insert("PORT".to_string(), "9000".to_string());
        vars.insert("REQUEST_TIMEOUT".to_string(), "30".to_string());
        vars.insert("SUBSTITUTIONS_PATH".to_string(), "rules.toml".to_string());
        let config = load(&vars).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.substitutions_path, Some(PathBuf::from("rules.toml")));
    }
}
