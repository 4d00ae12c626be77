use std::time::Duration;

use anyhow::{Context, Result};

use crate::consensus::ConsensusMechanism;

/// Service configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    /// Bearer token the upstream application must present on evaluation requests.
    pub service_api_key: String,
    pub environment: String,
    pub port: u16,
    pub rust_log: String,
    pub request_timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
    pub consensus_mechanism: ConsensusMechanism,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            service_api_key: std::env::var("AI_SERVICE_API_KEY")
                .unwrap_or_else(|_| "development-key".to_string()),
            environment: std::env::var("ENV").unwrap_or_else(|_| "development".to_string()),
            port: parse_env("PORT", 8000)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            request_timeout: Duration::from_secs(parse_env("LLM_REQUEST_TIMEOUT_SECS", 30)?),
            max_tokens: parse_env("LLM_MAX_TOKENS", 4096)?,
            temperature: parse_env("LLM_TEMPERATURE", 0.3)?,
            consensus_mechanism: parse_env("CONSENSUS_MECHANISM", ConsensusMechanism::default())?,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }
}

fn require_env(key: &str) -> Result<String> {
    let value = std::env::var(key)
        .with_context(|| format!("Required environment variable '{key}' is not set"))?;
    if value.trim().is_empty() {
        anyhow::bail!("Required environment variable '{key}' is empty");
    }
    Ok(value)
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} has an invalid value '{raw}': {e}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: u16 = parse_env("SWARM_EVAL_TEST_UNSET_PORT", 8000).unwrap();
        assert_eq!(value, 8000);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("SWARM_EVAL_TEST_BAD_TOKENS", "lots");
        let result: Result<u32> = parse_env("SWARM_EVAL_TEST_BAD_TOKENS", 4096);
        assert!(result.is_err());
    }

    #[test]
    fn test_require_env_missing_is_an_error() {
        let err = require_env("SWARM_EVAL_TEST_MISSING_KEY").unwrap_err();
        assert!(err.to_string().contains("SWARM_EVAL_TEST_MISSING_KEY"));
    }
}
