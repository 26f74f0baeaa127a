use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl GeminiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub discord_token: String,
    pub gemini: GeminiConfig,
    pub command_prefix: String,
    pub http_host: String,
    pub http_port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let discord_token = required("DISCORD_BOT_TOKEN")?;
        let api_key = required("GEMINI_API_KEY")?;

        let timeout_secs = match lookup("LLM_TIMEOUT_SECS") {
            Some(v) => v.parse::<u64>().map_err(|e| ConfigError::Invalid {
                key: "LLM_TIMEOUT_SECS",
                reason: e.to_string(),
            })?,
            None => 30,
        };
        let http_port = match lookup("APP_PORT") {
            Some(v) => v.parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: "APP_PORT",
                reason: e.to_string(),
            })?,
            None => 8080,
        };

        let gemini = GeminiConfig {
            api_key,
            model: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.into()),
            api_base: lookup("GEMINI_API_BASE")
                .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.into())
                .trim_end_matches('/')
                .to_string(),
            timeout_secs,
        };

        Ok(Self {
            discord_token,
            gemini,
            command_prefix: lookup("COMMAND_PREFIX").unwrap_or_else(|| "!".into()),
            http_host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            http_port,
        })
    }
}
