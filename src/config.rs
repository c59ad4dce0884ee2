use thiserror::Error;

use crate::{caption::DEFAULT_GEMINI_API_URL, vision::DEFAULT_VISION_API_URL};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
/// Large enough for a 10 MB image after base64 expansion.
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_api_url: String,
    pub vision_api_key: String,
    pub vision_api_url: String,
    pub bind_addr: String,
    pub max_body_bytes: usize,
    pub cors_all_responses: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. Empty values count as unset.
    ///
    /// A missing API key is not an error here; calls made with it fail at
    /// the service and go through the normal error paths.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let gemini_api_key = get("GEMINI_API_KEY").unwrap_or_default();
        let vision_api_key = get("VISION_API_KEY").unwrap_or_else(|| gemini_api_key.clone());

        let max_body_bytes = match get("MAX_BODY_BYTES") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| {
                ConfigError::InvalidValue {
                    key: "MAX_BODY_BYTES",
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?,
            None => DEFAULT_MAX_BODY_BYTES,
        };

        let cors_all_responses = match get("CORS_ALL_RESPONSES") {
            Some(raw) => parse_bool("CORS_ALL_RESPONSES", &raw)?,
            None => false,
        };

        Ok(Self {
            gemini_api_key,
            gemini_api_url: get("GEMINI_API_URL").unwrap_or_else(|| DEFAULT_GEMINI_API_URL.into()),
            vision_api_key,
            vision_api_url: get("VISION_API_URL").unwrap_or_else(|| DEFAULT_VISION_API_URL.into()),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            max_body_bytes,
            cors_all_responses,
        })
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}
