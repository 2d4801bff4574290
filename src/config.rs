//! Startup configuration

use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ENGINE_URL: &str = "http://localhost:8000";

const ENGINE_URL: &str = "SYMPTOM_CHAT_ENGINE_URL";
const REQUEST_TIMEOUT_SECS: &str = "SYMPTOM_CHAT_REQUEST_TIMEOUT_SECS";
const ALLOW_BACKTRACK: &str = "SYMPTOM_CHAT_ALLOW_BACKTRACK";
const SHARE_BASE_URL: &str = "SYMPTOM_CHAT_SHARE_BASE_URL";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a whole number of seconds greater than zero, got {value:?}")]
    InvalidTimeout { var: &'static str, value: String },
    #[error("{var} must be true or false, got {value:?}")]
    InvalidFlag { var: &'static str, value: String },
    #[error("{var} must not be empty")]
    Empty { var: &'static str },
}

/// Settings read once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub engine_url: String,
    pub request_timeout: Option<Duration>,
    pub allow_backtrack: bool,
    pub share_base_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; unset variables take their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let engine_url = match lookup(ENGINE_URL) {
            Some(url) if url.trim().is_empty() => return Err(ConfigError::Empty { var: ENGINE_URL }),
            Some(url) => url.trim().to_string(),
            None => DEFAULT_ENGINE_URL.to_string(),
        };

        let request_timeout = match lookup(REQUEST_TIMEOUT_SECS) {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    return Err(ConfigError::InvalidTimeout {
                        var: REQUEST_TIMEOUT_SECS,
                        value,
                    })
                }
            },
            None => None,
        };

        let allow_backtrack = match lookup(ALLOW_BACKTRACK) {
            Some(value) => parse_flag(&value).ok_or(ConfigError::InvalidFlag {
                var: ALLOW_BACKTRACK,
                value,
            })?,
            None => true,
        };

        let share_base_url = lookup(SHARE_BASE_URL)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| engine_url.clone());

        Ok(Self {
            engine_url,
            request_timeout,
            allow_backtrack,
            share_base_url,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
