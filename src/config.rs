use std::env;

use thiserror::Error;

pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub max_message_bytes: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("MCP_MAX_MESSAGE_BYTES must be a positive integer")]
    InvalidMaxMessageBytes,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let max_message_bytes = env::var("MCP_MAX_MESSAGE_BYTES")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(|value| {
                value
                    .parse::<usize>()
                    .ok()
                    .filter(|limit| *limit > 0)
                    .ok_or(ConfigError::InvalidMaxMessageBytes)
            })
            .transpose()?
            .unwrap_or(DEFAULT_MAX_MESSAGE_BYTES);

        Ok(Self { max_message_bytes })
    }
}
