//! Configuration errors

use thiserror::Error;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "CS_CONFIG_READ",
            ConfigError::Parse(_) => "CS_CONFIG_PARSE",
            ConfigError::Invalid(_) => "CS_CONFIG_INVALID",
        }
    }
}
