//! CLI-specific error types

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::fault::Fault;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// The checksum core refused to start
    BootFailed,
    /// Scan did not finish within its tick limit
    ScanIncomplete,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "CS_CLI_CONFIG_ERROR",
            Self::IoError => "CS_CLI_IO_ERROR",
            Self::BootFailed => "CS_CLI_BOOT_FAILED",
            Self::ScanIncomplete => "CS_CLI_SCAN_INCOMPLETE",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    pub fn scan_incomplete(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ScanIncomplete, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<Fault> for CliError {
    fn from(e: Fault) -> Self {
        Self::boot_failed(format!("{}: {}", e.code(), e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code() {
        let err = CliError::config_error("bad file");
        assert_eq!(err.to_string(), "CS_CLI_CONFIG_ERROR: bad file");
    }

    #[test]
    fn test_fault_maps_to_boot_failed() {
        let err: CliError = Fault::InvalidDefinition("Eeprom table: entry 0".into()).into();
        assert_eq!(err.code(), &CliErrorCode::BootFailed);
        assert!(err.message().contains("CS_INVALID_DEFINITION"));
    }
}
