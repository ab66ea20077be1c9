//! CLI error type.

use std::fmt;

use polytiles::config::ConfigError;
use polytiles::convert::ConvertError;
use polytiles::logging::LoggingError;
use polytiles::server::ServerError;

/// Errors surfaced to the user by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be loaded, saved or resolved.
    Config(String),
    /// Logging could not be initialized.
    Logging(LoggingError),
    /// The async runtime could not be started.
    Runtime(std::io::Error),
    /// The HTTP server failed.
    Server(ServerError),
    /// The conversion request was invalid.
    InvalidRequest(ConvertError),
    /// The conversion ran and failed.
    Conversion(String),
    /// The user interrupted the command.
    Interrupted,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Logging(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Server(e) => write!(f, "Server error: {}", e),
            CliError::InvalidRequest(e) => write!(f, "Invalid request: {}", e),
            CliError::Conversion(msg) => write!(f, "Conversion failed: {}", msg),
            CliError::Interrupted => write!(f, "Interrupted"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Logging(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Server(e) => Some(e),
            CliError::InvalidRequest(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<ServerError> for CliError {
    fn from(e: ServerError) -> Self {
        CliError::Server(e)
    }
}

impl From<ConvertError> for CliError {
    fn from(e: ConvertError) -> Self {
        CliError::InvalidRequest(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            CliError::Conversion("tippecanoe exited with exit status: 1".into()).to_string(),
            "Conversion failed: tippecanoe exited with exit status: 1"
        );
        assert_eq!(
            CliError::from(ConvertError::SamePath).to_string(),
            "Invalid request: 'input' and 'output' must be different paths"
        );
    }
}
