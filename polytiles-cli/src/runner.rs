//! Shared setup for CLI commands.

use std::path::{Path, PathBuf};

use polytiles::config::{config_file_path, ConfigFile};
use polytiles::logging::{self, LoggingGuard};
use tokio::runtime::Runtime;
use tracing::info;

use crate::error::CliError;

/// Loads configuration and initializes logging for a command.
pub struct CliRunner {
    config: ConfigFile,
    config_path: PathBuf,
    _logging: LoggingGuard,
}

impl CliRunner {
    /// Loads the configuration from `config_path` (or the default location)
    /// and installs the log subscriber. `verbose` forces debug logging.
    pub fn new(config_path: Option<&Path>, verbose: bool) -> Result<Self, CliError> {
        let config_path = resolve_config_path(config_path)?;
        let mut config = ConfigFile::load_from(&config_path)?;
        if verbose {
            config.logging.level = "debug".to_string();
        }

        let logging = logging::init(&config.logging)?;

        Ok(Self {
            config,
            config_path,
            _logging: logging,
        })
    }

    /// The loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Logs the command being started.
    pub fn log_startup(&self, command: &str) {
        info!(
            version = polytiles::VERSION,
            command,
            config = %self.config_path.display(),
            "Polytiles starting"
        );
    }

    /// Builds the multi-threaded runtime commands run on.
    pub fn runtime(&self) -> Result<Runtime, CliError> {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(CliError::Runtime)
    }
}

/// Returns the explicit path if given, otherwise the default location.
pub fn resolve_config_path(config_path: Option<&Path>) -> Result<PathBuf, CliError> {
    match config_path {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(config_file_path()?),
    }
}
