//! INI-backed configuration file.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use crate::logging::LoggingConfig;
use crate::tools::ToolsConfig;

/// Default listen address for the HTTP server.
pub const DEFAULT_LISTEN: &str = "127.0.0.1:5173";

/// Errors that can occur while loading or saving the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No per-user configuration directory on this platform.
    #[error("could not determine the configuration directory")]
    NoConfigDir,

    /// The file exists but could not be read or parsed.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    /// The file could not be written.
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A key holds a value that cannot be used.
    #[error("invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// HTTP server settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerSettings {
    /// Address to bind, `host:port`.
    pub listen: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
        }
    }
}

/// Parsed configuration file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigFile {
    /// `[server]` section.
    pub server: ServerSettings,
    /// `[tools]` section.
    pub tools: ToolsConfig,
    /// `[logging]` section.
    pub logging: LoggingConfig,
}

/// Returns the default configuration file path.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("polytiles").join("config.ini"))
        .ok_or(ConfigError::NoConfigDir)
}

impl ConfigFile {
    /// Loads the configuration from the default path.
    ///
    /// Returns defaults if the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path()?)
    }

    /// Loads the configuration from `path`, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ini(&ini)
    }

    /// Builds the configuration from parsed INI data.
    pub fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let get = |section: &str, key: &str| {
            ini.section(Some(section))
                .and_then(|props| props.get(key))
                .map(str::trim)
        };

        if let Some(listen) = get("server", "listen") {
            if listen.is_empty() || !listen.contains(':') {
                return Err(ConfigError::InvalidValue {
                    key: "server.listen".to_string(),
                    value: listen.to_string(),
                    reason: "expected host:port".to_string(),
                });
            }
            config.server.listen = listen.to_string();
        }

        if let Some(tippecanoe) = get("tools", "tippecanoe").filter(|v| !v.is_empty()) {
            config.tools.tippecanoe = tippecanoe.to_string();
        }
        if let Some(versatiles) = get("tools", "versatiles").filter(|v| !v.is_empty()) {
            config.tools.versatiles = versatiles.to_string();
        }
        config.tools.temp_dir = optional_path(get("tools", "temp_dir"));

        if let Some(level) = get("logging", "level").filter(|v| !v.is_empty()) {
            config.logging.level = level.to_string();
        }
        config.logging.directory = optional_path(get("logging", "directory"));

        Ok(config)
    }

    /// Converts the configuration to INI data.
    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        ini.with_section(Some("server"))
            .set("listen", self.server.listen.as_str());
        ini.with_section(Some("tools"))
            .set("tippecanoe", self.tools.tippecanoe.as_str())
            .set("versatiles", self.tools.versatiles.as_str())
            .set("temp_dir", path_value(self.tools.temp_dir.as_deref()));
        ini.with_section(Some("logging"))
            .set("level", self.logging.level.as_str())
            .set("directory", path_value(self.logging.directory.as_deref()));
        ini
    }

    /// Saves the configuration to the default path.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path()?)
    }

    /// Saves the configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        self.to_ini().write_to_file(path).map_err(write_error)
    }

    /// Returns every setting as `(section.key, value)` for display.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("server.listen", self.server.listen.clone()),
            ("tools.tippecanoe", self.tools.tippecanoe.clone()),
            ("tools.versatiles", self.tools.versatiles.clone()),
            ("tools.temp_dir", path_value(self.tools.temp_dir.as_deref())),
            ("logging.level", self.logging.level.clone()),
            (
                "logging.directory",
                path_value(self.logging.directory.as_deref()),
            ),
        ]
    }
}

fn optional_path(value: Option<&str>) -> Option<PathBuf> {
    value.filter(|v| !v.is_empty()).map(PathBuf::from)
}

fn path_value(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string()).unwrap_or_default()
}
