use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tree::{OrphanSweep, RepositoryOptions};

const DEFAULT_LOG_LEVEL: &str = "warn";

/// Settings loaded from `config.toml`.
#[derive(Debug, Default)]
pub struct ArborConfig {
    path: Option<PathBuf>,
    data: RawConfig,
}

impl ArborConfig {
    /// Loads the config from `explicit` or the default location. A missing
    /// file yields default settings.
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = explicit.or_else(default_config_path);
        let data = match path.as_ref() {
            Some(config_path) if config_path.exists() => read_file(config_path)?,
            _ => RawConfig::default(),
        };
        Ok(Self { path, data })
    }

    /// Path the config was (or would be) read from.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Configured orphan sweep depth.
    pub fn orphan_sweep(&self) -> OrphanSweep {
        self.data.repository.orphan_sweep.unwrap_or_default()
    }

    /// Repository options derived from the file.
    pub fn repository_options(&self) -> RepositoryOptions {
        RepositoryOptions::new().orphan_sweep(self.orphan_sweep())
    }

    /// Configured log filter.
    pub fn log_level(&self) -> &str {
        self.data
            .logging
            .level
            .as_deref()
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Updates settings in memory; call [`Self::persist`] to write them.
    pub fn apply(&mut self, update: ConfigUpdate) {
        if let Some(sweep) = update.orphan_sweep {
            self.data.repository.orphan_sweep = Some(sweep);
        }
        if let Some(level) = update.log_level {
            self.data.logging.level = Some(level);
        }
    }

    /// Writes the settings back to disk, creating parent directories.
    pub fn persist(&self) -> Result<PathBuf, ConfigError> {
        let target = match &self.path {
            Some(path) => path.clone(),
            None => default_config_path().ok_or(ConfigError::NoConfigPath)?,
        };
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let serialized = toml::to_string_pretty(&self.data)
            .map_err(|source| ConfigError::Serialize { source })?;
        fs::write(&target, serialized).map_err(|source| ConfigError::Write {
            path: target.clone(),
            source,
        })?;
        Ok(target)
    }
}

/// Fields to change with [`ArborConfig::apply`].
#[derive(Debug, Default)]
pub struct ConfigUpdate {
    /// New orphan sweep depth.
    pub orphan_sweep: Option<OrphanSweep>,
    /// New log filter.
    pub log_level: Option<String>,
}

fn read_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct RawConfig {
    #[serde(default)]
    repository: RepositorySection,
    #[serde(default)]
    logging: LoggingSection,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct RepositorySection {
    orphan_sweep: Option<OrphanSweep>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct LoggingSection {
    level: Option<String>,
}

/// Errors raised while reading or writing the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading failed.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Config path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The file is not valid TOML for this schema.
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// Config path.
        path: PathBuf,
        /// Parser error.
        source: toml::de::Error,
    },
    /// Serialization failed.
    #[error("failed to serialize config: {source}")]
    Serialize {
        /// Serializer error.
        source: toml::ser::Error,
    },
    /// Writing failed.
    #[error("failed to write config {path}: {source}")]
    Write {
        /// Config path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The parent directory could not be created.
    #[error("failed to create config directory {path}: {source}")]
    CreateDir {
        /// Directory path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// No explicit path and no platform config directory.
    #[error("no config directory found; pass --config or set ARBOR_CONFIG")]
    NoConfigPath,
}

/// Default config location: `<config dir>/arbor/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("arbor").join("config.toml"))
}
