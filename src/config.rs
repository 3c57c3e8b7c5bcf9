//! Configuration management for student-records.
//!
//! Configuration is layered with figment: built-in defaults, then an optional
//! TOML file, then environment variables prefixed with `STUDENT_RECORDS_`
//! (nested keys split on `__`, e.g. `STUDENT_RECORDS_STORE__BACKEND=memory`).

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::logging::LogFormat;

/// Default configuration file name, looked up in the working directory.
const CONFIG_FILE_NAME: &str = "student-records.toml";

/// Environment variable prefix.
const ENV_PREFIX: &str = "STUDENT_RECORDS_";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Record store configuration.
    pub store: StoreConfig,
    /// Log output configuration.
    pub log: LogConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub bind: String,
}

/// Log output configuration. Verbosity comes from the command line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub format: LogFormat,
}

/// Which record store backend to construct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    #[default]
    JsonFile,
    Remote,
    Memory,
}

/// Record store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: Backend,
    /// Data file for the `json_file` backend.
    pub data_file: PathBuf,
    /// Settings for the `remote` backend.
    pub remote: RemoteConfig,
}

/// Remote document store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    pub collection: String,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5000".to_string(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            data_file: PathBuf::from("data/students.json"),
            remote: RemoteConfig::default(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            collection: "students".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Config {
    /// Load configuration from the default file and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if loading, parsing or validation fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);
        Self::from_figment(Self::figment(&config_file))
    }

    /// Check a single configuration file on its own.
    ///
    /// Unlike [`Config::load_from`], the file must exist, and environment
    /// variables are not layered on top, so the result reflects only the
    /// file's contents over the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, fails to parse, or holds
    /// invalid values.
    pub fn validate_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        Self::from_figment(
            Figment::new()
                .merge(Serialized::defaults(Config::default()))
                .merge(Toml::file(path)),
        )
    }

    fn figment(config_file: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        PathBuf::from(CONFIG_FILE_NAME)
    }

    /// The parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns an error if `server.bind` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .map_err(|_| Error::ConfigValidation {
                message: format!("server.bind is not a socket address: {}", self.server.bind),
            })
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;

        match self.store.backend {
            Backend::JsonFile => {
                if self.store.data_file.as_os_str().is_empty() {
                    return Err(Error::ConfigValidation {
                        message: "store.data_file must not be empty".to_string(),
                    });
                }
            }
            Backend::Remote => {
                let remote = &self.store.remote;
                if !(remote.base_url.starts_with("http://")
                    || remote.base_url.starts_with("https://"))
                {
                    return Err(Error::ConfigValidation {
                        message: format!(
                            "store.remote.base_url must be an http(s) URL, got {:?}",
                            remote.base_url
                        ),
                    });
                }
                if remote.collection.trim().is_empty() {
                    return Err(Error::ConfigValidation {
                        message: "store.remote.collection must not be empty".to_string(),
                    });
                }
                if remote.timeout_secs == 0 {
                    return Err(Error::ConfigValidation {
                        message: "store.remote.timeout_secs must be greater than 0".to_string(),
                    });
                }
            }
            Backend::Memory => {}
        }

        Ok(())
    }
}
