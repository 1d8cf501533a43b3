//! Environment-backed configuration.
//!
//! Process settings come from `RISKLINE_*` environment variables with defaults. The model
//! definition (features, bounds, categories, baselines) lives in a JSON file; see [`model`].

pub mod error;
pub mod model;


pub use error::ConfigError;
pub use model::{AppConfig, EmbeddingConfig, ModelConfig, ServiceConfig};

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;

/// Default limit for `POST /predict/batch`.
pub const DEFAULT_MAX_BATCH: usize = 1000;

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `RISKLINE_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Model config JSON. Default: `./config.json`.
    pub config_path: PathBuf,

    /// Overrides `active_model` from the model config.
    pub active_model: Option<String>,

    /// Text encoder directory (BERT + tokenizer). Stub encoder when unset.
    pub encoder_path: Option<PathBuf>,

    /// Max items per batch prediction. Default: `1000`.
    pub max_batch: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            config_path: PathBuf::from("./config.json"),
            active_model: None,
            encoder_path: None,
            max_batch: DEFAULT_MAX_BATCH,
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "RISKLINE_PORT";
    const ENV_BIND_ADDR: &'static str = "RISKLINE_BIND_ADDR";
    const ENV_CONFIG_PATH: &'static str = "RISKLINE_CONFIG_PATH";
    const ENV_ACTIVE_MODEL: &'static str = "RISKLINE_ACTIVE_MODEL";
    const ENV_ENCODER_PATH: &'static str = "RISKLINE_ENCODER_PATH";
    const ENV_MAX_BATCH: &'static str = "RISKLINE_MAX_BATCH";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let config_path = Self::parse_path_from_env(Self::ENV_CONFIG_PATH, defaults.config_path);
        let active_model = Self::parse_optional_string_from_env(Self::ENV_ACTIVE_MODEL);
        let encoder_path = Self::parse_optional_path_from_env(Self::ENV_ENCODER_PATH);
        let max_batch = Self::parse_max_batch_from_env(defaults.max_batch)?;

        Ok(Self {
            port,
            bind_addr,
            config_path,
            active_model,
            encoder_path,
            max_batch,
        })
    }

    /// Validates paths and basic invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.config_path.exists() {
            return Err(ConfigError::PathNotFound {
                path: self.config_path.clone(),
            });
        }
        if !self.config_path.is_file() {
            return Err(ConfigError::NotAFile {
                path: self.config_path.clone(),
            });
        }

        if let Some(ref path) = self.encoder_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        if self.max_batch == 0 {
            return Err(ConfigError::InvalidMaxBatch {
                value: self.max_batch.to_string(),
            });
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_max_batch_from_env(default: usize) -> Result<usize, ConfigError> {
        match env::var(Self::ENV_MAX_BATCH) {
            Ok(value) => match value.trim().parse::<usize>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(ConfigError::InvalidMaxBatch { value }),
            },
            Err(_) => Ok(default),
        }
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name).map(PathBuf::from).unwrap_or(default)
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        Self::parse_optional_string_from_env(var_name).map(PathBuf::from)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}
