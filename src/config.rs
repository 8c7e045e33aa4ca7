//! Application configuration loaded from TOML
//!
//! Default location: `~/.config/texnouz-ocpp/control.toml`, overridable with
//! the `OCPP_CONTROL_CONFIG` environment variable. Every section is optional.
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [transport]
//! json_response_timeout_secs = 30
//! soap_request_timeout_secs = 60
//! remote_ocpp_url = "ws://ocpp-node:9000/ocpp"
//! central_system_url = "http://central:8080/ocpp/soap"
//!
//! [smart_charging]
//! lock_ttl_secs = 300
//!
//! [[vendors]]
//! vendor = "Acme"
//! static_limit_key = "AcmeMaxAmps"
//! static_limit_scale = "per_connector"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::vendor::{LimitScale, ScheduleShape};

pub const CONFIG_ENV: &str = "OCPP_CONTROL_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub transport: TransportConfig,
    pub smart_charging: SmartChargingConfig,
    pub vendors: Vec<VendorOverride>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, `RUST_LOG` wins when set.
    pub level: String,
    /// `text` or `json`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub json_response_timeout_secs: u64,
    pub soap_request_timeout_secs: u64,
    /// Base websocket URL of the OCPP server node used when a JSON station
    /// has no live session in this process.
    pub remote_ocpp_url: Option<String>,
    /// Our own SOAP address, sent as `From` in OCPP-S envelopes.
    pub central_system_url: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            json_response_timeout_secs: 30,
            soap_request_timeout_secs: 60,
            remote_ocpp_url: None,
            central_system_url: "http://localhost:8080/ocpp/soap".to_string(),
        }
    }
}

impl TransportConfig {
    pub fn json_response_timeout(&self) -> Duration {
        Duration::from_secs(self.json_response_timeout_secs)
    }

    pub fn soap_request_timeout(&self) -> Duration {
        Duration::from_secs(self.soap_request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartChargingConfig {
    pub lock_ttl_secs: u64,
}

impl Default for SmartChargingConfig {
    fn default() -> Self {
        Self { lock_ttl_secs: 300 }
    }
}

impl SmartChargingConfig {
    pub fn lock_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.lock_ttl_secs as i64)
    }
}

/// One row of the vendor override table. Unset fields keep the built-in or
/// default behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorOverride {
    pub vendor: String,
    #[serde(default)]
    pub static_limit_key: Option<String>,
    #[serde(default)]
    pub static_limit_scale: Option<LimitScale>,
    #[serde(default)]
    pub schedule_shape: Option<ScheduleShape>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load from `OCPP_CONTROL_CONFIG` or the default path; a missing file
    /// yields defaults.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_path());
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(&path)
    }
}

pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("texnouz-ocpp")
        .join("control.toml")
}
