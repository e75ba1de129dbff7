//! Relay configuration.
//!
//! Loaded from a TOML file at startup. Every field has a default, so the
//! relay runs without any configuration file.

use crate::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file '{path}' is not readable: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config in '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub http: HttpConfig,
    pub logging: LoggingConfig,
    pub websocket: TransportConfig,
    pub signaling: SignalingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".into(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `trace`, `debug`, `info`, `warn` or `error`. `RUST_LOG` wins when set.
    pub level: String,
    /// `text` or `json`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalingConfig {
    /// Pause before announcing a new connection to the rest of the room.
    pub user_join_delay_ms: u64,
    /// Upper bound for one delivery to one recipient. Unset means no bound.
    pub delivery_timeout_ms: Option<u64>,
}

impl SignalingConfig {
    pub fn user_join_delay(&self) -> Duration {
        Duration::from_millis(self.user_join_delay_ms)
    }

    pub fn delivery_timeout(&self) -> Option<Duration> {
        self.delivery_timeout_ms.map(Duration::from_millis)
    }
}

impl RelayConfig {
    /// Read and validate the file at `path`.
    ///
    /// `Ok(None)` means the file does not exist; the caller decides whether
    /// defaults apply and reports it once logging is up.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>, ConfigError> {
        let path = path.as_ref();

        let config: Self = match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        config.validate()?;
        Ok(Some(config))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(ConfigError::Invalid {
                field: "logging.format",
                reason: format!("expected 'text' or 'json', got '{}'", self.logging.format),
            });
        }

        let ws = &self.websocket;
        if ws.ping_period_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "websocket.ping_period_secs",
                reason: "must be greater than zero".into(),
            });
        }
        if ws.ping_period_secs >= ws.pong_wait_secs {
            return Err(ConfigError::Invalid {
                field: "websocket.ping_period_secs",
                reason: format!(
                    "must be shorter than pong_wait_secs ({})",
                    ws.pong_wait_secs
                ),
            });
        }
        if ws.max_message_size == 0 {
            return Err(ConfigError::Invalid {
                field: "websocket.max_message_size",
                reason: "must be greater than zero".into(),
            });
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.http.bind_address, self.http.port)
    }
}
