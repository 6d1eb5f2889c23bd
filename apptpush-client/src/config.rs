//! Client configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (`--config` / APPTPUSH_CONFIG in the binary)
//! 3. Environment variables

use apptpush_protocol::{ACCEPT_VERSION, DEFAULT_HEART_BEAT_MS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// WebSocket endpoint configuration.
    pub endpoint: EndpointConfig,
    /// STOMP handshake configuration.
    pub stomp: StompConfig,
}

impl Config {
    /// Loads `path` (or the defaults when `None`), then applies environment
    /// variable overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    fn load_with(
        path: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(lookup);
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        self.endpoint.apply_overrides(&lookup);
        self.stomp.apply_overrides(&lookup);
    }

    /// Checks values that would make every connection attempt fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.endpoint.validate()
    }

    /// Saves configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        Ok(())
    }
}

/// WebSocket endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Endpoint URL (ws:// or wss://).
    pub url: String,
    /// Connection timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8080/ws".to_string(),
            connect_timeout_secs: 10,
        }
    }
}

impl EndpointConfig {
    fn apply_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("APPTPUSH_URL") {
            self.url = url;
        }

        if let Some(timeout) = lookup("APPTPUSH_CONNECT_TIMEOUT") {
            if let Ok(secs) = timeout.parse() {
                self.connect_timeout_secs = secs;
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let scheme = self.url.split_once("://").map(|(scheme, _)| scheme);
        if !matches!(scheme, Some("ws") | Some("wss")) {
            return Err(ConfigError::ValidationError(format!(
                "endpoint.url must use ws:// or wss://, got '{}'",
                self.url
            )));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "endpoint.connect_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns connect timeout as Duration.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// STOMP handshake configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StompConfig {
    /// Value of the `accept-version` header.
    pub accept_version: String,
    /// Outgoing heart-beat interval we advertise, in milliseconds.
    ///
    /// Only advertised: the client never sends heart-beats itself. A broker
    /// that enforces this interval will close the socket, and the session
    /// does not reconnect on its own. Set it to 0 for such brokers.
    pub heart_beat_send_ms: u64,
    /// Incoming heart-beat interval we ask for, in milliseconds.
    pub heart_beat_receive_ms: u64,
}

impl Default for StompConfig {
    fn default() -> Self {
        Self {
            accept_version: ACCEPT_VERSION.to_string(),
            heart_beat_send_ms: DEFAULT_HEART_BEAT_MS,
            heart_beat_receive_ms: DEFAULT_HEART_BEAT_MS,
        }
    }
}

impl StompConfig {
    fn apply_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        if let Some(version) = lookup("APPTPUSH_ACCEPT_VERSION") {
            self.accept_version = version;
        }

        // "send,receive" in milliseconds
        if let Some(heart_beat) = lookup("APPTPUSH_HEART_BEAT") {
            if let Some((send, receive)) = heart_beat.split_once(',') {
                if let (Ok(send), Ok(receive)) = (send.trim().parse(), receive.trim().parse()) {
                    self.heart_beat_send_ms = send;
                    self.heart_beat_receive_ms = receive;
                }
            }
        }
    }

    /// Value of the `heart-beat` header.
    pub fn heart_beat_header(&self) -> String {
        format!("{},{}", self.heart_beat_send_ms, self.heart_beat_receive_ms)
    }
}

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    IoError(PathBuf, std::io::Error),
    ParseError(PathBuf, String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, e) => {
                write!(f, "failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::ValidationError(msg) => {
                write!(f, "configuration validation failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
