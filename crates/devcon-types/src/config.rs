//! Console configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file) yields a working
//! console bound to `127.0.0.1:6001`.

use std::path::Path;

use serde::Deserialize;

use crate::color::Color;
use crate::error::{ConsoleError, Result};

/// Top-level console configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Number of submitted lines kept for Up/Down navigation.
    pub history_capacity: usize,
    /// Display name of the visibility key, shown in the welcome message.
    pub toggle_key_name: String,
    pub network: NetworkConfig,
    pub colors: OutputColors,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            history_capacity: 10,
            toggle_key_name: "Tab".to_string(),
            network: NetworkConfig::default(),
            colors: OutputColors::default(),
        }
    }
}

/// Settings for the network transport.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Serve the console over TCP instead of the local surface.
    pub enabled: bool,
    pub bind_address: String,
    pub port: u16,
    /// Sleep between queue checks on the listener thread.
    pub poll_interval_ms: u64,
    /// Longest accepted input line in bytes.
    pub max_line_len: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_address: "127.0.0.1".to_string(),
            port: 6001,
            poll_interval_ms: 50,
            max_line_len: 1024,
        }
    }
}

impl NetworkConfig {
    /// `address:port` string suitable for `TcpListener::bind`.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Colors used for error, info and warning lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OutputColors {
    pub error: Color,
    pub info: Color,
    pub warning: Color,
}

impl Default for OutputColors {
    fn default() -> Self {
        Self {
            error: Color::RED,
            info: Color::rgb(30, 98, 206),
            warning: Color::rgb(170, 135, 30),
        }
    }
}

impl ConsoleConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("Loaded console config from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.history_capacity == 0 {
            return Err(ConsoleError::Config(
                "history_capacity must be at least 1".to_string(),
            ));
        }
        if self.network.max_line_len == 0 {
            return Err(ConsoleError::Config(
                "network.max_line_len must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
