//! Configuration for the Arista exporter.

use std::net::SocketAddr;
use std::path::Path;

use arista_eapi::{EapiConfig, EapiError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mapping::{is_valid_metric_name, sanitize_prefix};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] json5::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Invalid eAPI settings: {0}")]
    Eapi(#[from] EapiError),
}

/// Complete exporter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// HTTP endpoint settings.
    #[serde(default)]
    pub web: WebConfig,

    /// Probe metric settings.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Device connection profiles.
    #[serde(default)]
    pub eapi: EapiConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// Address to listen on (default: "0.0.0.0:9465").
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Path of the probe endpoint (default: "/arista").
    #[serde(default = "default_probe_path")]
    pub probe_path: String,

    /// Path of the exporter's own metrics (default: "/metrics").
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
}

fn default_listen() -> String {
    "0.0.0.0:9465".to_string()
}

fn default_probe_path() -> String {
    "/arista".to_string()
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            probe_path: default_probe_path(),
            metrics_path: default_metrics_path(),
        }
    }
}

/// Probe metric naming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Metric name prefix (default: "arista").
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_prefix() -> String {
    "arista".to_string()
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format: "text" or "json".
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Paths served by the router regardless of configuration.
const RESERVED_PATHS: [&str; 2] = ["/", "/health"];

impl ExporterConfig {
    /// Load configuration from a JSON5 file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: ExporterConfig = json5::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parsed listen address.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.web.listen.parse().map_err(|_| {
            ConfigError::Validation(format!("Invalid listen address: {}", self.web.listen))
        })
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listen_addr()?;

        for (name, path) in [
            ("Probe path", &self.web.probe_path),
            ("Metrics path", &self.web.metrics_path),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::Validation(format!(
                    "{} must start with /",
                    name
                )));
            }
            if RESERVED_PATHS.contains(&path.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "{} must not be {}",
                    name, path
                )));
            }
        }

        if self.web.probe_path == self.web.metrics_path {
            return Err(ConfigError::Validation(
                "Probe path and metrics path must differ".to_string(),
            ));
        }

        let prefix = &self.metrics.prefix;
        if prefix.is_empty() {
            return Err(ConfigError::Validation(
                "Metric prefix must not be empty".to_string(),
            ));
        }
        if !is_valid_metric_name(prefix) {
            let suggestion = sanitize_prefix(prefix);
            let message = if suggestion.is_empty() {
                format!("Invalid metric prefix {:?}", prefix)
            } else {
                format!("Invalid metric prefix {:?} (try {:?})", prefix, suggestion)
            };
            return Err(ConfigError::Validation(message));
        }

        self.eapi.validate()?;

        Ok(())
    }
}
