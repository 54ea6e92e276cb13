//! Server configuration.

use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum request body size in bytes.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,

    /// Requests allowed per client per window.
    #[serde(default = "default_rate_limit_requests")]
    pub rate_limit_requests: usize,

    /// Rate limit window in seconds.
    #[serde(default = "default_rate_limit_window")]
    pub rate_limit_window_seconds: u64,

    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Mapping time-to-live in seconds. Unset disables expiry.
    #[serde(default = "default_mapping_ttl")]
    pub mapping_ttl_seconds: Option<u64>,

    /// Interval between in-memory expiry sweeps, in seconds.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_seconds: u64,

    /// Secret for deterministic replacements. Required, never logged.
    pub deterministic_secret: String,

    /// Redis connection URL. Unset selects the in-memory store.
    pub redis_url: Option<String>,

    /// Telemetry configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Telemetry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (json, pretty).
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_payload_bytes() -> usize {
    1024 * 1024 // 1MB
}

fn default_rate_limit_requests() -> usize {
    120
}

fn default_rate_limit_window() -> u64 {
    60 // seconds
}

fn default_request_timeout() -> u64 {
    15 // seconds
}

fn default_mapping_ttl() -> Option<u64> {
    Some(86_400) // 24 hours
}

fn default_cleanup_interval() -> u64 {
    300 // seconds
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl ServerConfig {
    /// Loads configuration from files and environment.
    pub fn load() -> Result<Self> {
        let config = Config::builder()
            // Load from config files
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables
            .add_source(
                Environment::with_prefix("NETREDACT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let server_config: ServerConfig = config.try_deserialize()?;
        server_config.validate()?;

        Ok(server_config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("Invalid port: 0");
        }

        if self.deterministic_secret.len() < 32 {
            anyhow::bail!("deterministic_secret must be at least 32 bytes");
        }

        if !(1024..=8 * 1024 * 1024).contains(&self.max_payload_bytes) {
            anyhow::bail!(
                "max_payload_bytes must be between 1024 and 8388608, got {}",
                self.max_payload_bytes
            );
        }

        if self.rate_limit_requests == 0 {
            anyhow::bail!("rate_limit_requests must be at least 1");
        }

        if self.rate_limit_window_seconds == 0 {
            anyhow::bail!("rate_limit_window_seconds must be at least 1");
        }

        if self.request_timeout_seconds == 0 {
            anyhow::bail!("request_timeout_seconds must be at least 1");
        }

        if let Some(ttl) = self.mapping_ttl_seconds {
            if ttl < 60 {
                anyhow::bail!("mapping_ttl_seconds must be at least 60, got {}", ttl);
            }
        }

        if self.cleanup_interval_seconds < 30 {
            anyhow::bail!(
                "cleanup_interval_seconds must be at least 30, got {}",
                self.cleanup_interval_seconds
            );
        }

        Ok(())
    }
}
