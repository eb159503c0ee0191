use crate::scheduler::JobKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Admin API configuration
    pub server: ServerConfig,

    /// Settings store configuration
    pub settings: SettingsConfig,

    /// Check endpoint configuration
    #[serde(default)]
    pub checks: ChecksConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path = std::env::var("CONFIG_PATH")
            .unwrap_or_else(|_| "config/isp-monitor.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: ISP_MONITOR__)
            .add_source(
                config::Environment::with_prefix("ISP_MONITOR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Admin API host
    #[serde(default = "default_host")]
    pub host: String,

    /// Admin API port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// JSON settings file shared with the ISP application
    #[serde(default = "default_settings_path")]
    pub path: PathBuf,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: default_settings_path(),
        }
    }
}

/// Endpoints of the host application that perform the actual checks.
/// Kinds without a URL run a no-op check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecksConfig {
    /// Request timeout (seconds)
    #[serde(default = "default_check_timeout")]
    pub timeout_secs: u64,

    pub signal_warning_url: Option<String>,
    pub signal_recap_url: Option<String>,
    pub offline_check_url: Option<String>,
}

impl ChecksConfig {
    pub fn url(&self, kind: JobKind) -> Option<&str> {
        match kind {
            JobKind::SignalWarning => self.signal_warning_url.as_deref(),
            JobKind::SignalRecap => self.signal_recap_url.as_deref(),
            JobKind::OfflineCheck => self.offline_check_url.as_deref(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_check_timeout(),
            signal_warning_url: None,
            signal_recap_url: None,
            offline_check_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            prometheus_enabled: true,
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8085
}

fn default_settings_path() -> PathBuf {
    PathBuf::from("data/settings.json")
}

fn default_check_timeout() -> u64 {
    120
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
