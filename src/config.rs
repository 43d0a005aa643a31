//! Configuration management for recon-agent
//!
//! Configuration is loaded from `./config/recon-agent.toml` (or `--config`).
//! No hardcoded defaults exist in source code - all defaults are in the config template.

use serde::Deserialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration file path relative to working directory
pub const CONFIG_PATH: &str = "./config/recon-agent.toml";

/// Default configuration file content - this is the ONLY place defaults exist
pub const DEFAULT_CONFIG: &str = include_str!("../config/recon-agent.toml");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found at {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid URL in '{field}': {url}")]
    InvalidUrl { field: String, url: String },

    #[error("Invalid port in '{field}': {port}")]
    InvalidPort { field: String, port: u16 },

    #[error("Configuration field '{field}' cannot be empty")]
    EmptyRequired { field: String },
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub browser: BrowserConfig,
    pub probe: ProbeConfig,
    pub enrichment: EnrichmentConfig,
    pub agent: AgentConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Headless browser configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    /// Seconds to wait after navigation before capturing the rendered DOM
    pub settle_delay_secs: u64,
    #[serde(default = "default_sandbox")]
    pub sandbox: bool,
}

fn default_sandbox() -> bool {
    true
}

/// Port probe configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    pub ports: Vec<u16>,
    pub connect_timeout_ms: u64,
}

impl ProbeConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Knowledge-base enrichment configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentConfig {
    /// Page URL prefix; the canonical company key is appended
    pub base_url: String,
    pub key_separator: String,
}

/// Session log output format
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable block per session
    Text,
    /// One JSON object per line
    Jsonl,
}

/// Agent loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    pub interval_secs: u64,
    pub session_log_path: PathBuf,
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

fn default_log_format() -> LogFormat {
    LogFormat::Text
}

impl AgentConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl AppConfig {
    /// Load configuration from the default path, falling back to the bundled template
    pub fn load() -> Result<Self, ConfigError> {
        match Self::load_from_path(Path::new(CONFIG_PATH)) {
            Err(ConfigError::FileNotFound(_)) => Self::embedded(),
            other => other,
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate the bundled default configuration
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_toml(DEFAULT_CONFIG)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.user_agent.trim().is_empty() {
            return Err(ConfigError::EmptyRequired {
                field: "http.user_agent".to_string(),
            });
        }
        if self.http.request_timeout_secs == 0 {
            return Err(ConfigError::EmptyRequired {
                field: "http.request_timeout_secs".to_string(),
            });
        }

        if self.probe.ports.is_empty() {
            return Err(ConfigError::EmptyRequired {
                field: "probe.ports".to_string(),
            });
        }
        for (i, port) in self.probe.ports.iter().enumerate() {
            if *port == 0 {
                return Err(ConfigError::InvalidPort {
                    field: format!("probe.ports[{}]", i),
                    port: *port,
                });
            }
        }
        if self.probe.connect_timeout_ms == 0 {
            return Err(ConfigError::EmptyRequired {
                field: "probe.connect_timeout_ms".to_string(),
            });
        }

        let base = &self.enrichment.base_url;
        if !(base.starts_with("https://") || base.starts_with("http://")) {
            return Err(ConfigError::InvalidUrl {
                field: "enrichment.base_url".to_string(),
                url: base.clone(),
            });
        }

        if self.agent.interval_secs == 0 {
            return Err(ConfigError::EmptyRequired {
                field: "agent.interval_secs".to_string(),
            });
        }
        if self.agent.session_log_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyRequired {
                field: "agent.session_log_path".to_string(),
            });
        }

        Ok(())
    }

    /// Create default configuration file at the standard location
    pub fn create_default_config() -> Result<PathBuf, ConfigError> {
        let path = Path::new(CONFIG_PATH);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::File::create(path)?;
        file.write_all(DEFAULT_CONFIG.as_bytes())?;

        Ok(path.to_path_buf())
    }
}
