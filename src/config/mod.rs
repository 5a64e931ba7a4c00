//! Configuration management for vulnlens
//!
//! Settings are read from a TOML file, overridden by `VULNLENS_*`
//! environment variables and validated before use.

use crate::error::{Result, VulnError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub server: ServerConfig,
    pub data: DataConfig,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub max_upload_size: String,
    /// Directory holding the browser upload page; an empty path disables it
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("./static")
}

/// Locations of the read-only vulnerability dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Root of the `<year>/<CVE-ID>.json` tree
    pub records_dir: PathBuf,
    /// JSON object mapping advisory IDs to CVE ID lists
    pub advisories_file: PathBuf,
}

impl ServerConfig {
    /// Socket address string for the listener
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    /// Upload limit in bytes
    pub fn max_upload_bytes(&self) -> Result<usize> {
        parse_size(&self.max_upload_size).ok_or_else(|| VulnError::InvalidConfigValue {
            path: "server.max_upload_size".to_string(),
            message: format!("Invalid size format: {}", self.max_upload_size),
        })
    }
}

impl Config {
    /// Load configuration from a file, apply environment overrides and validate
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Parse a configuration file as written, without overrides or validation
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(VulnError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| VulnError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| VulnError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: VULNLENS_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("VULNLENS_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "SERVER__BIND" => {
                self.server.bind = value.to_string();
            }
            "SERVER__PORT" => {
                self.server.port = value.parse().map_err(|_| VulnError::InvalidConfigValue {
                    path: path.to_string(),
                    message: format!("Cannot parse '{}' as a port number", value),
                })?;
            }
            "SERVER__MAX_UPLOAD_SIZE" => {
                self.server.max_upload_size = value.to_string();
            }
            "SERVER__STATIC_DIR" => {
                self.server.static_dir = PathBuf::from(value);
            }
            "DATA__RECORDS_DIR" => {
                self.data.records_dir = PathBuf::from(value);
            }
            "DATA__ADVISORIES_FILE" => {
                self.data.advisories_file = PathBuf::from(value);
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| VulnError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("vulnlens").join("config.toml"))
    }

    /// Copy of the configuration with `~/` expanded in every data path
    pub fn expanded(&self) -> Result<Self> {
        let mut config = self.clone();
        config.data.records_dir = expand_path(&self.data.records_dir)?;
        config.data.advisories_file = expand_path(&self.data.advisories_file)?;
        config.server.static_dir = expand_path(&self.server.static_dir)?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        let records_dir = PathBuf::from("./ssvc.me");

        Self {
            meta: MetaConfig {
                schema_version: "1.0.0".to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            server: ServerConfig {
                bind: "0.0.0.0".to_string(),
                port: 8080,
                max_upload_size: "10MB".to_string(),
                static_dir: default_static_dir(),
            },
            data: DataConfig {
                advisories_file: records_dir.join("rhsa_to_cve.json"),
                records_dir,
            },
        }
    }
}

/// Expand a leading `~/` against the home directory
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    let path_str = path
        .to_str()
        .ok_or_else(|| VulnError::Config("Invalid path encoding".to_string()))?;

    if let Some(stripped) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| VulnError::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(stripped))
    } else {
        Ok(path.to_path_buf())
    }
}

/// Parse size strings like "10MB", "512KB" or "4096" into bytes
pub fn parse_size(s: &str) -> Option<usize> {
    let s = s.trim().to_uppercase();

    // Check two-letter suffixes before the bare "B"
    let (digits, multiplier) = if let Some(n) = s.strip_suffix("GB") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("MB") {
        (n, 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("KB") {
        (n, 1024)
    } else if let Some(n) = s.strip_suffix('B') {
        (n, 1)
    } else {
        (s.as_str(), 1)
    };

    digits
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
}
