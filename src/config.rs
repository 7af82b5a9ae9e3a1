//! Configuration parsing and management

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::policy::write_guard::GMAIL_API_PREFIX;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Domain allow-list settings
    #[serde(default)]
    pub allowlist: AllowlistConfig,

    /// Gmail write guard settings
    #[serde(default)]
    pub write_guard: WriteGuardConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the allow-list comes from and whether it follows changes
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AllowlistConfig {
    /// CSV file with a `domain` column
    #[serde(default = "default_domains_file")]
    pub domains_file: PathBuf,

    /// Reload when the file changes or on SIGHUP
    #[serde(default = "default_true")]
    pub watch: bool,
}

impl Default for AllowlistConfig {
    fn default() -> Self {
        Self {
            domains_file: default_domains_file(),
            watch: true,
        }
    }
}

fn default_domains_file() -> PathBuf {
    PathBuf::from("allowed_domains.csv")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WriteGuardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Path prefix the rule table is anchored under
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
}

impl Default for WriteGuardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_prefix: default_api_prefix(),
        }
    }
}

fn default_api_prefix() -> String {
    GMAIL_API_PREFIX.to_string()
}

/// Line format of the audit log file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditFormat {
    /// `<timestamp> - ALLOWED: GET https://...`
    #[default]
    Text,
    /// One JSON object per line
    Jsonl,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,

    /// Whether to log allowed requests
    pub log_allowed_requests: bool,

    /// Whether to log blocked requests
    pub log_blocked_requests: bool,

    /// Path of the audit log file, if any
    pub audit_log: Option<PathBuf>,

    pub audit_format: AuditFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_allowed_requests: true,
            log_blocked_requests: true,
            audit_log: None,
            audit_format: AuditFormat::Text,
        }
    }
}

/// Helper for deserializing `log_requests` as either a bool or a table.
#[derive(Deserialize)]
#[serde(untagged)]
enum LogRequestsValue {
    Bool(bool),
    Table {
        #[serde(default = "default_true")]
        allowed: bool,
        #[serde(default = "default_true")]
        blocked: bool,
    },
}

fn default_true() -> bool {
    true
}

/// Raw helper struct for deserializing LoggingConfig from TOML.
#[derive(Deserialize)]
struct LoggingConfigRaw {
    #[serde(default = "default_log_level")]
    level: String,
    #[serde(default)]
    log_requests: Option<LogRequestsValue>,
    #[serde(default)]
    audit_log: Option<PathBuf>,
    #[serde(default)]
    audit_format: AuditFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl<'de> Deserialize<'de> for LoggingConfig {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = LoggingConfigRaw::deserialize(deserializer)?;
        let (log_allowed, log_blocked) = match raw.log_requests {
            None => (true, true),
            Some(LogRequestsValue::Bool(b)) => (b, b),
            Some(LogRequestsValue::Table { allowed, blocked }) => (allowed, blocked),
        };
        Ok(LoggingConfig {
            level: raw.level,
            log_allowed_requests: log_allowed,
            log_blocked_requests: log_blocked,
            audit_log: raw.audit_log,
            audit_format: raw.audit_format,
        })
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::config(format!("Invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.allowlist.domains_file.as_os_str().is_empty() {
            return Err(Error::config("allowlist.domains_file must not be empty"));
        }

        let prefix = &self.write_guard.api_prefix;
        if !prefix.is_empty() && (!prefix.starts_with('/') || prefix.ends_with('/')) {
            return Err(Error::config(format!(
                "write_guard.api_prefix {:?} must start with '/' and not end with '/'",
                prefix
            )));
        }

        Ok(())
    }
}
