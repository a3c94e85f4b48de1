//! Configuration module for postadm.

use serde::Deserialize;
use std::path::Path;

use crate::model::{Limit, MAX_QUOTA_MB};
use crate::{PostadmError, Result};

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/postadm.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/postadm.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Limits applied to newly added domains.
///
/// Values follow the limit convention: 0 = unlimited, -1 = disabled.
#[derive(Debug, Clone, Deserialize)]
pub struct DomainDefaultsConfig {
    /// Maximum number of pure aliases.
    #[serde(default = "default_domain_limit")]
    pub aliases: i64,
    /// Maximum number of mailboxes.
    #[serde(default = "default_domain_limit")]
    pub mailboxes: i64,
    /// Maximum quota per mailbox in MB.
    #[serde(default = "default_domain_limit")]
    pub maxquota: i64,
}

fn default_domain_limit() -> i64 {
    10
}

impl Default for DomainDefaultsConfig {
    fn default() -> Self {
        Self {
            aliases: default_domain_limit(),
            mailboxes: default_domain_limit(),
            maxquota: default_domain_limit(),
        }
    }
}

/// Mailbox configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MailboxConfig {
    /// Quota in MB given to accounts added without an explicit quota.
    #[serde(default = "default_mailbox_quota")]
    pub default_quota: i64,
}

fn default_mailbox_quota() -> i64 {
    10
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            default_quota: default_mailbox_quota(),
        }
    }
}

/// External password hashing command configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    /// Program to run.
    #[serde(default = "default_password_command")]
    pub command: String,
    /// Program arguments. `{scheme}` is replaced by the scheme name.
    #[serde(default = "default_password_args")]
    pub args: Vec<String>,
    /// Hash scheme name (e.g. "CRAM-MD5", "BLF-CRYPT").
    #[serde(default = "default_password_scheme")]
    pub scheme: String,
    /// Maximum time to wait for the command, in seconds.
    #[serde(default = "default_password_timeout")]
    pub timeout_secs: u64,
}

fn default_password_command() -> String {
    "doveadm".to_string()
}

fn default_password_args() -> Vec<String> {
    vec!["pw".to_string(), "-s".to_string(), "{scheme}".to_string()]
}

fn default_password_scheme() -> String {
    "CRAM-MD5".to_string()
}

fn default_password_timeout() -> u64 {
    5
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            command: default_password_command(),
            args: default_password_args(),
            scheme: default_password_scheme(),
            timeout_secs: default_password_timeout(),
        }
    }
}

/// Storage schema options.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaConfig {
    /// Keep the native `admin.superadmin` column in sync with the ALL grant.
    #[serde(default = "default_superadmin_flag")]
    pub superadmin_flag: bool,
}

fn default_superadmin_flag() -> bool {
    true
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            superadmin_flag: default_superadmin_flag(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Defaults for new domains.
    #[serde(default)]
    pub domain_defaults: DomainDefaultsConfig,
    /// Mailbox configuration.
    #[serde(default)]
    pub mailbox: MailboxConfig,
    /// Password hashing configuration.
    #[serde(default)]
    pub password: PasswordConfig,
    /// Schema options.
    #[serde(default)]
    pub schema: SchemaConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(PostadmError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| PostadmError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `POSTADM_DATABASE_PATH`: Override the database path
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("POSTADM_DATABASE_PATH") {
            if !path.is_empty() {
                self.database.path = path;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let defaults = &self.domain_defaults;
        for (name, value) in [
            ("domain_defaults.aliases", defaults.aliases),
            ("domain_defaults.mailboxes", defaults.mailboxes),
            ("domain_defaults.maxquota", defaults.maxquota),
            ("mailbox.default_quota", self.mailbox.default_quota),
        ] {
            if !Limit::is_valid_raw(value) {
                return Err(PostadmError::Config(format!(
                    "{name} must be -1, 0 or a positive number"
                )));
            }
        }
        if self.mailbox.default_quota > MAX_QUOTA_MB {
            return Err(PostadmError::Config(format!(
                "mailbox.default_quota must not exceed {MAX_QUOTA_MB} MB"
            )));
        }
        crate::logging::parse_level(&self.logging.level)?;
        if self.password.command.trim().is_empty() {
            return Err(PostadmError::Config(
                "password.command must not be empty".to_string(),
            ));
        }
        if self.password.scheme.trim().is_empty() {
            return Err(PostadmError::Config(
                "password.scheme must not be empty".to_string(),
            ));
        }
        if self.password.timeout_secs == 0 {
            return Err(PostadmError::Config(
                "password.timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
