//! Logging setup for postadm.
//!
//! Committed lifecycle operations log at `info`. The log file is appended to,
//! so it keeps a trail across runs next to the `log` table.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::{PostadmError, Result};

/// Parse a configured level name.
pub fn parse_level(level: &str) -> Result<Level> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(PostadmError::Config(format!("unknown log level '{other}'"))),
    }
}

/// `RUST_LOG` wins; otherwise postadm logs at `level` and sqlx only warns.
fn build_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level.as_str().to_ascii_lowercase();
        EnvFilter::new(format!("postadm={level},sqlx=warn"))
    })
}

/// Initialize logging to stdout and the configured log file.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let level = parse_level(&config.level)?;

    if let Some(parent) = Path::new(&config.file).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.file)?;
    let writer = std::io::stdout.and(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .with(build_filter(level))
        .try_init()
        .map_err(|e| PostadmError::Config(format!("logging already initialized: {e}")))
}

/// Initialize stderr-only logging. An unknown level falls back to `info`.
pub fn init_console_only(level: &str) {
    let level = parse_level(level).unwrap_or(Level::INFO);

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .with(build_filter(level))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace").unwrap(), Level::TRACE);
        assert_eq!(parse_level(" DEBUG ").unwrap(), Level::DEBUG);
        assert_eq!(parse_level("warning").unwrap(), Level::WARN);
        assert_eq!(parse_level("ERROR").unwrap(), Level::ERROR);
    }

    #[test]
    fn test_parse_level_rejects_unknown() {
        assert!(matches!(parse_level("verbose"), Err(PostadmError::Config(_))));
        assert!(parse_level("").is_err());
    }

    #[test]
    fn test_init_appends_to_existing_log_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("postadm.log");
        fs::write(&file, "earlier run\n").unwrap();

        let config = LoggingConfig {
            level: "debug".to_string(),
            file: file.to_string_lossy().into_owned(),
        };
        init(&config).unwrap();
        tracing::info!("directory opened");

        let contents = fs::read_to_string(&file).unwrap();
        assert!(contents.starts_with("earlier run\n"));
        assert!(contents.contains("directory opened"));
    }

    #[test]
    fn test_init_rejects_unknown_level() {
        let temp_dir = TempDir::new().unwrap();
        let config = LoggingConfig {
            level: "loud".to_string(),
            file: temp_dir
                .path()
                .join("postadm.log")
                .to_string_lossy()
                .into_owned(),
        };
        assert!(init(&config).is_err());
        assert!(!temp_dir.path().join("postadm.log").exists());
    }
}
