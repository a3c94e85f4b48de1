//! Password hashing delegate.
//!
//! postadm never hashes passwords itself. Plain passwords are handed to an
//! external utility (dovecot's `doveadm pw` by default) whose output is the
//! prefixed `{SCHEME}hash` string stored in the directory.

use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::PasswordConfig;
use crate::{PostadmError, Result};

/// Placeholder in configured arguments replaced by the scheme name.
pub const SCHEME_PLACEHOLDER: &str = "{scheme}";

/// Produces prefixed password hashes.
pub trait PasswordHasher {
    /// Hash a plain password into `{SCHEME}hash` form.
    fn hash(&self, password: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Split a prefixed hash into `(scheme, hash)`.
///
/// ```
/// use postadm::password::split_prefixed_hash;
///
/// assert_eq!(split_prefixed_hash("{CRAM-MD5}abc"), Some(("CRAM-MD5", "abc")));
/// assert_eq!(split_prefixed_hash("abc"), None);
/// ```
pub fn split_prefixed_hash(value: &str) -> Option<(&str, &str)> {
    let rest = value.strip_prefix('{')?;
    let (scheme, hash) = rest.split_once('}')?;
    let scheme_ok = !scheme.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_');
    if !scheme_ok || hash.is_empty() || hash.chars().any(char::is_whitespace) {
        return None;
    }
    Some((scheme, hash))
}

/// Hasher that runs an external command with a bounded timeout.
///
/// The password is written twice on stdin (entry and confirmation), and the
/// first line of stdout must be a `{SCHEME}hash` for the configured scheme.
#[derive(Debug, Clone)]
pub struct CommandHasher {
    command: String,
    args: Vec<String>,
    scheme: String,
    timeout: Duration,
}

impl CommandHasher {
    /// Create a hasher.
    pub fn new(
        command: impl Into<String>,
        args: Vec<String>,
        scheme: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            args,
            scheme: scheme.into(),
            timeout,
        }
    }

    /// Create a hasher from the `[password]` configuration.
    pub fn from_config(config: &PasswordConfig) -> Self {
        Self::new(
            config.command.clone(),
            config.args.clone(),
            config.scheme.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Configured scheme name.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Arguments with the scheme placeholder expanded.
    fn expanded_args(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace(SCHEME_PLACEHOLDER, &self.scheme))
            .collect()
    }

    async fn run(&self, password: &str) -> Result<String> {
        let mut child = Command::new(&self.command)
            .args(self.expanded_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                PostadmError::DependencyFailure(format!("failed to run {}: {e}", self.command))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            let input = format!("{password}\n{password}\n");
            // A command that exits without reading is judged by its status below.
            if let Err(e) = stdin.write_all(input.as_bytes()).await {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(PostadmError::DependencyFailure(format!(
                        "failed to write to {}: {e}",
                        self.command
                    )));
                }
            }
        }

        let output = child.wait_with_output().await.map_err(|e| {
            PostadmError::DependencyFailure(format!("failed to wait for {}: {e}", self.command))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PostadmError::DependencyFailure(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = stdout.lines().next().unwrap_or("").trim();
        match split_prefixed_hash(line) {
            Some((scheme, _)) if scheme.eq_ignore_ascii_case(&self.scheme) => Ok(line.to_string()),
            _ => Err(PostadmError::DependencyFailure(format!(
                "{} returned an unexpected hash for scheme {}",
                self.command, self.scheme
            ))),
        }
    }
}

impl PasswordHasher for CommandHasher {
    fn hash(&self, password: &str) -> impl Future<Output = Result<String>> + Send {
        async move {
            debug!(command = %self.command, scheme = %self.scheme, "hashing password");
            match tokio::time::timeout(self.timeout, self.run(password)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(command = %self.command, "password hashing timed out");
                    Err(PostadmError::DependencyFailure(format!(
                        "{} timed out after {}s",
                        self.command,
                        self.timeout.as_secs_f64()
                    )))
                }
            }
        }
    }
}
