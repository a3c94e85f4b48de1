//! Audit log.
//!
//! Every committed lifecycle operation appends one entry on its own
//! transaction, so the entry and the mutation commit or roll back together.

use chrono::Utc;
use tracing::debug;

use crate::db::{Database, DbConn, LogRepository};
use crate::model::{Action, LogEntry, NewLogEntry};
use crate::Result;

/// Timestamp format of the `log.timestamp` column.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Current UTC time in the log column format.
pub fn timestamp() -> String {
    Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Append an audit entry. Returns the new entry id.
pub async fn record(
    conn: &mut DbConn,
    actor: &str,
    domain: &str,
    action: Action,
    data: impl Into<String>,
) -> Result<i64> {
    let entry = NewLogEntry {
        username: actor.to_string(),
        domain: domain.to_string(),
        action,
        data: data.into(),
    };
    let id = LogRepository::new(conn)
        .append(&timestamp(), &entry)
        .await?;
    debug!(id, action = %action, domain, "audit entry appended");
    Ok(id)
}

/// Read access to the audit log.
pub struct AuditLog<'a> {
    db: &'a Database,
}

impl<'a> AuditLog<'a> {
    /// Create a reader over the database.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Most recent entries, newest first, optionally for one domain.
    pub async fn recent(&self, domain: Option<&str>, limit: i64) -> Result<Vec<LogEntry>> {
        let mut conn = self.db.acquire().await?;
        LogRepository::new(&mut conn).recent(domain, limit).await
    }

    /// Total number of entries.
    pub async fn count(&self) -> Result<i64> {
        let mut conn = self.db.acquire().await?;
        LogRepository::new(&mut conn).count().await
    }
}
