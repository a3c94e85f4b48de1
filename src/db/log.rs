//! Audit log repository.

use super::DbConn;
use crate::error::PostadmError;
use crate::model::{LogEntry, NewLogEntry};
use crate::Result;

const SELECT_LOG: &str = "SELECT id, timestamp, username, domain, action, data FROM log";

/// Repository for the append-only `log` table.
pub struct LogRepository<'c> {
    conn: &'c mut DbConn,
}

impl<'c> LogRepository<'c> {
    /// Create a repository over a connection or transaction.
    pub fn new(conn: &'c mut DbConn) -> Self {
        Self { conn }
    }

    /// Append an entry stamped with `timestamp`. Returns the new row id.
    pub async fn append(&mut self, timestamp: &str, entry: &NewLogEntry) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO log (timestamp, username, domain, action, data)
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(timestamp)
        .bind(&entry.username)
        .bind(&entry.domain)
        .bind(entry.action.as_str())
        .bind(&entry.data)
        .fetch_one(&mut *self.conn)
        .await
        .map_err(|e| PostadmError::Database(e.to_string()))?;
        Ok(id)
    }

    /// Most recent entries, newest first, optionally for one domain.
    pub async fn recent(&mut self, domain: Option<&str>, limit: i64) -> Result<Vec<LogEntry>> {
        let entries: std::result::Result<Vec<LogEntry>, sqlx::Error> = match domain {
            Some(domain) => {
                sqlx::query_as(&format!(
                    "{SELECT_LOG} WHERE domain = $1 ORDER BY id DESC LIMIT $2"
                ))
                .bind(domain)
                .bind(limit)
                .fetch_all(&mut *self.conn)
                .await
            }
            None => {
                sqlx::query_as(&format!("{SELECT_LOG} ORDER BY id DESC LIMIT $1"))
                    .bind(limit)
                    .fetch_all(&mut *self.conn)
                    .await
            }
        };
        entries.map_err(|e| PostadmError::Database(e.to_string()))
    }

    /// Total number of entries.
    pub async fn count(&mut self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM log")
            .fetch_one(&mut *self.conn)
            .await
            .map_err(|e| PostadmError::Database(e.to_string()))?;
        Ok(count.0)
    }
}
