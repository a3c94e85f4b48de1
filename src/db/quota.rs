//! Quota usage repository.
//!
//! The `quota2` table belongs to the delivery agent; postadm only reads it.

use super::DbConn;
use crate::error::PostadmError;
use crate::model::QuotaUsage;
use crate::Result;

/// Read-only repository for `quota2` rows.
pub struct QuotaRepository<'c> {
    conn: &'c mut DbConn,
}

impl<'c> QuotaRepository<'c> {
    /// Create a repository over a connection or transaction.
    pub fn new(conn: &'c mut DbConn) -> Self {
        Self { conn }
    }

    /// Usage reported for one mailbox, if any.
    pub async fn find(&mut self, username: &str) -> Result<Option<QuotaUsage>> {
        sqlx::query_as("SELECT username, bytes, messages FROM quota2 WHERE username = $1")
            .bind(username)
            .fetch_optional(&mut *self.conn)
            .await
            .map_err(|e| PostadmError::Database(e.to_string()))
    }

    /// Usage for every mailbox of a domain, zero for unreported mailboxes.
    pub async fn list_by_domain(&mut self, domain: &str) -> Result<Vec<QuotaUsage>> {
        sqlx::query_as(
            "SELECT m.username AS username,
                    COALESCE(q.bytes, 0) AS bytes,
                    COALESCE(q.messages, 0) AS messages
             FROM mailbox m LEFT JOIN quota2 q ON q.username = m.username
             WHERE m.domain = $1
             ORDER BY m.username",
        )
        .bind(domain)
        .fetch_all(&mut *self.conn)
        .await
        .map_err(|e| PostadmError::Database(e.to_string()))
    }
}
