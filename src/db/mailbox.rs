//! Mailbox repository.

use sqlx::{QueryBuilder, Sqlite};

use super::DbConn;
use crate::error::{Entity, PostadmError};
use crate::model::limit::limit_to_storage_units;
use crate::model::{Limit, Mailbox, MailboxUpdate, NewMailbox};
use crate::Result;

const SELECT_MAILBOX: &str = "SELECT username, password, name, maildir, quota, local_part, domain,
        created, modified, active
 FROM mailbox";

/// Repository for mailbox rows.
///
/// Quotas cross this boundary in MB and are stored in storage units.
pub struct MailboxRepository<'c> {
    conn: &'c mut DbConn,
}

impl<'c> MailboxRepository<'c> {
    /// Create a repository over a connection or transaction.
    pub fn new(conn: &'c mut DbConn) -> Self {
        Self { conn }
    }

    /// Check whether a mailbox exists.
    pub async fn exists(&mut self, username: &str) -> Result<bool> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM mailbox WHERE username = $1)")
                .bind(username)
                .fetch_one(&mut *self.conn)
                .await
                .map_err(|e| PostadmError::Database(e.to_string()))?;
        Ok(exists.0)
    }

    /// Get a mailbox by address.
    pub async fn find(&mut self, username: &str) -> Result<Option<Mailbox>> {
        sqlx::query_as(&format!("{SELECT_MAILBOX} WHERE username = $1"))
            .bind(username)
            .fetch_optional(&mut *self.conn)
            .await
            .map_err(|e| PostadmError::Database(e.to_string()))
    }

    /// Insert a validated mailbox draft.
    pub async fn create(&mut self, new_mailbox: &NewMailbox) -> Result<Mailbox> {
        sqlx::query(
            "INSERT INTO mailbox (username, password, name, maildir, quota, local_part, domain, active)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(&new_mailbox.username)
        .bind(&new_mailbox.password)
        .bind(&new_mailbox.name)
        .bind(new_mailbox.maildir())
        .bind(storage_quota(new_mailbox.quota_limit())?)
        .bind(&new_mailbox.local_part)
        .bind(&new_mailbox.domain)
        .bind(new_mailbox.active)
        .execute(&mut *self.conn)
        .await
        .map_err(|e| PostadmError::from_insert(Entity::Mailbox, &new_mailbox.username, e))?;

        self.find(&new_mailbox.username)
            .await?
            .ok_or_else(|| PostadmError::not_found(Entity::Mailbox, &new_mailbox.username))
    }

    /// Update a mailbox's mutable fields.
    ///
    /// Returns the updated mailbox, or None if not found.
    pub async fn update(
        &mut self,
        username: &str,
        update: &MailboxUpdate,
    ) -> Result<Option<Mailbox>> {
        if update.is_empty() {
            return self.find(username).await;
        }

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("UPDATE mailbox SET modified = datetime('now')");

        if let Some(ref password) = update.password {
            query.push(", password = ");
            query.push_bind(password.clone());
        }
        if let Some(ref name) = update.name {
            query.push(", name = ");
            query.push_bind(name.clone());
        }
        if let Some(quota) = update.quota {
            query.push(", quota = ");
            query.push_bind(storage_quota(Limit::from_raw(quota))?);
        }
        if let Some(active) = update.active {
            query.push(", active = ");
            query.push_bind(active);
        }

        query.push(" WHERE username = ");
        query.push_bind(username.to_string());

        let result = query
            .build()
            .execute(&mut *self.conn)
            .await
            .map_err(|e| PostadmError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find(username).await
    }

    /// Delete a mailbox row. Returns true if a row was deleted.
    pub async fn delete(&mut self, username: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM mailbox WHERE username = $1")
            .bind(username)
            .execute(&mut *self.conn)
            .await
            .map_err(|e| PostadmError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Number of mailboxes owned by a domain.
    pub async fn count_by_domain(&mut self, domain: &str) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM mailbox WHERE domain = $1")
            .bind(domain)
            .fetch_one(&mut *self.conn)
            .await
            .map_err(|e| PostadmError::Database(e.to_string()))?;
        Ok(count.0)
    }

    /// Mailboxes owned by a domain, sorted by address.
    pub async fn list_by_domain(&mut self, domain: &str) -> Result<Vec<Mailbox>> {
        sqlx::query_as(&format!(
            "{SELECT_MAILBOX} WHERE domain = $1 ORDER BY username"
        ))
        .bind(domain)
        .fetch_all(&mut *self.conn)
        .await
        .map_err(|e| PostadmError::Database(e.to_string()))
    }
}

/// Stored quota for a whole-MB limit, rejecting values past the storage range.
fn storage_quota(quota: Limit) -> Result<i64> {
    limit_to_storage_units(quota).ok_or_else(|| PostadmError::invalid(Entity::Mailbox, "quota"))
}
