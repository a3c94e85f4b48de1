//! Domain admin grant repository.

use super::DbConn;
use crate::error::{Entity, PostadmError};
use crate::model::DomainAdmin;
use crate::Result;

/// Repository for `domain_admins` rows.
pub struct GrantRepository<'c> {
    conn: &'c mut DbConn,
}

impl<'c> GrantRepository<'c> {
    /// Create a repository over a connection or transaction.
    pub fn new(conn: &'c mut DbConn) -> Self {
        Self { conn }
    }

    /// Check whether `username` holds a grant on `domain`.
    pub async fn exists(&mut self, username: &str, domain: &str) -> Result<bool> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM domain_admins WHERE username = $1 AND domain = $2)",
        )
        .bind(username)
        .bind(domain)
        .fetch_one(&mut *self.conn)
        .await
        .map_err(|e| PostadmError::Database(e.to_string()))?;
        Ok(exists.0)
    }

    /// Insert a grant.
    pub async fn create(&mut self, username: &str, domain: &str) -> Result<DomainAdmin> {
        let key = format!("{username} -> {domain}");
        sqlx::query("INSERT INTO domain_admins (username, domain) VALUES ($1, $2)")
            .bind(username)
            .bind(domain)
            .execute(&mut *self.conn)
            .await
            .map_err(|e| PostadmError::from_insert(Entity::Grant, &key, e))?;

        let grant: Option<DomainAdmin> = sqlx::query_as(
            "SELECT username, domain, created, active FROM domain_admins
             WHERE username = $1 AND domain = $2",
        )
        .bind(username)
        .bind(domain)
        .fetch_optional(&mut *self.conn)
        .await
        .map_err(|e| PostadmError::Database(e.to_string()))?;

        grant.ok_or_else(|| PostadmError::not_found(Entity::Grant, key))
    }

    /// Delete one grant. Returns true if a row was deleted.
    pub async fn delete(&mut self, username: &str, domain: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM domain_admins WHERE username = $1 AND domain = $2")
            .bind(username)
            .bind(domain)
            .execute(&mut *self.conn)
            .await
            .map_err(|e| PostadmError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every grant on a domain. Returns the number removed.
    pub async fn delete_by_domain(&mut self, domain: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM domain_admins WHERE domain = $1")
            .bind(domain)
            .execute(&mut *self.conn)
            .await
            .map_err(|e| PostadmError::Database(e.to_string()))?;
        Ok(result.rows_affected())
    }

    /// Delete every grant held by an admin. Returns the number removed.
    pub async fn delete_by_admin(&mut self, username: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM domain_admins WHERE username = $1")
            .bind(username)
            .execute(&mut *self.conn)
            .await
            .map_err(|e| PostadmError::Database(e.to_string()))?;
        Ok(result.rows_affected())
    }

    /// Domains granted to an admin, sorted by name.
    pub async fn domains_for(&mut self, username: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT domain FROM domain_admins WHERE username = $1 ORDER BY domain",
        )
        .bind(username)
        .fetch_all(&mut *self.conn)
        .await
        .map_err(|e| PostadmError::Database(e.to_string()))?;
        Ok(rows.into_iter().map(|(domain,)| domain).collect())
    }

    /// Admins holding a grant on a domain, sorted by name.
    pub async fn admins_for(&mut self, domain: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT username FROM domain_admins WHERE domain = $1 ORDER BY username",
        )
        .bind(domain)
        .fetch_all(&mut *self.conn)
        .await
        .map_err(|e| PostadmError::Database(e.to_string()))?;
        Ok(rows.into_iter().map(|(username,)| username).collect())
    }

    /// Number of grants held by an admin.
    pub async fn count_for_admin(&mut self, username: &str) -> Result<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM domain_admins WHERE username = $1")
                .bind(username)
                .fetch_one(&mut *self.conn)
                .await
                .map_err(|e| PostadmError::Database(e.to_string()))?;
        Ok(count.0)
    }
}
