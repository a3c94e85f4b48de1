//! Alias repository.

use super::DbConn;
use crate::error::{Entity, PostadmError};
use crate::model::{Alias, NewAlias};
use crate::Result;

const SELECT_ALIAS: &str = "SELECT address, goto, domain, created, modified, active FROM alias";

/// Matches alias rows with no mailbox behind them.
const PURE: &str = "NOT EXISTS (SELECT 1 FROM mailbox m WHERE m.username = alias.address)";

/// Repository for alias rows, both pure aliases and mailbox self-aliases.
pub struct AliasRepository<'c> {
    conn: &'c mut DbConn,
}

impl<'c> AliasRepository<'c> {
    /// Create a repository over a connection or transaction.
    pub fn new(conn: &'c mut DbConn) -> Self {
        Self { conn }
    }

    /// Check whether an alias row exists for `address`.
    pub async fn exists(&mut self, address: &str) -> Result<bool> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM alias WHERE address = $1)")
            .bind(address)
            .fetch_one(&mut *self.conn)
            .await
            .map_err(|e| PostadmError::Database(e.to_string()))?;
        Ok(exists.0)
    }

    /// Get an alias by address.
    pub async fn find(&mut self, address: &str) -> Result<Option<Alias>> {
        sqlx::query_as(&format!("{SELECT_ALIAS} WHERE address = $1"))
            .bind(address)
            .fetch_optional(&mut *self.conn)
            .await
            .map_err(|e| PostadmError::Database(e.to_string()))
    }

    /// Insert a validated alias draft.
    pub async fn create(&mut self, new_alias: &NewAlias) -> Result<Alias> {
        sqlx::query("INSERT INTO alias (address, goto, domain, active) VALUES ($1, $2, $3, $4)")
            .bind(&new_alias.address)
            .bind(&new_alias.goto)
            .bind(&new_alias.domain)
            .bind(new_alias.active)
            .execute(&mut *self.conn)
            .await
            .map_err(|e| PostadmError::from_insert(Entity::Alias, &new_alias.address, e))?;

        self.find(&new_alias.address)
            .await?
            .ok_or_else(|| PostadmError::not_found(Entity::Alias, &new_alias.address))
    }

    /// Replace the destination list. Returns true if a row was updated.
    pub async fn set_goto(&mut self, address: &str, goto: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE alias SET goto = $1, modified = datetime('now') WHERE address = $2",
        )
        .bind(goto)
        .bind(address)
        .execute(&mut *self.conn)
        .await
        .map_err(|e| PostadmError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Set the active flag. Returns true if a row was updated.
    pub async fn set_active(&mut self, address: &str, active: bool) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE alias SET active = $1, modified = datetime('now') WHERE address = $2",
        )
        .bind(active)
        .bind(address)
        .execute(&mut *self.conn)
        .await
        .map_err(|e| PostadmError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete an alias row. Returns true if a row was deleted.
    pub async fn delete(&mut self, address: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM alias WHERE address = $1")
            .bind(address)
            .execute(&mut *self.conn)
            .await
            .map_err(|e| PostadmError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every alias owned by a domain. Returns the number removed.
    pub async fn delete_by_domain(&mut self, domain: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM alias WHERE domain = $1")
            .bind(domain)
            .execute(&mut *self.conn)
            .await
            .map_err(|e| PostadmError::Database(e.to_string()))?;
        Ok(result.rows_affected())
    }

    /// Number of pure aliases owned by a domain.
    pub async fn count_pure_by_domain(&mut self, domain: &str) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM alias WHERE domain = $1 AND {PURE}"
        ))
        .bind(domain)
        .fetch_one(&mut *self.conn)
        .await
        .map_err(|e| PostadmError::Database(e.to_string()))?;
        Ok(count.0)
    }

    /// Pure aliases owned by a domain, sorted by address.
    pub async fn list_pure_by_domain(&mut self, domain: &str) -> Result<Vec<Alias>> {
        sqlx::query_as(&format!(
            "{SELECT_ALIAS} WHERE domain = $1 AND {PURE} ORDER BY address"
        ))
        .bind(domain)
        .fetch_all(&mut *self.conn)
        .await
        .map_err(|e| PostadmError::Database(e.to_string()))
    }
}
