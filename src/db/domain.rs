//! Domain repository.

use sqlx::{QueryBuilder, Sqlite};

use super::DbConn;
use crate::error::{Entity, PostadmError};
use crate::model::{Domain, DomainUpdate, Limit, NewDomain, ALL_DOMAINS, TRANSPORT};
use crate::Result;

/// Database row for the `domain` table.
#[derive(Debug, sqlx::FromRow)]
struct DomainRow {
    domain: String,
    description: String,
    aliases: i64,
    mailboxes: i64,
    maxquota: i64,
    transport: String,
    active: bool,
    created: String,
    modified: String,
}

impl DomainRow {
    fn into_domain(self) -> Domain {
        Domain {
            domain: self.domain,
            description: self.description,
            aliases: Limit::from_raw(self.aliases),
            mailboxes: Limit::from_raw(self.mailboxes),
            maxquota: Limit::from_raw(self.maxquota),
            transport: self.transport,
            active: self.active,
            created: self.created,
            modified: self.modified,
        }
    }
}

const SELECT_DOMAIN: &str = "SELECT domain, description, aliases, mailboxes, maxquota, transport,
        active, created, modified
 FROM domain";

/// Repository for domain rows.
pub struct DomainRepository<'c> {
    conn: &'c mut DbConn,
}

impl<'c> DomainRepository<'c> {
    /// Create a repository over a connection or transaction.
    pub fn new(conn: &'c mut DbConn) -> Self {
        Self { conn }
    }

    /// Check whether a domain row exists. The sentinel counts as existing.
    pub async fn exists(&mut self, domain: &str) -> Result<bool> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM domain WHERE domain = $1)")
            .bind(domain)
            .fetch_one(&mut *self.conn)
            .await
            .map_err(|e| PostadmError::Database(e.to_string()))?;
        Ok(exists.0)
    }

    /// Get a domain by name.
    pub async fn find(&mut self, domain: &str) -> Result<Option<Domain>> {
        let row: Option<DomainRow> = sqlx::query_as(&format!("{SELECT_DOMAIN} WHERE domain = $1"))
            .bind(domain)
            .fetch_optional(&mut *self.conn)
            .await
            .map_err(|e| PostadmError::Database(e.to_string()))?;
        Ok(row.map(DomainRow::into_domain))
    }

    /// Insert a validated domain draft.
    pub async fn create(&mut self, new_domain: &NewDomain) -> Result<Domain> {
        sqlx::query(
            "INSERT INTO domain (domain, description, aliases, mailboxes, maxquota, transport, active)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&new_domain.domain)
        .bind(&new_domain.description)
        .bind(new_domain.aliases)
        .bind(new_domain.mailboxes)
        .bind(new_domain.maxquota)
        .bind(TRANSPORT)
        .bind(new_domain.active)
        .execute(&mut *self.conn)
        .await
        .map_err(|e| PostadmError::from_insert(Entity::Domain, &new_domain.domain, e))?;

        self.find(&new_domain.domain)
            .await?
            .ok_or_else(|| PostadmError::not_found(Entity::Domain, &new_domain.domain))
    }

    /// Update a domain's mutable fields.
    ///
    /// Returns the updated domain, or None if not found.
    pub async fn update(&mut self, domain: &str, update: &DomainUpdate) -> Result<Option<Domain>> {
        if update.is_empty() {
            return self.find(domain).await;
        }

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("UPDATE domain SET modified = datetime('now')");

        if let Some(ref description) = update.description {
            query.push(", description = ");
            query.push_bind(description.clone());
        }
        if let Some(aliases) = update.aliases {
            query.push(", aliases = ");
            query.push_bind(aliases);
        }
        if let Some(mailboxes) = update.mailboxes {
            query.push(", mailboxes = ");
            query.push_bind(mailboxes);
        }
        if let Some(maxquota) = update.maxquota {
            query.push(", maxquota = ");
            query.push_bind(maxquota);
        }
        if let Some(active) = update.active {
            query.push(", active = ");
            query.push_bind(active);
        }

        query.push(" WHERE domain = ");
        query.push_bind(domain.to_string());

        let result = query
            .build()
            .execute(&mut *self.conn)
            .await
            .map_err(|e| PostadmError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find(domain).await
    }

    /// Delete a domain row. Owned rows must already be gone.
    ///
    /// Returns true if a row was deleted.
    pub async fn delete(&mut self, domain: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM domain WHERE domain = $1")
            .bind(domain)
            .execute(&mut *self.conn)
            .await
            .map_err(|e| PostadmError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// List hosted domains by name, excluding the sentinel.
    pub async fn list(&mut self) -> Result<Vec<Domain>> {
        let rows: Vec<DomainRow> =
            sqlx::query_as(&format!("{SELECT_DOMAIN} WHERE domain <> $1 ORDER BY domain"))
                .bind(ALL_DOMAINS)
                .fetch_all(&mut *self.conn)
                .await
                .map_err(|e| PostadmError::Database(e.to_string()))?;
        Ok(rows.into_iter().map(DomainRow::into_domain).collect())
    }

    /// List the named domains that exist, excluding the sentinel.
    pub async fn list_named(&mut self, names: &[String]) -> Result<Vec<Domain>> {
        let mut domains = Vec::with_capacity(names.len());
        for name in names {
            if name == ALL_DOMAINS {
                continue;
            }
            if let Some(domain) = self.find(name).await? {
                domains.push(domain);
            }
        }
        Ok(domains)
    }
}
