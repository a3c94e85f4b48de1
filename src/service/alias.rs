//! Pure alias lifecycle.
//!
//! Aliases that belong to a mailbox are managed through
//! [`AccountService`](super::AccountService) and rejected here.

use tracing::{info, warn};

use crate::audit;
use crate::db::{AliasRepository, Database, DbConn, DomainRepository, MailboxRepository};
use crate::error::{Entity, PostadmError};
use crate::model::address::{normalize, normalize_domain};
use crate::model::{normalized_goto, Action, Alias, NewAlias};
use crate::rules;
use crate::Result;

use super::DEFAULT_ACTOR;

/// Service for pure alias operations.
pub struct AliasService<'a> {
    db: &'a Database,
    actor: String,
}

impl<'a> AliasService<'a> {
    /// Create a new AliasService.
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            actor: DEFAULT_ACTOR.to_string(),
        }
    }

    /// Record `actor` in audit entries.
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    /// Check whether an alias row exists for `address`, of any kind.
    pub async fn alias_exists(&self, address: &str) -> Result<bool> {
        let mut conn = self.db.acquire().await?;
        AliasRepository::new(&mut conn)
            .exists(&normalize(address))
            .await
    }

    /// Get an alias by address.
    pub async fn get_alias(&self, address: &str) -> Result<Alias> {
        let address = normalize(address);
        let mut conn = self.db.acquire().await?;
        AliasRepository::new(&mut conn)
            .find(&address)
            .await?
            .ok_or_else(|| PostadmError::not_found(Entity::Alias, address))
    }

    /// Pure aliases of a domain.
    pub async fn list_aliases(&self, domain: &str) -> Result<Vec<Alias>> {
        let domain = normalize_domain(domain);
        let mut conn = self.db.acquire().await?;
        if !DomainRepository::new(&mut conn).exists(&domain).await? {
            return Err(PostadmError::not_found(Entity::Domain, domain));
        }
        AliasRepository::new(&mut conn)
            .list_pure_by_domain(&domain)
            .await
    }

    /// Add a pure alias. `goto` is a comma-separated destination list.
    ///
    /// `address` may be a catch-all (`@domain`).
    pub async fn add_alias(&self, address: &str, goto: &str) -> Result<Alias> {
        let mut draft = NewAlias::new(address, goto).normalized()?;
        draft.goto = normalized_goto(&[&draft.goto])?;

        let mut tx = self.db.begin().await?;
        let domain = DomainRepository::new(&mut tx)
            .find(&draft.domain)
            .await?
            .filter(|domain| !domain.is_sentinel())
            .ok_or_else(|| PostadmError::not_found(Entity::Domain, &draft.domain))?;
        if rules::address_is_claimed(&mut tx, &draft.address).await? {
            return Err(PostadmError::already_exists(Entity::Alias, &draft.address));
        }
        if !rules::domain_accepts_new_pure_alias(&mut tx, &domain).await? {
            warn!(domain = %domain.domain, limit = %domain.aliases, "alias limit reached");
            return Err(PostadmError::CapacityExceeded {
                domain: domain.domain,
                kind: Entity::Alias,
            });
        }

        let alias = AliasRepository::new(&mut tx).create(&draft).await?;
        audit::record(
            &mut tx,
            &self.actor,
            &alias.domain,
            Action::CreateAlias,
            format!("{} -> {}", alias.address, alias.goto),
        )
        .await?;
        tx.commit().await?;

        info!(alias = %alias.address, actor = %self.actor, "alias created");
        Ok(alias)
    }

    /// Replace the destination list of a pure alias.
    pub async fn update_alias(&self, address: &str, goto: &str) -> Result<Alias> {
        let address = normalize(address);
        let goto = normalized_goto(&[goto])?;

        let mut tx = self.db.begin().await?;
        ensure_not_mailbox(&mut tx, &address).await?;
        if !AliasRepository::new(&mut tx).set_goto(&address, &goto).await? {
            return Err(PostadmError::not_found(Entity::Alias, &address));
        }
        let alias = AliasRepository::new(&mut tx)
            .find(&address)
            .await?
            .ok_or_else(|| PostadmError::not_found(Entity::Alias, &address))?;
        audit::record(
            &mut tx,
            &self.actor,
            &alias.domain,
            Action::EditAlias,
            format!("{address} -> {goto}"),
        )
        .await?;
        tx.commit().await?;

        info!(alias = %address, actor = %self.actor, "alias updated");
        Ok(alias)
    }

    /// Delete a pure alias.
    pub async fn delete_alias(&self, address: &str) -> Result<()> {
        let address = normalize(address);

        let mut tx = self.db.begin().await?;
        ensure_not_mailbox(&mut tx, &address).await?;
        let alias = AliasRepository::new(&mut tx)
            .find(&address)
            .await?
            .ok_or_else(|| PostadmError::not_found(Entity::Alias, &address))?;
        AliasRepository::new(&mut tx).delete(&address).await?;
        audit::record(
            &mut tx,
            &self.actor,
            &alias.domain,
            Action::DeleteAlias,
            &address,
        )
        .await?;
        tx.commit().await?;

        info!(alias = %address, actor = %self.actor, "alias deleted");
        Ok(())
    }
}

/// Reject alias operations on an address owned by a mailbox.
async fn ensure_not_mailbox(conn: &mut DbConn, address: &str) -> Result<()> {
    if MailboxRepository::new(conn).exists(address).await? {
        return Err(PostadmError::InvariantViolation {
            entity: Entity::Mailbox,
            field: "alias",
        });
    }
    Ok(())
}
