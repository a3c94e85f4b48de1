//! Domain lifecycle.

use serde::Serialize;
use tracing::{debug, info};

use crate::audit;
use crate::config::Config;
use crate::db::{
    AdminRepository, AliasRepository, Database, DomainRepository, GrantRepository,
    MailboxRepository,
};
use crate::error::{Entity, PostadmError};
use crate::model::address::normalize_domain;
use crate::model::{Action, Domain, DomainUpdate, NewDomain};
use crate::Result;

use super::DEFAULT_ACTOR;

/// Usage of a domain against its limits.
#[derive(Debug, Clone, Serialize)]
pub struct DomainSummary {
    /// Domain name.
    pub domain: String,
    /// Description.
    pub description: String,
    /// Mailboxes owned.
    pub mailbox_count: i64,
    /// Mailbox ceiling, rendered.
    pub mailbox_limit: String,
    /// Pure aliases owned.
    pub alias_count: i64,
    /// Pure alias ceiling, rendered.
    pub alias_limit: String,
    /// Per-mailbox quota ceiling in MB, rendered.
    pub maxquota: String,
    /// Admins holding a direct grant.
    pub admins: Vec<String>,
    /// Whether the domain is active.
    pub active: bool,
}

/// Service for domain operations.
pub struct DomainService<'a> {
    db: &'a Database,
    config: &'a Config,
    actor: String,
}

impl<'a> DomainService<'a> {
    /// Create a new DomainService.
    pub fn new(db: &'a Database, config: &'a Config) -> Self {
        Self {
            db,
            config,
            actor: DEFAULT_ACTOR.to_string(),
        }
    }

    /// Record `actor` in audit entries.
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    /// Check whether a domain exists. `ALL` always does.
    pub async fn domain_exists(&self, name: &str) -> Result<bool> {
        let mut conn = self.db.acquire().await?;
        DomainRepository::new(&mut conn)
            .exists(&normalize_domain(name))
            .await
    }

    /// Get a domain by name.
    pub async fn get_domain(&self, name: &str) -> Result<Domain> {
        let name = normalize_domain(name);
        let mut conn = self.db.acquire().await?;
        DomainRepository::new(&mut conn)
            .find(&name)
            .await?
            .ok_or_else(|| PostadmError::not_found(Entity::Domain, name))
    }

    /// List hosted domains, excluding `ALL`.
    pub async fn list_domains(&self) -> Result<Vec<Domain>> {
        let mut conn = self.db.acquire().await?;
        DomainRepository::new(&mut conn).list().await
    }

    /// Summarise a domain's usage against its limits.
    pub async fn domain_summary(&self, name: &str) -> Result<DomainSummary> {
        let name = normalize_domain(name);
        let mut conn = self.db.acquire().await?;
        let domain = DomainRepository::new(&mut conn)
            .find(&name)
            .await?
            .ok_or_else(|| PostadmError::not_found(Entity::Domain, &name))?;

        let mailbox_count = MailboxRepository::new(&mut conn)
            .count_by_domain(&name)
            .await?;
        let alias_count = AliasRepository::new(&mut conn)
            .count_pure_by_domain(&name)
            .await?;
        let admins = GrantRepository::new(&mut conn).admins_for(&name).await?;

        Ok(DomainSummary {
            domain: domain.domain,
            description: domain.description,
            mailbox_count,
            mailbox_limit: domain.mailboxes.to_string(),
            alias_count,
            alias_limit: domain.aliases.to_string(),
            maxquota: domain.maxquota.to_string(),
            admins,
            active: domain.active,
        })
    }

    /// Add a domain with the configured default limits.
    pub async fn add_domain(&self, name: &str) -> Result<Domain> {
        self.create_domain(NewDomain::with_defaults(name, &self.config.domain_defaults))
            .await
    }

    /// Add a domain from a draft carrying explicit limits.
    pub async fn create_domain(&self, draft: NewDomain) -> Result<Domain> {
        let draft = draft.normalized()?;

        let mut tx = self.db.begin().await?;
        if DomainRepository::new(&mut tx).exists(&draft.domain).await? {
            return Err(PostadmError::already_exists(Entity::Domain, &draft.domain));
        }
        let domain = DomainRepository::new(&mut tx).create(&draft).await?;
        audit::record(
            &mut tx,
            &self.actor,
            &domain.domain,
            Action::CreateDomain,
            &domain.domain,
        )
        .await?;
        tx.commit().await?;

        info!(domain = %domain.domain, actor = %self.actor, "domain created");
        Ok(domain)
    }

    /// Update a domain's description, limits or active flag.
    pub async fn update_domain(&self, name: &str, update: DomainUpdate) -> Result<Domain> {
        let name = normalize_domain(name);
        update.check(&name)?;

        let mut tx = self.db.begin().await?;
        let current = DomainRepository::new(&mut tx)
            .find(&name)
            .await?
            .ok_or_else(|| PostadmError::not_found(Entity::Domain, &name))?;
        if current.is_sentinel() {
            return Err(PostadmError::InvariantViolation {
                entity: Entity::Domain,
                field: "domain",
            });
        }

        let domain = DomainRepository::new(&mut tx)
            .update(&name, &update)
            .await?
            .ok_or_else(|| PostadmError::not_found(Entity::Domain, &name))?;

        let data = serde_json::json!({
            "description": update.description,
            "aliases": update.aliases,
            "mailboxes": update.mailboxes,
            "maxquota": update.maxquota,
            "active": update.active,
        });
        audit::record(
            &mut tx,
            &self.actor,
            &name,
            Action::EditDomain,
            data.to_string(),
        )
        .await?;
        tx.commit().await?;

        info!(domain = %name, actor = %self.actor, "domain updated");
        Ok(domain)
    }

    /// Delete a domain and everything it owns.
    ///
    /// Mailboxes go first together with their self-aliases, then the
    /// remaining aliases, then the grants on the domain. Admins left with no
    /// grant at all are deleted before the domain row itself.
    pub async fn delete_domain(&self, name: &str) -> Result<()> {
        let name = normalize_domain(name);

        let mut tx = self.db.begin().await?;
        let domain = DomainRepository::new(&mut tx)
            .find(&name)
            .await?
            .ok_or_else(|| PostadmError::not_found(Entity::Domain, &name))?;
        if domain.is_sentinel() {
            return Err(PostadmError::InvariantViolation {
                entity: Entity::Domain,
                field: "domain",
            });
        }

        let mailboxes = MailboxRepository::new(&mut tx).list_by_domain(&name).await?;
        for mailbox in &mailboxes {
            AliasRepository::new(&mut tx).delete(&mailbox.username).await?;
            MailboxRepository::new(&mut tx).delete(&mailbox.username).await?;
        }
        debug!(domain = %name, count = mailboxes.len(), "mailboxes removed");

        let aliases = AliasRepository::new(&mut tx).delete_by_domain(&name).await?;
        debug!(domain = %name, count = aliases, "aliases removed");

        let admins = GrantRepository::new(&mut tx).admins_for(&name).await?;
        GrantRepository::new(&mut tx).delete_by_domain(&name).await?;

        let mut orphaned = Vec::new();
        for admin in admins {
            if GrantRepository::new(&mut tx).count_for_admin(&admin).await? == 0 {
                AdminRepository::new(&mut tx).delete(&admin).await?;
                orphaned.push(admin);
            }
        }
        debug!(domain = %name, admins = ?orphaned, "orphaned admins removed");

        DomainRepository::new(&mut tx).delete(&name).await?;

        let data = format!(
            "{name} ({} mailboxes, {} aliases, {} admins)",
            mailboxes.len(),
            aliases,
            orphaned.len()
        );
        audit::record(&mut tx, &self.actor, &name, Action::DeleteDomain, data).await?;
        tx.commit().await?;

        info!(domain = %name, actor = %self.actor, "domain deleted");
        Ok(())
    }
}
