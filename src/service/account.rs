//! Mailbox (account) lifecycle.
//!
//! A mailbox never exists without its self-alias: both rows are created and
//! destroyed in the same transaction.

use tracing::{info, warn};

use crate::audit;
use crate::config::Config;
use crate::db::{
    AliasRepository, Database, DbConn, DomainRepository, MailboxRepository, QuotaRepository,
};
use crate::error::{Entity, PostadmError};
use crate::model::address::{normalize, normalize_domain};
use crate::model::{
    normalized_goto, Action, Alias, Domain, Limit, Mailbox, MailboxUpdate, NewAlias, NewMailbox,
    QuotaUsage,
};
use crate::password::PasswordHasher;
use crate::rules;
use crate::Result;

use super::DEFAULT_ACTOR;

/// Service for mailbox operations.
pub struct AccountService<'a> {
    db: &'a Database,
    config: &'a Config,
    actor: String,
}

impl<'a> AccountService<'a> {
    /// Create a new AccountService.
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

    /// Check whether a mailbox row exists.
    pub async fn mailbox_exists(&self, address: &str) -> Result<bool> {
        let mut conn = self.db.acquire().await?;
        MailboxRepository::new(&mut conn)
            .exists(&normalize(address))
            .await
    }

    /// Check whether both the mailbox and its alias exist.
    pub async fn account_exists(&self, address: &str) -> Result<bool> {
        let address = normalize(address);
        let mut conn = self.db.acquire().await?;
        account_exists(&mut conn, &address).await
    }

    /// Get a mailbox by address.
    pub async fn get_mailbox(&self, address: &str) -> Result<Mailbox> {
        let address = normalize(address);
        let mut conn = self.db.acquire().await?;
        MailboxRepository::new(&mut conn)
            .find(&address)
            .await?
            .ok_or_else(|| PostadmError::not_found(Entity::Mailbox, address))
    }

    /// Mailboxes of a domain.
    pub async fn list_mailboxes(&self, domain: &str) -> Result<Vec<Mailbox>> {
        let domain = normalize_domain(domain);
        let mut conn = self.db.acquire().await?;
        if !DomainRepository::new(&mut conn).exists(&domain).await? {
            return Err(PostadmError::not_found(Entity::Domain, domain));
        }
        MailboxRepository::new(&mut conn).list_by_domain(&domain).await
    }

    /// Usage reported by the delivery agent, zero if nothing was reported.
    pub async fn mailbox_usage(&self, address: &str) -> Result<QuotaUsage> {
        let address = normalize(address);
        let mut conn = self.db.acquire().await?;
        if !MailboxRepository::new(&mut conn).exists(&address).await? {
            return Err(PostadmError::not_found(Entity::Mailbox, address));
        }
        let usage = QuotaRepository::new(&mut conn).find(&address).await?;
        Ok(usage.unwrap_or_else(|| QuotaUsage::empty(address)))
    }

    /// Add an account with a pre-hashed password.
    ///
    /// Without an explicit quota the configured default quota is used.
    pub async fn add_account(
        &self,
        address: &str,
        hashed_password: &str,
        quota: Option<Limit>,
    ) -> Result<Mailbox> {
        let quota = quota.unwrap_or_else(|| Limit::from_raw(self.config.mailbox.default_quota));
        self.create_account(NewMailbox::new(address, hashed_password, quota))
            .await
    }

    /// Hash `password` through `hasher`, then add the account.
    pub async fn add_account_with_hasher<H: PasswordHasher>(
        &self,
        hasher: &H,
        address: &str,
        password: &str,
        quota: Option<Limit>,
    ) -> Result<Mailbox> {
        let hashed = hasher.hash(password).await?;
        self.add_account(address, &hashed, quota).await
    }

    /// Add an account from a draft, together with its self-alias.
    pub async fn create_account(&self, draft: NewMailbox) -> Result<Mailbox> {
        let draft = draft.normalized()?;

        let mut tx = self.db.begin().await?;
        let domain = find_domain(&mut tx, &draft.domain).await?;
        if rules::address_is_claimed(&mut tx, &draft.username).await? {
            return Err(PostadmError::already_exists(Entity::Mailbox, &draft.username));
        }
        if !rules::domain_accepts_new_mailbox(&mut tx, &domain).await? {
            warn!(domain = %domain.domain, limit = %domain.mailboxes, "mailbox limit reached");
            return Err(PostadmError::CapacityExceeded {
                domain: domain.domain,
                kind: Entity::Mailbox,
            });
        }
        check_quota(&domain, draft.quota_limit())?;

        let mailbox = MailboxRepository::new(&mut tx).create(&draft).await?;
        let self_alias =
            NewAlias::self_alias(&mailbox.username, &mailbox.domain).with_active(mailbox.active);
        AliasRepository::new(&mut tx).create(&self_alias).await?;
        audit::record(
            &mut tx,
            &self.actor,
            &mailbox.domain,
            Action::CreateMailbox,
            &mailbox.username,
        )
        .await?;
        tx.commit().await?;

        info!(mailbox = %mailbox.username, actor = %self.actor, "mailbox created");
        Ok(mailbox)
    }

    /// Update a mailbox's name, password, quota or active flag.
    ///
    /// A new quota is checked against the domain ceiling; the active flag is
    /// mirrored onto the self-alias.
    pub async fn update_account(&self, address: &str, update: MailboxUpdate) -> Result<Mailbox> {
        let address = normalize(address);

        let mut tx = self.db.begin().await?;
        let current = MailboxRepository::new(&mut tx)
            .find(&address)
            .await?
            .ok_or_else(|| PostadmError::not_found(Entity::Mailbox, &address))?;
        update.check(&current)?;

        if let Some(quota) = update.quota {
            let domain = find_domain(&mut tx, &current.domain).await?;
            check_quota(&domain, Limit::from_raw(quota))?;
        }

        let mailbox = MailboxRepository::new(&mut tx)
            .update(&address, &update)
            .await?
            .ok_or_else(|| PostadmError::not_found(Entity::Mailbox, &address))?;
        if let Some(active) = update.active {
            AliasRepository::new(&mut tx)
                .set_active(&address, active)
                .await?;
        }

        let data = serde_json::json!({
            "username": address,
            "name": update.name,
            "password": update.password.is_some(),
            "quota": update.quota,
            "active": update.active,
        });
        audit::record(
            &mut tx,
            &self.actor,
            &mailbox.domain,
            Action::EditMailbox,
            data.to_string(),
        )
        .await?;
        tx.commit().await?;

        info!(mailbox = %address, actor = %self.actor, "mailbox updated");
        Ok(mailbox)
    }

    /// Rewrite a mailbox's forwarding.
    ///
    /// With `keep_local_copy` the mailbox's own address stays in the goto list;
    /// with no destinations and a local copy, forwarding is switched off.
    pub async fn set_forwarding<S: AsRef<str>>(
        &self,
        address: &str,
        destinations: &[S],
        keep_local_copy: bool,
    ) -> Result<Alias> {
        let address = normalize(address);

        let mut list: Vec<String> = Vec::with_capacity(destinations.len() + 1);
        if keep_local_copy {
            list.push(address.clone());
        }
        list.extend(destinations.iter().map(|d| d.as_ref().to_string()));
        let goto = normalized_goto(&list)?;

        let mut tx = self.db.begin().await?;
        let mailbox = MailboxRepository::new(&mut tx)
            .find(&address)
            .await?
            .ok_or_else(|| PostadmError::not_found(Entity::Mailbox, &address))?;
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
            &mailbox.domain,
            Action::EditForward,
            format!("{address} -> {goto}"),
        )
        .await?;
        tx.commit().await?;

        info!(mailbox = %address, forward = alias.is_forward(), "forwarding updated");
        Ok(alias)
    }

    /// Delete an account: its self-alias first, then the mailbox.
    pub async fn delete_account(&self, address: &str) -> Result<()> {
        let address = normalize(address);

        let mut tx = self.db.begin().await?;
        let mailbox = MailboxRepository::new(&mut tx)
            .find(&address)
            .await?
            .ok_or_else(|| PostadmError::not_found(Entity::Mailbox, &address))?;
        if !AliasRepository::new(&mut tx).exists(&address).await? {
            return Err(PostadmError::not_found(Entity::Alias, &address));
        }

        AliasRepository::new(&mut tx).delete(&address).await?;
        MailboxRepository::new(&mut tx).delete(&address).await?;
        audit::record(
            &mut tx,
            &self.actor,
            &mailbox.domain,
            Action::DeleteMailbox,
            &address,
        )
        .await?;
        tx.commit().await?;

        info!(mailbox = %address, actor = %self.actor, "mailbox deleted");
        Ok(())
    }
}

async fn account_exists(conn: &mut DbConn, address: &str) -> Result<bool> {
    if !MailboxRepository::new(&mut *conn).exists(address).await? {
        return Ok(false);
    }
    AliasRepository::new(conn).exists(address).await
}

async fn find_domain(conn: &mut DbConn, name: &str) -> Result<Domain> {
    DomainRepository::new(conn)
        .find(name)
        .await?
        .filter(|domain| !domain.is_sentinel())
        .ok_or_else(|| PostadmError::not_found(Entity::Domain, name))
}

fn check_quota(domain: &Domain, quota: Limit) -> Result<()> {
    if rules::mailbox_quota_valid(domain, quota) {
        Ok(())
    } else {
        Err(PostadmError::QuotaOutOfRange {
            domain: domain.domain.clone(),
            quota: quota.as_raw(),
            maxquota: domain.maxquota.as_raw(),
        })
    }
}
