//! Admin and grant lifecycle.
//!
//! Grant changes, including the super-admin toggle, are not written to the
//! audit log.

use tracing::info;

use crate::audit;
use crate::config::Config;
use crate::db::{AdminRepository, Database, DbConn, DomainRepository, GrantRepository};
use crate::error::{Entity, PostadmError};
use crate::model::address::{normalize, normalize_domain};
use crate::model::{Action, Admin, AdminScope, AdminUpdate, NewAdmin, ALL_DOMAINS};
use crate::password::PasswordHasher;
use crate::rules;
use crate::Result;

use super::DEFAULT_ACTOR;

/// Service for admin and grant operations.
pub struct AdminService<'a> {
    db: &'a Database,
    config: &'a Config,
    actor: String,
}

impl<'a> AdminService<'a> {
    /// Create a new AdminService.
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

    /// Check whether an admin exists.
    pub async fn admin_exists(&self, username: &str) -> Result<bool> {
        let mut conn = self.db.acquire().await?;
        AdminRepository::new(&mut conn)
            .exists(&normalize(username))
            .await
    }

    /// Get an admin by login name.
    pub async fn get_admin(&self, username: &str) -> Result<Admin> {
        let username = normalize(username);
        let mut conn = self.db.acquire().await?;
        AdminRepository::new(&mut conn)
            .find(&username)
            .await?
            .ok_or_else(|| PostadmError::not_found(Entity::Admin, username))
    }

    /// List all admins.
    pub async fn list_admins(&self) -> Result<Vec<Admin>> {
        let mut conn = self.db.acquire().await?;
        AdminRepository::new(&mut conn).list().await
    }

    /// Domains granted to an admin, including `ALL` for super-admins.
    pub async fn admin_domains(&self, username: &str) -> Result<Vec<String>> {
        let username = normalize(username);
        let mut conn = self.db.acquire().await?;
        ensure_admin(&mut conn, &username).await?;
        GrantRepository::new(&mut conn).domains_for(&username).await
    }

    /// Administrative scope of an admin.
    pub async fn admin_scope(&self, username: &str) -> Result<AdminScope> {
        let domains = self.admin_domains(username).await?;
        Ok(AdminScope::from_grants(&domains))
    }

    /// Check whether an admin is super-admin (holds the `ALL` grant).
    pub async fn is_super_admin(&self, username: &str) -> Result<bool> {
        let username = normalize(username);
        let mut conn = self.db.acquire().await?;
        ensure_admin(&mut conn, &username).await?;
        rules::admin_is_super(&mut conn, &username).await
    }

    /// Check whether an admin may administer `domain`.
    pub async fn has_domain(&self, username: &str, domain: &str) -> Result<bool> {
        let username = normalize(username);
        let mut conn = self.db.acquire().await?;
        ensure_admin(&mut conn, &username).await?;
        rules::admin_has_domain(&mut conn, &username, &normalize_domain(domain)).await
    }

    /// Add an admin with a pre-hashed password.
    pub async fn add_admin(&self, username: &str, hashed_password: &str) -> Result<Admin> {
        let draft = NewAdmin::new(username, hashed_password).normalized()?;

        let mut tx = self.db.begin().await?;
        if AdminRepository::new(&mut tx).exists(&draft.username).await? {
            return Err(PostadmError::already_exists(Entity::Admin, &draft.username));
        }
        let admin = AdminRepository::new(&mut tx).create(&draft).await?;
        audit::record(
            &mut tx,
            &self.actor,
            "",
            Action::CreateAdmin,
            &admin.username,
        )
        .await?;
        tx.commit().await?;

        info!(admin = %admin.username, actor = %self.actor, "admin created");
        Ok(admin)
    }

    /// Hash `password` through `hasher`, then add the admin.
    pub async fn add_admin_with_hasher<H: PasswordHasher>(
        &self,
        hasher: &H,
        username: &str,
        password: &str,
    ) -> Result<Admin> {
        let hashed = hasher.hash(password).await?;
        self.add_admin(username, &hashed).await
    }

    /// Update an admin's password or active flag.
    pub async fn update_admin(&self, username: &str, update: AdminUpdate) -> Result<Admin> {
        let username = normalize(username);
        update.check(&username)?;

        let mut tx = self.db.begin().await?;
        let admin = AdminRepository::new(&mut tx)
            .update(&username, &update)
            .await?
            .ok_or_else(|| PostadmError::not_found(Entity::Admin, &username))?;

        let data = serde_json::json!({
            "username": username,
            "password": update.password.is_some(),
            "active": update.active,
        });
        audit::record(&mut tx, &self.actor, "", Action::EditAdmin, data.to_string()).await?;
        tx.commit().await?;

        info!(admin = %username, actor = %self.actor, "admin updated");
        Ok(admin)
    }

    /// Delete an admin after removing all of its grants.
    pub async fn delete_admin(&self, username: &str) -> Result<()> {
        let username = normalize(username);

        let mut tx = self.db.begin().await?;
        ensure_admin(&mut tx, &username).await?;
        let grants = GrantRepository::new(&mut tx)
            .delete_by_admin(&username)
            .await?;
        AdminRepository::new(&mut tx).delete(&username).await?;
        audit::record(&mut tx, &self.actor, "", Action::DeleteAdmin, &username).await?;
        tx.commit().await?;

        info!(admin = %username, grants, actor = %self.actor, "admin deleted");
        Ok(())
    }

    /// Grant `domain` to an admin.
    ///
    /// Rejected when the admin already covers the domain, directly or
    /// through `ALL`.
    pub async fn add_admin_domain(&self, username: &str, domain: &str) -> Result<()> {
        let username = normalize(username);
        let domain = normalize_domain(domain);

        let mut tx = self.db.begin().await?;
        ensure_admin(&mut tx, &username).await?;
        ensure_domain(&mut tx, &domain).await?;
        if rules::admin_has_domain(&mut tx, &username, &domain).await? {
            return Err(PostadmError::already_exists(
                Entity::Grant,
                format!("{username} -> {domain}"),
            ));
        }
        GrantRepository::new(&mut tx).create(&username, &domain).await?;
        if domain == ALL_DOMAINS {
            self.sync_superadmin_flag(&mut tx, &username, true).await?;
        }
        tx.commit().await?;

        info!(admin = %username, domain = %domain, "domain granted");
        Ok(())
    }

    /// Revoke a grant. Revoking `ALL` demotes a super-admin.
    pub async fn delete_admin_domain(&self, username: &str, domain: &str) -> Result<()> {
        let username = normalize(username);
        let domain = normalize_domain(domain);

        let mut tx = self.db.begin().await?;
        ensure_admin(&mut tx, &username).await?;
        ensure_domain(&mut tx, &domain).await?;
        if !GrantRepository::new(&mut tx).delete(&username, &domain).await? {
            return Err(PostadmError::not_found(
                Entity::Grant,
                format!("{username} -> {domain}"),
            ));
        }
        if domain == ALL_DOMAINS {
            self.sync_superadmin_flag(&mut tx, &username, false).await?;
        }
        tx.commit().await?;

        info!(admin = %username, domain = %domain, "domain grant revoked");
        Ok(())
    }

    /// Make an admin super-admin or revoke it. Idempotent either way.
    ///
    /// Only the admin's `ALL` grant is touched, never the `ALL` domain.
    pub async fn set_super_admin(&self, username: &str, enabled: bool) -> Result<()> {
        let username = normalize(username);

        let mut tx = self.db.begin().await?;
        ensure_admin(&mut tx, &username).await?;
        let held = rules::admin_is_super(&mut tx, &username).await?;
        if enabled && !held {
            GrantRepository::new(&mut tx)
                .create(&username, ALL_DOMAINS)
                .await?;
        } else if !enabled && held {
            GrantRepository::new(&mut tx)
                .delete(&username, ALL_DOMAINS)
                .await?;
        }
        self.sync_superadmin_flag(&mut tx, &username, enabled).await?;
        tx.commit().await?;

        info!(admin = %username, enabled, "super-admin toggled");
        Ok(())
    }

    async fn sync_superadmin_flag(
        &self,
        conn: &mut DbConn,
        username: &str,
        enabled: bool,
    ) -> Result<()> {
        if self.config.schema.superadmin_flag {
            AdminRepository::new(conn)
                .set_superadmin(username, enabled)
                .await?;
        }
        Ok(())
    }
}

async fn ensure_admin(conn: &mut DbConn, username: &str) -> Result<()> {
    if AdminRepository::new(conn).exists(username).await? {
        Ok(())
    } else {
        Err(PostadmError::not_found(Entity::Admin, username))
    }
}

async fn ensure_domain(conn: &mut DbConn, domain: &str) -> Result<()> {
    if DomainRepository::new(conn).exists(domain).await? {
        Ok(())
    } else {
        Err(PostadmError::not_found(Entity::Domain, domain))
    }
}
