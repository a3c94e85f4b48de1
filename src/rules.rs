//! Relationship rules.
//!
//! Predicates over the current directory state. Lifecycle operations evaluate
//! them on the same transaction connection that performs the mutation, so a
//! capacity check and the insert it guards cannot be separated by another
//! writer.

use crate::db::{AliasRepository, DbConn, GrantRepository, MailboxRepository};
use crate::model::{Domain, Limit, ALL_DOMAINS};
use crate::Result;

/// Check whether `domain` may own one more mailbox.
pub async fn domain_accepts_new_mailbox(conn: &mut DbConn, domain: &Domain) -> Result<bool> {
    match domain.mailboxes {
        Limit::Unlimited => Ok(true),
        Limit::Disabled => Ok(false),
        limit => {
            let count = MailboxRepository::new(conn)
                .count_by_domain(&domain.domain)
                .await?;
            Ok(limit.admits_another(count))
        }
    }
}

/// Check whether `domain` may own one more pure alias.
///
/// Self-aliases created with mailboxes do not count.
pub async fn domain_accepts_new_pure_alias(conn: &mut DbConn, domain: &Domain) -> Result<bool> {
    match domain.aliases {
        Limit::Unlimited => Ok(true),
        Limit::Disabled => Ok(false),
        limit => {
            let count = AliasRepository::new(conn)
                .count_pure_by_domain(&domain.domain)
                .await?;
            Ok(limit.admits_another(count))
        }
    }
}

/// Check a mailbox quota in MB against the domain's ceiling.
pub fn mailbox_quota_valid(domain: &Domain, quota: Limit) -> bool {
    quota_within_ceiling(domain.maxquota, quota)
}

/// Quota rule over bare limits.
///
/// An unlimited ceiling admits anything, and a disabled ceiling only admits a
/// disabled quota. Under any other ceiling the quota must be finite and not
/// above it.
pub fn quota_within_ceiling(maxquota: Limit, quota: Limit) -> bool {
    match (maxquota, quota) {
        (Limit::Disabled, Limit::Disabled) => true,
        (Limit::Unlimited, _) => true,
        (_, Limit::Unlimited) => false,
        (Limit::Disabled, Limit::Max(_)) => false,
        (Limit::Max(ceiling), Limit::Max(mb)) => mb <= ceiling,
        (Limit::Max(_), Limit::Disabled) => true,
    }
}

/// Check whether an admin holds the `ALL` grant.
pub async fn admin_is_super(conn: &mut DbConn, username: &str) -> Result<bool> {
    GrantRepository::new(conn).exists(username, ALL_DOMAINS).await
}

/// Check whether an admin may administer `domain`, directly or through `ALL`.
pub async fn admin_has_domain(conn: &mut DbConn, username: &str, domain: &str) -> Result<bool> {
    let mut grants = GrantRepository::new(conn);
    if grants.exists(username, ALL_DOMAINS).await? {
        return Ok(true);
    }
    grants.exists(username, domain).await
}

/// Check whether an address is taken by a mailbox or any alias.
pub async fn address_is_claimed(conn: &mut DbConn, address: &str) -> Result<bool> {
    if MailboxRepository::new(&mut *conn).exists(address).await? {
        return Ok(true);
    }
    AliasRepository::new(conn).exists(address).await
}
