//! Mailbox (account) model.

use validator::Validate;

use super::address::{
    normalize, split_address, validate_domain_name, validate_email_address, validate_local_part,
};
use super::limit::{
    storage_units_to_limit, storage_units_to_quota_mb, Limit, QuotaMb, MAX_QUOTA_MB,
};
use crate::error::{Entity, PostadmError};
use crate::Result;

/// Mailbox entity.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Mailbox {
    /// Full address (unique, immutable).
    pub username: String,
    /// Pre-hashed password (`{SCHEME}hash`).
    pub password: String,
    /// Display name.
    pub name: String,
    /// Maildir path relative to the mail root.
    pub maildir: String,
    /// Quota in storage units (0 = unlimited, -1 = disabled).
    pub quota: i64,
    /// Local part of the address (immutable).
    pub local_part: String,
    /// Owning domain.
    pub domain: String,
    /// Creation timestamp.
    pub created: String,
    /// Last modification timestamp.
    pub modified: String,
    /// Whether the mailbox is active.
    pub active: bool,
}

impl Mailbox {
    /// Quota as a whole-MB limit.
    pub fn quota_limit(&self) -> Limit {
        storage_units_to_limit(self.quota)
    }

    /// Quota in MB.
    pub fn quota_mb(&self) -> QuotaMb {
        storage_units_to_quota_mb(self.quota)
    }
}

/// Derive the default maildir path for an address.
pub fn default_maildir(domain: &str, username: &str) -> String {
    format!("{domain}/{username}/")
}

/// Data for creating a new mailbox.
#[derive(Debug, Clone, Validate)]
pub struct NewMailbox {
    /// Full address.
    #[validate(custom(function = "validate_email_address"))]
    pub username: String,
    /// Pre-hashed password.
    #[validate(length(min = 1))]
    pub password: String,
    /// Display name.
    #[validate(length(max = 255))]
    pub name: String,
    /// Explicit maildir path overriding the derived one.
    #[validate(length(min = 1))]
    pub maildir: Option<String>,
    /// Quota in MB (0 = unlimited, -1 = disabled).
    #[validate(range(min = -1, max = MAX_QUOTA_MB))]
    pub quota: i64,
    /// Local part.
    #[validate(custom(function = "validate_local_part"))]
    pub local_part: String,
    /// Owning domain.
    #[validate(custom(function = "validate_domain_name"))]
    pub domain: String,
    /// Active flag.
    pub active: bool,
}

impl NewMailbox {
    /// Create a draft for `address` with a pre-hashed password.
    ///
    /// The local part and domain are derived from the address; a malformed
    /// address leaves them empty so validation reports them.
    pub fn new(address: impl Into<String>, password: impl Into<String>, quota: Limit) -> Self {
        let username = normalize(&address.into());
        let (local_part, domain) = split_address(&username)
            .map(|(local, domain)| (local.to_string(), domain.to_string()))
            .unwrap_or_default();
        Self {
            username,
            password: password.into(),
            name: String::new(),
            maildir: None,
            quota: quota.as_raw(),
            local_part,
            domain,
            active: true,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Override the maildir path.
    pub fn with_maildir(mut self, maildir: impl Into<String>) -> Self {
        self.maildir = Some(maildir.into());
        self
    }

    /// Set the active flag.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Quota as a limit.
    pub fn quota_limit(&self) -> Limit {
        Limit::from_raw(self.quota)
    }

    /// Maildir path to store.
    pub fn maildir(&self) -> String {
        self.maildir
            .clone()
            .unwrap_or_else(|| default_maildir(&self.domain, &self.username))
    }

    /// Validate every field and check the address composition.
    pub fn normalized(self) -> Result<Self> {
        self.validate()
            .map_err(|e| PostadmError::from_validation(Entity::Mailbox, e))?;
        if format!("{}@{}", self.local_part, self.domain) != self.username {
            return Err(PostadmError::invalid(Entity::Mailbox, "username"));
        }
        Ok(self)
    }
}

/// Data for updating an existing mailbox.
///
/// `username` and `local_part` may be supplied but must match the stored
/// values.
#[derive(Debug, Clone, Default, Validate)]
pub struct MailboxUpdate {
    /// Address (immutable).
    pub username: Option<String>,
    /// Local part (immutable).
    pub local_part: Option<String>,
    /// New pre-hashed password.
    #[validate(length(min = 1))]
    pub password: Option<String>,
    /// New display name.
    #[validate(length(max = 255))]
    pub name: Option<String>,
    /// New quota in MB.
    #[validate(range(min = -1, max = MAX_QUOTA_MB))]
    pub quota: Option<i64>,
    /// New active flag.
    pub active: Option<bool>,
}

impl MailboxUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempt to set the address.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Attempt to set the local part.
    pub fn local_part(mut self, local_part: impl Into<String>) -> Self {
        self.local_part = Some(local_part.into());
        self
    }

    /// Set a new pre-hashed password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the quota.
    pub fn quota(mut self, quota: Limit) -> Self {
        self.quota = Some(quota.as_raw());
        self
    }

    /// Set the active flag.
    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    /// Check if no mutable field is set.
    pub fn is_empty(&self) -> bool {
        self.password.is_none()
            && self.name.is_none()
            && self.quota.is_none()
            && self.active.is_none()
    }

    /// Validate fields and reject changes to the address or local part.
    pub fn check(&self, current: &Mailbox) -> Result<()> {
        if let Some(ref username) = self.username {
            if normalize(username) != current.username {
                return Err(PostadmError::InvariantViolation {
                    entity: Entity::Mailbox,
                    field: "username",
                });
            }
        }
        if let Some(ref local_part) = self.local_part {
            if normalize(local_part) != current.local_part {
                return Err(PostadmError::InvariantViolation {
                    entity: Entity::Mailbox,
                    field: "local_part",
                });
            }
        }
        self.validate()
            .map_err(|e| PostadmError::from_validation(Entity::Mailbox, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::limit::QUOTA_MULTIPLIER;

    fn mailbox() -> Mailbox {
        Mailbox {
            username: "alice@example.com".to_string(),
            password: "{PLAIN}x".to_string(),
            name: "Alice".to_string(),
            maildir: "example.com/alice@example.com/".to_string(),
            quota: 50 * QUOTA_MULTIPLIER,
            local_part: "alice".to_string(),
            domain: "example.com".to_string(),
            created: String::new(),
            modified: String::new(),
            active: true,
        }
    }

    #[test]
    fn test_new_mailbox_splits_address() {
        let draft = NewMailbox::new("Alice@Example.com", "{PLAIN}x", Limit::Max(10));
        assert_eq!(draft.username, "alice@example.com");
        assert_eq!(draft.local_part, "alice");
        assert_eq!(draft.domain, "example.com");
        assert_eq!(draft.quota, 10);
        assert_eq!(draft.maildir(), "example.com/alice@example.com/");
    }

    #[test]
    fn test_maildir_override() {
        let draft = NewMailbox::new("alice@example.com", "{PLAIN}x", Limit::Unlimited)
            .with_maildir("custom/alice/");
        assert_eq!(draft.maildir(), "custom/alice/");
    }

    #[test]
    fn test_normalized_accepts_valid() {
        let draft = NewMailbox::new("alice@example.com", "{PLAIN}x", Limit::Max(10))
            .with_name("Alice");
        assert!(draft.normalized().is_ok());
    }

    #[test]
    fn test_normalized_rejects_malformed_address() {
        let err = NewMailbox::new("alice", "{PLAIN}x", Limit::Max(10))
            .normalized()
            .unwrap_err();
        match err {
            PostadmError::InvalidFormat { entity, fields } => {
                assert_eq!(entity, Entity::Mailbox);
                assert!(fields.contains(&"username".to_string()));
                assert!(fields.contains(&"domain".to_string()));
                assert!(fields.contains(&"local_part".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_normalized_rejects_empty_password() {
        let err = NewMailbox::new("alice@example.com", "", Limit::Max(10))
            .normalized()
            .unwrap_err();
        assert!(matches!(err, PostadmError::InvalidFormat { fields, .. } if fields == vec!["password"]));
    }

    #[test]
    fn test_quota_accessors() {
        let mb = mailbox();
        assert_eq!(mb.quota_limit(), Limit::Max(50));
        assert_eq!(mb.quota_mb().whole_mb(), 50);
        assert_eq!(mb.quota_mb().remainder_units(), 0);
    }

    #[test]
    fn test_quota_above_storage_range() {
        let err = NewMailbox::new("alice@example.com", "{PLAIN}x", Limit::Max(MAX_QUOTA_MB + 1))
            .normalized()
            .unwrap_err();
        assert!(matches!(err, PostadmError::InvalidFormat { fields, .. } if fields == vec!["quota"]));
        assert!(MailboxUpdate::new()
            .quota(Limit::Max(MAX_QUOTA_MB + 1))
            .check(&mailbox())
            .is_err());
        assert!(NewMailbox::new("alice@example.com", "{PLAIN}x", Limit::Max(MAX_QUOTA_MB))
            .normalized()
            .is_ok());
    }

    #[test]
    fn test_update_rejects_username_change() {
        let update = MailboxUpdate::new().username("bob@example.com");
        assert!(matches!(
            update.check(&mailbox()),
            Err(PostadmError::InvariantViolation {
                field: "username",
                ..
            })
        ));
    }

    #[test]
    fn test_update_rejects_local_part_change() {
        let update = MailboxUpdate::new().local_part("bob");
        assert!(matches!(
            update.check(&mailbox()),
            Err(PostadmError::InvariantViolation {
                field: "local_part",
                ..
            })
        ));
    }

    #[test]
    fn test_update_allows_mutable_fields() {
        let update = MailboxUpdate::new()
            .username("ALICE@example.com")
            .name("Alice A.")
            .quota(Limit::Max(20));
        assert!(update.check(&mailbox()).is_ok());
        assert!(!update.is_empty());
        assert!(MailboxUpdate::new().is_empty());
    }
}
