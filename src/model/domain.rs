//! Domain model.

use validator::Validate;

use super::address::{normalize, validate_domain_name, ALL_DOMAINS};
use super::limit::Limit;
use crate::config::DomainDefaultsConfig;
use crate::error::{Entity, PostadmError};
use crate::Result;

/// Transport value expected by the delivery agent for hosted domains.
pub const TRANSPORT: &str = "virtual";

/// Hosted domain.
#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    /// Domain name (lower case, unique).
    pub domain: String,
    /// Free-form description.
    pub description: String,
    /// Pure alias ceiling.
    pub aliases: Limit,
    /// Mailbox ceiling.
    pub mailboxes: Limit,
    /// Per-mailbox quota ceiling in MB.
    pub maxquota: Limit,
    /// Delivery transport.
    pub transport: String,
    /// Whether the domain is active.
    pub active: bool,
    /// Creation timestamp.
    pub created: String,
    /// Last modification timestamp.
    pub modified: String,
}

impl Domain {
    /// True for the sentinel domain that stands for every domain.
    pub fn is_sentinel(&self) -> bool {
        self.domain == ALL_DOMAINS
    }
}

/// Data for creating a new domain.
#[derive(Debug, Clone, Validate)]
pub struct NewDomain {
    /// Domain name.
    #[validate(custom(function = "validate_domain_name"))]
    pub domain: String,
    /// Description.
    #[validate(length(max = 255))]
    pub description: String,
    /// Pure alias ceiling (raw).
    #[validate(range(min = -1))]
    pub aliases: i64,
    /// Mailbox ceiling (raw).
    #[validate(range(min = -1))]
    pub mailboxes: i64,
    /// Quota ceiling in MB (raw).
    #[validate(range(min = -1))]
    pub maxquota: i64,
    /// Active flag.
    pub active: bool,
}

impl NewDomain {
    /// Create a draft with the built-in default limits.
    pub fn new(domain: impl Into<String>) -> Self {
        Self::with_defaults(domain, &DomainDefaultsConfig::default())
    }

    /// Create a draft using configured default limits.
    pub fn with_defaults(domain: impl Into<String>, defaults: &DomainDefaultsConfig) -> Self {
        Self {
            domain: domain.into(),
            description: String::new(),
            aliases: defaults.aliases,
            mailboxes: defaults.mailboxes,
            maxquota: defaults.maxquota,
            active: true,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the alias ceiling.
    pub fn with_aliases(mut self, limit: Limit) -> Self {
        self.aliases = limit.as_raw();
        self
    }

    /// Set the mailbox ceiling.
    pub fn with_mailboxes(mut self, limit: Limit) -> Self {
        self.mailboxes = limit.as_raw();
        self
    }

    /// Set the quota ceiling.
    pub fn with_maxquota(mut self, limit: Limit) -> Self {
        self.maxquota = limit.as_raw();
        self
    }

    /// Set the active flag.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Lower-case the name and validate every field.
    pub fn normalized(mut self) -> Result<Self> {
        self.domain = normalize(&self.domain);
        self.validate()
            .map_err(|e| PostadmError::from_validation(Entity::Domain, e))?;
        Ok(self)
    }
}

/// Data for updating an existing domain.
///
/// The `domain` key may be supplied but must match the stored name.
#[derive(Debug, Clone, Default, Validate)]
pub struct DomainUpdate {
    /// Domain name (immutable).
    pub domain: Option<String>,
    /// New description.
    #[validate(length(max = 255))]
    pub description: Option<String>,
    /// New alias ceiling.
    #[validate(range(min = -1))]
    pub aliases: Option<i64>,
    /// New mailbox ceiling.
    #[validate(range(min = -1))]
    pub mailboxes: Option<i64>,
    /// New quota ceiling.
    #[validate(range(min = -1))]
    pub maxquota: Option<i64>,
    /// New active flag.
    pub active: Option<bool>,
}

impl DomainUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempt to set the domain key.
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the alias ceiling.
    pub fn aliases(mut self, limit: Limit) -> Self {
        self.aliases = Some(limit.as_raw());
        self
    }

    /// Set the mailbox ceiling.
    pub fn mailboxes(mut self, limit: Limit) -> Self {
        self.mailboxes = Some(limit.as_raw());
        self
    }

    /// Set the quota ceiling.
    pub fn maxquota(mut self, limit: Limit) -> Self {
        self.maxquota = Some(limit.as_raw());
        self
    }

    /// Set the active flag.
    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    /// Check if no mutable field is set.
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.aliases.is_none()
            && self.mailboxes.is_none()
            && self.maxquota.is_none()
            && self.active.is_none()
    }

    /// Validate field ranges and reject a change of the domain key.
    pub fn check(&self, current: &str) -> Result<()> {
        if let Some(ref domain) = self.domain {
            if normalize(domain) != current {
                return Err(PostadmError::InvariantViolation {
                    entity: Entity::Domain,
                    field: "domain",
                });
            }
        }
        self.validate()
            .map_err(|e| PostadmError::from_validation(Entity::Domain, e))
    }
}
