//! Admin-to-domain grants.

use super::address::ALL_DOMAINS;

/// A capability grant of one domain to one admin.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct DomainAdmin {
    /// Admin login name.
    pub username: String,
    /// Granted domain, or `ALL`.
    pub domain: String,
    /// Creation timestamp.
    pub created: String,
    /// Whether the grant is active.
    pub active: bool,
}

impl DomainAdmin {
    /// True if this grant covers every domain.
    pub fn is_global(&self) -> bool {
        self.domain == ALL_DOMAINS
    }
}

/// Administrative scope of an admin, derived from its grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminScope {
    /// Holds the ALL grant.
    Global,
    /// Holds grants on the listed domains only.
    Scoped(Vec<String>),
}

impl AdminScope {
    /// Build the scope from a list of granted domain names.
    pub fn from_grants<S: AsRef<str>>(domains: &[S]) -> Self {
        if domains.iter().any(|d| d.as_ref() == ALL_DOMAINS) {
            AdminScope::Global
        } else {
            AdminScope::Scoped(domains.iter().map(|d| d.as_ref().to_string()).collect())
        }
    }

    /// True if the scope includes `domain`.
    pub fn covers(&self, domain: &str) -> bool {
        match self {
            AdminScope::Global => true,
            AdminScope::Scoped(domains) => domains.iter().any(|d| d == domain),
        }
    }

    /// True for super-admins.
    pub fn is_global(&self) -> bool {
        matches!(self, AdminScope::Global)
    }
}
