//! Error types for postadm.

use std::fmt;

use thiserror::Error;

/// Kind of directory entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    /// A hosted domain.
    Domain,
    /// An administrator account.
    Admin,
    /// An admin-to-domain grant.
    Grant,
    /// A mailbox (account).
    Mailbox,
    /// An alias or forwarding entry.
    Alias,
}

impl Entity {
    /// Lower-case name used in messages and audit entries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Domain => "domain",
            Entity::Admin => "admin",
            Entity::Grant => "domain admin grant",
            Entity::Mailbox => "mailbox",
            Entity::Alias => "alias",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common error type for postadm.
#[derive(Error, Debug)]
pub enum PostadmError {
    /// Referenced entity is absent.
    #[error("{entity} '{key}' not found")]
    NotFound { entity: Entity, key: String },

    /// Uniqueness violation on an entity key.
    #[error("{entity} '{key}' already exists")]
    AlreadyExists { entity: Entity, key: String },

    /// The domain's limit for this kind of entity is reached or the kind is disabled.
    #[error("domain '{domain}' does not accept another {kind}")]
    CapacityExceeded { domain: String, kind: Entity },

    /// Mailbox quota does not fit the domain's quota ceiling.
    #[error("quota {quota} MB is not allowed for domain '{domain}' (maxquota {maxquota})")]
    QuotaOutOfRange {
        domain: String,
        quota: i64,
        maxquota: i64,
    },

    /// One or more fields failed format validation.
    #[error("invalid {entity}: {}", .fields.join(", "))]
    InvalidFormat { entity: Entity, fields: Vec<String> },

    /// Attempt to change a field that is immutable after creation.
    #[error("{entity} field '{field}' cannot be changed")]
    InvariantViolation { entity: Entity, field: &'static str },

    /// The external password hashing delegate failed or timed out.
    #[error("dependency failure: {0}")]
    DependencyFailure(String),

    /// Database error.
    ///
    /// Errors from sqlx are converted to this variant unless a repository
    /// recognises them as a uniqueness violation.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl PostadmError {
    /// Shorthand for [`PostadmError::NotFound`].
    pub fn not_found(entity: Entity, key: impl Into<String>) -> Self {
        PostadmError::NotFound {
            entity,
            key: key.into(),
        }
    }

    /// Shorthand for [`PostadmError::AlreadyExists`].
    pub fn already_exists(entity: Entity, key: impl Into<String>) -> Self {
        PostadmError::AlreadyExists {
            entity,
            key: key.into(),
        }
    }

    /// Shorthand for an [`PostadmError::InvalidFormat`] with a single field.
    pub fn invalid(entity: Entity, field: &str) -> Self {
        PostadmError::InvalidFormat {
            entity,
            fields: vec![field.to_string()],
        }
    }

    /// Build an [`PostadmError::InvalidFormat`] from validator output.
    pub fn from_validation(entity: Entity, errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|field| field.to_string())
            .collect();
        fields.sort();
        PostadmError::InvalidFormat { entity, fields }
    }

    /// Map an sqlx error raised while inserting `key`.
    ///
    /// Unique-constraint conflicts become [`PostadmError::AlreadyExists`].
    pub fn from_insert(entity: Entity, key: &str, e: sqlx::Error) -> Self {
        let unique = e
            .as_database_error()
            .map(|db| db.is_unique_violation())
            .unwrap_or(false);
        if unique {
            PostadmError::already_exists(entity, key)
        } else {
            PostadmError::Database(e.to_string())
        }
    }
}

// Conversion from sqlx errors
impl From<sqlx::Error> for PostadmError {
    fn from(e: sqlx::Error) -> Self {
        PostadmError::Database(e.to_string())
    }
}

/// Result type alias for postadm operations.
pub type Result<T> = std::result::Result<T, PostadmError>;
