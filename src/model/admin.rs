//! Administrator model.

use validator::Validate;

use super::address::{normalize, validate_email_address};
use crate::error::{Entity, PostadmError};
use crate::Result;

/// Administrator entity.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Admin {
    /// Login name, an email address (unique).
    pub username: String,
    /// Pre-hashed password.
    pub password: String,
    /// Native super-admin flag, a cached mirror of the ALL grant.
    pub superadmin: bool,
    /// Creation timestamp.
    pub created: String,
    /// Last modification timestamp.
    pub modified: String,
    /// Whether the admin may log in.
    pub active: bool,
}

/// Data for creating a new admin.
#[derive(Debug, Clone, Validate)]
pub struct NewAdmin {
    /// Login name.
    #[validate(custom(function = "validate_email_address"))]
    pub username: String,
    /// Pre-hashed password.
    #[validate(length(min = 1))]
    pub password: String,
    /// Active flag.
    pub active: bool,
}

impl NewAdmin {
    /// Create a draft with a pre-hashed password.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: normalize(&username.into()),
            password: password.into(),
            active: true,
        }
    }

    /// Set the active flag.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Validate every field.
    pub fn normalized(self) -> Result<Self> {
        self.validate()
            .map_err(|e| PostadmError::from_validation(Entity::Admin, e))?;
        Ok(self)
    }
}

/// Data for updating an existing admin.
#[derive(Debug, Clone, Default, Validate)]
pub struct AdminUpdate {
    /// Login name (immutable).
    pub username: Option<String>,
    /// New pre-hashed password.
    #[validate(length(min = 1))]
    pub password: Option<String>,
    /// New active flag.
    pub active: Option<bool>,
}

impl AdminUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempt to set the login name.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set a new pre-hashed password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the active flag.
    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    /// Check if no mutable field is set.
    pub fn is_empty(&self) -> bool {
        self.password.is_none() && self.active.is_none()
    }

    /// Validate fields and reject a change of the login name.
    pub fn check(&self, current: &str) -> Result<()> {
        if let Some(ref username) = self.username {
            if normalize(username) != current {
                return Err(PostadmError::InvariantViolation {
                    entity: Entity::Admin,
                    field: "username",
                });
            }
        }
        self.validate()
            .map_err(|e| PostadmError::from_validation(Entity::Admin, e))
    }
}
