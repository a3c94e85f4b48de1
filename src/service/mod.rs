//! Lifecycle operations.
//!
//! Every mutating operation runs in one transaction: entities are loaded,
//! relationship rules are re-checked on the transaction connection, the
//! mutation set is applied, an audit entry is appended, and only then is the
//! transaction committed. Any error drops the transaction, which rolls back.
//!
//! Services take already-hashed passwords. The `*_with_hasher` variants hash
//! through a [`PasswordHasher`](crate::password::PasswordHasher) before the
//! transaction begins, so no database lock is held across the external call.

mod account;
mod admin;
mod alias;
mod domain;

pub use account::AccountService;
pub use admin::AdminService;
pub use alias::AliasService;
pub use domain::{DomainService, DomainSummary};

/// Actor recorded in audit entries when a service is not given one.
pub const DEFAULT_ACTOR: &str = "postadm";
