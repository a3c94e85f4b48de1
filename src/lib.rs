//! postadm - virtual mail hosting directory administration
//!
//! Manages the domains, administrators, mailboxes and aliases that mail
//! transfer and delivery agents read from a shared SQLite schema, and keeps
//! the cross-entity invariants between them: per-domain capacity and quota
//! ceilings, the shared mailbox/alias address space, super-admin grants on
//! the `ALL` sentinel domain, and cascading deletes.

pub mod audit;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod password;
pub mod rules;
pub mod service;

pub use audit::AuditLog;
pub use config::Config;
pub use db::Database;
pub use error::{Entity, PostadmError, Result};
pub use model::{
    Admin, AdminScope, AdminUpdate, Alias, Domain, DomainUpdate, Limit, Mailbox, MailboxUpdate,
    NewDomain, NewMailbox, QuotaUsage, ALL_DOMAINS,
};
pub use password::{CommandHasher, PasswordHasher};
pub use service::{AccountService, AdminService, AliasService, DomainService, DomainSummary};
