//! Entity model for postadm.
//!
//! Entities mirror the rows of the shared mail schema. Each entity that can
//! be created has a draft type (`New*`) whose `normalized` method is a pure
//! validation step, and mutable entities have an update type whose `check`
//! method rejects changes to immutable key fields.

pub mod address;
mod admin;
mod alias;
mod domain;
mod grant;
pub mod limit;
mod log;
mod mailbox;
mod quota;

pub use address::ALL_DOMAINS;
pub use admin::{Admin, AdminUpdate, NewAdmin};
pub use alias::{normalized_goto, Alias, NewAlias};
pub use domain::{Domain, DomainUpdate, NewDomain, TRANSPORT};
pub use grant::{AdminScope, DomainAdmin};
pub use limit::{
    quota_mb_to_storage_units, storage_units_to_quota_mb, Limit, QuotaMb, MAX_QUOTA_MB,
    QUOTA_MULTIPLIER,
};
pub use log::{Action, LogEntry, NewLogEntry};
pub use mailbox::{default_maildir, Mailbox, MailboxUpdate, NewMailbox};
pub use quota::QuotaUsage;
