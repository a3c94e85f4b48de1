//! Test helpers for directory integration tests.
//!
//! Provides database setup, seeding helpers and a row-count snapshot used to
//! compare directory state before and after an operation.

#![allow(dead_code)]

use postadm::{Config, Database, DomainService, Limit, NewDomain};

/// Pre-hashed password used for seeded accounts and admins.
pub const HASH: &str = "{PLAIN}secret";

/// Open a fresh in-memory directory with default configuration.
pub async fn setup() -> (Database, Config) {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to open in-memory database");
    (db, Config::default())
}

/// Create a domain with explicit limits.
pub async fn seed_domain(
    db: &Database,
    config: &Config,
    name: &str,
    mailboxes: Limit,
    aliases: Limit,
    maxquota: Limit,
) {
    DomainService::new(db, config)
        .create_domain(
            NewDomain::new(name)
                .with_mailboxes(mailboxes)
                .with_aliases(aliases)
                .with_maxquota(maxquota),
        )
        .await
        .expect("Failed to seed domain");
}

/// Create a domain with no limits at all.
pub async fn seed_unlimited_domain(db: &Database, config: &Config, name: &str) {
    seed_domain(
        db,
        config,
        name,
        Limit::Unlimited,
        Limit::Unlimited,
        Limit::Unlimited,
    )
    .await;
}

/// Row counts of every directory table.
#[derive(Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub domains: i64,
    pub admins: i64,
    pub grants: i64,
    pub mailboxes: i64,
    pub aliases: i64,
}

async fn count(db: &Database, table: &str) -> i64 {
    let sql = format!("SELECT COUNT(*) FROM {table}");
    sqlx::query_scalar(&sql)
        .fetch_one(db.pool())
        .await
        .expect("Failed to count rows")
}

/// Take a row-count snapshot of the directory.
pub async fn snapshot(db: &Database) -> Snapshot {
    Snapshot {
        domains: count(db, "domain").await,
        admins: count(db, "admin").await,
        grants: count(db, "domain_admins").await,
        mailboxes: count(db, "mailbox").await,
        aliases: count(db, "alias").await,
    }
}

/// Insert a usage row as the delivery agent would.
pub async fn report_usage(db: &Database, username: &str, bytes: i64, messages: i64) {
    sqlx::query("INSERT INTO quota2 (username, bytes, messages) VALUES ($1, $2, $3)")
        .bind(username)
        .bind(bytes)
        .bind(messages)
        .execute(db.pool())
        .await
        .expect("Failed to report usage");
}
