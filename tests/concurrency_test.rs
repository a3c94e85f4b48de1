//! Concurrency tests for postadm.
//!
//! Lifecycle operations race on a file database, where the pool hands out
//! several connections and SQLite arbitrates between writers.

mod common;

use std::sync::Arc;

use common::{seed_domain, HASH};
use postadm::{AccountService, AliasService, Config, Database, Entity, Limit, PostadmError};
use tempfile::TempDir;

const NUM_WRITERS: usize = 8;

/// Open a file database with one domain limited to `mailboxes` and `aliases`.
async fn setup_file_db(
    temp_dir: &TempDir,
    mailboxes: Limit,
    aliases: Limit,
) -> (Arc<Database>, Arc<Config>) {
    let db = Database::open(temp_dir.path().join("postadm.db"))
        .await
        .unwrap();
    let config = Config::default();
    seed_domain(&db, &config, "example.com", mailboxes, aliases, Limit::Unlimited).await;
    (Arc::new(db), Arc::new(config))
}

/// Concurrent accounts on a domain with room for one.
///
/// Exactly one writer wins; every other writer waits for the lock, re-checks
/// capacity and gets a typed rejection.
#[tokio::test]
async fn test_concurrent_accounts_respect_capacity() {
    let temp_dir = TempDir::new().unwrap();
    let (db, config) = setup_file_db(&temp_dir, Limit::Max(1), Limit::Unlimited).await;

    let mut handles = Vec::new();
    for i in 0..NUM_WRITERS {
        let db = Arc::clone(&db);
        let config = Arc::clone(&config);
        handles.push(tokio::spawn(async move {
            AccountService::new(&db, &config)
                .add_account(&format!("user{i}@example.com"), HASH, None)
                .await
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(PostadmError::CapacityExceeded {
                kind: Entity::Mailbox,
                ..
            }) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(created, 1, "Exactly one account should be created");
    let mailboxes = AccountService::new(&db, &config)
        .list_mailboxes("example.com")
        .await
        .unwrap();
    assert_eq!(mailboxes.len(), 1);
}

/// Concurrent accounts for the same address: one wins, the rest collide.
#[tokio::test]
async fn test_concurrent_same_address() {
    let temp_dir = TempDir::new().unwrap();
    let (db, config) = setup_file_db(&temp_dir, Limit::Unlimited, Limit::Unlimited).await;

    let mut handles = Vec::new();
    for _ in 0..NUM_WRITERS {
        let db = Arc::clone(&db);
        let config = Arc::clone(&config);
        handles.push(tokio::spawn(async move {
            AccountService::new(&db, &config)
                .add_account("alice@example.com", HASH, None)
                .await
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(PostadmError::AlreadyExists { .. }) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(created, 1);
    assert!(AccountService::new(&db, &config)
        .account_exists("alice@example.com")
        .await
        .unwrap());
}

/// Concurrent pure aliases fill the alias ceiling exactly.
#[tokio::test]
async fn test_concurrent_aliases_respect_capacity() {
    let temp_dir = TempDir::new().unwrap();
    let (db, _config) = setup_file_db(&temp_dir, Limit::Unlimited, Limit::Max(3)).await;

    let mut handles = Vec::new();
    for i in 0..NUM_WRITERS {
        let db = Arc::clone(&db);
        handles.push(tokio::spawn(async move {
            AliasService::new(&db)
                .add_alias(&format!("alias{i}@example.com"), "dest@example.org")
                .await
        }));
    }

    let mut created = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(PostadmError::CapacityExceeded {
                kind: Entity::Alias,
                ..
            }) => rejected += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(created, 3);
    assert_eq!(rejected, NUM_WRITERS - 3);
    let aliases = AliasService::new(&db)
        .list_aliases("example.com")
        .await
        .unwrap();
    assert_eq!(aliases.len(), 3);
}
