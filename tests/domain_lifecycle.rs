//! Domain lifecycle tests: creation, updates and cascading deletes.

mod common;

use common::{seed_domain, seed_unlimited_domain, setup, snapshot, HASH};
use postadm::{
    AccountService, AdminService, AliasService, DomainService, DomainUpdate, Entity, Limit,
    PostadmError, ALL_DOMAINS,
};

#[tokio::test]
async fn test_add_then_delete_restores_directory() {
    let (db, config) = setup().await;
    seed_unlimited_domain(&db, &config, "keep.org").await;
    let before = snapshot(&db).await;

    let domains = DomainService::new(&db, &config);
    domains.add_domain("example.com").await.unwrap();
    domains.delete_domain("example.com").await.unwrap();

    assert_eq!(snapshot(&db).await, before);
    assert!(!domains.domain_exists("example.com").await.unwrap());
    assert!(domains.domain_exists("keep.org").await.unwrap());
}

#[tokio::test]
async fn test_delete_cascades_to_everything_owned() {
    let (db, config) = setup().await;
    seed_unlimited_domain(&db, &config, "example.com").await;
    seed_unlimited_domain(&db, &config, "other.org").await;

    let accounts = AccountService::new(&db, &config);
    accounts
        .add_account("a@example.com", HASH, Some(Limit::Max(5)))
        .await
        .unwrap();
    accounts
        .add_account("b@example.com", HASH, None)
        .await
        .unwrap();
    accounts
        .add_account("c@other.org", HASH, None)
        .await
        .unwrap();

    let aliases = AliasService::new(&db);
    aliases
        .add_alias("info@example.com", "a@example.com")
        .await
        .unwrap();
    aliases
        .add_alias("@example.com", "b@example.com")
        .await
        .unwrap();

    let admins = AdminService::new(&db, &config);
    admins.add_admin("only@example.net", HASH).await.unwrap();
    admins
        .add_admin_domain("only@example.net", "example.com")
        .await
        .unwrap();
    admins.add_admin("both@example.net", HASH).await.unwrap();
    admins
        .add_admin_domain("both@example.net", "example.com")
        .await
        .unwrap();
    admins
        .add_admin_domain("both@example.net", "other.org")
        .await
        .unwrap();

    DomainService::new(&db, &config)
        .delete_domain("example.com")
        .await
        .unwrap();

    for address in ["a@example.com", "b@example.com"] {
        assert!(!accounts.mailbox_exists(address).await.unwrap());
        assert!(!aliases.alias_exists(address).await.unwrap());
    }
    assert!(!aliases.alias_exists("info@example.com").await.unwrap());
    assert!(!aliases.alias_exists("@example.com").await.unwrap());

    assert!(!admins.admin_exists("only@example.net").await.unwrap());
    assert!(admins.admin_exists("both@example.net").await.unwrap());
    assert_eq!(
        admins.admin_domains("both@example.net").await.unwrap(),
        vec!["other.org".to_string()]
    );

    assert!(accounts.account_exists("c@other.org").await.unwrap());
    let after = snapshot(&db).await;
    assert_eq!(after.mailboxes, 1);
    assert_eq!(after.aliases, 1);
    assert_eq!(after.grants, 1);
}

#[tokio::test]
async fn test_delete_keeps_super_admins() {
    let (db, config) = setup().await;
    seed_unlimited_domain(&db, &config, "example.com").await;

    let admins = AdminService::new(&db, &config);
    admins.add_admin("root@example.net", HASH).await.unwrap();
    admins
        .set_super_admin("root@example.net", true)
        .await
        .unwrap();

    DomainService::new(&db, &config)
        .delete_domain("example.com")
        .await
        .unwrap();

    assert!(admins.is_super_admin("root@example.net").await.unwrap());
}

#[tokio::test]
async fn test_sentinel_cannot_be_changed() {
    let (db, config) = setup().await;
    let domains = DomainService::new(&db, &config);

    assert!(matches!(
        domains.delete_domain(ALL_DOMAINS).await,
        Err(PostadmError::InvariantViolation {
            entity: Entity::Domain,
            ..
        })
    ));
    assert!(matches!(
        domains
            .update_domain(ALL_DOMAINS, DomainUpdate::new().description("everything"))
            .await,
        Err(PostadmError::InvariantViolation { .. })
    ));
    assert!(domains.domain_exists(ALL_DOMAINS).await.unwrap());
    assert!(domains.list_domains().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_domain_is_reported() {
    let (db, config) = setup().await;
    let domains = DomainService::new(&db, &config);

    assert!(matches!(
        domains.delete_domain("nowhere.example").await,
        Err(PostadmError::NotFound {
            entity: Entity::Domain,
            ..
        })
    ));
    assert!(matches!(
        domains.get_domain("nowhere.example").await,
        Err(PostadmError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_summary_counts_pure_aliases_only() {
    let (db, config) = setup().await;
    seed_domain(
        &db,
        &config,
        "example.com",
        Limit::Max(3),
        Limit::Max(4),
        Limit::Max(100),
    )
    .await;
    AccountService::new(&db, &config)
        .add_account("a@example.com", HASH, Some(Limit::Max(10)))
        .await
        .unwrap();
    AliasService::new(&db)
        .add_alias("info@example.com", "a@example.com")
        .await
        .unwrap();

    let summary = DomainService::new(&db, &config)
        .domain_summary("example.com")
        .await
        .unwrap();
    assert_eq!(summary.mailbox_count, 1);
    assert_eq!(summary.alias_count, 1);
    assert_eq!(summary.mailbox_limit, Limit::Max(3).to_string());
    assert_eq!(summary.alias_limit, Limit::Max(4).to_string());
}
