//! Admin and grant tests, including super-admin handling on `ALL`.

mod common;

use common::{seed_unlimited_domain, setup, HASH};
use postadm::{
    AdminScope, AdminService, AdminUpdate, AuditLog, Config, DomainService, Entity,
    PostadmError, ALL_DOMAINS,
};

#[tokio::test]
async fn test_super_admin_toggle_is_idempotent() {
    let (db, config) = setup().await;
    let admins = AdminService::new(&db, &config);
    admins.add_admin("root@example.net", HASH).await.unwrap();

    for _ in 0..2 {
        admins
            .set_super_admin("root@example.net", true)
            .await
            .unwrap();
        assert!(admins.is_super_admin("root@example.net").await.unwrap());
        assert_eq!(
            admins.admin_domains("root@example.net").await.unwrap(),
            vec![ALL_DOMAINS.to_string()]
        );
    }
    assert!(admins.get_admin("root@example.net").await.unwrap().superadmin);

    for _ in 0..2 {
        admins
            .set_super_admin("root@example.net", false)
            .await
            .unwrap();
        assert!(!admins.is_super_admin("root@example.net").await.unwrap());
    }
    assert!(!admins.get_admin("root@example.net").await.unwrap().superadmin);

    let domains = DomainService::new(&db, &config);
    assert!(domains.domain_exists(ALL_DOMAINS).await.unwrap());
}

#[tokio::test]
async fn test_super_admin_covers_every_domain() {
    let (db, config) = setup().await;
    seed_unlimited_domain(&db, &config, "example.com").await;
    let admins = AdminService::new(&db, &config);
    admins.add_admin("root@example.net", HASH).await.unwrap();
    admins
        .add_admin_domain("root@example.net", "all")
        .await
        .unwrap();

    assert_eq!(
        admins.admin_scope("root@example.net").await.unwrap(),
        AdminScope::Global
    );
    assert!(admins
        .has_domain("root@example.net", "example.com")
        .await
        .unwrap());
    assert!(matches!(
        admins
            .add_admin_domain("root@example.net", "example.com")
            .await,
        Err(PostadmError::AlreadyExists {
            entity: Entity::Grant,
            ..
        })
    ));

    admins
        .delete_admin_domain("root@example.net", ALL_DOMAINS)
        .await
        .unwrap();
    assert!(!admins
        .has_domain("root@example.net", "example.com")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_scoped_grants() {
    let (db, config) = setup().await;
    seed_unlimited_domain(&db, &config, "example.com").await;
    seed_unlimited_domain(&db, &config, "other.org").await;
    let admins = AdminService::new(&db, &config);
    admins.add_admin("ops@example.net", HASH).await.unwrap();
    admins
        .add_admin_domain("ops@example.net", "Example.COM")
        .await
        .unwrap();

    let scope = admins.admin_scope("ops@example.net").await.unwrap();
    assert!(scope.covers("example.com"));
    assert!(!scope.covers("other.org"));

    assert!(matches!(
        admins.add_admin_domain("ops@example.net", "missing.org").await,
        Err(PostadmError::NotFound {
            entity: Entity::Domain,
            ..
        })
    ));
    assert!(matches!(
        admins.add_admin_domain("nobody@example.net", "other.org").await,
        Err(PostadmError::NotFound {
            entity: Entity::Admin,
            ..
        })
    ));
    assert!(matches!(
        admins
            .delete_admin_domain("ops@example.net", "other.org")
            .await,
        Err(PostadmError::NotFound {
            entity: Entity::Grant,
            ..
        })
    ));
}

#[tokio::test]
async fn test_deleting_an_admin_drops_its_grants() {
    let (db, config) = setup().await;
    seed_unlimited_domain(&db, &config, "example.com").await;
    let admins = AdminService::new(&db, &config);
    admins.add_admin("ops@example.net", HASH).await.unwrap();
    admins
        .add_admin_domain("ops@example.net", "example.com")
        .await
        .unwrap();

    admins.delete_admin("ops@example.net").await.unwrap();
    assert!(!admins.admin_exists("ops@example.net").await.unwrap());

    let summary = DomainService::new(&db, &config)
        .domain_summary("example.com")
        .await
        .unwrap();
    assert!(summary.admins.is_empty());
}

#[tokio::test]
async fn test_login_name_cannot_change() {
    let (db, config) = setup().await;
    let admins = AdminService::new(&db, &config);
    admins.add_admin("ops@example.net", HASH).await.unwrap();

    assert!(matches!(
        admins
            .update_admin(
                "ops@example.net",
                AdminUpdate::new().username("other@example.net")
            )
            .await,
        Err(PostadmError::InvariantViolation {
            entity: Entity::Admin,
            ..
        })
    ));
    let admin = admins
        .update_admin("ops@example.net", AdminUpdate::new().active(false))
        .await
        .unwrap();
    assert!(!admin.active);
}

#[tokio::test]
async fn test_grants_are_not_audited() {
    let (db, config) = setup().await;
    seed_unlimited_domain(&db, &config, "example.com").await;
    let log = AuditLog::new(&db);
    let admins = AdminService::new(&db, &config).with_actor("root@example.net");
    admins.add_admin("ops@example.net", HASH).await.unwrap();
    let before = log.count().await.unwrap();

    admins
        .add_admin_domain("ops@example.net", "example.com")
        .await
        .unwrap();
    admins
        .set_super_admin("ops@example.net", true)
        .await
        .unwrap();
    admins
        .delete_admin_domain("ops@example.net", "example.com")
        .await
        .unwrap();

    assert_eq!(log.count().await.unwrap(), before);
}

#[tokio::test]
async fn test_superadmin_flag_left_alone_when_disabled() {
    let db = postadm::Database::open_in_memory().await.unwrap();
    let mut config = Config::default();
    config.schema.superadmin_flag = false;
    let admins = AdminService::new(&db, &config);
    admins.add_admin("root@example.net", HASH).await.unwrap();

    admins
        .set_super_admin("root@example.net", true)
        .await
        .unwrap();
    assert!(admins.is_super_admin("root@example.net").await.unwrap());
    assert!(!admins.get_admin("root@example.net").await.unwrap().superadmin);
}
