//! Admin repository.

use sqlx::{QueryBuilder, Sqlite};

use super::DbConn;
use crate::error::{Entity, PostadmError};
use crate::model::{Admin, AdminUpdate, NewAdmin};
use crate::Result;

const SELECT_ADMIN: &str =
    "SELECT username, password, superadmin, created, modified, active FROM admin";

/// Repository for admin rows.
pub struct AdminRepository<'c> {
    conn: &'c mut DbConn,
}

impl<'c> AdminRepository<'c> {
    /// Create a repository over a connection or transaction.
    pub fn new(conn: &'c mut DbConn) -> Self {
        Self { conn }
    }

    /// Check whether an admin exists.
    pub async fn exists(&mut self, username: &str) -> Result<bool> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM admin WHERE username = $1)")
                .bind(username)
                .fetch_one(&mut *self.conn)
                .await
                .map_err(|e| PostadmError::Database(e.to_string()))?;
        Ok(exists.0)
    }

    /// Get an admin by login name.
    pub async fn find(&mut self, username: &str) -> Result<Option<Admin>> {
        sqlx::query_as(&format!("{SELECT_ADMIN} WHERE username = $1"))
            .bind(username)
            .fetch_optional(&mut *self.conn)
            .await
            .map_err(|e| PostadmError::Database(e.to_string()))
    }

    /// Insert a validated admin draft.
    pub async fn create(&mut self, new_admin: &NewAdmin) -> Result<Admin> {
        sqlx::query("INSERT INTO admin (username, password, active) VALUES ($1, $2, $3)")
            .bind(&new_admin.username)
            .bind(&new_admin.password)
            .bind(new_admin.active)
            .execute(&mut *self.conn)
            .await
            .map_err(|e| PostadmError::from_insert(Entity::Admin, &new_admin.username, e))?;

        self.find(&new_admin.username)
            .await?
            .ok_or_else(|| PostadmError::not_found(Entity::Admin, &new_admin.username))
    }

    /// Update an admin's mutable fields.
    ///
    /// Returns the updated admin, or None if not found.
    pub async fn update(&mut self, username: &str, update: &AdminUpdate) -> Result<Option<Admin>> {
        if update.is_empty() {
            return self.find(username).await;
        }

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("UPDATE admin SET modified = datetime('now')");

        if let Some(ref password) = update.password {
            query.push(", password = ");
            query.push_bind(password.clone());
        }
        if let Some(active) = update.active {
            query.push(", active = ");
            query.push_bind(active);
        }

        query.push(" WHERE username = ");
        query.push_bind(username.to_string());

        let result = query
            .build()
            .execute(&mut *self.conn)
            .await
            .map_err(|e| PostadmError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find(username).await
    }

    /// Set the cached super-admin flag.
    pub async fn set_superadmin(&mut self, username: &str, superadmin: bool) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE admin SET superadmin = $1, modified = datetime('now') WHERE username = $2",
        )
        .bind(superadmin)
        .bind(username)
        .execute(&mut *self.conn)
        .await
        .map_err(|e| PostadmError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete an admin row. Its grants must already be gone.
    pub async fn delete(&mut self, username: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM admin WHERE username = $1")
            .bind(username)
            .execute(&mut *self.conn)
            .await
            .map_err(|e| PostadmError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// List all admins by login name.
    pub async fn list(&mut self) -> Result<Vec<Admin>> {
        sqlx::query_as(&format!("{SELECT_ADMIN} ORDER BY username"))
            .fetch_all(&mut *self.conn)
            .await
            .map_err(|e| PostadmError::Database(e.to_string()))
    }

    /// Count all admins.
    pub async fn count(&mut self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM admin")
            .fetch_one(&mut *self.conn)
            .await
            .map_err(|e| PostadmError::Database(e.to_string()))?;
        Ok(count.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[tokio::test]
    async fn test_create_and_find() {
        let db = Database::open_in_memory().await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let mut repo = AdminRepository::new(&mut conn);

        let draft = NewAdmin::new("Root@Example.com", "{PLAIN}secret")
            .normalized()
            .unwrap();
        let admin = repo.create(&draft).await.unwrap();
        assert_eq!(admin.username, "root@example.com");
        assert_eq!(admin.password, "{PLAIN}secret");
        assert!(!admin.superadmin);
        assert!(admin.active);

        assert!(repo.exists("root@example.com").await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_is_case_insensitive() {
        let db = Database::open_in_memory().await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let mut repo = AdminRepository::new(&mut conn);

        repo.create(&NewAdmin::new("root@example.com", "{PLAIN}a"))
            .await
            .unwrap();
        let mut upper = NewAdmin::new("root@example.com", "{PLAIN}b");
        upper.username = "ROOT@example.com".to_string();
        let err = repo.create(&upper).await.unwrap_err();
        assert!(matches!(
            err,
            PostadmError::AlreadyExists {
                entity: Entity::Admin,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_update_and_superadmin_flag() {
        let db = Database::open_in_memory().await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let mut repo = AdminRepository::new(&mut conn);
        repo.create(&NewAdmin::new("root@example.com", "{PLAIN}a"))
            .await
            .unwrap();

        let admin = repo
            .update(
                "root@example.com",
                &AdminUpdate::new().password("{PLAIN}b").active(false),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.password, "{PLAIN}b");
        assert!(!admin.active);

        assert!(repo.set_superadmin("root@example.com", true).await.unwrap());
        assert!(repo.find("root@example.com").await.unwrap().unwrap().superadmin);
        assert!(!repo.set_superadmin("nobody@example.com", true).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_and_list() {
        let db = Database::open_in_memory().await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let mut repo = AdminRepository::new(&mut conn);
        for name in ["b@example.com", "a@example.com"] {
            repo.create(&NewAdmin::new(name, "{PLAIN}x")).await.unwrap();
        }

        let names: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.username)
            .collect();
        assert_eq!(names, vec!["a@example.com", "b@example.com"]);

        assert!(repo.delete("a@example.com").await.unwrap());
        assert!(!repo.delete("a@example.com").await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
