//! User repository.

use super::user::{NewUser, User};
use super::DbPool;
use crate::{PodcastMgError, Result};

const USER_COLUMNS: &str =
    "id, email, password, is_admin, created_at, updated_at, deleted_at";

/// Repository for user CRUD operations.
///
/// Lookups only return users that have not been soft deleted.
pub struct UserRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new user.
    ///
    /// A duplicate email fails with [`PodcastMgError::AlreadyExists`].
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (email, password, is_admin) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(&new_user.email)
        .bind(&new_user.password)
        .bind(new_user.is_admin)
        .fetch_one(self.pool)
        .await
        .map_err(|e| match PodcastMgError::from(e) {
            PodcastMgError::AlreadyExists(_) => PodcastMgError::AlreadyExists("user".to_string()),
            other => other,
        })?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| PodcastMgError::NotFound("user".to_string()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ? AND deleted_at IS NULL");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(user)
    }

    /// Get a user by email.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql =
            format!("SELECT {USER_COLUMNS} FROM users WHERE email = ? AND deleted_at IS NULL");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(self.pool)
            .await?;
        Ok(user)
    }

    /// Check whether an email is taken, including by soft deleted users.
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
            .bind(email)
            .fetch_one(self.pool)
            .await?;
        Ok(exists)
    }

    /// Soft delete a user. The row and its subscriptions are kept.
    ///
    /// Returns false if the user does not exist or is already deleted.
    pub async fn soft_delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET deleted_at = datetime('now'), updated_at = datetime('now')
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_create_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let user = repo
            .create(&NewUser::new("alice@example.com", "hash"))
            .await
            .unwrap();

        assert!(user.id > 0);
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.password, "hash");
        assert!(!user.is_admin);
        assert!(user.deleted_at.is_none());
    }

    #[tokio::test]
    async fn test_create_duplicate_email() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        repo.create(&NewUser::new("alice@example.com", "hash"))
            .await
            .unwrap();
        let result = repo.create(&NewUser::new("alice@example.com", "other")).await;

        match result {
            Err(PodcastMgError::AlreadyExists(what)) => assert_eq!(what, "user"),
            other => panic!("Expected AlreadyExists, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_by_email() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let created = repo
            .create(&NewUser::new("bob@example.com", "hash"))
            .await
            .unwrap();

        let found = repo.get_by_email("bob@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);

        assert!(repo.get_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_soft_delete_hides_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        assert!(!repo.email_exists("erin@example.com").await.unwrap());
        let user = repo
            .create(&NewUser::new("erin@example.com", "hash"))
            .await
            .unwrap();
        assert!(repo.email_exists("erin@example.com").await.unwrap());

        assert!(repo.soft_delete(user.id).await.unwrap());
        assert!(!repo.soft_delete(user.id).await.unwrap());

        assert!(repo.get_by_id(user.id).await.unwrap().is_none());
        assert!(repo.get_by_email("erin@example.com").await.unwrap().is_none());

        // The email stays reserved
        assert!(repo.email_exists("erin@example.com").await.unwrap());
        assert!(repo
            .create(&NewUser::new("erin@example.com", "hash"))
            .await
            .is_err());
    }
}
