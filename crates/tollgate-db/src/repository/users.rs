//! User operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{NewUser, User};
use crate::repository::Database;
use crate::utils::normalize_email;

impl Database {
    // ==================== User Operations ====================

    /// Insert a new user
    pub async fn insert_user(&self, user: NewUser) -> Result<User, DbError> {
        let now = Utc::now();
        let email = normalize_email(&user.email);

        // Check if user already exists
        let existing = self.get_user_by_email(&email).await?;
        if existing.is_some() {
            return Err(DbError::Duplicate(format!("User '{}' already exists", email)));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO users (email, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&email)
        .bind(&user.password_hash)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = result.get("id");

        Ok(User {
            id,
            email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a user by email address (case-insensitive)
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Update user password hash
    pub async fn update_user_password(&self, id: i64, password_hash: &str) -> Result<bool, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(password_hash)
        .bind(now.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Check if any users exist
    pub async fn has_users(&self) -> Result<bool, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM users")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = result.get("count");
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::DbError;
    use crate::models::NewUser;
    use crate::repository::test_support::temp_database;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "stored-hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let (db, _dir) = temp_database().await;
        assert!(!db.has_users().await.unwrap());

        let user = db.insert_user(new_user("u@example.com")).await.unwrap();
        assert!(db.has_users().await.unwrap());

        let by_id = db.get_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "u@example.com");
        assert_eq!(by_id.password_hash, "stored-hash");

        let by_email = db.get_user_by_email("u@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
    }

    #[tokio::test]
    async fn test_lookup_missing_user() {
        let (db, _dir) = temp_database().await;

        assert!(db.get_user_by_id(42).await.unwrap().is_none());
        assert!(db.get_user_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_email_is_normalized() {
        let (db, _dir) = temp_database().await;

        let user = db.insert_user(new_user("  Mixed@Example.COM")).await.unwrap();
        assert_eq!(user.email, "mixed@example.com");

        let found = db.get_user_by_email("MIXED@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let (db, _dir) = temp_database().await;

        db.insert_user(new_user("dup@example.com")).await.unwrap();
        let err = db.insert_user(new_user("DUP@example.com")).await.unwrap_err();
        assert!(matches!(err, DbError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_update_password() {
        let (db, _dir) = temp_database().await;
        let user = db.insert_user(new_user("u@example.com")).await.unwrap();

        assert!(db.update_user_password(user.id, "new-hash").await.unwrap());
        assert!(!db.update_user_password(user.id + 100, "new-hash").await.unwrap());

        let reloaded = db.get_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(reloaded.password_hash, "new-hash");
        assert!(reloaded.updated_at >= user.updated_at);
    }
}
