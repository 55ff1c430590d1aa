//! User lookup seam

use async_trait::async_trait;
use tollgate_db::{Database, DbError, User};

/// Where the authentication layer loads users from
///
/// Both lookups may legitimately return `Ok(None)`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, DbError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DbError>;

    /// Replace a user's stored password hash
    async fn update_password_hash(&self, id: i64, password_hash: &str) -> Result<bool, DbError>;
}

#[async_trait]
impl UserStore for Database {
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        self.get_user_by_id(id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        self.get_user_by_email(email).await
    }

    async fn update_password_hash(&self, id: i64, password_hash: &str) -> Result<bool, DbError> {
        self.update_user_password(id, password_hash).await
    }
}
