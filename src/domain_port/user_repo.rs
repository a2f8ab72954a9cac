use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user_id: UserId,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    /// Fails with `UserExists` when the email is taken.
    async fn create(
        &self,
        user_id: UserId,
        email: &str,
        password_hash: &str,
    ) -> Result<(), AuthError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError>;

    async fn id_exists(&self, user_id: UserId) -> Result<bool, AuthError>;
}
