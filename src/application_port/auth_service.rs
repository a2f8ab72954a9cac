use crate::domain_model::*;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user already exists")]
    UserExists,
    #[error("token invalid")]
    TokenInvalid,
    #[error("token expired")]
    TokenExpired,
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(Debug, Clone)]
pub struct SignupInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct SigninInput {
    pub email: String,
    pub password: String,
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn signup(&self, request: SignupInput) -> Result<UserId, AuthError>;

    /// Verifies credentials and replaces every prior refresh token of the user.
    async fn signin(&self, request: SigninInput) -> Result<TokenPair, AuthError>;

    /// Resolves a bearer access token to the user it was issued to.
    async fn authorize(&self, access_token: &str) -> Result<UserId, AuthError>;

    /// Exchanges a live refresh token for a new pair; the presented one dies.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;

    /// Drops every refresh token of the user. Returns how many were live.
    async fn signout(&self, user_id: UserId) -> Result<u64, AuthError>;
}
