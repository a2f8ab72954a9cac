use crate::application_impl::{RotationProtocol, TokenPairIssuer};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;
use tracing::{debug, info};

impl From<LedgerError> for AuthError {
    fn from(error: LedgerError) -> Self {
        AuthError::Store(error.to_string())
    }
}

pub struct RealAuthService {
    user_repo: Arc<dyn UserRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    signer: Arc<dyn TokenSigner>,
    issuer: Arc<TokenPairIssuer>,
    ledger: Arc<dyn RefreshLedger>,
    rotation: RotationProtocol,
    min_password_len: usize,
}

impl RealAuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        signer: Arc<dyn TokenSigner>,
        issuer: Arc<TokenPairIssuer>,
        ledger: Arc<dyn RefreshLedger>,
    ) -> Self {
        let rotation = RotationProtocol::new(signer.clone(), issuer.clone(), ledger.clone());
        Self {
            user_repo,
            credential_hasher,
            signer,
            issuer,
            ledger,
            rotation,
            min_password_len: 1,
        }
    }

    pub fn with_min_password_len(mut self, min_password_len: usize) -> Self {
        self.min_password_len = min_password_len.max(1);
        self
    }

    fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    fn validate_signup(&self, email: &str, password: &str) -> Result<(), AuthError> {
        if email.is_empty() {
            return Err(AuthError::InvalidInput("email is required".to_string()));
        }
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => return Err(AuthError::InvalidInput("email is malformed".to_string())),
        }
        if password.is_empty() {
            return Err(AuthError::InvalidInput("password is required".to_string()));
        }
        if password.chars().count() < self.min_password_len {
            return Err(AuthError::InvalidInput("password too short".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn signup(&self, request: SignupInput) -> Result<UserId, AuthError> {
        let SignupInput { email, password } = request;
        let email = Self::normalize_email(&email);

        self.validate_signup(&email, &password)?;

        if self.user_repo.get_by_email(&email).await?.is_some() {
            return Err(AuthError::UserExists);
        }

        let user_id = UserId::new();
        let password_hash = self.credential_hasher.hash_password(&password).await?;
        // The unique index still catches a racing signup for the same email.
        self.user_repo
            .create(user_id, &email, &password_hash)
            .await?;

        info!(%user_id, "user signed up");
        Ok(user_id)
    }

    async fn signin(&self, request: SigninInput) -> Result<TokenPair, AuthError> {
        let SigninInput { email, password } = request;
        let email = Self::normalize_email(&email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidInput(
                "email and password are required".to_string(),
            ));
        }

        let rec = self
            .user_repo
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let ok = self
            .credential_hasher
            .verify_password(&password, &rec.password_hash)
            .await?;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self
            .issuer
            .issue_pair(rec.user_id)
            .map_err(|e| AuthError::InternalError(e.to_string()))?;

        // Every earlier session of this user ends here.
        self.ledger.replace(rec.user_id, &pair.refresh_token).await?;

        info!(user_id = %rec.user_id, "user signed in");
        Ok(pair)
    }

    async fn authorize(&self, access_token: &str) -> Result<UserId, AuthError> {
        let claims = self
            .signer
            .verify_typed(access_token, TokenType::Access)
            .map_err(|e| {
                debug!(error = %e, "access token refused");
                match e {
                    TokenError::Expired => AuthError::TokenExpired,
                    _ => AuthError::TokenInvalid,
                }
            })?;

        let user_id = claims.user_id().ok_or(AuthError::TokenInvalid)?;

        if !self.user_repo.id_exists(user_id).await? {
            return Err(AuthError::TokenInvalid);
        }

        Ok(user_id)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        Ok(self.rotation.rotate(refresh_token).await?)
    }

    async fn signout(&self, user_id: UserId) -> Result<u64, AuthError> {
        let revoked = self.ledger.delete_all(user_id).await?;
        info!(%user_id, revoked, "user signed out");
        Ok(revoked)
    }
}
