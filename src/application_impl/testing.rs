use crate::application_impl::*;
use crate::infra_memory::{MemoryRefreshLedger, MemoryUserRepo};
use std::sync::Arc;
use std::time::Duration;

pub const TEST_ISSUER: &str = "http://127.0.0.1:8080";

pub fn test_signer() -> Arc<JwtHs256Signer> {
    Arc::new(JwtHs256Signer::new(
        &SigningKey::new(b"unit-test-signing-key".to_vec()).unwrap(),
        TEST_ISSUER,
    ))
}

pub fn test_issuer(signer: Arc<dyn crate::application_port::TokenSigner>) -> TokenPairIssuer {
    TokenPairIssuer::new(
        signer,
        IssuerConfig {
            issuer: TEST_ISSUER.to_string(),
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(5 * 24 * 60 * 60),
        },
    )
}

pub struct TestAuth {
    pub service: RealAuthService,
    pub issuer: Arc<TokenPairIssuer>,
    pub ledger: Arc<MemoryRefreshLedger>,
}

impl TestAuth {
    pub fn new() -> Self {
        Self::with_min_password_len(1)
    }

    pub fn with_min_password_len(min_password_len: usize) -> Self {
        let signer = test_signer();
        let issuer = Arc::new(test_issuer(signer.clone()));
        let ledger = Arc::new(MemoryRefreshLedger::new());
        let service = RealAuthService::new(
            Arc::new(MemoryUserRepo::new()),
            Arc::new(Argon2PasswordHasher),
            signer,
            issuer.clone(),
            ledger.clone(),
        )
        .with_min_password_len(min_password_len);

        TestAuth {
            service,
            issuer,
            ledger,
        }
    }
}
