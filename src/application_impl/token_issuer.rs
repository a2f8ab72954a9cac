use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct IssuerConfig {
    pub issuer: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl IssuerConfig {
    /// Lifetimes must be non-zero, access shorter than refresh, and the
    /// resulting expiry representable as a timestamp.
    pub fn try_new(
        issuer: impl Into<String>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self, TokenError> {
        if access_ttl.is_zero() {
            return Err(TokenError::Signing("access lifetime must be positive".to_string()));
        }
        if access_ttl >= refresh_ttl {
            return Err(TokenError::Signing(
                "access lifetime must be shorter than refresh lifetime".to_string(),
            ));
        }
        expiry_after(Utc::now(), refresh_ttl)?;

        Ok(IssuerConfig {
            issuer: issuer.into(),
            access_ttl,
            refresh_ttl,
        })
    }
}

fn expiry_after(issued_at: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, TokenError> {
    TimeDelta::from_std(ttl)
        .ok()
        .and_then(|ttl| issued_at.checked_add_signed(ttl))
        .ok_or_else(|| TokenError::Signing(format!("lifetime of {}s is out of range", ttl.as_secs())))
}

/// Builds access/refresh pairs that share subject and issuer.
pub struct TokenPairIssuer {
    signer: Arc<dyn TokenSigner>,
    cfg: IssuerConfig,
}

impl TokenPairIssuer {
    pub fn new(signer: Arc<dyn TokenSigner>, cfg: IssuerConfig) -> Self {
        TokenPairIssuer { signer, cfg }
    }

    pub fn config(&self) -> &IssuerConfig {
        &self.cfg
    }

    pub fn issue_pair(&self, user_id: UserId) -> Result<TokenPair, TokenError> {
        self.issue_pair_at(user_id, Utc::now())
    }

    /// Either both tokens are signed or the call fails; no half pair escapes.
    pub fn issue_pair_at(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, TokenError> {
        let issued_at = now.trunc_subsecs(0);
        let access_token = self.sign(user_id, TokenType::Access, issued_at, self.cfg.access_ttl)?;
        let refresh_token =
            self.sign(user_id, TokenType::Refresh, issued_at, self.cfg.refresh_ttl)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    fn sign(
        &self,
        user_id: UserId,
        token_type: TokenType,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<SignedToken, TokenError> {
        let claims = TokenClaims {
            subject: user_id.to_string(),
            issuer: self.cfg.issuer.clone(),
            token_type,
            token_id: uuid::Uuid::new_v4().to_string(),
            issued_at,
            expires_at: expiry_after(issued_at, ttl)?,
        };
        self.signer.sign(&claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::testing::*;

    #[test]
    fn pair_carries_typed_tokens_for_the_same_user() {
        let signer = test_signer();
        let issuer = test_issuer(signer.clone());

        for _ in 0..8 {
            let user_id = UserId::new();
            let pair = issuer.issue_pair(user_id).unwrap();

            let access = signer.verify(pair.access_token.as_str()).unwrap();
            let refresh = signer.verify(pair.refresh_token.as_str()).unwrap();

            assert_eq!(access.token_type, TokenType::Access);
            assert_eq!(refresh.token_type, TokenType::Refresh);
            assert_eq!(access.user_id(), Some(user_id));
            assert_eq!(refresh.user_id(), Some(user_id));
            assert_eq!(access.issuer, TEST_ISSUER);
            assert_eq!(refresh.issuer, TEST_ISSUER);
        }
    }

    #[test]
    fn lifetimes_come_from_config() {
        let issuer = test_issuer(test_signer());
        let now = Utc::now();
        let pair = issuer.issue_pair_at(UserId::new(), now).unwrap();

        let access = &pair.access_token.claims;
        let refresh = &pair.refresh_token.claims;
        assert_eq!(access.issued_at, now.trunc_subsecs(0));
        assert_eq!(refresh.issued_at, access.issued_at);
        assert_eq!(access.expires_at - access.issued_at, chrono::Duration::minutes(15));
        assert_eq!(refresh.expires_at - refresh.issued_at, chrono::Duration::days(5));
    }

    #[test]
    fn pairs_issued_in_the_same_second_differ() {
        let issuer = test_issuer(test_signer());
        let user_id = UserId::new();
        let now = Utc::now();

        let first = issuer.issue_pair_at(user_id, now).unwrap();
        let second = issuer.issue_pair_at(user_id, now).unwrap();

        assert_ne!(first.access_token.raw, second.access_token.raw);
        assert_ne!(first.refresh_token.raw, second.refresh_token.raw);
        assert_ne!(first.access_token.raw, first.refresh_token.raw);
    }

    #[test]
    fn config_rejects_unusable_lifetimes() {
        let minute = Duration::from_secs(60);
        let cases = [
            (Duration::ZERO, minute),
            (minute, minute),
            (Duration::from_secs(600), minute),
            (minute, Duration::from_secs(u64::MAX)),
            (minute, Duration::from_secs(1_000_000 * 365 * 24 * 60 * 60)),
        ];
        for (access_ttl, refresh_ttl) in cases {
            assert!(
                matches!(
                    IssuerConfig::try_new(TEST_ISSUER, access_ttl, refresh_ttl),
                    Err(TokenError::Signing(_))
                ),
                "{access_ttl:?} / {refresh_ttl:?}"
            );
        }

        let cfg = IssuerConfig::try_new(TEST_ISSUER, minute, Duration::from_secs(600)).unwrap();
        assert_eq!(cfg.issuer, TEST_ISSUER);
    }

    #[test]
    fn oversized_lifetime_fails_instead_of_panicking() {
        for refresh_ttl in [
            Duration::from_secs(u64::MAX),
            Duration::from_secs(1_000_000 * 365 * 24 * 60 * 60),
        ] {
            let issuer = TokenPairIssuer::new(
                test_signer(),
                IssuerConfig {
                    issuer: TEST_ISSUER.to_string(),
                    access_ttl: Duration::from_secs(900),
                    refresh_ttl,
                },
            );
            assert!(matches!(
                issuer.issue_pair(UserId::new()),
                Err(TokenError::Signing(_))
            ));
        }
    }

    #[test]
    fn signing_failure_yields_no_pair() {
        let issuer = TokenPairIssuer::new(
            test_signer(),
            IssuerConfig {
                issuer: TEST_ISSUER.to_string(),
                access_ttl: Duration::from_secs(900),
                refresh_ttl: Duration::ZERO,
            },
        );

        assert!(matches!(
            issuer.issue_pair(UserId::new()),
            Err(TokenError::Signing(_))
        ));
    }
}
