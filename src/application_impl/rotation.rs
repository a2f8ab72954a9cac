use crate::application_impl::TokenPairIssuer;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Gates a presented refresh token passes through, in order.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RotationStage {
    Presented,
    SignatureVerified,
    SubjectExtracted,
    LedgerMatched,
    NotExpired,
    Reissued,
    LedgerUpdated,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum RejectReason {
    Token(TokenError),
    BadSubject,
    UnknownToken,
    Expired,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Token(e) => write!(f, "{e}"),
            RejectReason::BadSubject => f.write_str("subject is not a user id"),
            RejectReason::UnknownToken => f.write_str("no ledger entry"),
            RejectReason::Expired => f.write_str("ledger entry expired"),
        }
    }
}

/// `stage` is the last gate the token got through.
#[derive(Debug, thiserror::Error)]
pub enum RotationError {
    #[error("rejected after {stage:?}: {reason}")]
    Unauthorized {
        stage: RotationStage,
        reason: RejectReason,
    },
    #[error("failed after {stage:?}: {reason}")]
    Internal { stage: RotationStage, reason: String },
}

impl From<RotationError> for AuthError {
    fn from(error: RotationError) -> Self {
        match error {
            RotationError::Unauthorized {
                reason: RejectReason::Expired | RejectReason::Token(TokenError::Expired),
                ..
            } => AuthError::TokenExpired,
            RotationError::Unauthorized { .. } => AuthError::TokenInvalid,
            RotationError::Internal { reason, .. } => AuthError::InternalError(reason),
        }
    }
}

fn reject(stage: RotationStage, reason: RejectReason) -> RotationError {
    RotationError::Unauthorized { stage, reason }
}

fn internal(stage: RotationStage, reason: impl fmt::Display) -> RotationError {
    RotationError::Internal {
        stage,
        reason: reason.to_string(),
    }
}

/// Exchanges a refresh token for a new pair.
///
/// The ledger, not the signature, decides whether a refresh token is live: a
/// rotated token keeps a valid signature until it expires but has no ledger row.
pub struct RotationProtocol {
    signer: Arc<dyn TokenSigner>,
    issuer: Arc<TokenPairIssuer>,
    ledger: Arc<dyn RefreshLedger>,
}

impl RotationProtocol {
    pub fn new(
        signer: Arc<dyn TokenSigner>,
        issuer: Arc<TokenPairIssuer>,
        ledger: Arc<dyn RefreshLedger>,
    ) -> Self {
        RotationProtocol {
            signer,
            issuer,
            ledger,
        }
    }

    pub async fn rotate(&self, raw: &str) -> Result<TokenPair, RotationError> {
        self.rotate_at(raw, Utc::now()).await
    }

    pub async fn rotate_at(
        &self,
        raw: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, RotationError> {
        let result = self.run(raw, now).await;
        match &result {
            Ok(_) => debug!(stage = ?RotationStage::LedgerUpdated, "refresh token rotated"),
            Err(e) => warn!(error = %e, "refresh token rotation refused"),
        }
        result
    }

    async fn run(&self, raw: &str, now: DateTime<Utc>) -> Result<TokenPair, RotationError> {
        use RotationStage::*;

        let claims = self
            .signer
            .verify_typed(raw, TokenType::Refresh)
            .map_err(|e| reject(Presented, RejectReason::Token(e)))?;

        let user_id = claims
            .user_id()
            .ok_or_else(|| reject(SignatureVerified, RejectReason::BadSubject))?;

        let entry = match self.ledger.lookup(user_id, raw).await {
            Ok(entry) => entry,
            Err(LedgerError::NotFound) => {
                return Err(reject(SubjectExtracted, RejectReason::UnknownToken));
            }
            Err(e) => return Err(internal(SubjectExtracted, e)),
        };

        if !entry.is_live_at(now) {
            return Err(reject(LedgerMatched, RejectReason::Expired));
        }

        let pair = self
            .issuer
            .issue_pair_at(user_id, now)
            .map_err(|e| internal(NotExpired, e))?;

        match self.ledger.rotate(user_id, raw, &pair.refresh_token).await {
            Ok(_) => Ok(pair),
            // A concurrent rotation consumed the row between lookup and rotate.
            Err(LedgerError::NotFound) => Err(reject(Reissued, RejectReason::UnknownToken)),
            Err(e) => Err(internal(Reissued, e)),
        }
    }
}
