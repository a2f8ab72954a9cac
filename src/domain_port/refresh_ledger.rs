use crate::domain_model::*;
use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("refresh token not found")]
    NotFound,
    #[error("refresh token already recorded for user")]
    DuplicateKey,
    #[error("persistence error: {0}")]
    Persistence(String),
}

/// Durable record of the refresh tokens that are currently live, stored as digests.
///
/// Every method hashes the raw token itself; callers never see or pass digests.
#[async_trait::async_trait]
pub trait RefreshLedger: Send + Sync {
    async fn insert(
        &self,
        user_id: UserId,
        token: &SignedToken,
    ) -> Result<RefreshLedgerEntry, LedgerError>;

    /// `NotFound` when no row matches `(user_id, digest(raw))`.
    async fn lookup(&self, user_id: UserId, raw: &str) -> Result<RefreshLedgerEntry, LedgerError>;

    /// Idempotent; returns the number of rows removed.
    async fn delete_all(&self, user_id: UserId) -> Result<u64, LedgerError>;

    /// `delete_all` followed by `insert`, as one atomic unit.
    async fn replace(
        &self,
        user_id: UserId,
        token: &SignedToken,
    ) -> Result<RefreshLedgerEntry, LedgerError>;

    /// Consumes the row of `presented`, drops the rest of the user's rows and
    /// records `next`, as one atomic unit. `NotFound` if `presented` is no
    /// longer recorded, in which case nothing changes.
    async fn rotate(
        &self,
        user_id: UserId,
        presented: &str,
        next: &SignedToken,
    ) -> Result<RefreshLedgerEntry, LedgerError>;

    /// Removes every row with `expires_at <= now`.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, LedgerError>;
}
