use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Ledger kept in process memory.
///
/// All rows of one user live under a single map entry, so every method below
/// runs under that entry's lock and is atomic per user.
#[derive(Debug, Default)]
pub struct MemoryRefreshLedger {
    rows: DashMap<UserId, Vec<RefreshLedgerEntry>>,
}

impl MemoryRefreshLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count_for(&self, user_id: UserId) -> usize {
        self.rows.get(&user_id).map(|rows| rows.len()).unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl RefreshLedger for MemoryRefreshLedger {
    async fn insert(
        &self,
        user_id: UserId,
        token: &SignedToken,
    ) -> Result<RefreshLedgerEntry, LedgerError> {
        let entry = RefreshLedgerEntry::for_token(user_id, token, Utc::now());
        let mut rows = self.rows.entry(user_id).or_default();
        if rows.iter().any(|r| r.hashed_token == entry.hashed_token) {
            return Err(LedgerError::DuplicateKey);
        }
        rows.push(entry.clone());
        Ok(entry)
    }

    async fn lookup(&self, user_id: UserId, raw: &str) -> Result<RefreshLedgerEntry, LedgerError> {
        let hashed_token = digest_refresh_token(raw);
        self.rows
            .get(&user_id)
            .and_then(|rows| rows.iter().find(|r| r.hashed_token == hashed_token).cloned())
            .ok_or(LedgerError::NotFound)
    }

    async fn delete_all(&self, user_id: UserId) -> Result<u64, LedgerError> {
        Ok(self
            .rows
            .remove(&user_id)
            .map(|(_, rows)| rows.len() as u64)
            .unwrap_or(0))
    }

    async fn replace(
        &self,
        user_id: UserId,
        token: &SignedToken,
    ) -> Result<RefreshLedgerEntry, LedgerError> {
        let entry = RefreshLedgerEntry::for_token(user_id, token, Utc::now());
        let mut rows = self.rows.entry(user_id).or_default();
        rows.clear();
        rows.push(entry.clone());
        Ok(entry)
    }

    async fn rotate(
        &self,
        user_id: UserId,
        presented: &str,
        next: &SignedToken,
    ) -> Result<RefreshLedgerEntry, LedgerError> {
        let presented = digest_refresh_token(presented);
        let entry = RefreshLedgerEntry::for_token(user_id, next, Utc::now());

        match self.rows.entry(user_id) {
            Entry::Occupied(mut occupied) => {
                let rows = occupied.get_mut();
                if !rows.iter().any(|r| r.hashed_token == presented) {
                    return Err(LedgerError::NotFound);
                }
                rows.clear();
                rows.push(entry.clone());
                Ok(entry)
            }
            Entry::Vacant(_) => Err(LedgerError::NotFound),
        }
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, LedgerError> {
        let mut purged = 0u64;
        self.rows.retain(|_, rows| {
            let before = rows.len();
            rows.retain(|r| r.is_live_at(now));
            purged += (before - rows.len()) as u64;
            !rows.is_empty()
        });
        Ok(purged)
    }
}
