use super::{SignedToken, UserId};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// One live refresh token, identified by `(user_id, hashed_token)`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RefreshLedgerEntry {
    pub user_id: UserId,
    pub hashed_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl RefreshLedgerEntry {
    pub fn for_token(user_id: UserId, token: &SignedToken, created_at: DateTime<Utc>) -> Self {
        RefreshLedgerEntry {
            user_id,
            hashed_token: digest_refresh_token(token.as_str()),
            created_at,
            expires_at: token.claims.expires_at,
        }
    }

    /// The upper bound is exclusive: an entry expiring exactly at `now` is dead.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// SHA-256 of the raw wire token, hex encoded.
///
/// Refresh tokens are high-entropy signed strings, so a fast digest is enough.
/// Password hashing lives in `Argon2PasswordHasher` and is never used here.
pub fn digest_refresh_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn digest_is_deterministic_hex() {
        let a = digest_refresh_token("header.payload.signature");
        let b = digest_refresh_token("header.payload.signature");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, "header.payload.signature");
    }

    #[test]
    fn digest_differs_per_token() {
        assert_ne!(
            digest_refresh_token("header.payload.signature"),
            digest_refresh_token("header.payload.signaturf")
        );
    }

    #[test]
    fn liveness_bound_is_exclusive() {
        let now = Utc::now();
        let entry = RefreshLedgerEntry {
            user_id: UserId::new(),
            hashed_token: digest_refresh_token("t"),
            created_at: now - Duration::days(1),
            expires_at: now,
        };
        assert!(!entry.is_live_at(now));
        assert!(entry.is_live_at(now - Duration::microseconds(1)));
    }
}
