use super::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Access => f.write_str("access"),
            TokenType::Refresh => f.write_str("refresh"),
        }
    }
}

/// Payload carried inside a signed token.
///
/// `subject` stays a raw string so that callers decide how to interpret it;
/// see [`TokenClaims::user_id`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TokenClaims {
    pub subject: String,
    pub issuer: String,
    pub token_type: TokenType,
    pub token_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TokenClaims {
    /// Parses the subject as a user identity.
    pub fn user_id(&self) -> Option<UserId> {
        self.subject.parse::<UserId>().ok()
    }
}

/// A token in its wire form together with the claims it was built from.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SignedToken {
    pub raw: String,
    pub claims: TokenClaims,
}

impl SignedToken {
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TokenPair {
    pub access_token: SignedToken,
    pub refresh_token: SignedToken,
}
