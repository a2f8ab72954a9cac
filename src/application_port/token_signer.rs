use crate::domain_model::*;

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum TokenError {
    #[error("signing failed: {0}")]
    Signing(String),
    #[error("malformed token")]
    Malformed,
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("unexpected issuer")]
    WrongIssuer,
    #[error("expected {expected} token, got {actual}")]
    WrongType {
        expected: TokenType,
        actual: TokenType,
    },
}

/// Signs and verifies compact tokens with one fixed algorithm.
///
/// Implementations hold nothing mutable besides the secret they were built with.
pub trait TokenSigner: Send + Sync {
    fn sign(&self, claims: &TokenClaims) -> Result<SignedToken, TokenError>;

    /// Checks structure, algorithm, signature, expiry and issuer.
    fn verify(&self, raw: &str) -> Result<TokenClaims, TokenError>;

    fn verify_typed(&self, raw: &str, expected: TokenType) -> Result<TokenClaims, TokenError> {
        let claims = self.verify(raw)?;
        if claims.token_type != expected {
            return Err(TokenError::WrongType {
                expected,
                actual: claims.token_type,
            });
        }
        Ok(claims)
    }
}
