use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode,
};
use serde::{Deserialize, Serialize};
use std::fmt;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Symmetric secret resolved once at start-up.
#[derive(Clone)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, TokenError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(TokenError::Signing("signing key is empty".to_string()));
        }
        Ok(SigningKey(bytes))
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(..)")
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    sub: String,
    iss: String,
    token_type: TokenType,
    jti: String,
    iat: i64,
    exp: i64,
}

impl WireClaims {
    fn from_claims(claims: &TokenClaims) -> Self {
        WireClaims {
            sub: claims.subject.clone(),
            iss: claims.issuer.clone(),
            token_type: claims.token_type,
            jti: claims.token_id.clone(),
            iat: claims.issued_at.timestamp(),
            exp: claims.expires_at.timestamp(),
        }
    }

    fn into_claims(self) -> Option<TokenClaims> {
        Some(TokenClaims {
            subject: self.sub,
            issuer: self.iss,
            token_type: self.token_type,
            token_id: self.jti,
            issued_at: DateTime::<Utc>::from_timestamp(self.iat, 0)?,
            expires_at: DateTime::<Utc>::from_timestamp(self.exp, 0)?,
        })
    }
}

pub struct JwtHs256Signer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtHs256Signer {
    /// Only tokens whose `iss` equals `issuer` verify.
    pub fn new(key: &SigningKey, issuer: &str) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "iat", "sub", "iss"]);

        JwtHs256Signer {
            encoding_key: EncodingKey::from_secret(&key.0),
            decoding_key: DecodingKey::from_secret(&key.0),
            validation,
        }
    }

    fn map_decode_error(e: jsonwebtoken::errors::Error) -> TokenError {
        match e.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidAlgorithm => TokenError::UnsupportedAlgorithm(format!("{e}")),
            ErrorKind::InvalidIssuer => TokenError::WrongIssuer,
            _ => TokenError::Malformed,
        }
    }
}

impl TokenSigner for JwtHs256Signer {
    fn sign(&self, claims: &TokenClaims) -> Result<SignedToken, TokenError> {
        if claims.expires_at <= claims.issued_at {
            return Err(TokenError::Signing(
                "expiry must be after issue time".to_string(),
            ));
        }

        let wire = WireClaims::from_claims(claims);
        let raw = encode(&Header::new(ALGORITHM), &wire, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        // Timestamps travel as whole seconds; keep exactly what was signed.
        let claims = wire
            .into_claims()
            .ok_or_else(|| TokenError::Signing("timestamp out of range".to_string()))?;

        Ok(SignedToken { raw, claims })
    }

    fn verify(&self, raw: &str) -> Result<TokenClaims, TokenError> {
        let header = decode_header(raw).map_err(|_| TokenError::Malformed)?;
        if header.alg != ALGORITHM {
            return Err(TokenError::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }

        let data = decode::<WireClaims>(raw, &self.decoding_key, &self.validation)
            .map_err(Self::map_decode_error)?;

        let claims = data.claims.into_claims().ok_or(TokenError::Malformed)?;
        if claims.expires_at <= claims.issued_at {
            return Err(TokenError::Malformed);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, SubsecRound};

    const SECRET: &[u8] = b"unit-test-signing-key";
    const ISSUER: &str = "http://127.0.0.1:8080";

    fn signer() -> JwtHs256Signer {
        JwtHs256Signer::new(&SigningKey::new(SECRET).unwrap(), ISSUER)
    }

    fn with_header(raw: &str, header_b64: &str) -> String {
        let (_, rest) = raw.split_once('.').unwrap();
        format!("{header_b64}.{rest}")
    }

    fn claims(token_type: TokenType, issued_at: DateTime<Utc>, ttl: Duration) -> TokenClaims {
        TokenClaims {
            subject: UserId::new().to_string(),
            issuer: ISSUER.to_string(),
            token_type,
            token_id: uuid::Uuid::new_v4().to_string(),
            issued_at,
            expires_at: issued_at + ttl,
        }
    }

    #[test]
    fn verify_recovers_signed_claims() {
        let now = Utc::now().trunc_subsecs(0);
        let sent = claims(TokenType::Refresh, now, Duration::days(5));

        let token = signer().sign(&sent).unwrap();
        assert_eq!(token.claims, sent);

        let verified = signer().verify(&token.raw).unwrap();
        assert_eq!(verified, sent);
    }

    #[test]
    fn sub_second_precision_is_dropped_on_sign() {
        let now = Utc::now();
        let token = signer()
            .sign(&claims(TokenType::Access, now, Duration::minutes(15)))
            .unwrap();

        assert_eq!(token.claims.issued_at, now.trunc_subsecs(0));
        assert_eq!(signer().verify(&token.raw).unwrap(), token.claims);
    }

    #[test]
    fn sign_rejects_expiry_not_after_issue() {
        let now = Utc::now();
        let err = signer()
            .sign(&claims(TokenType::Access, now, Duration::zero()))
            .unwrap_err();
        assert!(matches!(err, TokenError::Signing(_)));
    }

    #[test]
    fn verify_rejects_other_algorithm() {
        let now = Utc::now().timestamp();
        let payload = serde_json::json!({
            "sub": UserId::new().to_string(),
            "iss": ISSUER,
            "token_type": "refresh",
            "jti": "substituted",
            "iat": now,
            "exp": now + 600,
        });
        for alg in [Algorithm::HS384, Algorithm::HS512] {
            let raw = encode(&Header::new(alg), &payload, &EncodingKey::from_secret(SECRET)).unwrap();
            let err = signer().verify(&raw).unwrap_err();
            assert!(matches!(err, TokenError::UnsupportedAlgorithm(_)), "{alg:?}: {err:?}");
        }
    }

    #[test]
    fn verify_rejects_none_and_asymmetric_headers() {
        let token = signer()
            .sign(&claims(TokenType::Access, Utc::now(), Duration::minutes(15)))
            .unwrap();

        // {"alg":"none","typ":"JWT"}
        let unsigned = with_header(&token.raw, "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0");
        assert_eq!(signer().verify(&unsigned), Err(TokenError::Malformed));
        let stripped = format!("{}.", unsigned.rsplit_once('.').unwrap().0);
        assert_eq!(signer().verify(&stripped), Err(TokenError::Malformed));

        // {"alg":"RS256","typ":"JWT"}
        let rs256 = with_header(&token.raw, "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9");
        assert!(matches!(
            signer().verify(&rs256),
            Err(TokenError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn verify_rejects_other_issuer() {
        let token = signer()
            .sign(&TokenClaims {
                issuer: "https://elsewhere".to_string(),
                ..claims(TokenType::Access, Utc::now(), Duration::minutes(15))
            })
            .unwrap();

        assert_eq!(signer().verify(&token.raw), Err(TokenError::WrongIssuer));
    }

    #[test]
    fn verify_rejects_foreign_key() {
        let other = JwtHs256Signer::new(&SigningKey::new(b"some-other-key".to_vec()).unwrap(), ISSUER);
        let token = other
            .sign(&claims(TokenType::Access, Utc::now(), Duration::minutes(15)))
            .unwrap();

        assert_eq!(signer().verify(&token.raw), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn verify_rejects_swapped_payload() {
        let a = signer()
            .sign(&claims(TokenType::Access, Utc::now(), Duration::minutes(15)))
            .unwrap();
        let b = signer()
            .sign(&claims(TokenType::Refresh, Utc::now(), Duration::days(5)))
            .unwrap();

        let a_parts: Vec<&str> = a.raw.split('.').collect();
        let b_parts: Vec<&str> = b.raw.split('.').collect();
        let forged = format!("{}.{}.{}", a_parts[0], b_parts[1], a_parts[2]);

        assert_eq!(signer().verify(&forged), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn verify_rejects_garbage() {
        for raw in ["", "not-a-token", "a.b", "a.b.c", "...."] {
            assert_eq!(signer().verify(raw), Err(TokenError::Malformed), "{raw:?}");
        }
    }

    #[test]
    fn verify_rejects_expired() {
        let issued = Utc::now() - Duration::hours(2);
        let token = signer()
            .sign(&claims(TokenType::Refresh, issued, Duration::hours(1)))
            .unwrap();

        assert_eq!(signer().verify(&token.raw), Err(TokenError::Expired));
    }

    #[test]
    fn verify_typed_checks_discriminator() {
        let token = signer()
            .sign(&claims(TokenType::Refresh, Utc::now(), Duration::days(5)))
            .unwrap();

        assert!(signer().verify_typed(&token.raw, TokenType::Refresh).is_ok());
        assert_eq!(
            signer().verify_typed(&token.raw, TokenType::Access),
            Err(TokenError::WrongType {
                expected: TokenType::Access,
                actual: TokenType::Refresh,
            })
        );
    }

    #[test]
    fn empty_key_is_refused() {
        assert!(SigningKey::new(Vec::new()).is_err());
    }
}
