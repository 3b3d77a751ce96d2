//! Scoped token engine: HS256-signed header/payload/signature tokens.
//!
//! The engine asserts cryptographic and temporal validity only. A token that
//! decodes fine but carries the wrong scope for an operation is an
//! authorization decision left to the orchestrator, which keeps the engine
//! reusable across every scope.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Purpose a token was issued for. A token is single-purpose.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Access,
    Refresh,
    Verify,
    Reset,
}

impl Scope {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
            Self::Verify => "verify",
            Self::Reset => "reset",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct TokenHeader {
    alg: String,
    typ: String,
}

impl TokenHeader {
    fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Verified claims returned by [`TokenEngine::decode`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub scope: Scope,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("invalid signing key")]
    Key,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, TokenError> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| TokenError::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Signs and verifies scoped, expiring tokens with a process-wide secret.
///
/// The key is read-only after construction and safe to share across tasks.
#[derive(Clone)]
pub struct TokenEngine {
    secret: SecretString,
}

impl std::fmt::Debug for TokenEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenEngine").finish_non_exhaustive()
    }
}

impl TokenEngine {
    #[must_use]
    pub const fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| TokenError::Key)
    }

    /// Create a signed token for `subject` with the given scope and lifetime.
    ///
    /// The `jti` claim is a fresh UUID, so two tokens issued within the same
    /// second still serialize differently.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be encoded or signing fails.
    pub fn issue(
        &self,
        subject: &str,
        scope: Scope,
        ttl: chrono::Duration,
    ) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            scope,
            exp: now + ttl.num_seconds(),
            iat: now,
            jti: Uuid::new_v4().to_string(),
        };

        let header_b64 = b64e_json(&TokenHeader::hs256())?;
        let claims_b64 = b64e_json(&claims)?;
        let signing_input = format!("{header_b64}.{claims_b64}");

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature}"))
    }

    /// Verify signature and expiry, returning the claims.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Expired`] once `exp` has elapsed (checked as
    /// soon as the payload parses, so expiry always wins over signature
    /// problems) and [`TokenError::InvalidSignature`] for tampered or
    /// foreign-key tokens. No claims are returned on any failure.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode_at(token, Utc::now().timestamp())
    }

    fn decode_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let mut parts = token.split('.');
        let (header_b64, claims_b64, signature_b64) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(header), Some(claims), Some(signature), None) => {
                    (header, claims, signature)
                }
                _ => return Err(TokenError::TokenFormat),
            };

        let header: TokenHeader = b64d_json(header_b64)?;
        let claims: Claims = b64d_json(claims_b64)?;

        if claims.exp <= now {
            return Err(TokenError::Expired);
        }

        if header.alg != "HS256" {
            return Err(TokenError::UnsupportedAlg(header.alg));
        }

        let signature = Base64UrlUnpadded::decode_vec(signature_b64)
            .map_err(|_| TokenError::Base64)?;

        let mut mac = self.mac()?;
        mac.update(format!("{header_b64}.{claims_b64}").as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> TokenEngine {
        TokenEngine::new(SecretString::from("test-signing-secret".to_string()))
    }

    #[test]
    fn issue_then_decode_returns_claims() {
        let engine = engine();
        let token = engine
            .issue("alice@example.com", Scope::Access, chrono::Duration::minutes(30))
            .unwrap();

        let claims = engine.decode(&token).unwrap();
        assert_eq!(claims.sub, "alice@example.com");
        assert_eq!(claims.scope, Scope::Access);
        assert!(claims.exp > claims.iat);
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn tokens_are_three_dot_separated_parts() {
        let token = engine()
            .issue("a@x.com", Scope::Verify, chrono::Duration::hours(24))
            .unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn same_second_issuance_yields_distinct_tokens() {
        let engine = engine();
        let first = engine
            .issue("a@x.com", Scope::Access, chrono::Duration::minutes(30))
            .unwrap();
        let second = engine
            .issue("a@x.com", Scope::Access, chrono::Duration::minutes(30))
            .unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn expired_token_decodes_to_expired() {
        let engine = engine();
        let token = engine
            .issue("a@x.com", Scope::Access, chrono::Duration::seconds(-60))
            .unwrap();
        assert!(matches!(engine.decode(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn expiry_wins_over_bad_signature() {
        let engine = engine();
        let token = engine
            .issue("a@x.com", Scope::Access, chrono::Duration::seconds(-60))
            .unwrap();
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push('A');
        assert!(matches!(engine.decode(&tampered), Err(TokenError::Expired)));
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let engine = engine();
        let token = engine
            .issue("a@x.com", Scope::Access, chrono::Duration::minutes(5))
            .unwrap();

        let mut parts: Vec<&str> = token.split('.').collect();
        let flipped = if parts[2].starts_with('A') { "B" } else { "A" };
        let mut signature = parts[2].to_string();
        signature.replace_range(0..1, flipped);
        parts[2] = &signature;
        let tampered = parts.join(".");

        assert!(matches!(
            engine.decode(&tampered),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn foreign_key_token_is_rejected() {
        let token = engine()
            .issue("a@x.com", Scope::Refresh, chrono::Duration::days(7))
            .unwrap();
        let other = TokenEngine::new(SecretString::from("another-secret".to_string()));
        assert!(matches!(
            other.decode(&token),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let engine = engine();
        let token = engine
            .issue("a@x.com", Scope::Access, chrono::Duration::minutes(5))
            .unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        let mut claims: Claims = b64d_json(parts[1]).unwrap();
        claims.sub = "mallory@example.com".to_string();
        let forged = format!("{}.{}.{}", parts[0], b64e_json(&claims).unwrap(), parts[2]);

        assert!(matches!(
            engine.decode(&forged),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let engine = engine();
        assert!(matches!(
            engine.decode("not-a-token"),
            Err(TokenError::TokenFormat)
        ));
        assert!(matches!(
            engine.decode("a.b.c.d"),
            Err(TokenError::TokenFormat)
        ));
        assert!(engine.decode("!!.!!.!!").is_err());
    }

    #[test]
    fn unsupported_algorithm_is_rejected() {
        let engine = engine();
        let header = b64e_json(&TokenHeader {
            alg: "none".to_string(),
            typ: "JWT".to_string(),
        })
        .unwrap();
        let claims = b64e_json(&Claims {
            sub: "a@x.com".to_string(),
            scope: Scope::Access,
            exp: Utc::now().timestamp() + 600,
            iat: Utc::now().timestamp(),
            jti: Uuid::new_v4().to_string(),
        })
        .unwrap();
        let token = format!("{header}.{claims}.");

        assert!(matches!(
            engine.decode(&token),
            Err(TokenError::UnsupportedAlg(alg)) if alg == "none"
        ));
    }

    #[test]
    fn scope_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Scope::Access).unwrap(), "\"access\"");
        assert_eq!(serde_json::to_string(&Scope::Reset).unwrap(), "\"reset\"");
        let scope: Scope = serde_json::from_str("\"refresh\"").unwrap();
        assert_eq!(scope, Scope::Refresh);
        assert_eq!(Scope::Verify.to_string(), "verify");
    }

    #[test]
    fn decode_at_respects_clock() {
        let engine = engine();
        let token = engine
            .issue("a@x.com", Scope::Access, chrono::Duration::seconds(10))
            .unwrap();
        let far_future = Utc::now().timestamp() + 3600;
        assert!(matches!(
            engine.decode_at(&token, far_future),
            Err(TokenError::Expired)
        ));
    }
}
