//! JWT Token Handler
//! Mission: Issue and validate signed, time-bounded identity tokens

use crate::auth::models::Claims;
use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

/// Why a presented token was rejected.
///
/// All variants are per-request outcomes; the request gate converts them to
/// an anonymous request rather than an error response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token could not be parsed at all.
    Malformed,
    /// The signature does not match (tampered or foreign token).
    InvalidSignature,
    /// The validity window has elapsed.
    Expired,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Malformed => write!(f, "malformed token"),
            TokenError::InvalidSignature => write!(f, "invalid token signature"),
            TokenError::Expired => write!(f, "token expired"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Stateless HS256 token issuer/validator.
///
/// The secret and validity window come from process-wide configuration and
/// are immutable after startup. Tokens are never persisted or revoked;
/// validity is reconstructed from the signature and expiry alone.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiration_secs: i64,
}

impl TokenService {
    pub fn new(secret: &str, expiration_secs: i64) -> Self {
        let mut validation = Validation::default();
        // No clock-skew tolerance beyond process clock resolution.
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiration_secs,
        }
    }

    /// Issue a token for an authenticated subject.
    pub fn issue(&self, subject: &str) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now,
            exp: now + self.expiration_secs,
        };

        debug!(subject, expires_in_secs = self.expiration_secs, "Issuing JWT");

        encode(&Header::default(), &claims, &self.encoding_key).context("Failed to sign JWT")
    }

    /// Verify signature and expiry, returning the embedded subject.
    pub fn validate(&self, token: &str) -> Result<String, TokenError> {
        let decoded =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                    _ => TokenError::Malformed,
                }
            })?;

        Ok(decoded.claims.sub)
    }
}
