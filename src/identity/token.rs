//! Bearer token issuance and verification (HS256 JWT).
//!
//! Verification is a pure function of the token, the signing secret and the
//! current time; no session state is kept on the server.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt::{Debug, Formatter};

use super::claims::Claims;

/// Validity window of an issued token.
pub const TOKEN_LIFETIME_SECS: i64 = 7 * 24 * 60 * 60;

const EXP_CLAIM: &str = "exp";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("secret key not found")]
    SecretNotConfigured,
    #[error("secret key already exists")]
    SecretAlreadySet,
    #[error("invalid content")]
    EmptyContent,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// Symmetric key for signing tokens. Never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(String);

impl SigningSecret {
    pub fn new<S: Into<String>>(secret: S) -> Result<Self, TokenError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(TokenError::SecretNotConfigured);
        }
        Ok(SigningSecret(secret))
    }

    fn as_bytes(&self) -> &[u8] { self.0.as_bytes() }
}

impl Debug for SigningSecret {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str("SigningSecret(***)") }
}

pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenIssuer {
    pub fn new(secret: SigningSecret) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // expiry is checked by hand: a token expiring exactly now is already expired
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(&self, claims: &Claims) -> Result<String, TokenError> {
        self.issue_at(claims, Utc::now())
    }

    /// Sign `claims` with an expiry of `now` plus [`TOKEN_LIFETIME_SECS`].
    ///
    /// `exp` is reserved for the issuer: claims that are empty or already carry
    /// it fail with `EmptyContent`, so whatever is issued verifies back unchanged.
    pub fn issue_at(&self, claims: &Claims, now: DateTime<Utc>) -> Result<String, TokenError> {
        if claims.is_empty() || claims.get(EXP_CLAIM).is_some() {
            return Err(TokenError::EmptyContent);
        }
        let mut payload = Map::new();
        for (k, v) in claims.iter() {
            payload.insert(k.to_string(), Value::String(v.to_string()));
        }
        payload.insert(EXP_CLAIM.to_string(), Value::from(now.timestamp() + TOKEN_LIFETIME_SECS));

        encode(&Header::new(Algorithm::HS256), &payload, &self.encoding)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Check signature and expiry against `now` and return the claims without `exp`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let data = decode::<Map<String, Value>>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                    TokenError::InvalidSignature
                }
                _ => TokenError::Malformed(e.to_string()),
            }
        })?;

        let mut payload = data.claims;
        let exp = payload
            .remove(EXP_CLAIM)
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
            .ok_or_else(|| TokenError::Malformed("missing or non-numeric exp".into()))?;
        if exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        let mut claims = Claims::new();
        for (k, v) in payload {
            match v {
                Value::String(s) => { claims.insert(k, s); }
                _ => return Err(TokenError::EmptyContent),
            }
        }
        if claims.is_empty() {
            return Err(TokenError::EmptyContent);
        }
        Ok(claims)
    }
}
