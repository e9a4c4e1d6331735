//! Signed access token issuance and verification (HS256 JWT)

use crate::{config::SecurityConfig, error::AppError, models::user::Role};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    crypto, decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// The caller-supplied part of a token's claims
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimSet {
    pub subject: Uuid,
    pub username: String,
    pub role: Role,
}

/// JWT claims as carried on the wire
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (identity ID)
    pub sub: Uuid,

    /// Username
    pub username: String,

    /// Role at issuance time
    pub role: Role,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,
}

impl Claims {
    pub fn claim_set(&self) -> ClaimSet {
        ClaimSet {
            subject: self.sub,
            username: self.username.clone(),
            role: self.role,
        }
    }
}

/// Why a token was rejected. Callers outside the codec should not surface
/// the distinction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,
}

/// Token codec
///
/// Keys are derived once from the configured secret and never change for
/// the lifetime of the process, so a shared `Arc<TokenCodec>` needs no
/// locking.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_token_exp_secs: u64,
}

impl TokenCodec {
    /// Create codec from config
    pub fn from_config(config: &SecurityConfig) -> Result<Self, AppError> {
        Self::new(config.jwt_secret.expose_secret(), config.access_token_exp_secs)
    }

    pub fn new(secret: &str, access_token_exp_secs: u64) -> Result<Self, AppError> {
        // Ensure secret is at least 32 bytes for HS256
        if secret.len() < 32 {
            return Err(AppError::Config("JWT secret too short (min 32 chars)".to_string()));
        }

        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_token_exp_secs,
        })
    }

    /// Lifetime of tokens issued by [`TokenCodec::issue_access_token`]
    pub fn access_token_exp_secs(&self) -> u64 {
        self.access_token_exp_secs
    }

    /// Sign `claims` into a token expiring `ttl` from now. A negative `ttl`
    /// produces an already-expired token.
    pub fn issue(&self, claims: &ClaimSet, ttl: Duration) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now + ttl;

        let claims = Claims {
            sub: claims.subject,
            username: claims.username.clone(),
            role: claims.role,
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode access token: {:?}", e);
            AppError::Internal(format!("Failed to encode access token: {}", e))
        })
    }

    /// Issue an access token with the configured lifetime
    pub fn issue_access_token(&self, claims: &ClaimSet) -> Result<String, AppError> {
        let ttl = i64::try_from(self.access_token_exp_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| AppError::Config("access_token_exp_secs out of range".to_string()))?;
        self.issue(claims, ttl)
    }

    /// Verify a token and return its claims.
    ///
    /// Checks run in order: structure, signature over `header.payload`,
    /// expiry (no leeway), claim decoding. The signature is checked before
    /// anything is decoded, so any altered byte is reported as
    /// `InvalidSignature`.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        if !is_compact_jws(token) {
            return Err(TokenError::Malformed);
        }

        let (message, signature) = token.rsplit_once('.').ok_or(TokenError::Malformed)?;

        let signature_ok = crypto::verify(signature, message.as_bytes(), &self.decoding_key, ALGORITHM)
            .map_err(|e| {
                tracing::debug!("Token signature check failed: {:?}", e);
                TokenError::InvalidSignature
            })?;
        if !signature_ok {
            return Err(TokenError::InvalidSignature);
        }

        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => {
                    tracing::debug!("Token decoding failed: {:?}", e);
                    TokenError::Malformed
                }
            })
    }
}

/// Three non-empty base64url segments separated by dots
fn is_compact_jws(token: &str) -> bool {
    let segments: Vec<&str> = token.split('.').collect();
    segments.len() == 3
        && segments.iter().all(|segment| {
            !segment.is_empty()
                && segment
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        })
}
