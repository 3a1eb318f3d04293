//! Access, refresh, and CSRF token issuance and verification.
//!
//! Access tokens are short-lived JWTs signed with the global pepper. Refresh
//! and CSRF tokens are opaque random strings; refresh tokens are never
//! interpreted, only compared by hash against the stored session row (see
//! [`crate::auth::password`]).

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::prelude::RngExt;
use rand::rng;
use serde::{Deserialize, Serialize};

use crate::{config::Config, errors::Error, types::UserId};

/// Minimum access token lifetime; shorter configured values are raised to it.
const ACCESS_TOKEN_TTL_FLOOR: Duration = Duration::from_secs(60);

/// Entropy of a refresh token before hex encoding.
const REFRESH_TOKEN_BYTES: usize = 48;

/// Entropy of a CSRF token before hex encoding.
const CSRF_TOKEN_BYTES: usize = 24;

/// Access token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: UserId,   // Subject (user ID)
    pub email: String, // User email
    pub exp: i64,      // Expiration time
    pub iat: i64,      // Issued at
}

impl AccessClaims {
    fn new(user_id: UserId, email: &str, config: &Config) -> Self {
        let now = Utc::now();
        let exp = now + config.auth.access_token_ttl.max(ACCESS_TOKEN_TTL_FLOOR);

        Self {
            sub: user_id,
            email: email.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Create a signed access token for a user
pub fn issue_access_token(user_id: UserId, email: &str, config: &Config) -> Result<String, Error> {
    let claims = AccessClaims::new(user_id, email, config);
    let key = EncodingKey::from_secret(config.pepper()?.as_bytes());

    encode(&Header::default(), &claims, &key).map_err(|e| Error::Internal {
        operation: format!("create access token: {e}"),
    })
}

/// Verify and decode an access token
pub fn verify_access_token(token: &str, config: &Config) -> Result<AccessClaims, Error> {
    let key = DecodingKey::from_secret(config.pepper()?.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<AccessClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        // Anything wrong with the presented token itself is a 401
        jsonwebtoken::errors::ErrorKind::InvalidToken
        | jsonwebtoken::errors::ErrorKind::InvalidSignature
        | jsonwebtoken::errors::ErrorKind::ExpiredSignature
        | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_)
        | jsonwebtoken::errors::ErrorKind::InvalidIssuer
        | jsonwebtoken::errors::ErrorKind::InvalidAudience
        | jsonwebtoken::errors::ErrorKind::InvalidSubject
        | jsonwebtoken::errors::ErrorKind::ImmatureSignature
        | jsonwebtoken::errors::ErrorKind::Base64(_)
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => Error::Unauthenticated { message: None },

        // Key and library failures are ours, a 500
        jsonwebtoken::errors::ErrorKind::InvalidEcdsaKey
        | jsonwebtoken::errors::ErrorKind::InvalidRsaKey(_)
        | jsonwebtoken::errors::ErrorKind::RsaFailedSigning
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithmName
        | jsonwebtoken::errors::ErrorKind::InvalidKeyFormat
        | jsonwebtoken::errors::ErrorKind::MissingAlgorithm
        | jsonwebtoken::errors::ErrorKind::Json(_)
        | jsonwebtoken::errors::ErrorKind::Utf8(_)
        | jsonwebtoken::errors::ErrorKind::Crypto(_) => Error::Internal {
            operation: format!("access token verification: {e}"),
        },

        // Future error kinds default to a server error rather than a silent 401
        _ => Error::Internal {
            operation: format!("access token verification (unknown error): {e}"),
        },
    })?;

    Ok(token_data.claims)
}

/// Generate an opaque refresh token: 48 bytes of entropy, hex-encoded.
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// Generate a double-submit CSRF token: 24 bytes of entropy, hex-encoded.
pub fn generate_csrf_token() -> String {
    let mut bytes = [0u8; CSRF_TOKEN_BYTES];
    rng().fill(&mut bytes);
    hex::encode(bytes)
}
