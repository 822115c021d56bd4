//! Issues and verifies the signed bearer tokens that clients present on protected routes.

// Adapted from https://github.com/tokio-rs/axum/blob/main/examples/jwt/src/main.rs

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, user::UserID};

/// How long a bearer token stays valid after sign-in.
pub const DEFAULT_TOKEN_DURATION: Duration = Duration::days(1);

/// The keys used to sign and verify bearer tokens, derived from one secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenKeys {
    /// Create the signing and verification keys from a shared `secret`.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenKeys { .. }")
    }
}

/// The contents of a bearer token.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// The user the token was issued to.
    #[serde(rename = "userId")]
    pub user_id: UserID,
    /// The time the token was issued, in seconds since the Unix epoch.
    pub iat: u64,
    /// The expiry time of the token, in seconds since the Unix epoch.
    pub exp: u64,
}

/// Issue a signed token for `user_id` that expires after `duration`.
///
/// # Errors
///
/// Returns [Error::TokenCreation] if the token could not be signed.
pub fn issue_token(user_id: UserID, keys: &TokenKeys, duration: Duration) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        user_id,
        iat: unix_seconds(now),
        exp: unix_seconds(now + duration),
    };

    encode(&Header::default(), &claims, &keys.encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Check the signature and expiry of `token` and return its claims.
///
/// # Errors
///
/// Returns [Error::InvalidToken] if the token is malformed, was not signed
/// with `keys`, or has expired.
pub fn verify_token(token: &str, keys: &TokenKeys) -> Result<Claims, Error> {
    decode::<Claims>(token, &keys.decoding_key, &Validation::default())
        .map(|token_data| token_data.claims)
        .map_err(|error| {
            tracing::debug!("Rejected bearer token: {error}");
            Error::InvalidToken
        })
}

fn unix_seconds(date_time: OffsetDateTime) -> u64 {
    u64::try_from(date_time.unix_timestamp()).unwrap_or_default()
}
