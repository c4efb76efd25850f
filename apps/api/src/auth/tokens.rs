//! Signed, time-limited access and refresh tokens.
//!
//! Both token kinds are HS256 JWTs carrying the same claim shape but signed
//! with different secrets, so a refresh token can never pass as an access
//! token. Issuance and verification delegate entirely to `jsonwebtoken`.

use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    /// Expiration, seconds since epoch.
    pub exp: i64,
    /// Issued at, seconds since epoch.
    pub iat: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token")]
    Invalid,
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        AppError::Unauthorized(e.to_string())
    }
}

/// Issues a short-lived access token for the given user.
pub fn issue_access_token(user_id: i64, secret: &str, ttl_minutes: i64) -> Result<String> {
    issue(user_id, secret, Duration::minutes(ttl_minutes))
}

/// Issues a long-lived refresh token for the given user.
pub fn issue_refresh_token(user_id: i64, secret: &str, ttl_days: i64) -> Result<String> {
    issue(user_id, secret, Duration::days(ttl_days))
}

fn issue(user_id: i64, secret: &str, ttl: Duration) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
        user_id,
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

/// Verifies signature and expiry and returns the claims.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-access-secret";
    const OTHER_SECRET: &str = "test-refresh-secret";

    #[test]
    fn test_issue_and_decode_roundtrip() {
        let token = issue_access_token(42, SECRET, 15).unwrap();
        let claims = decode_token(&token, SECRET).unwrap();
        assert_eq!(claims.user_id, 42);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_access_token(42, SECRET, 15).unwrap();
        assert_eq!(
            decode_token(&token, OTHER_SECRET).unwrap_err(),
            TokenError::Invalid
        );
    }

    #[test]
    fn test_refresh_token_not_valid_as_access_token() {
        // Same claim shape, different secret: must not cross over.
        let refresh = issue_refresh_token(42, OTHER_SECRET, 7).unwrap();
        assert_eq!(
            decode_token(&refresh, SECRET).unwrap_err(),
            TokenError::Invalid
        );
    }

    #[test]
    fn test_expired_token_rejected() {
        // Expired well past the default 60s validation leeway.
        let now = Utc::now();
        let claims = Claims {
            user_id: 42,
            iat: (now - Duration::minutes(30)).timestamp(),
            exp: (now - Duration::minutes(15)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert_eq!(decode_token(&token, SECRET).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert_eq!(
            decode_token("not-a-jwt", SECRET).unwrap_err(),
            TokenError::Invalid
        );
    }
}
