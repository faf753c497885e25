//! HS256 session tokens.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("no signing secret configured")]
    NoSecret,

    #[error("token expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

/// Claims issued at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub user_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Verify a compact JWT signed with HS256 and return its claims.
///
/// `now` is seconds since the Unix epoch; a token whose `exp` is at or before
/// it is rejected. Tokens without `exp` never expire.
pub fn verify_hs256(token: &str, secret: &[u8], now: i64) -> Result<SessionClaims, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::NoSecret);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_aud = false;

    let claims = decode::<SessionClaims>(token, &DecodingKey::from_secret(secret), &validation)?.claims;
    match claims.exp {
        Some(exp) if exp <= now => Err(TokenError::Expired),
        _ => Ok(claims),
    }
}

/// Sign `claims` as an HS256 JWT.
pub fn sign_hs256(claims: &SessionClaims, secret: &[u8]) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::NoSecret);
    }
    Ok(encode(&Header::new(Algorithm::HS256), claims, &EncodingKey::from_secret(secret))?)
}
