//! `POST /api/auth/login`: password check, session token, session cookie.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{self, InvalidHeaderValue};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;

use crate::auth::{session_cookie, sign_hs256, AttemptCheck, LoginAttempts, SessionClaims, TokenError};
use crate::config::GatewayConfig;
use crate::http::request::client_ip;
use crate::http::response::ApiError;
use crate::store::{LoyaltyStore, StoreError};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("invalid request body: {0}")]
    Body(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("password check failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("password check did not complete: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("failed to issue session: {0}")]
    Token(#[from] TokenError),

    #[error("session cookie is not a valid header: {0}")]
    Cookie(#[from] InvalidHeaderValue),

    #[error("user {0} vanished during login")]
    MissingUser(i64),
}

fn issue(field: &str, message: &str) -> Value {
    json!({ "path": [field], "message": message })
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, _)| !host.is_empty() && !domain.ends_with('.'))
}

/// Email and password from the request body, or every problem found.
pub fn validate_credentials(body: &Value) -> Result<(String, String), Vec<Value>> {
    let mut issues = Vec::new();

    let email = match body.get("email") {
        None | Some(Value::Null) => {
            issues.push(issue("email", "Required"));
            None
        }
        Some(Value::String(email)) if looks_like_email(email) => Some(email.clone()),
        Some(Value::String(_)) => {
            issues.push(issue("email", "Invalid email address"));
            None
        }
        Some(_) => {
            issues.push(issue("email", "Expected string"));
            None
        }
    };

    let password = match body.get("password") {
        None | Some(Value::Null) => {
            issues.push(issue("password", "Required"));
            None
        }
        Some(Value::String(password)) if password.chars().count() >= MIN_PASSWORD_LEN => Some(password.clone()),
        Some(Value::String(_)) => {
            issues.push(issue("password", "Password must be at least 6 characters"));
            None
        }
        Some(_) => {
            issues.push(issue("password", "Expected string"));
            None
        }
    };

    match (email, password) {
        (Some(email), Some(password)) => Ok((email, password)),
        _ => Err(issues),
    }
}

fn invalid_credentials() -> Response {
    ApiError::error(StatusCode::UNAUTHORIZED, "Invalid email or password").into_response()
}

async fn authenticate(
    config: &GatewayConfig,
    store: &dyn LoyaltyStore,
    attempts: &LoginAttempts,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<Response, LoginError> {
    let body: Value = serde_json::from_slice(body)?;
    let (email, password) = match validate_credentials(&body) {
        Ok(credentials) => credentials,
        Err(details) => {
            let body = json!({ "error": "Invalid input", "details": details });
            return Ok(ApiError::new(StatusCode::BAD_REQUEST, body).into_response());
        }
    };

    let client = client_ip(headers);
    let now = Instant::now();
    if attempts.check(&client, now) == AttemptCheck::Blocked {
        tracing::warn!(client = %client, "Login attempts exhausted");
        return Ok(ApiError::error(
            StatusCode::TOO_MANY_REQUESTS,
            "Too many login attempts. Please try again in 15 minutes.",
        )
        .into_response());
    }

    let Some(credentials) = store.login_credentials(&email).await? else {
        attempts.record_failure(&client, now);
        return Ok(invalid_credentials());
    };

    if !credentials.is_active {
        return Ok(ApiError::error(
            StatusCode::FORBIDDEN,
            "Account is deactivated. Please contact support.",
        )
        .into_response());
    }

    let hash = credentials.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
    if !valid {
        attempts.record_failure(&client, now);
        return Ok(invalid_credentials());
    }
    attempts.clear(&client);

    let auth = &config.auth;
    let max_age = i64::try_from(auth.session_max_age_secs).unwrap_or(i64::MAX);
    let claims = SessionClaims {
        user_id: credentials.id,
        email: Some(credentials.email.clone()),
        role: credentials.role.clone(),
        exp: Some(chrono::Utc::now().timestamp().saturating_add(max_age)),
    };
    let token = sign_hs256(&claims, auth.jwt_secret.as_bytes())?;

    store.record_login(credentials.id).await?;
    if let Err(e) = store
        .log_activity(credentials.id, "login", "User logged in successfully", &client)
        .await
    {
        tracing::info!(error = %e, "Activity logging not available");
    }

    let user = store
        .user_by_id(credentials.id)
        .await?
        .ok_or(LoginError::MissingUser(credentials.id))?;
    let cookie = session_cookie(&auth.cookie_name, &token, auth.session_max_age_secs, auth.secure_cookies)?;

    tracing::info!(user_id = user.id, "User logged in");
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "success": true, "message": "Login successful", "user": user })),
    )
        .into_response())
}

pub async fn login(
    State(config): State<Arc<GatewayConfig>>,
    State(store): State<Arc<dyn LoyaltyStore>>,
    State(attempts): State<LoginAttempts>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match authenticate(&config, store.as_ref(), &attempts, &headers, &body).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Login error");
            ApiError::internal("Internal server error").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_credentials() {
        let body = json!({ "email": "jane@example.com", "password": "hunter22" });
        assert_eq!(
            validate_credentials(&body).unwrap(),
            ("jane@example.com".to_string(), "hunter22".to_string())
        );
    }

    #[test]
    fn reports_every_problem() {
        let issues = validate_credentials(&json!({ "email": "jane", "password": "short" })).unwrap_err();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0]["message"], "Invalid email address");
        assert_eq!(issues[1]["path"], json!(["password"]));

        let issues = validate_credentials(&json!({})).unwrap_err();
        assert_eq!(issues[0]["message"], "Required");
    }

    #[test]
    fn email_shape() {
        assert!(looks_like_email("a@b.co"));
        assert!(!looks_like_email("a@b"));
        assert!(!looks_like_email("@b.co"));
        assert!(!looks_like_email("a b@c.co"));
        assert!(!looks_like_email("a@b.co."));
        assert!(!looks_like_email("a@@b.co"));
    }
}
