//! Request → user resolution.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::auth::session::session_token;
use crate::auth::token::verify_hs256;
use crate::auth::AuthError;
use crate::store::{AuthenticatedUser, LoyaltyStore};

/// Resolves a session token to the user it belongs to.
#[async_trait]
pub trait UserLookup: Send + Sync + 'static {
    /// `None` for any token that does not identify an active user.
    async fn user_from_token(&self, token: &str) -> Option<AuthenticatedUser>;
}

/// Verifies signed session tokens and loads the user from the store.
pub struct TokenUserLookup {
    secret: Vec<u8>,
    store: Arc<dyn LoyaltyStore>,
}

impl TokenUserLookup {
    pub fn new(secret: impl Into<Vec<u8>>, store: Arc<dyn LoyaltyStore>) -> Self {
        Self {
            secret: secret.into(),
            store,
        }
    }
}

#[async_trait]
impl UserLookup for TokenUserLookup {
    async fn user_from_token(&self, token: &str) -> Option<AuthenticatedUser> {
        let now = chrono::Utc::now().timestamp();
        let claims = match verify_hs256(token, &self.secret, now) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!(error = %e, "Session token rejected");
                return None;
            }
        };

        match self.store.user_by_id(claims.user_id).await {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(user_id = claims.user_id, error = %e, "Token verification error");
                None
            }
        }
    }
}

/// What the auth extractor and provider need from application state.
#[derive(Clone)]
pub struct AuthState {
    pub lookup: Arc<dyn UserLookup>,
    pub cookie_name: Arc<str>,
}

impl AuthState {
    /// Resolve the user behind a request's session cookie.
    pub async fn user_from_request(&self, headers: &HeaderMap) -> Result<AuthenticatedUser, AuthError> {
        let token = session_token(headers, &self.cookie_name).ok_or(AuthError::MissingToken)?;
        self.lookup
            .user_from_token(&token)
            .await
            .ok_or(AuthError::InvalidToken)
    }
}

/// Extractor for routes that require a signed-in user.
///
/// Rejects with 401 `Not authenticated` when the cookie is absent and 401
/// `Invalid token` when it does not resolve to a user.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        AuthState::from_ref(state)
            .user_from_request(&parts.headers)
            .await
            .map(CurrentUser)
    }
}
