//! Response shaping.
//!
//! # Responsibilities
//! - JSON error bodies for handlers (`ApiError`)
//! - 401 bodies for rejected sessions
//! - Copying backend response headers onto a mirrored response
//!
//! # Design Decisions
//! - Hop-by-hop and framing headers are never copied; the server recomputes them

use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::auth::AuthError;

/// Headers that describe one connection or one encoding of the body.
const SKIPPED_HEADERS: [HeaderName; 9] = [
    header::CONNECTION,
    header::CONTENT_LENGTH,
    header::CONTENT_ENCODING,
    header::TRANSFER_ENCODING,
    header::TE,
    header::TRAILER,
    header::UPGRADE,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
];

/// An error response: a status code and a JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiError {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    /// `{ "error": message }`
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status, json!({ "error": message.into() }))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::error(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::error(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::error(StatusCode::UNAUTHORIZED, self.to_string()).into_response()
    }
}

/// Copy end-to-end headers from a backend response.
pub fn copy_forwardable_headers(from: &HeaderMap, to: &mut HeaderMap) {
    for (name, value) in from {
        if SKIPPED_HEADERS.contains(name) || name.as_str() == "keep-alive" {
            continue;
        }
        to.append(name.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn api_error_renders_status_and_body() {
        let response = ApiError::internal("Failed to fetch locations").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await, json!({ "error": "Failed to fetch locations" }));
    }

    #[tokio::test]
    async fn auth_errors_are_401() {
        let response = AuthError::MissingToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await, json!({ "error": "Not authenticated" }));

        let response = AuthError::InvalidToken.into_response();
        assert_eq!(body_json(response).await, json!({ "error": "Invalid token" }));
    }

    #[test]
    fn framing_headers_are_not_copied() {
        let mut from = HeaderMap::new();
        from.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        from.insert(header::CONTENT_LENGTH, HeaderValue::from_static("12"));
        from.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        from.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        from.append("x-backend", HeaderValue::from_static("a"));
        from.append("x-backend", HeaderValue::from_static("b"));

        let mut to = HeaderMap::new();
        copy_forwardable_headers(&from, &mut to);

        assert_eq!(to.get(header::CONTENT_TYPE).unwrap(), "text/plain");
        assert!(to.get(header::CONTENT_LENGTH).is_none());
        assert!(to.get(header::CONNECTION).is_none());
        assert!(to.get("keep-alive").is_none());
        assert_eq!(to.get_all("x-backend").iter().count(), 2);
    }
}
