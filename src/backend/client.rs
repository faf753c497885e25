//! HTTP client for the backend service.

use std::convert::Infallible;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;
use thiserror::Error;

use crate::backend::headers::{default_headers, merge_headers};
use crate::backend::resolver::{BackendResolver, BackendUrl};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Method, body and headers for one backend call.
#[derive(Debug, Clone)]
pub struct CallOptions {
    pub method: Method,
    pub body: Option<Vec<u8>>,
    pub headers: HeaderMap,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            headers: HeaderMap::new(),
        }
    }
}

impl CallOptions {
    pub fn get() -> Self {
        Self::default()
    }

    /// POST with a JSON-encoded body.
    pub fn post_json<T: Serialize + ?Sized>(body: &T) -> Result<Self, BackendError> {
        Ok(Self {
            method: Method::POST,
            body: Some(serde_json::to_vec(body)?),
            headers: HeaderMap::new(),
        })
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Process-wide backend client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    resolver: BackendResolver,
}

impl BackendClient {
    pub fn new(resolver: BackendResolver) -> Result<Self, BackendError> {
        // Backend is reached directly, never through an ambient HTTP_PROXY.
        let http = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(BackendError::Client)?;
        Ok(Self { http, resolver })
    }

    /// Bind the client to one inbound request's resolved base URL.
    pub fn for_request(&self, headers: &HeaderMap) -> RequestBackend {
        RequestBackend {
            base: self.resolver.resolve(headers),
            http: self.http.clone(),
        }
    }

    /// Bind the client to an explicit host, as if it came from a Host header.
    pub fn for_host(&self, host: Option<&str>) -> RequestBackend {
        RequestBackend {
            base: self.resolver.resolve_host(host),
            http: self.http.clone(),
        }
    }
}

/// Backend client resolved for a single request.
#[derive(Debug, Clone)]
pub struct RequestBackend {
    base: BackendUrl,
    http: reqwest::Client,
}

impl RequestBackend {
    pub fn base_url(&self) -> &BackendUrl {
        &self.base
    }

    /// Issue one call to `{base}{endpoint}`.
    ///
    /// The response is returned as received, whatever its status. Only
    /// transport failures are errors.
    pub async fn call(&self, endpoint: &str, options: CallOptions) -> Result<reqwest::Response, BackendError> {
        let url = self.base.join(endpoint);
        tracing::debug!(url = %url, method = %options.method, "Calling backend");

        let headers = merge_headers(&default_headers(), &options.headers);
        let mut request = self.http.request(options.method, &url).headers(headers);
        if let Some(body) = options.body {
            request = request.body(body);
        }

        request
            .send()
            .await
            .map_err(|source| BackendError::Request { url, source })
    }

    pub async fn get(&self, endpoint: &str) -> Result<reqwest::Response, BackendError> {
        self.call(endpoint, CallOptions::get()).await
    }
}

impl<S> FromRequestParts<S> for RequestBackend
where
    S: Send + Sync,
    BackendClient: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(BackendClient::from_ref(state).for_request(&parts.headers))
    }
}
