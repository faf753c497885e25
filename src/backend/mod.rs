//! Backend service access.
//!
//! # Data Flow
//! ```text
//! Inbound request (Host header)
//!     → resolver.rs (override or scheme://host)
//!     → headers.rs (default headers merged with caller headers)
//!     → client.rs (single HTTP round-trip, raw response returned)
//! ```
//!
//! # Design Decisions
//! - Base URL is derived per request and never cached
//! - No retries, backoff or timeouts are added here
//! - Responses are returned unparsed; route handlers decide how to shape them

pub mod client;
pub mod headers;
pub mod resolver;

pub use client::{BackendClient, BackendError, CallOptions, RequestBackend};
pub use headers::{default_headers, merge_headers};
pub use resolver::{resolve_backend_url, BackendResolver, BackendUrl, DEFAULT_HOST};
