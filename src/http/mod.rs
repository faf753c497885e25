//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers, base path)
//!     → request.rs (request ID, tracing span)
//!     → /api/*  → proxy.rs (backend calls) | data.rs (store reads) | login.rs
//!     → pages   → composition middleware → pages.rs (HTML shell)
//!     → response.rs (error bodies, mirrored headers)
//!     → Send to client
//! ```

pub mod data;
pub mod login;
pub mod pages;
pub mod proxy;
pub mod request;
pub mod response;
pub mod server;
pub mod state;

pub use request::X_REQUEST_ID;
pub use response::ApiError;
pub use server::{build_router, HttpServer};
pub use state::AppState;
