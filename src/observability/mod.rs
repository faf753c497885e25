//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems emit tracing events
//!     → logging.rs (fmt subscriber, EnvFilter)
//!     → stdout
//! Per-request spans carry the request ID (see http::request).
//! ```
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level when set

pub mod logging;

pub use logging::init_tracing;
