//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     SIGINT/SIGTERM → stop accepting → drain in-flight requests → close pool → exit
//! ```

pub mod shutdown;

pub use shutdown::shutdown_signal;
