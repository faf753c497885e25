//! Session authentication.
//!
//! # Data Flow
//! ```text
//! Cookie header
//!     → session.rs (pull the session token out of the cookie)
//!     → token.rs (verify HS256 signature and expiry)
//!     → lookup.rs (load the active user from the store)
//!     → AuthenticatedUser | None
//!
//! Login (email, password)
//!     → attempts.rs (per-address attempt limit)
//!     → store credentials + bcrypt check
//!     → token.rs (sign a session token)
//!     → session.rs (Set-Cookie)
//! ```

pub mod attempts;
pub mod lookup;
pub mod session;
pub mod token;

use thiserror::Error;

pub use attempts::{AttemptCheck, LoginAttempts};
pub use lookup::{AuthState, CurrentUser, TokenUserLookup, UserLookup};
pub use session::{clear_session_cookie, session_cookie, session_token};
pub use token::{sign_hs256, verify_hs256, SessionClaims, TokenError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Not authenticated")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,
}
