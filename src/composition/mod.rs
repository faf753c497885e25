//! Per-path composition of request context.
//!
//! # Data Flow
//! ```text
//! Page request (path inside the mount point, base path stripped)
//!     → public_routes.rs (shared prefix allow-list)
//!     → stack.rs (pass-through | [Auth] | [Auth, Settings, Chat, ConditionalLayout])
//!     → providers.rs (run each selected provider, outermost first)
//!     → layout.rs (App chrome or bare page)
//!     → page handler reads the attached contexts
//! ```
//!
//! # Design Decisions
//! - Selection is pure and synchronous; only the providers themselves await
//! - An absent path selects the full stack
//! - Providers never fail the request; a provider that cannot load its data
//!   attaches an empty context and records the error

pub mod layout;
pub mod providers;
pub mod public_routes;
pub mod stack;

pub use layout::{conditional_layout, LayoutChrome};
pub use providers::{compose_providers, AuthContext, ChatContext, ChatSettings, ContextProviders, SettingsContext};
pub use public_routes::{is_auth_flow_route, is_public_route, match_public_route, PublicRoute, PublicRouteKind, PUBLIC_ROUTES};
pub use stack::{compose_page, select_auth_page_stack, select_provider_stack, ProviderRole, ProviderStack};
