//! Provider stack selection.

use std::fmt;

use serde::Serialize;

use crate::composition::public_routes::{match_public_route, PublicRouteKind};

/// A cross-cutting context wrapped around a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderRole {
    Auth,
    Settings,
    Chat,
    ConditionalLayout,
}

/// Providers to apply, outermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProviderStack(&'static [ProviderRole]);

impl ProviderStack {
    /// Children rendered with nothing attached.
    pub const PASS_THROUGH: ProviderStack = ProviderStack(&[]);

    pub const FULL: ProviderStack = ProviderStack(&[
        ProviderRole::Auth,
        ProviderRole::Settings,
        ProviderRole::Chat,
        ProviderRole::ConditionalLayout,
    ]);

    pub const AUTH_ONLY: ProviderStack = ProviderStack(&[ProviderRole::Auth]);

    pub fn roles(&self) -> &'static [ProviderRole] {
        self.0
    }

    pub fn is_pass_through(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, role: ProviderRole) -> bool {
        self.0.contains(&role)
    }
}

impl fmt::Display for ProviderStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("pass-through");
        }
        let names: Vec<String> = self.0.iter().map(|r| format!("{r:?}")).collect();
        f.write_str(&names.join(" > "))
    }
}

/// Root composer: public routes pass through, everything else gets the full
/// stack. An absent path gets the full stack.
pub fn select_provider_stack(path: Option<&str>) -> ProviderStack {
    if match_public_route(path).is_some() {
        ProviderStack::PASS_THROUGH
    } else {
        ProviderStack::FULL
    }
}

/// Nested composer for the login, register and forgot-password layout.
pub fn select_auth_page_stack() -> ProviderStack {
    ProviderStack::AUTH_ONLY
}

/// Effective stack for a page: the root selection, plus the auth layout's
/// own stack when the route is an auth-flow page.
pub fn compose_page(path: Option<&str>) -> ProviderStack {
    match match_public_route(path) {
        Some(route) if route.kind == PublicRouteKind::AuthFlow => select_auth_page_stack(),
        Some(_) => ProviderStack::PASS_THROUGH,
        None => select_provider_stack(path),
    }
}
