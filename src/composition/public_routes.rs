//! Routes that render before a session exists.

/// Why a route is public.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicRouteKind {
    /// First-run setup; runs before any user exists.
    SetupWizard,
    /// Login, registration and password recovery.
    AuthFlow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicRoute {
    pub prefix: &'static str,
    pub kind: PublicRouteKind,
}

/// The one list both composers read. Matching is by prefix.
pub static PUBLIC_ROUTES: [PublicRoute; 5] = [
    PublicRoute { prefix: "/setup-wizard", kind: PublicRouteKind::SetupWizard },
    PublicRoute { prefix: "/loyalty/setup-wizard", kind: PublicRouteKind::SetupWizard },
    PublicRoute { prefix: "/login", kind: PublicRouteKind::AuthFlow },
    PublicRoute { prefix: "/register", kind: PublicRouteKind::AuthFlow },
    PublicRoute { prefix: "/forgot-password", kind: PublicRouteKind::AuthFlow },
];

/// First allow-list entry `path` starts with.
pub fn match_public_route(path: Option<&str>) -> Option<&'static PublicRoute> {
    let path = path?;
    PUBLIC_ROUTES.iter().find(|route| path.starts_with(route.prefix))
}

pub fn is_public_route(path: Option<&str>) -> bool {
    match_public_route(path).is_some()
}

pub fn is_auth_flow_route(path: Option<&str>) -> bool {
    matches!(match_public_route(path), Some(route) if route.kind == PublicRouteKind::AuthFlow)
}
