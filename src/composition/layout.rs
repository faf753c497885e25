//! Page chrome selection.

use serde::Serialize;

/// Pages rendered without the app shell.
const BARE_PAGES: [&str; 5] = ["/", "/login", "/register", "/forgot-password", "/setup-wizard"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutChrome {
    /// Navigation, sidebar and a signed-in user.
    App,
    Bare,
}

/// Exact match on the bare list, or any path mentioning the setup wizard.
pub fn conditional_layout(path: &str) -> LayoutChrome {
    if BARE_PAGES.contains(&path) || path.contains("/setup-wizard") {
        LayoutChrome::Bare
    } else {
        LayoutChrome::App
    }
}
