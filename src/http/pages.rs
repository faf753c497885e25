//! Page rendering.
//!
//! Pages are everything outside `/api`. By the time the handler runs the
//! composer middleware has attached whatever contexts the page's provider
//! stack asked for; the handler serializes them into a bootstrap blob inside
//! a minimal HTML shell.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Serialize;

use crate::composition::{AuthContext, ChatContext, LayoutChrome, ProviderStack, SettingsContext};
use crate::config::GatewayConfig;
use crate::http::response::ApiError;

/// Contexts attached to one page request.
#[derive(Debug, Clone, Serialize)]
pub struct PageBootstrap {
    pub path: String,
    pub stack: ProviderStack,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<SettingsContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat: Option<ChatContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutChrome>,
}

impl PageBootstrap {
    pub fn from_request(req: &Request) -> Self {
        let ext = req.extensions();
        Self {
            path: req.uri().path().to_string(),
            stack: ext.get::<ProviderStack>().copied().unwrap_or(ProviderStack::PASS_THROUGH),
            auth: ext.get::<AuthContext>().cloned(),
            settings: ext.get::<SettingsContext>().cloned(),
            chat: ext.get::<ChatContext>().cloned(),
            layout: ext.get::<LayoutChrome>().copied(),
        }
    }

    /// App chrome requires a signed-in user.
    pub fn needs_login(&self) -> bool {
        self.layout == Some(LayoutChrome::App)
            && self.auth.as_ref().is_some_and(|auth| auth.user.is_none())
    }

    pub fn render(&self) -> Result<String, serde_json::Error> {
        // `<` escaped so the blob cannot close its own script tag.
        let blob = serde_json::to_string(self)?.replace('<', "\\u003c");
        let chrome = match self.layout {
            Some(LayoutChrome::App) => "app",
            Some(LayoutChrome::Bare) | None => "bare",
        };
        Ok(format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>Loyalty</title>\n</head>\n<body>\n<div id=\"root\" data-chrome=\"{chrome}\"></div>\n\
             <script id=\"__BOOTSTRAP__\" type=\"application/json\">{blob}</script>\n</body>\n</html>\n"
        ))
    }
}

pub async fn page(State(config): State<Arc<GatewayConfig>>, req: Request) -> Response {
    let page = PageBootstrap::from_request(&req);

    if page.needs_login() {
        let login = format!("{}/login", config.listener.base_path);
        tracing::debug!(path = %page.path, to = %login, "Redirecting to login");
        return Redirect::to(&login).into_response();
    }

    match page.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(path = %page.path, error = %e, "Failed to render page");
            ApiError::internal("Internal server error").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::ChatSettings;
    use axum::body::Body;

    fn request() -> Request {
        Request::builder().uri("/dashboard").body(Body::empty()).unwrap()
    }

    #[test]
    fn pass_through_page_has_no_contexts() {
        let page = PageBootstrap::from_request(&request());
        assert_eq!(page.stack, ProviderStack::PASS_THROUGH);
        assert!(!page.needs_login());

        let html = page.render().unwrap();
        assert!(html.contains(r#"data-chrome="bare""#));
        assert!(!html.contains("\"auth\""));
    }

    #[test]
    fn app_chrome_without_user_needs_login() {
        let mut req = request();
        req.extensions_mut().insert(ProviderStack::FULL);
        req.extensions_mut().insert(AuthContext { user: None });
        req.extensions_mut().insert(LayoutChrome::App);
        assert!(PageBootstrap::from_request(&req).needs_login());
    }

    #[test]
    fn blob_cannot_close_script_tag() {
        let mut req = request();
        let mut settings = SettingsContext::default();
        settings
            .settings
            .insert("shop_name".into(), "</script><b>".into());
        req.extensions_mut().insert(settings);
        req.extensions_mut().insert(ChatContext {
            settings: ChatSettings::default(),
        });

        let html = PageBootstrap::from_request(&req).render().unwrap();
        assert!(!html.contains("</script><b>"));
        assert!(html.contains("\\u003c/script>"));
    }
}
