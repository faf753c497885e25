//! Context providers and the middleware that applies them.
//!
//! Each provider attaches one typed extension to the request. Providers run
//! in stack order, so an inner provider can read what an outer one attached
//! (chat settings come from the settings context).

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use serde::Serialize;

use crate::auth::AuthState;
use crate::composition::layout::conditional_layout;
use crate::composition::stack::{compose_page, ProviderRole, ProviderStack};
use crate::store::{AuthenticatedUser, LoyaltyStore};

/// Signed-in user, if any.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuthContext {
    pub user: Option<AuthenticatedUser>,
}

/// Active system settings keyed by setting key.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SettingsContext {
    pub settings: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SettingsContext {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSettings {
    pub chat_enabled: bool,
    pub chat_api_url: String,
    pub chat_floating_button: bool,
    pub max_file_size: i64,
    pub allowed_file_types: Vec<String>,
    pub typing_indicator_delay: i64,
    pub message_retry_attempts: i64,
    pub session_timeout: i64,
}

impl ChatSettings {
    /// Setting keys the chat configuration is read from.
    pub const KEYS: [&'static str; 8] = [
        "chat_enabled",
        "chat_api_url",
        "chat_floating_button",
        "chat_max_file_size",
        "chat_allowed_file_types",
        "chat_typing_indicator_delay",
        "chat_message_retry_attempts",
        "chat_session_timeout",
    ];

    /// Build from a settings map, using the stock value for any key that is
    /// missing, empty or unparsable.
    pub fn from_settings(settings: &BTreeMap<String, String>) -> Self {
        let text = |key: &str, default: &str| -> String {
            settings
                .get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };
        let number = |key: &str, default: i64| -> i64 {
            settings
                .get(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        Self {
            chat_enabled: text("chat_enabled", "true") == "true",
            chat_api_url: text("chat_api_url", "https://your-mulesoft-api.com/chat/v1/messages"),
            chat_floating_button: text("chat_floating_button", "true") == "true",
            max_file_size: number("chat_max_file_size", 10_485_760),
            allowed_file_types: text(
                "chat_allowed_file_types",
                "image/jpeg,image/png,image/gif,application/pdf,text/plain",
            )
            .split(',')
            .map(str::to_string)
            .collect(),
            typing_indicator_delay: number("chat_typing_indicator_delay", 1000),
            message_retry_attempts: number("chat_message_retry_attempts", 3),
            session_timeout: number("chat_session_timeout", 3_600_000),
        }
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self::from_settings(&BTreeMap::new())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatContext {
    pub settings: ChatSettings,
}

/// Everything the providers need to load their data.
#[derive(Clone)]
pub struct ContextProviders {
    pub auth: AuthState,
    pub store: Arc<dyn LoyaltyStore>,
}

impl ContextProviders {
    /// Run every provider in `stack`, outermost first.
    pub async fn apply(&self, stack: ProviderStack, path: &str, req: &mut Request) {
        for role in stack.roles() {
            match role {
                ProviderRole::Auth => {
                    let headers = req.headers().clone();
                    let ctx = self.load_auth(&headers).await;
                    req.extensions_mut().insert(ctx);
                }
                ProviderRole::Settings => {
                    let ctx = self.load_settings().await;
                    req.extensions_mut().insert(ctx);
                }
                ProviderRole::Chat => {
                    let settings = req
                        .extensions()
                        .get::<SettingsContext>()
                        .map(|s| s.settings.clone())
                        .unwrap_or_default();
                    req.extensions_mut().insert(ChatContext {
                        settings: ChatSettings::from_settings(&settings),
                    });
                }
                ProviderRole::ConditionalLayout => {
                    req.extensions_mut().insert(conditional_layout(path));
                }
            }
        }
        req.extensions_mut().insert(stack);
    }

    async fn load_auth(&self, headers: &HeaderMap) -> AuthContext {
        AuthContext {
            user: self.auth.user_from_request(headers).await.ok(),
        }
    }

    async fn load_settings(&self) -> SettingsContext {
        match self.store.system_settings().await {
            Ok(rows) => SettingsContext {
                settings: rows
                    .into_iter()
                    .map(|s| (s.key, s.value.unwrap_or_default()))
                    .collect(),
                error: None,
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize system settings");
                SettingsContext {
                    settings: BTreeMap::new(),
                    error: Some("Failed to initialize system settings".to_string()),
                }
            }
        }
    }
}

/// Middleware selecting and applying the provider stack for a page request.
///
/// Matches on the path inside the mount point, so with a base path of
/// `/loyalty` a request for `/loyalty/login` is matched as `/login`.
pub async fn compose_providers(
    State(providers): State<ContextProviders>,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();

    let stack = compose_page(Some(&path));
    tracing::debug!(path = %path, stack = %stack, "Composing providers");

    providers.apply(stack, &path, &mut req).await;
    next.run(req).await
}
