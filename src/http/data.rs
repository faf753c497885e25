//! Routes answered from the loyalty database.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{clear_session_cookie, session_token, verify_hs256, CurrentUser};
use crate::composition::ChatSettings;
use crate::config::GatewayConfig;
use crate::http::request::client_ip;
use crate::http::response::ApiError;
use crate::store::{LoyaltyStore, LoyaltyTier, SettingType, StoreError, SystemSetting};

#[derive(Debug, Default, Deserialize)]
pub struct SettingsQuery {
    pub key: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub setting_type: Option<SettingType>,
    pub default: Option<String>,
}

/// Single-key reads degrade to "not set" when the store fails.
async fn setting_or_absent(store: &dyn LoyaltyStore, key: &str) -> Option<String> {
    match store.system_setting(key).await {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(key, error = %e, "Error getting system setting");
            None
        }
    }
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn loyalty_tiers(
    State(store): State<Arc<dyn LoyaltyStore>>,
) -> Result<Json<Vec<LoyaltyTier>>, ApiError> {
    store.active_tiers().await.map(Json).map_err(|e| {
        tracing::error!(error = %e, "Error fetching loyalty tiers");
        ApiError::internal("Failed to fetch loyalty tiers")
    })
}

pub async fn setup_status(State(store): State<Arc<dyn LoyaltyStore>>) -> Result<Json<Value>, ApiError> {
    let count = store.user_count().await.map_err(|e| {
        tracing::error!(error = %e, "Error checking setup status");
        ApiError::internal("Failed to check setup status")
    })?;

    Ok(Json(json!({
        "setupRequired": count == 0,
        "userCount": count,
    })))
}

/// List reads degrade to an empty list when the store fails.
fn settings_or_empty(result: Result<Vec<SystemSetting>, StoreError>, context: &'static str) -> Vec<SystemSetting> {
    result.unwrap_or_else(|e| {
        tracing::error!(error = %e, "{context}");
        Vec::new()
    })
}

/// `GET /api/system-settings`: one key, one category, or everything.
pub async fn system_settings(
    CurrentUser(_user): CurrentUser,
    State(store): State<Arc<dyn LoyaltyStore>>,
    Query(query): Query<SettingsQuery>,
) -> Json<Value> {
    if let Some(key) = query.key.as_deref().filter(|k| !k.is_empty()) {
        let stored = setting_or_absent(store.as_ref(), key).await;
        return Json(match query.setting_type {
            Some(kind) => json!({
                "key": key,
                "value": kind.convert(stored.as_deref(), kind.zero()),
                "type": kind.as_str(),
            }),
            None => json!({ "key": key, "value": stored }),
        });
    }

    if let Some(category) = query.category.as_deref().filter(|c| !c.is_empty()) {
        let settings = settings_or_empty(
            store.system_settings_by_category(category).await,
            "Error getting system settings by category",
        );
        return Json(json!({ "category": category, "settings": settings }));
    }

    let settings = settings_or_empty(store.system_settings().await, "Error getting all system settings");
    Json(json!({ "settings": settings }))
}

/// `GET /api/system-settings/{key}` with optional `type` and `default`.
pub async fn system_setting(
    CurrentUser(_user): CurrentUser,
    State(store): State<Arc<dyn LoyaltyStore>>,
    Path(key): Path<String>,
    Query(query): Query<SettingsQuery>,
) -> Json<Value> {
    let stored = setting_or_absent(store.as_ref(), &key).await;

    let body = match (query.setting_type, query.default) {
        (Some(kind), default) => {
            let default = kind.parse_default(default.as_deref());
            json!({
                "key": key,
                "value": kind.convert(stored.as_deref(), default),
                "type": kind.as_str(),
            })
        }
        (None, Some(default)) => json!({ "key": key, "value": stored.unwrap_or(default) }),
        (None, None) => json!({ "key": key, "value": stored }),
    };
    Json(body)
}

pub async fn chat_settings(
    CurrentUser(_user): CurrentUser,
    State(store): State<Arc<dyn LoyaltyStore>>,
) -> Json<Value> {
    let mut values = BTreeMap::new();
    for key in ChatSettings::KEYS {
        if let Some(value) = setting_or_absent(store.as_ref(), key).await {
            values.insert(key.to_string(), value);
        }
    }
    Json(json!({ "settings": ChatSettings::from_settings(&values) }))
}

pub async fn auth_me(CurrentUser(user): CurrentUser) -> Json<Value> {
    Json(json!({
        "user": {
            "id": user.id,
            "email": user.email,
            "firstName": user.first_name,
            "lastName": user.last_name,
            "name": user.display_name(),
            "role": user.role,
            "phone": user.phone,
            "points": user.points,
            "totalSpent": user.total_spent,
            "visitCount": user.visit_count,
            "tier": user.tier.as_deref().unwrap_or("Bronze"),
            "memberStatus": user.member_status,
            "enrollmentDate": user.enrollment_date,
            "isAuthenticated": true,
        }
    }))
}

/// Records the logout when the session is valid, then always clears the
/// cookie.
pub async fn logout(
    State(config): State<Arc<GatewayConfig>>,
    State(store): State<Arc<dyn LoyaltyStore>>,
    headers: HeaderMap,
) -> Response {
    let auth = &config.auth;

    if let Some(token) = session_token(&headers, &auth.cookie_name) {
        let now = chrono::Utc::now().timestamp();
        match verify_hs256(&token, auth.jwt_secret.as_bytes(), now) {
            Ok(claims) => {
                let ip = client_ip(&headers);
                if let Err(e) = store
                    .log_activity(claims.user_id, "logout", "User logged out", &ip)
                    .await
                {
                    tracing::info!(error = %e, "Activity logging not available");
                }
            }
            Err(e) => tracing::info!(error = %e, "Invalid token during logout"),
        }
    }

    let cookie: HeaderValue = clear_session_cookie(&auth.cookie_name, auth.secure_cookies);
    (
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "success": true, "message": "Logout successful" })),
    )
        .into_response()
}
