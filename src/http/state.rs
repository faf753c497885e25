//! Application state shared by every handler.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::{AuthState, LoginAttempts};
use crate::backend::BackendClient;
use crate::composition::ContextProviders;
use crate::config::GatewayConfig;
use crate::store::LoyaltyStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub backend: BackendClient,
    pub store: Arc<dyn LoyaltyStore>,
    pub auth: AuthState,
    pub login_attempts: LoginAttempts,
}

impl FromRef<AppState> for BackendClient {
    fn from_ref(state: &AppState) -> Self {
        state.backend.clone()
    }
}

impl FromRef<AppState> for Arc<dyn LoyaltyStore> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl FromRef<AppState> for LoginAttempts {
    fn from_ref(state: &AppState) -> Self {
        state.login_attempts.clone()
    }
}

impl FromRef<AppState> for Arc<GatewayConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for ContextProviders {
    fn from_ref(state: &AppState) -> Self {
        ContextProviders {
            auth: state.auth.clone(),
            store: state.store.clone(),
        }
    }
}
