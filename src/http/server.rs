//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: API routes, page fallback, health check
//! - Wire up middleware (provider composition, timeout, request ID, tracing)
//! - Mount everything under the configured base path
//! - Serve on a listener until a shutdown signal arrives

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::FromRef;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthState, LoginAttempts, TokenUserLookup, UserLookup};
use crate::backend::{BackendClient, BackendError, BackendResolver};
use crate::composition::{compose_providers, ContextProviders};
use crate::config::GatewayConfig;
use crate::http::request::{propagate_request_id, request_span, set_request_id};
use crate::http::response::ApiError;
use crate::http::state::AppState;
use crate::http::{data, login, pages, proxy};
use crate::lifecycle::shutdown_signal;
use crate::store::LoyaltyStore;

/// HTTP server for the loyalty gateway.
pub struct HttpServer {
    router: Router,
    config: Arc<GatewayConfig>,
}

impl HttpServer {
    /// Server whose sessions are verified against the configured secret and
    /// resolved through `store`.
    pub fn new(config: GatewayConfig, store: Arc<dyn LoyaltyStore>) -> Result<Self, BackendError> {
        let lookup = Arc::new(TokenUserLookup::new(
            config.auth.jwt_secret.as_bytes().to_vec(),
            store.clone(),
        ));
        Self::with_lookup(config, store, lookup)
    }

    /// Server with a caller-supplied session lookup.
    pub fn with_lookup(
        config: GatewayConfig,
        store: Arc<dyn LoyaltyStore>,
        lookup: Arc<dyn UserLookup>,
    ) -> Result<Self, BackendError> {
        let config = Arc::new(config);
        let backend = BackendClient::new(BackendResolver::new(&config.backend))?;
        let auth = AuthState {
            lookup,
            cookie_name: Arc::from(config.auth.cookie_name.as_str()),
        };

        let state = AppState {
            config: config.clone(),
            backend,
            store,
            auth,
            login_attempts: LoginAttempts::new(),
        };

        let router = build_router(&config, state);
        Ok(Self { router, config })
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            base_path = %self.config.listener.base_path,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // backend proxies
        .route("/api/locations", get(proxy::locations))
        .route("/api/locations/current", get(proxy::current_location))
        .route("/api/categories", get(proxy::categories))
        .route("/api/shop/settings", get(proxy::shop_settings))
        .route("/api/payment-methods", get(proxy::payment_methods))
        .route("/api/products/{id}/modifiers", get(proxy::product_modifiers))
        .route("/api/orders", get(proxy::orders))
        .route("/api/promotions", get(proxy::promotions).post(proxy::enroll_promotion))
        .route("/api/customers/{id}/vouchers", get(proxy::customer_vouchers))
        .route("/api/mulesoft/members", get(proxy::mulesoft_members))
        .route("/api/mulesoft/members/sync", post(proxy::members_sync))
        .route("/api/mulesoft/products/loyalty", get(proxy::mulesoft_products_loyalty))
        .route("/api/loyalty/catalogs", get(proxy::loyalty_catalogs))
        .route("/api/loyalty/products/load", post(proxy::loyalty_products_load))
        .route("/api/products/import", post(proxy::products_import))
        .route("/api/setup/database-info", get(proxy::setup_database_info))
        .route("/api/setup/test-mulesoft", post(proxy::setup_test_mulesoft))
        .route("/api/setup/save-mulesoft", post(proxy::setup_save_mulesoft))
        // database
        .route("/api/loyalty/tiers", get(data::loyalty_tiers))
        .route("/api/setup/status", get(data::setup_status))
        .route("/api/system-settings", get(data::system_settings))
        .route("/api/system-settings/{key}", get(data::system_setting))
        .route("/api/chat/settings", get(data::chat_settings))
        .route("/api/auth/login", post(login::login))
        .route("/api/auth/me", get(data::auth_me))
        .route("/api/auth/logout", post(data::logout))
        .route("/api/{*rest}", get(api_not_found).post(api_not_found))
        .route("/health", get(data::health))
}

async fn api_not_found() -> impl IntoResponse {
    ApiError::error(StatusCode::NOT_FOUND, "Not found")
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(config: &GatewayConfig, state: AppState) -> Router {
    let providers = ContextProviders::from_ref(&state);

    let page = get(pages::page).layer(middleware::from_fn_with_state(providers, compose_providers));

    let app = api_routes().fallback(page).with_state(state);

    let app = match config.listener.base_path.as_str() {
        "" => app,
        base => Router::new().nest(base, app),
    };

    app.layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(propagate_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(request_span::<Body>))
        .layer(set_request_id())
}
