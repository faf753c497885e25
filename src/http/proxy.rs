//! Routes answered by the backend service.
//!
//! Each route resolves the backend from the inbound request, makes one call
//! and shapes the outcome in one of three ways:
//! - success or a fixed 500 (`fetch_json`)
//! - backend error body and status relayed verbatim (`mirror_raw`)
//! - backend error status kept, body parsed as JSON or replaced (`mirror_json`)
//!
//! A failure before any backend answer (unreadable request body, connection
//! refused) becomes a route-specific 500 via [`recover`].

use axum::body::{Body, Bytes};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use url::form_urlencoded;

use crate::auth::{AuthState, CurrentUser};
use crate::backend::{BackendError, CallOptions, RequestBackend};
use crate::http::response::{copy_forwardable_headers, ApiError};

/// How much of a non-JSON body is echoed back in `details`.
const NON_JSON_PREVIEW: usize = 200;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Backend returned {}", .0.as_u16())]
    Status(StatusCode),

    #[error("failed to read backend response: {0}")]
    Body(#[source] reqwest::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

/// Turn a failed exchange into the route's 500 body.
fn recover(
    result: Result<Response, ProxyError>,
    route: &'static str,
    context: &'static str,
    body: impl FnOnce(String) -> Value,
) -> Response {
    match result {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(route, error = %e, "{context}");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, body(e.to_string())).into_response()
        }
    }
}

fn status_text(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("")
}

async fn read_bytes(response: reqwest::Response) -> Result<Bytes, ProxyError> {
    response.bytes().await.map_err(ProxyError::Body)
}

/// Successful JSON body, anything else is an error.
async fn fetch_value(backend: &RequestBackend, route: &'static str, endpoint: &str) -> Result<Value, ProxyError> {
    let response = backend.get(endpoint).await?;
    let status = response.status();
    let bytes = read_bytes(response).await?;
    if !status.is_success() {
        tracing::error!(
            route,
            status = status.as_u16(),
            body = %String::from_utf8_lossy(&bytes),
            "Backend returned error"
        );
        return Err(ProxyError::Status(status));
    }
    Ok(serde_json::from_slice(&bytes)?)
}

async fn fetch_json(backend: &RequestBackend, route: &'static str, endpoint: &str) -> Result<Response, ProxyError> {
    let data = fetch_value(backend, route, endpoint).await?;
    Ok(Json(data).into_response())
}

/// Non-2xx responses are relayed with their status, headers and body intact.
async fn mirror_raw(response: reqwest::Response) -> Result<Response, ProxyError> {
    let status = response.status();
    if status.is_success() {
        let data: Value = serde_json::from_slice(&read_bytes(response).await?)?;
        return Ok(Json(data).into_response());
    }

    tracing::error!(status = status.as_u16(), "Backend responded with error status");
    let headers = response.headers().clone();
    let bytes = read_bytes(response).await?;

    let mut mirrored = Response::new(Body::from(bytes));
    *mirrored.status_mut() = status;
    copy_forwardable_headers(&headers, mirrored.headers_mut());
    Ok(mirrored)
}

/// Non-2xx responses keep their status; the body is the backend's JSON if it
/// parses, otherwise `fallback(text, status)`.
async fn mirror_json(
    response: reqwest::Response,
    fallback: impl FnOnce(&str, StatusCode) -> Value,
) -> Result<Response, ProxyError> {
    let status = response.status();
    let bytes = read_bytes(response).await?;
    if status.is_success() {
        let data: Value = serde_json::from_slice(&bytes)?;
        return Ok(Json(data).into_response());
    }

    let text = String::from_utf8_lossy(&bytes);
    tracing::error!(status = status.as_u16(), body = %text, "Backend responded with error status");
    let body = serde_json::from_slice(&bytes).unwrap_or_else(|_| fallback(&text, status));
    Ok((status, Json(body)).into_response())
}

fn parse_body(body: &Bytes) -> Result<Value, ProxyError> {
    Ok(serde_json::from_slice(body)?)
}

/// JavaScript truthiness, used for required request fields.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// Fixed-500 routes

pub async fn locations(backend: RequestBackend) -> Response {
    let result = fetch_json(&backend, "locations", "/api/locations").await;
    recover(result, "locations", "Error fetching locations", |_| {
        json!({ "error": "Failed to fetch locations" })
    })
}

pub async fn categories(backend: RequestBackend) -> Response {
    let result = fetch_json(&backend, "categories", "/api/categories").await;
    recover(result, "categories", "Error fetching categories", |_| {
        json!({ "error": "Failed to fetch categories" })
    })
}

pub async fn shop_settings(backend: RequestBackend) -> Response {
    let result = fetch_json(&backend, "shop_settings", "/api/shop/settings").await;
    recover(result, "shop_settings", "Error fetching shop settings", |_| {
        json!({ "error": "Failed to fetch shop settings" })
    })
}

pub async fn payment_methods(backend: RequestBackend) -> Response {
    let result = fetch_json(&backend, "payment_methods", "/api/payment-methods").await;
    recover(result, "payment_methods", "Error fetching payment methods", |_| {
        json!({ "error": "Failed to fetch payment methods" })
    })
}

pub async fn product_modifiers(backend: RequestBackend, Path(id): Path<String>) -> Response {
    let endpoint = format!("/api/products/{id}/modifiers");
    let result = fetch_json(&backend, "product_modifiers", &endpoint).await;
    recover(result, "product_modifiers", "Error fetching product modifiers", |_| {
        json!({ "error": "Failed to fetch product modifiers" })
    })
}

// Orders and promotions

#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    pub order_number: Option<String>,
}

fn array_len(data: &Value) -> usize {
    data.as_array().map_or(0, Vec::len)
}

async fn forward_orders(
    backend: &RequestBackend,
    auth: &AuthState,
    headers: &HeaderMap,
    order_number: Option<&str>,
) -> Result<Response, ProxyError> {
    // A confirmation page looks its order up by number without a session.
    let endpoint = match order_number {
        Some(number) => {
            tracing::info!(order_number = number, "Fetching order by number");
            let search: String = form_urlencoded::byte_serialize(number.as_bytes()).collect();
            format!("/api/orders?search={search}")
        }
        None => match auth.user_from_request(headers).await {
            Ok(user) => {
                tracing::info!(customer_id = user.id, "Fetching online orders for customer");
                format!("/api/orders?customer_id={}", user.id)
            }
            Err(e) => return Ok(e.into_response()),
        },
    };

    let data = fetch_value(backend, "orders", &endpoint).await?;
    tracing::info!(count = array_len(&data), "Found orders");
    Ok(Json(data).into_response())
}

/// `GET /api/orders`: one order by `order_number`, or the signed-in
/// customer's orders.
pub async fn orders(
    backend: RequestBackend,
    State(auth): State<AuthState>,
    Query(query): Query<OrdersQuery>,
    headers: HeaderMap,
) -> Response {
    let order_number = query.order_number.as_deref().filter(|n| !n.is_empty());
    let result = forward_orders(&backend, &auth, &headers, order_number).await;
    recover(result, "orders", "Error fetching orders", |_| {
        json!({ "error": "Failed to fetch orders" })
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct PromotionsQuery {
    pub loyalty_number: Option<String>,
}

fn promotion_count(data: &Value) -> u64 {
    data.get("total")
        .and_then(Value::as_u64)
        .filter(|total| *total > 0)
        .or_else(|| data.get("promotions").and_then(Value::as_array).map(|p| p.len() as u64))
        .unwrap_or(0)
}

async fn forward_customer_promotions(backend: &RequestBackend, loyalty_number: &str) -> Result<Response, ProxyError> {
    tracing::info!(loyalty_number, "Fetching promotions for customer");
    let response = backend.get(&format!("/api/loyalty/{loyalty_number}/promotions")).await?;
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Ok(ApiError::error(StatusCode::NOT_FOUND, "Customer not found").into_response());
    }

    let bytes = read_bytes(response).await?;
    if !status.is_success() {
        tracing::error!(route = "promotions", status = status.as_u16(), "Backend returned error");
        return Err(ProxyError::Status(status));
    }
    let data: Value = serde_json::from_slice(&bytes)?;
    let count = data.get("promotions").and_then(Value::as_array).map_or(0, Vec::len);
    tracing::info!(count, "Found customer promotions");
    Ok(Json(data).into_response())
}

async fn forward_promotions(backend: &RequestBackend, loyalty_number: Option<&str>) -> Result<Response, ProxyError> {
    if let Some(number) = loyalty_number {
        return forward_customer_promotions(backend, number).await;
    }

    tracing::info!("Fetching all active promotions");
    let data = fetch_value(backend, "promotions", "/api/promotions").await?;
    tracing::info!(count = promotion_count(&data), "Found promotions");
    Ok(Json(data).into_response())
}

/// `GET /api/promotions`: every active promotion, or one customer's by
/// `loyalty_number`.
pub async fn promotions(backend: RequestBackend, Query(query): Query<PromotionsQuery>) -> Response {
    let loyalty_number = query.loyalty_number.as_deref().filter(|n| !n.is_empty());
    let result = forward_promotions(&backend, loyalty_number).await;
    recover(result, "promotions", "Error fetching promotions", |_| {
        json!({ "error": "Failed to fetch promotions" })
    })
}

async fn forward_enrollment(backend: &RequestBackend, customer_id: i64, body: &Bytes) -> Result<Response, ProxyError> {
    let body = parse_body(body)?;
    let promotion_id = match body.get("promotionId") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(id) if is_truthy(id) => id.to_string(),
        _ => return Ok(ApiError::bad_request("Promotion ID required").into_response()),
    };

    tracing::info!(customer_id, promotion_id = %promotion_id, "Enrolling customer in promotion");
    let options = CallOptions::post_json(&json!({ "customerId": customer_id }))?;
    let response = backend
        .call(&format!("/api/promotions/{promotion_id}/enroll"), options)
        .await?;
    let status = response.status();
    let data: Value = serde_json::from_slice(&read_bytes(response).await?)?;
    if !status.is_success() {
        return Ok((status, Json(data)).into_response());
    }

    tracing::info!(customer_id, "Enrollment successful");
    Ok(Json(data).into_response())
}

/// `POST /api/promotions`: enroll the signed-in customer in `promotionId`.
pub async fn enroll_promotion(CurrentUser(user): CurrentUser, backend: RequestBackend, body: Bytes) -> Response {
    let result = forward_enrollment(&backend, user.id, &body).await;
    recover(result, "promotions", "Error enrolling in promotion", |_| {
        json!({ "error": "Failed to enroll in promotion" })
    })
}

// Raw mirrors

pub async fn current_location(backend: RequestBackend) -> Response {
    let result = match backend.get("/api/locations/current").await {
        Ok(response) => mirror_raw(response).await,
        Err(e) => Err(e.into()),
    };
    recover(result, "locations_current", "Error proxying current location request", |_| {
        json!({
            "success": false,
            "error": "Failed to fetch current location",
            "message": "No locations configured yet",
        })
    })
}

pub async fn setup_database_info(backend: RequestBackend) -> Response {
    let result = match backend.get("/api/setup/database-info").await {
        Ok(response) => mirror_raw(response).await,
        Err(e) => Err(e.into()),
    };
    recover(result, "setup_database_info", "Error proxying database info request", |_| {
        json!({ "error": "Failed to fetch database information" })
    })
}

async fn forward_test_mulesoft(backend: &RequestBackend, body: &Bytes) -> Result<Response, ProxyError> {
    let body = parse_body(body)?;
    let response = backend
        .call("/api/setup/test-mulesoft", CallOptions::post_json(&body)?)
        .await?;
    mirror_raw(response).await
}

pub async fn setup_test_mulesoft(backend: RequestBackend, body: Bytes) -> Response {
    let result = forward_test_mulesoft(&backend, &body).await;
    recover(result, "setup_test_mulesoft", "Error proxying MuleSoft test request", |message| {
        json!({
            "success": false,
            "error": "Failed to test MuleSoft connection",
            "message": message,
        })
    })
}

// Vouchers: backend body read first, error field relayed

async fn forward_vouchers(backend: &RequestBackend, id: &str) -> Result<Response, ProxyError> {
    let response = backend.get(&format!("/api/customers/{id}/vouchers")).await?;
    let status = response.status();
    let data: Value = serde_json::from_slice(&read_bytes(response).await?)?;

    if !status.is_success() {
        tracing::error!(customer_id = %id, status = status.as_u16(), body = %data, "Voucher backend error");
        let error = data
            .get("error")
            .filter(|e| is_truthy(e))
            .cloned()
            .unwrap_or_else(|| Value::from("Failed to fetch vouchers"));
        return Ok((status, Json(json!({ "success": false, "error": error }))).into_response());
    }

    let count = data.get("vouchers").and_then(Value::as_array).map_or(0, Vec::len);
    tracing::debug!(customer_id = %id, count, "Fetched vouchers");
    Ok(Json(data).into_response())
}

pub async fn customer_vouchers(backend: RequestBackend, Path(id): Path<String>) -> Response {
    let result = forward_vouchers(&backend, &id).await;
    recover(result, "customer_vouchers", "Error proxying voucher request", |message| {
        json!({ "success": false, "error": message })
    })
}

// Parsed mirrors

pub async fn mulesoft_members(backend: RequestBackend) -> Response {
    let result = match backend.get("/api/mulesoft/members").await {
        Ok(response) => {
            mirror_json(response, |text, _| {
                json!({ "error": "Failed to fetch members", "details": text })
            })
            .await
        }
        Err(e) => Err(e.into()),
    };
    recover(result, "mulesoft_members", "Error proxying members fetch", |message| {
        json!({ "error": "Internal server error", "details": message })
    })
}

async fn forward_members_sync(backend: &RequestBackend, body: &Bytes) -> Result<Response, ProxyError> {
    let body = parse_body(body)?;
    let program = body.get("loyaltyProgramId").cloned().unwrap_or_default();
    tracing::info!(loyalty_program_id = %program, "Syncing members");
    let response = backend
        .call("/api/mulesoft/members/sync", CallOptions::post_json(&body)?)
        .await?;
    mirror_json(response, |_, status| {
        json!({ "error": format!("Backend error: {}", status_text(status)) })
    })
    .await
}

pub async fn members_sync(backend: RequestBackend, body: Bytes) -> Response {
    let result = forward_members_sync(&backend, &body).await;
    recover(result, "members_sync", "Error proxying members sync request", |message| {
        json!({ "error": "Internal server error", "message": message })
    })
}

async fn forward_loyalty_products(backend: &RequestBackend) -> Result<Response, ProxyError> {
    let response = backend.get("/api/mulesoft/products/loyalty").await?;
    let status = response.status();
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));
    let bytes = read_bytes(response).await?;

    if !status.is_success() {
        let text = String::from_utf8_lossy(&bytes);
        tracing::error!(status = status.as_u16(), body = %text, "Backend responded with error status");
        let body = json!({
            "error": format!("Backend error: {}", status_text(status)),
            "details": text,
        });
        return Ok((status, Json(body)).into_response());
    }

    if !is_json {
        let preview: String = String::from_utf8_lossy(&bytes).chars().take(NON_JSON_PREVIEW).collect();
        tracing::error!(body = %preview, "Backend returned non-JSON response");
        return Ok(ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "Backend returned non-JSON response", "details": preview }),
        )
        .into_response());
    }

    let data: Value = serde_json::from_slice(&bytes)?;
    Ok(Json(data).into_response())
}

pub async fn mulesoft_products_loyalty(backend: RequestBackend) -> Response {
    let result = forward_loyalty_products(&backend).await;
    recover(result, "mulesoft_products_loyalty", "Error proxying products request", |message| {
        json!({ "error": "Internal server error", "message": message })
    })
}

pub async fn loyalty_catalogs(backend: RequestBackend) -> Response {
    let result = match backend.get("/api/loyalty/catalogs").await {
        Ok(response) => {
            mirror_json(response, |text, _| {
                json!({ "error": "Failed to fetch catalogs", "details": text })
            })
            .await
        }
        Err(e) => Err(e.into()),
    };
    recover(result, "loyalty_catalogs", "Error proxying catalogs fetch", |message| {
        json!({ "error": "Internal server error", "details": message })
    })
}

async fn forward_products_load(backend: &RequestBackend, body: &Bytes) -> Result<Response, ProxyError> {
    let body = parse_body(body)?;
    let catalog_id = match body.get("catalogId") {
        Some(id) if is_truthy(id) => id.clone(),
        _ => return Ok(ApiError::bad_request("Catalog ID is required").into_response()),
    };

    tracing::info!(catalog_id = %catalog_id, "Loading products from catalog");
    let options = CallOptions::post_json(&json!({ "catalogId": catalog_id }))?;
    let response = backend.call("/api/loyalty/products/load", options).await?;
    mirror_json(response, |text, _| {
        json!({ "error": "Failed to load products", "details": text })
    })
    .await
}

pub async fn loyalty_products_load(backend: RequestBackend, body: Bytes) -> Response {
    let result = forward_products_load(&backend, &body).await;
    recover(result, "loyalty_products_load", "Error proxying products load", |message| {
        json!({ "error": "Internal server error", "details": message })
    })
}

async fn forward_products_import(backend: &RequestBackend, body: &Bytes) -> Result<Response, ProxyError> {
    let products = parse_body(body)?;
    let count = match products.as_array() {
        Some(items) if !items.is_empty() => items.len(),
        _ => {
            return Ok(
                ApiError::bad_request("Products array is required and cannot be empty").into_response()
            )
        }
    };

    tracing::info!(count, "Importing products");
    let response = backend
        .call("/api/products/import", CallOptions::post_json(&products)?)
        .await?;
    mirror_json(response, |text, _| {
        json!({ "error": "Failed to import products", "details": text })
    })
    .await
}

pub async fn products_import(backend: RequestBackend, body: Bytes) -> Response {
    let result = forward_products_import(&backend, &body).await;
    recover(result, "products_import", "Error proxying products import", |message| {
        json!({ "error": "Internal server error", "details": message })
    })
}

async fn forward_save_mulesoft(backend: &RequestBackend, body: &Bytes) -> Result<Response, ProxyError> {
    let body = parse_body(body)?;
    let response = backend
        .call("/api/setup/save-mulesoft", CallOptions::post_json(&body)?)
        .await?;
    mirror_json(response, |text, _| json!({ "success": false, "message": text })).await
}

pub async fn setup_save_mulesoft(backend: RequestBackend, body: Bytes) -> Response {
    let result = forward_save_mulesoft(&backend, &body).await;
    recover(result, "setup_save_mulesoft", "Error proxying save MuleSoft settings", |message| {
        json!({ "success": false, "message": message })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(false)));
        assert!(is_truthy(&json!("cat-1")));
        assert!(is_truthy(&json!(12)));
        assert!(is_truthy(&json!([])));
    }

    #[test]
    fn status_error_message() {
        let e = ProxyError::Status(StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(e.to_string(), "Backend returned 503");
    }

    #[test]
    fn promotion_count_prefers_total() {
        assert_eq!(promotion_count(&json!({ "total": 4, "promotions": [1] })), 4);
        assert_eq!(promotion_count(&json!({ "total": 0, "promotions": [1, 2] })), 2);
        assert_eq!(promotion_count(&json!({})), 0);
    }

    #[test]
    fn status_text_is_reason_phrase() {
        assert_eq!(status_text(StatusCode::BAD_GATEWAY), "Bad Gateway");
    }
}
