//! # c4-api: HTTP JSON API for C4 Commerce
//!
//! Thin orchestration over the ledgers in `c4-db` and the checkout signer in
//! `c4-core`. Handlers parse and validate request shape, call one
//! repository, and render camelCase JSON.
//!
//! ## Routes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET    /api/health                    liveness + database check        │
//! │  GET    /api/services                  catalog (seeded when empty)      │
//! │  GET    /api/services/{id}                                              │
//! │  GET    /api/licenses                  always empty                     │
//! │  GET    /api/orders                    newest first                     │
//! │  POST   /api/orders                    create (201)                     │
//! │  GET    /api/orders/{id}               with payments + transactions     │
//! │  PATCH  /api/orders/{id}               status override                  │
//! │  GET    /api/payments                  list + summary                   │
//! │  POST   /api/payments                  manual record (201)              │
//! │  POST   /api/payments/aba/checkout     signed PayWay payload            │
//! │  GET    /api/transactions              list + summary                   │
//! │  GET    /api/users                                                      │
//! │  POST   /api/users                     create-or-get (201)              │
//! │  GET    /api/users/{id}                                                 │
//! │  GET    /api/reports                                                    │
//! │  POST   /api/reports                   file (201)                       │
//! │  GET    /api/reports/{id}                                               │
//! │  PATCH  /api/reports/{id}              resolve                          │
//! │  POST   /payment/success               gateway callback → 302           │
//! │                                        (json, form or multipart)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod views;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use c4_db::Database;

pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        AppState {
            db,
            config: Arc::new(config),
        }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/services", get(handlers::catalog::list_services))
        .route("/services/{id}", get(handlers::catalog::get_service))
        .route(
            "/orders",
            get(handlers::orders::list_orders).post(handlers::orders::create_order),
        )
        .route(
            "/orders/{id}",
            get(handlers::orders::get_order).patch(handlers::orders::update_order),
        )
        .route(
            "/payments",
            get(handlers::payments::list_payments).post(handlers::payments::create_payment),
        )
        .route("/payments/aba/checkout", post(handlers::checkout::payway_checkout))
        .route("/transactions", get(handlers::transactions::list_transactions))
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route("/users/{id}", get(handlers::users::get_user))
        .route(
            "/reports",
            get(handlers::reports::list_reports).post(handlers::reports::create_report),
        )
        .route(
            "/reports/{id}",
            get(handlers::reports::get_report).patch(handlers::reports::update_report),
        )
        .route("/licenses", get(handlers::catalog::list_licenses));

    Router::new()
        .nest("/api", api)
        .route("/payment/success", post(handlers::webhooks::payment_success))
        .with_state(state)
}

// =============================================================================
// Integration Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use std::path::PathBuf;
    use tower::ServiceExt;

    use super::*;
    use c4_core::{Money, NewService, PaywayConfig, Service};
    use c4_db::DbConfig;

    pub fn test_config() -> ApiConfig {
        ApiConfig {
            bind_addr: "127.0.0.1".to_string(),
            port: 0,
            db_path: PathBuf::from(":memory:"),
            db_max_connections: 1,
            order_prefix: "ORDER".to_string(),
            payway: PaywayConfig {
                merchant_id: "M-1".to_string(),
                api_key: "secret-key".to_string(),
                checkout_url: "https://gateway.example/checkout".to_string(),
                return_url: "https://shop.example/payment/success".to_string(),
                cancel_url: "https://shop.example/cancel".to_string(),
                currency: "USD".to_string(),
            },
        }
    }

    pub async fn test_state_with(config: ApiConfig) -> AppState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        AppState::new(db, config)
    }

    pub async fn test_state() -> AppState {
        test_state_with(test_config()).await
    }

    pub async fn seed_service(state: &AppState, name: &str, price: &str) -> Service {
        state
            .db
            .services()
            .insert(&NewService {
                name: name.to_string(),
                price: Money::parse(price).unwrap(),
                image: Some("C4-Auto-Delete-Comment.png".to_string()),
                description: Some("Automation plan".to_string()),
                long_description: None,
            })
            .await
            .unwrap()
    }

    /// Sends a request and returns the status, headers and JSON body.
    pub async fn send(
        app: Router,
        method: &str,
        uri: &str,
        content_type: &str,
        body: impl Into<Body>,
    ) -> (StatusCode, axum::http::HeaderMap, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("content-type", content_type)
                    .body(body.into())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, json)
    }

    pub async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let (status, _, json) = send(app, "GET", uri, "application/json", Body::empty()).await;
        (status, json)
    }

    pub async fn send_json(app: Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let (status, _, json) =
            send(app, method, uri, "application/json", body.to_string()).await;
        (status, json)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_purchase_checkout_and_settle() {
        let state = test_state().await;
        let service = seed_service(&state, "Auto Delete Comment - 1 Month Plan", "9.99").await;
        let app = router(state.clone());

        // 1. Order two units
        let (status, order) = send_json(
            app.clone(),
            "POST",
            "/api/orders",
            json!({"serviceId": service.id, "quantity": 2, "customer": {"name": "Ana"}}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(order["total"], json!(19.98));
        assert_eq!(order["totalDisplay"], "$19.98");
        assert_eq!(order["status"], "pending");
        let order_id = order["id"].as_str().unwrap().to_string();

        // 2. Checkout the existing order
        let (status, checkout) = send_json(
            app.clone(),
            "POST",
            "/api/payments/aba/checkout",
            json!({"serviceId": service.id, "orderId": order_id}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(checkout["payload"]["amount"], "19.98");
        assert_eq!(checkout["orderId"], order_id.as_str());
        assert_eq!(checkout["payload"]["hash"].as_str().unwrap().len(), 128);

        // 3. Gateway callback
        let form = format!("order_id={order_id}&amount=19.98&status=success");
        let (status, headers, _) = send(
            app.clone(),
            "POST",
            "/payment/success",
            "application/x-www-form-urlencoded",
            form,
        )
        .await;
        assert_eq!(status, StatusCode::FOUND);
        assert!(headers.contains_key("location"));

        // 4. Order is paid, one captured payment of 19.98
        let (_, order) = get_json(app.clone(), &format!("/api/orders/{order_id}")).await;
        assert_eq!(order["status"], "paid");

        let (_, payments) = get_json(app.clone(), "/api/payments").await;
        assert_eq!(payments["summary"]["count"], 1);
        assert_eq!(payments["summary"]["totalAmount"], json!(19.98));
        assert_eq!(payments["payments"][0]["status"], "captured");

        let (_, transactions) = get_json(app, "/api/transactions").await;
        assert_eq!(transactions["summary"]["count"], 1);
        assert_eq!(transactions["transactions"][0]["tranId"], order_id.as_str());
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let state = test_state().await;
        let (status, _) = get_json(router(state), "/api/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
