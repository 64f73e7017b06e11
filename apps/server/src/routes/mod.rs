//! # Routes
//!
//! One module per resource; [`router`] assembles them.
//!
//! ## Route Table
//! ```text
//! POST   /api/auth/login              public     issue a token
//! GET    /api/auth/me                 auth       current profile
//! GET    /api/health                  public     liveness probe
//!
//! GET    /api/products                auth       full catalog
//! POST   /api/products                admin      create product
//! PATCH  /api/products/{id}           admin      update product
//! DELETE /api/products/{id}           admin      delete product
//! GET    /api/products/low-stock      auth       low-stock alert list
//! GET    /api/products/barcode/{code} auth       scanner lookup
//!
//! POST   /api/sales/checkout          auth       the checkout transaction
//! GET    /api/sales                   auth       recent sales
//! GET    /api/sales/{id}              auth       sale detail with items
//!
//! GET    /api/dashboard               auth       KPIs, rankings, alerts
//!
//! GET    /api/users                   admin      list users
//! POST   /api/users                   admin      create user
//! PATCH  /api/users/{id}              admin      update user
//! DELETE /api/users/{id}              admin      delete user
//! ```

pub mod auth;
pub mod dashboard;
pub mod products;
pub mod sales;
pub mod users;

use axum::routing::{get, patch, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route("/api/products", get(products::list).post(products::create))
        .route("/api/products/low-stock", get(products::low_stock))
        .route("/api/products/barcode/{barcode}", get(products::by_barcode))
        .route(
            "/api/products/{id}",
            patch(products::update).delete(products::remove),
        )
        .route("/api/sales/checkout", post(sales::checkout))
        .route("/api/sales", get(sales::list))
        .route("/api/sales/{id}", get(sales::detail))
        .route("/api/dashboard", get(dashboard::dashboard))
        .route("/api/users", get(users::list).post(users::create))
        .route("/api/users/{id}", patch(users::update).delete(users::remove))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
