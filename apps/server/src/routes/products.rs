//! Product catalog handlers.
//!
//! Reads require any authenticated profile; mutations are admin-only.
//! Validation runs before the repository is touched, so a bad payload
//! never reaches the store.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::auth::CurrentProfile;
use crate::error::ApiError;
use crate::state::AppState;
use kiosk_core::validation::{validate_product_input, validate_uuid};
use kiosk_core::{Product, ProductInput, Role};

/// `GET /api/products` — the whole catalog, newest first.
pub async fn list(
    _profile: CurrentProfile,
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.db.products().list().await?;
    Ok(Json(products))
}

#[derive(Debug, Deserialize)]
pub struct LowStockParams {
    pub threshold: Option<i64>,
}

/// `GET /api/products/low-stock` — products at or below the threshold.
pub async fn low_stock(
    _profile: CurrentProfile,
    State(state): State<AppState>,
    Query(params): Query<LowStockParams>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let threshold = params
        .threshold
        .unwrap_or(state.config.low_stock_threshold);
    let products = state.db.products().list_low_stock(threshold).await?;
    Ok(Json(products))
}

/// `GET /api/products/barcode/{barcode}` — scanner lookup.
///
/// Returns `null` rather than 404 for an unknown code: a miss is an
/// ordinary outcome at the counter, not an error.
pub async fn by_barcode(
    _profile: CurrentProfile,
    State(state): State<AppState>,
    Path(barcode): Path<String>,
) -> Result<Json<Option<Product>>, ApiError> {
    let product = state.db.products().find_by_barcode(&barcode).await?;
    Ok(Json(product))
}

/// `POST /api/products` — admin-only create.
pub async fn create(
    profile: CurrentProfile,
    State(state): State<AppState>,
    Json(payload): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    profile.require_role(Some(Role::Admin))?;

    let input = validate_product_input(payload).map_err(|e| ApiError::validation(e.to_string()))?;
    let product = state.db.products().create(input).await?;

    Ok((StatusCode::CREATED, Json(product)))
}

/// `PATCH /api/products/{id}` — admin-only update.
pub async fn update(
    profile: CurrentProfile,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ProductInput>,
) -> Result<Json<Product>, ApiError> {
    profile.require_role(Some(Role::Admin))?;

    validate_uuid("id", &id).map_err(|e| ApiError::validation(e.to_string()))?;
    let input = validate_product_input(payload).map_err(|e| ApiError::validation(e.to_string()))?;
    let product = state.db.products().update(&id, input).await?;

    Ok(Json(product))
}

/// `DELETE /api/products/{id}` — admin-only delete.
///
/// Fails with `PRODUCT_IN_USE` when sale history references the product.
pub async fn remove(
    profile: CurrentProfile,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    profile.require_role(Some(Role::Admin))?;

    validate_uuid("id", &id).map_err(|e| ApiError::validation(e.to_string()))?;
    state.db.products().delete(&id).await?;

    Ok(Json(serde_json::json!({ "success": true })))
}
