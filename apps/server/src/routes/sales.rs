//! Checkout and sale history handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::CurrentProfile;
use crate::error::ApiError;
use crate::state::AppState;
use kiosk_core::checkout::LineRequest;
use kiosk_core::validation::validate_uuid;
use kiosk_core::{PaymentMethod, Sale};
use kiosk_db::repository::sale::SaleDetailItem;
use kiosk_db::CheckoutOutcome;

/// How many sales the history endpoint returns.
const SALES_HISTORY_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub items: Vec<LineRequest>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

/// `POST /api/sales/checkout` — the checkout transaction.
///
/// Both roles may sell. The authenticated profile becomes the sale's
/// creator; everything else is validated and executed atomically by the
/// sale repository.
pub async fn checkout(
    profile: CurrentProfile,
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutOutcome>), ApiError> {
    profile.require_role(None)?;

    let outcome = state
        .db
        .sales()
        .checkout(&payload.items, payload.payment_method, &profile.id)
        .await?;

    Ok((StatusCode::CREATED, Json(outcome)))
}

/// `GET /api/sales` — the most recent sales, newest first.
pub async fn list(
    _profile: CurrentProfile,
    State(state): State<AppState>,
) -> Result<Json<Vec<Sale>>, ApiError> {
    let sales = state.db.sales().list_recent(SALES_HISTORY_LIMIT).await?;
    Ok(Json(sales))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetailResponse {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleDetailItem>,
}

/// `GET /api/sales/{id}` — one sale with its line items.
pub async fn detail(
    _profile: CurrentProfile,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SaleDetailResponse>, ApiError> {
    validate_uuid("id", &id).map_err(|e| ApiError::validation(e.to_string()))?;

    let sale = state
        .db
        .sales()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", &id))?;

    let items = state.db.sales().get_items_detailed(&id).await?;

    Ok(Json(SaleDetailResponse { sale, items }))
}
