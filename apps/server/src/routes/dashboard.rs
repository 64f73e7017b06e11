//! Dashboard handler.

use axum::extract::State;
use axum::Json;
use chrono::Utc;

use crate::auth::CurrentProfile;
use crate::error::ApiError;
use crate::state::AppState;
use kiosk_db::repository::report::DashboardData;

/// `GET /api/dashboard` — KPIs, top products, recent sales and the
/// low-stock list, computed in one pass against the store's reference
/// offset.
pub async fn dashboard(
    _profile: CurrentProfile,
    State(state): State<AppState>,
) -> Result<Json<DashboardData>, ApiError> {
    let data = state
        .db
        .reports()
        .dashboard(
            Utc::now(),
            state.report_offset,
            state.config.low_stock_threshold,
        )
        .await?;

    Ok(Json(data))
}
