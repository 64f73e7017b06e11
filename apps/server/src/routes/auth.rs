//! Login and current-profile handlers.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::{verify_password, CurrentProfile};
use crate::error::ApiError;
use crate::state::AppState;
use kiosk_core::validation::validate_username;
use kiosk_core::Profile;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub profile: Profile,
}

/// `POST /api/auth/login` — verifies credentials and issues a token.
///
/// Unknown username and wrong password produce the same response, so the
/// endpoint does not leak which usernames exist.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let username =
        validate_username(&payload.username).map_err(|e| ApiError::validation(e.to_string()))?;

    debug!(username = %username, "Login attempt");

    let creds = state.db.profiles().find_credentials(&username).await?;

    let creds = match creds {
        Some(c) if verify_password(&payload.password, &c.password_hash) => c,
        _ => {
            warn!(username = %username, "Login failed");
            return Err(ApiError::unauthorized("Invalid username or password"));
        }
    };

    let profile = creds.profile();
    let token = state.jwt.generate_token(&profile)?;

    Ok(Json(LoginResponse { token, profile }))
}

/// `GET /api/auth/me` — the caller's profile, fresh from the store.
///
/// A valid token for a profile that has since been deleted is treated as
/// unauthenticated.
pub async fn me(
    profile: CurrentProfile,
    State(state): State<AppState>,
) -> Result<Json<Profile>, ApiError> {
    let stored = state
        .db
        .profiles()
        .get_by_id(&profile.id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Profile no longer exists"))?;

    Ok(Json(stored))
}
