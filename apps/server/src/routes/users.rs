//! User administration handlers. Admin-only, including the list.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::auth::{hash_password, CurrentProfile};
use crate::error::{ApiError, ErrorCode};
use crate::state::AppState;
use kiosk_core::validation::{validate_username, validate_uuid};
use kiosk_core::{Profile, Role};

/// Shortest password the API accepts for a new user.
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub full_name: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub username: String,
    pub full_name: String,
    pub role: Role,
}

/// `GET /api/users` — all profiles.
pub async fn list(
    profile: CurrentProfile,
    State(state): State<AppState>,
) -> Result<Json<Vec<Profile>>, ApiError> {
    profile.require_role(Some(Role::Admin))?;

    let users = state.db.profiles().list().await?;
    Ok(Json(users))
}

/// `POST /api/users` — provision a new user.
pub async fn create(
    profile: CurrentProfile,
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<Profile>), ApiError> {
    profile.require_role(Some(Role::Admin))?;

    let username =
        validate_username(&payload.username).map_err(|e| ApiError::validation(e.to_string()))?;
    let full_name = payload.full_name.trim();
    if full_name.is_empty() {
        return Err(ApiError::validation("fullName is required"));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let hash = hash_password(&payload.password)?;
    let created = state
        .db
        .profiles()
        .create(&username, full_name, payload.role, &hash)
        .await?;

    info!(id = %created.id, username = %created.username, "User created");

    Ok((StatusCode::CREATED, Json(created)))
}

/// `PATCH /api/users/{id}` — rename / re-role a user.
pub async fn update(
    profile: CurrentProfile,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<Profile>, ApiError> {
    profile.require_role(Some(Role::Admin))?;

    validate_uuid("id", &id).map_err(|e| ApiError::validation(e.to_string()))?;
    let username =
        validate_username(&payload.username).map_err(|e| ApiError::validation(e.to_string()))?;
    let full_name = payload.full_name.trim();
    if full_name.is_empty() {
        return Err(ApiError::validation("fullName is required"));
    }

    let updated = state
        .db
        .profiles()
        .update(&id, &username, full_name, payload.role)
        .await?;

    Ok(Json(updated))
}

/// `DELETE /api/users/{id}` — remove a user.
///
/// Blocked for the caller's own account and for users with recorded
/// sales (the sale history keeps its creator references).
pub async fn remove(
    profile: CurrentProfile,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    profile.require_role(Some(Role::Admin))?;

    validate_uuid("id", &id).map_err(|e| ApiError::validation(e.to_string()))?;

    if id == profile.id {
        return Err(ApiError::new(
            ErrorCode::SelfDeleteBlocked,
            "You cannot delete your own user",
        ));
    }

    state.db.profiles().delete(&id).await?;

    info!(id = %id, deleted_by = %profile.id, "User deleted");

    Ok(Json(serde_json::json!({ "success": true })))
}
