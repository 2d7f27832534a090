// src/handlers/users.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{AdminOnly, RequireRole},
    },
    models::auth::CreateUserPayload,
};

// GET /api/users
pub async fn list_users(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let users = app_state.church_service.list_users(&actor).await?;
    Ok(Json(users))
}

// POST /api/users
pub async fn create_user(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = app_state.church_service.create_user(&actor, &payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}
