// src/handlers/settings.rs

use axum::{extract::State, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{AdminOnly, RequireRole},
    },
    models::tenancy::UpdateOrganizationPayload,
};

// GET /api/settings
pub async fn get_settings(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let org = app_state.church_service.get_settings(actor.tenant_id).await?;
    Ok(Json(org))
}

// PUT /api/settings
pub async fn update_settings(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<UpdateOrganizationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let org = app_state.church_service.update_settings(&actor, &payload).await?;
    Ok(Json(org))
}
