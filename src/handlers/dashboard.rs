// src/handlers/dashboard.rs

use axum::{extract::State, response::IntoResponse, Json};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        rbac::{AnyStaff, RequireRole},
        tenancy::ScopedSession,
    },
};

// GET /api/dashboard
pub async fn get_dashboard(
    State(app_state): State<AppState>,
    _guard: RequireRole<AnyStaff>,
    ScopedSession(session): ScopedSession,
) -> Result<impl IntoResponse, AppError> {
    let summary = app_state.dashboard_service.get_summary(&session).await?;
    Ok(Json(summary))
}
