// src/handlers/ledger.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        rbac::{FinanceAccess, RequireRole},
        tenancy::ScopedSession,
    },
    models::ledger::CreateLedgerEntryPayload,
};

// GET /api/ledger
pub async fn get_overview(
    State(app_state): State<AppState>,
    _guard: RequireRole<FinanceAccess>,
    ScopedSession(session): ScopedSession,
) -> Result<impl IntoResponse, AppError> {
    let overview = app_state.ledger_service.overview(&session).await?;
    Ok(Json(overview))
}

// POST /api/ledger
pub async fn create_entry(
    State(app_state): State<AppState>,
    _guard: RequireRole<FinanceAccess>,
    ScopedSession(session): ScopedSession,
    Json(payload): Json<CreateLedgerEntryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let entry = app_state.ledger_service.create_entry(&session, &payload).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}
