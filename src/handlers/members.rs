// src/handlers/members.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        rbac::{AnyStaff, RequireRole},
        tenancy::ScopedSession,
    },
    models::member::MemberPayload,
};

// GET /api/members
pub async fn list_members(
    State(app_state): State<AppState>,
    _guard: RequireRole<AnyStaff>,
    ScopedSession(session): ScopedSession,
) -> Result<impl IntoResponse, AppError> {
    let members = app_state.member_service.list(&session).await?;
    Ok(Json(members))
}

// POST /api/members
pub async fn create_member(
    State(app_state): State<AppState>,
    _guard: RequireRole<AnyStaff>,
    ScopedSession(session): ScopedSession,
    Json(payload): Json<MemberPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let member = app_state.member_service.create(&session, &payload).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

// GET /api/members/{id}
pub async fn get_member(
    State(app_state): State<AppState>,
    _guard: RequireRole<AnyStaff>,
    ScopedSession(session): ScopedSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let member = app_state.member_service.get(&session, id).await?;
    Ok(Json(member))
}

// PUT /api/members/{id}
pub async fn update_member(
    State(app_state): State<AppState>,
    _guard: RequireRole<AnyStaff>,
    ScopedSession(session): ScopedSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<MemberPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let member = app_state.member_service.update(&session, id, &payload).await?;
    Ok(Json(member))
}

// POST /api/members/{id}/archive
pub async fn archive_member(
    State(app_state): State<AppState>,
    _guard: RequireRole<AnyStaff>,
    ScopedSession(session): ScopedSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let member = app_state.member_service.archive(&session, id).await?;
    Ok(Json(member))
}

// POST /api/members/{id}/reactivate
pub async fn reactivate_member(
    State(app_state): State<AppState>,
    _guard: RequireRole<AnyStaff>,
    ScopedSession(session): ScopedSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let member = app_state.member_service.reactivate(&session, id).await?;
    Ok(Json(member))
}
