// src/handlers/documents.rs

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Local;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        rbac::{AnyStaff, RequireRole},
        tenancy::ScopedSession,
    },
};

// GET /api/members/{id}/declaration
pub async fn member_declaration(
    State(app_state): State<AppState>,
    _guard: RequireRole<AnyStaff>,
    ScopedSession(session): ScopedSession,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    // Leitura isolada: membro de outra igreja dá 404
    let member = app_state.member_service.get(&session, id).await?;
    let pdf_bytes = app_state
        .document_service
        .declaration_pdf(&member, Local::now().date_naive())
        .await?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, "attachment; filename=\"declaracao.pdf\"".to_string()),
    ];
    Ok((headers, pdf_bytes).into_response())
}

// GET /api/members/{id}/card
pub async fn member_card(
    State(app_state): State<AppState>,
    _guard: RequireRole<AnyStaff>,
    ScopedSession(session): ScopedSession,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let member = app_state.member_service.get(&session, id).await?;
    let pdf_bytes = app_state
        .document_service
        .card_pdf(&member, Local::now().date_naive())
        .await?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"carteirinha_{}.pdf\"", id),
        ),
    ];
    Ok((headers, pdf_bytes).into_response())
}

// PUT /api/members/{id}/photo  (corpo: a imagem crua, PNG ou JPEG)
pub async fn upload_member_photo(
    State(app_state): State<AppState>,
    _guard: RequireRole<AnyStaff>,
    ScopedSession(session): ScopedSession,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    // Só grava a foto de um membro visível para esta igreja
    let member = app_state.member_service.get(&session, id).await?;
    app_state
        .document_service
        .save_photo(&member, body.to_vec())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
