// src/services/seed.rs

use crate::{
    common::error::AppError,
    config::{AppState, SeedAdmin},
    db::query::Entity,
    models::{audit::AuditAction, auth::Role},
    services::auth::hash_password,
};

const DEFAULT_CHURCH: &str = "Igreja Sede";
const DEFAULT_ADMIN: &str = "Administrador";

/// Cria a igreja padrão e o seu administrador na primeira subida.
/// Retorna `false` quando já existe alguma igreja (nada a fazer).
pub async fn seed_initial_admin(state: &AppState, seed: &SeedAdmin) -> Result<bool, AppError> {
    if state.org_repo.any_exists().await? {
        tracing::debug!("seed ignorado: já existem igrejas cadastradas");
        return Ok(false);
    }

    let hashed_password = hash_password(&seed.password).await?;

    let mut tx = state.db_pool.begin().await?;
    let church = state.org_repo.create_organization(&mut *tx, DEFAULT_CHURCH).await?;
    let admin = state
        .user_repo
        .create_user(&mut *tx, church.id, DEFAULT_ADMIN, &seed.email, &hashed_password, Role::Admin)
        .await?;
    state
        .audit_repo
        .record(
            &mut *tx,
            None,
            AuditAction::Signup,
            Entity::Organization,
            Some(church.id.0),
            &format!("Seed inicial: {}", admin.email),
        )
        .await?;
    tx.commit().await?;

    tracing::info!(email = %admin.email, "🌱 Administrador inicial criado");
    Ok(true)
}
