// src/db/audit_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::query::Entity,
    models::audit::{AuditAction, AuditEntry},
};

#[derive(Clone, Default)]
pub struct AuditRepository;

impl AuditRepository {
    pub fn new() -> Self {
        Self
    }

    /// Grava uma entrada de auditoria. Normalmente chamada dentro da
    /// mesma transação da alteração auditada.
    pub async fn record<'e, E>(
        &self,
        executor: E,
        user_id: Option<Uuid>,
        action: AuditAction,
        entity: Entity,
        entity_id: Option<Uuid>,
        details: &str,
    ) -> Result<AuditEntry, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entry = sqlx::query_as::<_, AuditEntry>(
            r#"
            INSERT INTO audit_log (action, entity, entity_id, details, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(action.as_str())
        .bind(entity.table())
        .bind(entity_id)
        .bind(details)
        .bind(user_id)
        .fetch_one(executor)
        .await?;

        tracing::debug!(action = action.as_str(), entity = entity.table(), "auditoria registrada");
        Ok(entry)
    }
}
