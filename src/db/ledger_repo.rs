// src/db/ledger_repo.rs

use sqlx::{Executor, Postgres};

use crate::{
    common::error::AppError,
    db::{
        query::{Direction, Entity, Select},
        session::Session,
    },
    models::{
        ledger::{CreateLedgerEntryPayload, LedgerEntry, LedgerLine},
        tenancy::TenantId,
    },
};

#[derive(Clone, Default)]
pub struct LedgerRepository;

impl LedgerRepository {
    pub fn new() -> Self {
        Self
    }

    /// Lançamentos com o nome do membro. O JOIN também é isolado:
    /// um membro de outra igreja aparece como `member_name = null`.
    pub async fn list_lines(&self, session: &Session) -> Result<Vec<LedgerLine>, AppError> {
        session
            .fetch_all(
                Select::new(Entity::LedgerEntry)
                    .left_join(Entity::Member, "m", "id", "member_id")
                    .column("m", "name", "member_name")
                    .order_by("entry_date", Direction::Desc)
                    .order_by("created_at", Direction::Desc),
            )
            .await
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        input: &CreateLedgerEntryPayload,
    ) -> Result<LedgerEntry, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entry = sqlx::query_as::<_, LedgerEntry>(
            r#"
            INSERT INTO ledger_entries (tenant_id, entry_date, kind, category, description, amount, member_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(input.entry_date)
        .bind(input.kind)
        .bind(&input.category)
        .bind(&input.description)
        .bind(input.amount)
        .bind(input.member_id)
        .fetch_one(executor)
        .await?;
        Ok(entry)
    }
}
