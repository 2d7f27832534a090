// src/db/member_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        query::{Direction, Entity, Select},
        session::Session,
    },
    models::{
        member::{Member, MemberPayload},
        tenancy::TenantId,
    },
};

// Leituras passam pela Session (o interceptor põe o tenant_id);
// gravações recebem o executor (pool ou transação) e o tenant explícito.
#[derive(Clone, Default)]
pub struct MemberRepository;

impl MemberRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  LEITURAS (isoladas pelo interceptor)
    // =========================================================================

    pub async fn list_active(&self, session: &Session) -> Result<Vec<Member>, AppError> {
        session
            .fetch_all(
                Select::new(Entity::Member)
                    .where_null("deleted_at")
                    .order_by("name", Direction::Asc),
            )
            .await
    }

    pub async fn find_visible(&self, session: &Session, id: Uuid) -> Result<Option<Member>, AppError> {
        session
            .fetch_optional(Select::new(Entity::Member).where_eq("id", id).where_null("deleted_at"))
            .await
    }

    // Inclui arquivados (para reativar)
    pub async fn find_any(&self, session: &Session, id: Uuid) -> Result<Option<Member>, AppError> {
        session
            .fetch_optional(Select::new(Entity::Member).where_eq("id", id))
            .await
    }

    pub async fn find_by_cpf(&self, session: &Session, cpf: &str) -> Result<Option<Member>, AppError> {
        session
            .fetch_optional(Select::new(Entity::Member).where_eq("cpf", cpf))
            .await
    }

    pub async fn count_active(&self, session: &Session) -> Result<i64, AppError> {
        session
            .count(
                Select::new(Entity::Member)
                    .where_eq("active", true)
                    .where_null("deleted_at"),
            )
            .await
    }

    pub async fn recent(&self, session: &Session, limit: i64) -> Result<Vec<Member>, AppError> {
        session
            .fetch_all(
                Select::new(Entity::Member)
                    .where_null("deleted_at")
                    .order_by("created_at", Direction::Desc)
                    .limit(limit),
            )
            .await
    }

    // =========================================================================
    //  GRAVAÇÕES
    // =========================================================================

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        input: &MemberPayload,
    ) -> Result<Member, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Member>(
            r#"
            INSERT INTO members (
                tenant_id, name, sex, marital_status, rg, cpf, address, phone,
                birth_date, baptism_date, position, active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, TRUE)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&input.name)
        .bind(input.normalized_sex())
        .bind(&input.marital_status)
        .bind(&input.rg)
        .bind(&input.cpf)
        .bind(&input.address)
        .bind(&input.phone)
        .bind(input.birth_date)
        .bind(input.baptism_date)
        .bind(input.position_or_default())
        .fetch_one(executor)
        .await
        .map_err(map_cpf_violation)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        id: Uuid,
        input: &MemberPayload,
    ) -> Result<Member, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Member>(
            r#"
            UPDATE members
            SET name = $3, sex = $4, marital_status = $5, rg = $6, cpf = $7,
                address = $8, phone = $9, birth_date = $10, baptism_date = $11,
                position = $12, active = COALESCE($13, active), updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(&input.name)
        .bind(input.normalized_sex())
        .bind(&input.marital_status)
        .bind(&input.rg)
        .bind(&input.cpf)
        .bind(&input.address)
        .bind(&input.phone)
        .bind(input.birth_date)
        .bind(input.baptism_date)
        .bind(input.position_or_default())
        .bind(input.active)
        .fetch_optional(executor)
        .await
        .map_err(map_cpf_violation)?
        .ok_or(AppError::MemberNotFound)
    }

    /// Arquivar (`Some(agora)`) ou reativar (`None`).
    pub async fn set_archived<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        id: Uuid,
        deleted_at: Option<DateTime<Utc>>,
    ) -> Result<Member, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Member>(
            r#"
            UPDATE members
            SET deleted_at = $3, active = ($3 IS NULL), updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(deleted_at)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::MemberNotFound)
    }
}

fn map_cpf_violation(e: sqlx::Error) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::CpfAlreadyExists;
        }
    }
    AppError::DatabaseError(e)
}
