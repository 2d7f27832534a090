// src/db/tenancy_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::tenancy::{Organization, TenantId, UpdateOrganizationPayload},
};

// Igrejas (tenants). A tabela não tem tenant_id: ela É o tenant.
#[derive(Clone)]
pub struct OrganizationRepository {
    pool: PgPool,
}

impl OrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: TenantId) -> Result<Option<Organization>, AppError> {
        let org = sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(org)
    }

    pub async fn any_exists(&self) -> Result<bool, AppError> {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM organizations)")
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Cria a igreja. Endereço e cidade ficam com texto padrão
    /// até o administrador preencher em Configurações.
    pub async fn create_organization<'e, E>(
        &self,
        executor: E,
        name: &str,
    ) -> Result<Organization, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let org = sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (name, address, city_state)
            VALUES ($1, 'Endereço não configurado', 'Cidade - UF')
            RETURNING *
            "#,
        )
        .bind(name)
        .fetch_one(executor)
        .await?;
        Ok(org)
    }

    pub async fn update_organization<'e, E>(
        &self,
        executor: E,
        id: TenantId,
        input: &UpdateOrganizationPayload,
    ) -> Result<Organization, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Organization>(
            r#"
            UPDATE organizations
            SET name = $2, cnpj = $3, address = $4, city_state = $5,
                responsible_name = $6, responsible_title = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.cnpj)
        .bind(&input.address)
        .bind(&input.city_state)
        .bind(&input.responsible_name)
        .bind(&input.responsible_title)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::OrganizationNotFound)
    }
}
