// src/services/church_service.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{query::Entity, AuditRepository, OrganizationRepository, UserRepository},
    models::{
        audit::AuditAction,
        auth::{CreateUserPayload, User},
        tenancy::{Organization, TenantId, UpdateOrganizationPayload},
    },
    services::auth::hash_password,
};

// Administração da própria igreja: equipe e configurações.
// `users` e `organizations` não passam pelo interceptor; o tenant
// vem sempre do usuário autenticado.
#[derive(Clone)]
pub struct ChurchService {
    user_repo: UserRepository,
    org_repo: OrganizationRepository,
    audit_repo: AuditRepository,
    pool: PgPool,
}

impl ChurchService {
    pub fn new(
        user_repo: UserRepository,
        org_repo: OrganizationRepository,
        audit_repo: AuditRepository,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, org_repo, audit_repo, pool }
    }

    pub async fn list_users(&self, actor: &User) -> Result<Vec<User>, AppError> {
        self.user_repo.list_by_tenant(actor.tenant_id).await
    }

    pub async fn create_user(&self, actor: &User, input: &CreateUserPayload) -> Result<User, AppError> {
        if self.user_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::EmailAlreadyExists);
        }

        let hashed_password = hash_password(&input.password).await?;

        let mut tx = self.pool.begin().await?;
        let user = self
            .user_repo
            .create_user(
                &mut *tx,
                actor.tenant_id,
                &input.name,
                &input.email,
                &hashed_password,
                input.role,
            )
            .await?;
        self.audit_repo
            .record(
                &mut *tx,
                Some(actor.id),
                AuditAction::CreateUser,
                Entity::User,
                Some(user.id),
                &format!("Usuário {} ({})", user.email, user.role.as_str()),
            )
            .await?;
        tx.commit().await?;

        Ok(user)
    }

    pub async fn get_settings(&self, tenant_id: TenantId) -> Result<Organization, AppError> {
        self.org_repo
            .find_by_id(tenant_id)
            .await?
            .ok_or(AppError::OrganizationNotFound)
    }

    pub async fn update_settings(
        &self,
        actor: &User,
        input: &UpdateOrganizationPayload,
    ) -> Result<Organization, AppError> {
        let mut tx = self.pool.begin().await?;
        let org = self
            .org_repo
            .update_organization(&mut *tx, actor.tenant_id, input)
            .await?;
        self.audit_repo
            .record(
                &mut *tx,
                Some(actor.id),
                AuditAction::UpdateConfig,
                Entity::Organization,
                Some(org.id.0),
                "Dados da igreja atualizados",
            )
            .await?;
        tx.commit().await?;

        Ok(org)
    }
}
