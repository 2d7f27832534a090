// src/services/member_service.rs

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{query::Entity, session::Session, AuditRepository, MemberRepository},
    models::{
        audit::AuditAction,
        member::{Member, MemberPayload},
    },
};

#[derive(Clone)]
pub struct MemberService {
    repo: MemberRepository,
    audit_repo: AuditRepository,
    pool: PgPool,
}

impl MemberService {
    pub fn new(repo: MemberRepository, audit_repo: AuditRepository, pool: PgPool) -> Self {
        Self { repo, audit_repo, pool }
    }

    // Não há filtro de igreja aqui: a Session cuida disso.
    pub async fn list(&self, session: &Session) -> Result<Vec<Member>, AppError> {
        self.repo.list_active(session).await
    }

    pub async fn get(&self, session: &Session, id: Uuid) -> Result<Member, AppError> {
        self.repo
            .find_visible(session, id)
            .await?
            .ok_or(AppError::MemberNotFound)
    }

    pub async fn create(&self, session: &Session, input: &MemberPayload) -> Result<Member, AppError> {
        // 1. Carimba o tenant de quem está cadastrando
        let tenant_id = session.require_tenant()?;
        session.authorize_write(Entity::Member, Some(tenant_id))?;

        let mut tx = self.pool.begin().await?;

        let member = match self.repo.insert(&mut *tx, tenant_id, input).await {
            Ok(member) => member,
            Err(AppError::CpfAlreadyExists) => {
                drop(tx);
                return Err(self.archived_cpf_conflict(session, input.cpf.as_deref()).await);
            }
            Err(e) => return Err(e),
        };

        // 2. Auditoria na mesma transação
        self.audit_repo
            .record(
                &mut *tx,
                actor_id(session),
                AuditAction::Create,
                Entity::Member,
                Some(member.id),
                &format!("Cadastro: {}", member.name),
            )
            .await?;

        tx.commit().await?;
        Ok(member)
    }

    /// CPF duplicado: se o dono for um membro arquivado desta igreja,
    /// devolvemos o id dele para o front oferecer a reativação. A busca
    /// passa pela Session, então um dono de outra igreja nunca aparece.
    pub async fn archived_cpf_conflict(&self, session: &Session, cpf: Option<&str>) -> AppError {
        let Some(cpf) = cpf else {
            return AppError::CpfAlreadyExists;
        };
        match self.repo.find_by_cpf(session, cpf).await {
            Ok(Some(existing)) if existing.is_archived() => AppError::MemberArchived {
                id: existing.id,
                name: existing.name,
            },
            Ok(_) => AppError::CpfAlreadyExists,
            Err(e) => e,
        }
    }

    pub async fn update(
        &self,
        session: &Session,
        id: Uuid,
        input: &MemberPayload,
    ) -> Result<Member, AppError> {
        // A leitura isolada garante que o membro é desta igreja
        let current = self.get(session, id).await?;
        session.authorize_write(Entity::Member, Some(current.tenant_id))?;

        let mut tx = self.pool.begin().await?;
        let member = self.repo.update(&mut *tx, current.tenant_id, id, input).await?;
        self.audit_repo
            .record(
                &mut *tx,
                actor_id(session),
                AuditAction::Update,
                Entity::Member,
                Some(member.id),
                "Edição de dados",
            )
            .await?;
        tx.commit().await?;

        Ok(member)
    }

    pub async fn archive(&self, session: &Session, id: Uuid) -> Result<Member, AppError> {
        let current = self
            .repo
            .find_any(session, id)
            .await?
            .ok_or(AppError::MemberNotFound)?;
        session.authorize_write(Entity::Member, Some(current.tenant_id))?;

        let mut tx = self.pool.begin().await?;
        let member = self
            .repo
            .set_archived(&mut *tx, current.tenant_id, id, Some(Utc::now()))
            .await?;
        self.audit_repo
            .record(&mut *tx, actor_id(session), AuditAction::Archive, Entity::Member, Some(id), "Arquivado")
            .await?;
        tx.commit().await?;

        Ok(member)
    }

    pub async fn reactivate(&self, session: &Session, id: Uuid) -> Result<Member, AppError> {
        let current = self
            .repo
            .find_any(session, id)
            .await?
            .ok_or(AppError::MemberNotFound)?;
        session.authorize_write(Entity::Member, Some(current.tenant_id))?;

        let mut tx = self.pool.begin().await?;
        let member = self.repo.set_archived(&mut *tx, current.tenant_id, id, None).await?;
        self.audit_repo
            .record(&mut *tx, actor_id(session), AuditAction::Reactivate, Entity::Member, Some(id), "Reativado")
            .await?;
        tx.commit().await?;

        tracing::info!(member = %id, "{} reativado", member.name);
        Ok(member)
    }
}

pub(crate) fn actor_id(session: &Session) -> Option<Uuid> {
    session.context().actor().map(|a| a.user_id)
}
