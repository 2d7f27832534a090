// src/services/ledger_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{query::Entity, session::Session, AuditRepository, LedgerRepository, MemberRepository},
    models::{
        audit::AuditAction,
        ledger::{CreateLedgerEntryPayload, LedgerEntry, LedgerOverview, LedgerSummary},
    },
    services::member_service::actor_id,
};

#[derive(Clone)]
pub struct LedgerService {
    repo: LedgerRepository,
    member_repo: MemberRepository,
    audit_repo: AuditRepository,
    pool: PgPool,
}

impl LedgerService {
    pub fn new(
        repo: LedgerRepository,
        member_repo: MemberRepository,
        audit_repo: AuditRepository,
        pool: PgPool,
    ) -> Self {
        Self { repo, member_repo, audit_repo, pool }
    }

    /// Lançamentos + saldo. O cálculo é feito em memória sobre as linhas
    /// já isoladas; a soma vai para o SQL quando o volume pedir.
    pub async fn overview(&self, session: &Session) -> Result<LedgerOverview, AppError> {
        let entries = self.repo.list_lines(session).await?;
        let summary = LedgerSummary::from_lines(&entries);
        Ok(LedgerOverview { summary, entries })
    }

    pub async fn create_entry(
        &self,
        session: &Session,
        input: &CreateLedgerEntryPayload,
    ) -> Result<LedgerEntry, AppError> {
        let tenant_id = session.require_tenant()?;
        session.authorize_write(Entity::LedgerEntry, Some(tenant_id))?;

        self.ensure_member_visible(session, input.member_id).await?;

        let mut tx = self.pool.begin().await?;
        let entry = self.repo.insert(&mut *tx, tenant_id, input).await?;
        self.audit_repo
            .record(
                &mut *tx,
                actor_id(session),
                AuditAction::CreateFinancial,
                Entity::LedgerEntry,
                Some(entry.id),
                &format!("{:?} de R$ {:.2}", entry.kind, entry.amount),
            )
            .await?;
        tx.commit().await?;

        Ok(entry)
    }

    /// O dizimista precisa ser visível para quem lança (mesma igreja, ativo).
    pub async fn ensure_member_visible(
        &self,
        session: &Session,
        member_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        let Some(member_id) = member_id else {
            return Ok(());
        };
        self.member_repo
            .find_visible(session, member_id)
            .await?
            .ok_or(AppError::MemberNotFound)?;
        Ok(())
    }
}
