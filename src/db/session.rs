// src/db/session.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::{
        context::OperationContext,
        interceptor::{InterceptorChain, Operation},
        query::{Entity, Select},
        store::{Record, Store},
    },
    models::tenancy::TenantId,
};

/// Porta de entrada das leituras da aplicação.
///
/// Cada requisição recebe a sua `Session`, com o `OperationContext`
/// capturado na autenticação. A cadeia de interceptores é compartilhada,
/// mas não guarda estado: cada chamada recebe o seu próprio `Select`.
#[derive(Clone)]
pub struct Session {
    store: Store,
    chain: Arc<InterceptorChain>,
    ctx: OperationContext,
}

impl Session {
    pub fn new(store: Store, chain: Arc<InterceptorChain>, ctx: OperationContext) -> Self {
        Self { store, chain, ctx }
    }

    pub fn context(&self) -> &OperationContext {
        &self.ctx
    }

    /// Tenant do usuário da operação; erro se não houver.
    pub fn require_tenant(&self) -> Result<TenantId, AppError> {
        self.ctx.actor().map(|a| a.tenant_id).ok_or(AppError::TenantRequired)
    }

    fn prepare(&self, mut select: Select) -> Result<Select, AppError> {
        self.chain.run(&mut Operation::Read(&mut select), &self.ctx)?;
        Ok(select)
    }

    pub async fn fetch_all<T: Record>(&self, select: Select) -> Result<Vec<T>, AppError> {
        debug_assert_eq!(select.root(), T::ENTITY);
        let select = self.prepare(select)?;
        self.store.fetch_all(&select).await
    }

    pub async fn fetch_optional<T: Record>(&self, select: Select) -> Result<Option<T>, AppError> {
        let rows = self.fetch_all::<T>(select.limit(1)).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn count(&self, select: Select) -> Result<i64, AppError> {
        let select = self.prepare(select)?;
        self.store.count(&select).await
    }

    /// Confere uma gravação antes de ela ir para o repositório.
    pub fn authorize_write(&self, entity: Entity, tenant_id: Option<TenantId>) -> Result<(), AppError> {
        self.chain.run(&mut Operation::Write { entity, tenant_id }, &self.ctx)
    }
}
