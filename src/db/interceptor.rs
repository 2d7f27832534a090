// src/db/interceptor.rs
//
// Pipeline executado antes de toda operação despachada por uma `Session`.
// O "guarda-costas" das igrejas mora aqui: toda leitura de uma entidade
// registrada recebe `tenant_id = <igreja do usuário>`, sem que o handler
// precise lembrar de filtrar.

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::{
        context::TenantContextProvider,
        query::{Condition, Entity, Filter, JoinKind, Select},
        registry::ScopedEntityRegistry,
    },
    models::tenancy::TenantId,
};

pub enum Operation<'q> {
    Read(&'q mut Select),
    // Gravações não são reescritas; só conferidas.
    Write {
        entity: Entity,
        tenant_id: Option<TenantId>,
    },
}

/// O que fazer com uma leitura isolada quando não há tenant resolvido.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Sem filtro (jobs de sistema, scripts). Comportamento herdado.
    #[default]
    Open,
    /// Nada é retornado, exceto para contextos privilegiados.
    Closed,
}

impl std::str::FromStr for FallbackPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(FallbackPolicy::Open),
            "closed" => Ok(FallbackPolicy::Closed),
            other => Err(anyhow::anyhow!("TENANT_FALLBACK inválido: '{}' (use open|closed)", other)),
        }
    }
}

pub trait Interceptor: Send + Sync {
    /// Não pode fazer I/O nem guardar estado entre chamadas.
    fn before_execute(
        &self,
        op: &mut Operation<'_>,
        ctx: &dyn TenantContextProvider,
    ) -> Result<(), AppError>;
}

// ---
// 1. Isolamento nas leituras
// ---
pub struct TenantIsolation {
    registry: Arc<ScopedEntityRegistry>,
    fallback: FallbackPolicy,
}

impl TenantIsolation {
    pub fn new(registry: Arc<ScopedEntityRegistry>, fallback: FallbackPolicy) -> Self {
        Self { registry, fallback }
    }

    /// Injeta o filtro em cada alias de entidade isolada (raiz e joins).
    pub fn apply(&self, select: &mut Select, tenant_id: TenantId) {
        let targets: Vec<(&'static str, &'static str)> = select
            .sources()
            .filter_map(|(alias, entity)| {
                self.registry.tenant_column(entity).map(|column| (alias, column))
            })
            .collect();

        for (alias, column) in targets {
            let added = select.constrain(Condition::Column {
                alias,
                column,
                filter: Filter::Eq(tenant_id.into()),
            });
            if added {
                tracing::trace!(alias, tenant = %tenant_id, "filtro de tenant aplicado");
            }
        }
    }

    /// Política fechada: nenhuma linha isolada aparece. Raiz isolada ou
    /// INNER JOIN isolado esvaziam a consulta; um LEFT JOIN isolado só
    /// perde o lado juntado.
    fn deny(&self, select: &mut Select) {
        let scoped: Vec<&'static str> = select
            .sources()
            .filter(|(_, entity)| self.registry.is_scoped(*entity))
            .map(|(alias, _)| alias)
            .collect();

        for alias in scoped {
            let condition = match select.join_kind(alias) {
                Some(JoinKind::Left) => Condition::NeverOn { alias },
                _ => Condition::Never,
            };
            select.constrain(condition);
        }
    }

    fn touches_scoped(&self, select: &Select) -> bool {
        select.sources().any(|(_, entity)| self.registry.is_scoped(entity))
    }
}

impl Interceptor for TenantIsolation {
    fn before_execute(
        &self,
        op: &mut Operation<'_>,
        ctx: &dyn TenantContextProvider,
    ) -> Result<(), AppError> {
        // 1. Só age em leituras
        let Operation::Read(select) = op else {
            return Ok(());
        };

        // 2. Resolve o tenant UMA vez, para a operação inteira
        match ctx.current_tenant() {
            Some(tenant_id) => self.apply(select, tenant_id),
            None => {
                if !self.touches_scoped(select) {
                    return Ok(());
                }
                tracing::debug!(
                    table = select.root().table(),
                    authenticated = ctx.is_authenticated(),
                    "leitura sem tenant resolvido"
                );
                if self.fallback == FallbackPolicy::Closed && !ctx.is_privileged() {
                    self.deny(select);
                }
            }
        }

        Ok(())
    }
}

// ---
// 2. Conferência nas gravações
// ---
// O handler carimba o tenant_id na criação; aqui só garantimos que
// o carimbo bate com a igreja de quem está gravando.
pub struct WriteTenantCheck {
    registry: Arc<ScopedEntityRegistry>,
}

impl WriteTenantCheck {
    pub fn new(registry: Arc<ScopedEntityRegistry>) -> Self {
        Self { registry }
    }
}

impl Interceptor for WriteTenantCheck {
    fn before_execute(
        &self,
        op: &mut Operation<'_>,
        ctx: &dyn TenantContextProvider,
    ) -> Result<(), AppError> {
        let Operation::Write { entity, tenant_id } = op else {
            return Ok(());
        };

        if !self.registry.is_scoped(*entity) {
            return Ok(());
        }

        match (ctx.current_tenant(), *tenant_id) {
            (Some(actor_tenant), Some(stamped)) if actor_tenant != stamped => {
                Err(AppError::TenantMismatch { entity: entity.table() })
            }
            // Registro isolado sem carimbo nunca é aceito
            (_, None) => Err(AppError::TenantRequired),
            _ => Ok(()),
        }
    }
}

// ---
// 3. A cadeia
// ---
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cadeia padrão da aplicação: isolamento de leitura + conferência de escrita.
    pub fn standard(registry: Arc<ScopedEntityRegistry>, fallback: FallbackPolicy) -> Self {
        Self::new()
            .with(TenantIsolation::new(registry.clone(), fallback))
            .with(WriteTenantCheck::new(registry))
    }

    pub fn with(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn run(
        &self,
        op: &mut Operation<'_>,
        ctx: &dyn TenantContextProvider,
    ) -> Result<(), AppError> {
        for interceptor in &self.interceptors {
            interceptor.before_execute(op, ctx)?;
        }
        Ok(())
    }
}
