// src/db/context.rs

use uuid::Uuid;

use crate::models::{auth::Role, tenancy::TenantId};

/// Quem está executando a operação em andamento.
pub trait TenantContextProvider: Send + Sync {
    fn is_authenticated(&self) -> bool;

    /// Leitura síncrona, apenas do estado já carregado em memória.
    /// Nunca pode disparar uma consulta que passe pelo interceptor.
    fn tenant_id(&self) -> Option<TenantId>;

    fn current_tenant(&self) -> Option<TenantId> {
        if !self.is_authenticated() {
            return None;
        }
        self.tenant_id()
    }

    /// Contextos de sistema (jobs, seed, auditoria) são tratados como privilegiados.
    fn is_privileged(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub tenant_id: TenantId,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    System,
    Authenticated(Actor),
}

/// Contexto de uma única operação (uma requisição).
/// A identidade é capturada uma vez, na autenticação, e não muda depois.
#[derive(Debug, Clone)]
pub struct OperationContext {
    identity: Identity,
}

impl OperationContext {
    pub fn anonymous() -> Self {
        Self { identity: Identity::Anonymous }
    }

    pub fn system() -> Self {
        Self { identity: Identity::System }
    }

    pub fn for_actor(actor: Actor) -> Self {
        Self { identity: Identity::Authenticated(actor) }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn actor(&self) -> Option<&Actor> {
        match &self.identity {
            Identity::Authenticated(actor) => Some(actor),
            _ => None,
        }
    }
}

impl TenantContextProvider for OperationContext {
    fn is_authenticated(&self) -> bool {
        matches!(self.identity, Identity::Authenticated(_))
    }

    fn tenant_id(&self) -> Option<TenantId> {
        self.actor().map(|actor| actor.tenant_id)
    }

    fn is_privileged(&self) -> bool {
        matches!(self.identity, Identity::System)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_authenticated_actors_resolve_a_tenant() {
        let tenant = TenantId::new();
        let ctx = OperationContext::for_actor(Actor {
            user_id: Uuid::new_v4(),
            tenant_id: tenant,
            role: Role::Secretary,
        });
        assert_eq!(ctx.current_tenant(), Some(tenant));
        assert!(!ctx.is_privileged());

        assert_eq!(OperationContext::anonymous().current_tenant(), None);
        assert_eq!(OperationContext::system().current_tenant(), None);
        assert!(OperationContext::system().is_privileged());
    }
}
