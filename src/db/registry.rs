// src/db/registry.rs

use std::collections::HashMap;

use crate::{common::error::AppError, db::query::Entity};

// ---
// Entidades isoladas por igreja.
// ---
// Nova entidade com tenant_id? Uma linha aqui. O check de startup
// (`verify_complete`) derruba a aplicação se alguém esquecer.
pub const SCOPED_ENTITIES: &[(Entity, &str)] = &[
    (Entity::Member, "tenant_id"),
    (Entity::LedgerEntry, "tenant_id"),
];

// Têm tenant_id mas NÃO passam pelo interceptor.
// Usuários são lidos no login/autenticação, antes de existir um tenant
// resolvido; os handlers filtram explicitamente.
pub const EXEMPT_ENTITIES: &[Entity] = &[Entity::User];

#[derive(Debug, Clone)]
pub struct ScopedEntityRegistry {
    scoped: HashMap<Entity, &'static str>,
    exempt: Vec<Entity>,
}

impl ScopedEntityRegistry {
    pub fn standard() -> Self {
        Self::from_entries(SCOPED_ENTITIES, EXEMPT_ENTITIES)
    }

    pub fn from_entries(scoped: &[(Entity, &'static str)], exempt: &[Entity]) -> Self {
        Self {
            scoped: scoped.iter().copied().collect(),
            exempt: exempt.to_vec(),
        }
    }

    /// Coluna de tenant da entidade, se ela for isolada.
    pub fn tenant_column(&self, entity: Entity) -> Option<&'static str> {
        self.scoped.get(&entity).copied()
    }

    pub fn is_scoped(&self, entity: Entity) -> bool {
        self.scoped.contains_key(&entity)
    }

    /// Cruza o modelo de entidades com o registro.
    pub fn verify_complete(&self) -> Result<(), AppError> {
        let missing: Vec<&str> = Entity::ALL
            .into_iter()
            .filter(|e| e.has_tenant_column())
            .filter(|e| !self.is_scoped(*e) && !self.exempt.contains(e))
            .map(|e| e.table())
            .collect();

        if !missing.is_empty() {
            return Err(AppError::RegistryIncomplete(missing.join(", ")));
        }

        let bogus: Vec<&str> = self
            .scoped
            .keys()
            .filter(|e| !e.has_tenant_column())
            .map(|e| e.table())
            .collect();

        if !bogus.is_empty() {
            return Err(AppError::RegistryIncomplete(format!(
                "sem coluna de tenant: {}",
                bogus.join(", ")
            )));
        }

        Ok(())
    }
}
