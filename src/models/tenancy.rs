// src/models/tenancy.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::db::{query::Entity, store::Record};

// ---
// 1. TenantId (A fronteira de isolamento)
// ---
// Um newtype para não confundir o ID da igreja com outros UUIDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct TenantId(pub Uuid);

impl TenantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// ---
// 2. Organization (A "Igreja")
// ---
// Criada no cadastro junto com o primeiro administrador. Nunca é apagada.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Organization {
    pub id: TenantId,
    pub name: String,
    pub cnpj: Option<String>,
    pub address: Option<String>,
    pub city_state: Option<String>,
    // Responsável que assina as declarações
    pub responsible_name: Option<String>,
    pub responsible_title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Organization {
    const ENTITY: Entity = Entity::Organization;
}

// Dados editáveis em Configurações
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrganizationPayload {
    #[validate(length(min = 2, max = 150, message = "O nome deve ter entre 2 e 150 caracteres."))]
    pub name: String,
    #[validate(length(max = 20, message = "CNPJ inválido."))]
    pub cnpj: Option<String>,
    #[validate(length(max = 200))]
    pub address: Option<String>,
    #[validate(length(max = 50))]
    pub city_state: Option<String>,
    #[validate(length(max = 100))]
    pub responsible_name: Option<String>,
    #[validate(length(max = 50))]
    pub responsible_title: Option<String>,
}
