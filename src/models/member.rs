// src/models/member.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{query::Entity, store::Record},
    models::tenancy::TenantId,
};

pub const DEFAULT_POSITION: &str = "Membro";

// Membro da igreja. Arquivar = preencher `deleted_at` (nunca apagamos a linha).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Member {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub name: String,
    pub sex: Option<String>, // 'M' ou 'F'
    pub marital_status: Option<String>,
    pub rg: Option<String>,
    pub cpf: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub baptism_date: Option<NaiveDate>,
    // Cargo / função (Membro, Diácono, Presbítero...)
    pub position: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Record for Member {
    const ENTITY: Entity = Entity::Member;
}

impl Member {
    pub fn is_archived(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_male(&self) -> bool {
        self.sex.as_deref() == Some("M")
    }
}

// Usado tanto no cadastro quanto na edição
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MemberPayload {
    #[validate(length(min = 2, max = 150, message = "O nome deve ter entre 2 e 150 caracteres."))]
    pub name: String,
    #[validate(length(equal = 1, message = "Use 'M' ou 'F'."))]
    pub sex: Option<String>,
    #[validate(length(max = 20))]
    pub marital_status: Option<String>,
    #[validate(length(max = 20))]
    pub rg: Option<String>,
    #[validate(length(min = 11, max = 14, message = "CPF inválido."))]
    pub cpf: Option<String>,
    #[validate(length(max = 200))]
    pub address: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub baptism_date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 50))]
    pub position: Option<String>,
    // Só faz sentido na edição; no cadastro o membro nasce ativo
    pub active: Option<bool>,
}

impl MemberPayload {
    /// Normaliza o sexo para 'M'/'F' (qualquer outra coisa vira None).
    pub fn normalized_sex(&self) -> Option<String> {
        self.sex
            .as_deref()
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| s == "M" || s == "F")
    }

    pub fn position_or_default(&self) -> &str {
        self.position.as_deref().unwrap_or(DEFAULT_POSITION)
    }
}
