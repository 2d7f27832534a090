// src/models/audit.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

// Ações registradas no log de auditoria
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Signup,
    Create,
    Update,
    Archive,
    Reactivate,
    CreateUser,
    CreateFinancial,
    UpdateConfig,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::Signup => "SIGNUP",
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Archive => "ARCHIVE",
            AuditAction::Reactivate => "REACTIVATE",
            AuditAction::CreateUser => "CREATE_USER",
            AuditAction::CreateFinancial => "CREATE_FIN",
            AuditAction::UpdateConfig => "UPDATE_CONFIG",
        }
    }
}

// Não é isolado por igreja: o escopo vem da entidade referenciada.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AuditEntry {
    pub id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub action: String,
    pub entity: String,
    pub entity_id: Option<Uuid>,
    pub details: Option<String>,
    // Nulo para ações do sistema
    pub user_id: Option<Uuid>,
}
