// src/models/ledger.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    db::{query::Entity, store::Record},
    models::tenancy::TenantId,
};

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "entry_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Income,  // Entrada (dízimo, oferta)
    Expense, // Saída (aluguel, luz)
}

// --- Structs ---

// Lançamento do caixa da igreja
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub entry_date: NaiveDate,
    pub kind: EntryKind,
    pub category: String,
    pub description: Option<String>,
    pub amount: Decimal,
    // Quem deu o dízimo. Nulo = oferta anônima.
    pub member_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

// Linha da listagem: lançamento + nome do membro (LEFT JOIN)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LedgerLine {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub entry_date: NaiveDate,
    pub kind: EntryKind,
    pub category: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub member_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub member_name: Option<String>,
}

impl Record for LedgerLine {
    const ENTITY: Entity = Entity::LedgerEntry;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
}

impl LedgerSummary {
    pub fn from_lines(lines: &[LedgerLine]) -> Self {
        let sum = |kind: EntryKind| -> Decimal {
            lines.iter().filter(|l| l.kind == kind).map(|l| l.amount).sum()
        };
        let income = sum(EntryKind::Income);
        let expense = sum(EntryKind::Expense);
        Self { income, expense, balance: income - expense }
    }
}

#[derive(Debug, Serialize)]
pub struct LedgerOverview {
    pub summary: LedgerSummary,
    pub entries: Vec<LedgerLine>,
}

fn validate_positive(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_positive() && !amount.is_zero() {
        Ok(())
    } else {
        Err(ValidationError::new("positive").with_message("O valor deve ser maior que zero.".into()))
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLedgerEntryPayload {
    pub entry_date: NaiveDate,
    pub kind: EntryKind,
    #[validate(length(min = 1, max = 50, message = "A categoria é obrigatória."))]
    pub category: String,
    #[validate(length(max = 200))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_positive"))]
    pub amount: Decimal,
    pub member_id: Option<Uuid>,
}
