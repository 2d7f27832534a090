// src/db/store.rs

use serde::de::DeserializeOwned;
use sqlx::{postgres::PgRow, FromRow, PgPool};

use crate::{
    common::error::AppError,
    db::{
        memory::MemoryStore,
        query::{Entity, Select},
    },
};

/// Um tipo que pode ser lido através de uma `Session`.
pub trait Record: for<'r> FromRow<'r, PgRow> + DeserializeOwned + Send + Unpin + 'static {
    const ENTITY: Entity;
}

/// Para onde as leituras já reescritas são despachadas.
#[derive(Clone)]
pub enum Store {
    Postgres(PgPool),
    Memory(MemoryStore),
}

impl Store {
    pub async fn fetch_all<T: Record>(&self, select: &Select) -> Result<Vec<T>, AppError> {
        match self {
            Store::Postgres(pool) => {
                let mut qb = select.to_query_builder();
                let rows = qb.build_query_as::<T>().fetch_all(pool).await?;
                Ok(rows)
            }
            Store::Memory(memory) => memory
                .fetch(select)?
                .into_iter()
                .map(|row| serde_json::from_value(row).map_err(|e| AppError::from(anyhow::Error::from(e))))
                .collect(),
        }
    }

    pub async fn count(&self, select: &Select) -> Result<i64, AppError> {
        match self {
            Store::Postgres(pool) => {
                let mut qb = select.to_count_builder();
                let (count,): (i64,) = qb.build_query_as().fetch_one(pool).await?;
                Ok(count)
            }
            Store::Memory(memory) => Ok(memory.fetch(select)?.len() as i64),
        }
    }
}
