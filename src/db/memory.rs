// src/db/memory.rs
//
// Backend em memória que avalia um `Select` com a mesma semântica do SQL
// gerado em `query.rs` (LEFT JOIN com condições no ON, resto no WHERE).
// Usado pelos testes de isolamento e para rodar consultas sem Postgres.

use std::{
    cmp::Ordering,
    collections::HashMap,
    sync::{Arc, RwLock},
};

use anyhow::anyhow;
use chrono::DateTime;
use serde::Serialize;
use serde_json::{Map, Value as Json};

use crate::{
    common::error::AppError,
    db::query::{Condition, Direction, Entity, Filter, JoinKind, Select, Value},
};

type Row = Map<String, Json>;

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<HashMap<&'static str, Vec<Row>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insere uma linha "física", sem passar por nenhum interceptor.
    pub fn insert<T: Serialize>(&self, entity: Entity, record: &T) -> Result<(), AppError> {
        let row = match serde_json::to_value(record).map_err(anyhow::Error::from)? {
            Json::Object(map) => map,
            _ => return Err(anyhow!("registro de {} não é um objeto", entity.table()).into()),
        };
        self.tables
            .write()
            .map_err(|_| anyhow!("memory store envenenado"))?
            .entry(entity.table())
            .or_default()
            .push(row);
        Ok(())
    }

    pub fn fetch(&self, select: &Select) -> Result<Vec<Json>, AppError> {
        let guard = self.tables.read().map_err(|_| anyhow!("memory store envenenado"))?;
        let tables: &HashMap<&'static str, Vec<Row>> = &guard;

        let root_alias = select.root_alias();

        // 1. Combinações alias -> linha (None = LEFT JOIN sem par)
        let mut combos: Vec<HashMap<&'static str, Option<&Row>>> = rows_of(tables, select.root())
            .iter()
            .map(|row| HashMap::from([(root_alias, Some(row))]))
            .collect();

        for join in select.joins() {
            let on_conditions: Vec<&Condition> = select
                .conditions()
                .iter()
                .filter(|c| join.kind == JoinKind::Left && c.alias() == Some(join.alias))
                .collect();

            let mut next = Vec::new();
            for combo in combos {
                let left_value = column_of(&combo, join.from_alias, join.from_column);
                let matches: Vec<&Row> = rows_of(tables, join.entity)
                    .iter()
                    .filter(|candidate| {
                        let right = candidate.get(join.column).unwrap_or(&Json::Null);
                        !right.is_null() && *right == left_value
                    })
                    .filter(|candidate| {
                        on_conditions.iter().all(|c| {
                            let mut joined = combo.clone();
                            joined.insert(join.alias, Some(*candidate));
                            holds(c, &joined)
                        })
                    })
                    .collect();

                if matches.is_empty() {
                    if join.kind == JoinKind::Left {
                        let mut extended = combo.clone();
                        extended.insert(join.alias, None);
                        next.push(extended);
                    }
                    continue;
                }
                for candidate in matches {
                    let mut extended = combo.clone();
                    extended.insert(join.alias, Some(candidate));
                    next.push(extended);
                }
            }
            combos = next;
        }

        // 2. WHERE
        let where_conditions: Vec<&Condition> = select
            .conditions()
            .iter()
            .filter(|c| match c.alias() {
                Some(alias) => select.join_kind(alias) != Some(JoinKind::Left),
                None => true,
            })
            .collect();
        combos.retain(|combo| where_conditions.iter().all(|c| holds(c, combo)));

        // 3. ORDER BY / LIMIT
        combos.sort_by(|a, b| {
            for (alias, column, direction) in select.ordering() {
                let ord = compare(&column_of(a, alias, column), &column_of(b, alias, column));
                let ord = match direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
        if let Some(limit) = select.limit_value() {
            combos.truncate(usize::try_from(limit).unwrap_or(0));
        }

        // 4. Projeção: root.* + colunas extras
        Ok(combos
            .iter()
            .map(|combo| {
                let mut out = combo
                    .get(root_alias)
                    .copied()
                    .flatten()
                    .cloned()
                    .unwrap_or_default();
                for p in select.projections() {
                    out.insert(p.as_name.to_string(), column_of(combo, p.alias, p.column));
                }
                Json::Object(out)
            })
            .collect())
    }
}

fn rows_of<'t>(tables: &'t HashMap<&'static str, Vec<Row>>, entity: Entity) -> &'t [Row] {
    tables.get(entity.table()).map(Vec::as_slice).unwrap_or(&[])
}

fn column_of(combo: &HashMap<&'static str, Option<&Row>>, alias: &str, column: &str) -> Json {
    combo
        .get(alias)
        .copied()
        .flatten()
        .and_then(|row| row.get(column))
        .cloned()
        .unwrap_or(Json::Null)
}

fn holds(condition: &Condition, combo: &HashMap<&'static str, Option<&Row>>) -> bool {
    match condition {
        Condition::Never | Condition::NeverOn { .. } => false,
        Condition::Column { alias, column, filter } => {
            let value = column_of(combo, alias, column);
            match filter {
                Filter::IsNull => value.is_null(),
                Filter::IsNotNull => !value.is_null(),
                // NULL = x é falso, como no SQL
                Filter::Eq(expected) => !value.is_null() && value == to_json(expected),
            }
        }
    }
}

fn to_json(value: &Value) -> Json {
    match value {
        Value::Uuid(v) => Json::String(v.to_string()),
        Value::Text(v) => Json::String(v.clone()),
        Value::Bool(v) => Json::Bool(*v),
    }
}

// NULLs por último em ASC, como no Postgres.
fn compare(a: &Json, b: &Json) -> Ordering {
    match (a, b) {
        (Json::Null, Json::Null) => Ordering::Equal,
        (Json::Null, _) => Ordering::Greater,
        (_, Json::Null) => Ordering::Less,
        (Json::Number(x), Json::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        // Timestamps do serde omitem a fração quando é zero: comparar como texto erra.
        (Json::String(x), Json::String(y)) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(a), Ok(b)) => a.cmp(&b),
                _ => x.cmp(y),
            }
        }
        (Json::Bool(x), Json::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert(Entity::Member, &json!({"id": "m1", "tenant_id": "t1", "name": "Ana", "deleted_at": null})).unwrap();
        store.insert(Entity::Member, &json!({"id": "m2", "tenant_id": "t2", "name": "Bia", "deleted_at": "2024-01-01T00:00:00Z"})).unwrap();
        store.insert(Entity::LedgerEntry, &json!({"id": "l1", "tenant_id": "t1", "member_id": "m1", "amount": 10.0})).unwrap();
        store.insert(Entity::LedgerEntry, &json!({"id": "l2", "tenant_id": "t1", "member_id": null, "amount": 25.5})).unwrap();
        store
    }

    #[test]
    fn where_null_and_ordering() {
        let rows = store()
            .fetch(&Select::new(Entity::Member).where_null("deleted_at"))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "Ana");

        let rows = store()
            .fetch(&Select::new(Entity::LedgerEntry).order_by("amount", Direction::Desc).limit(1))
            .unwrap();
        assert_eq!(rows[0]["id"], "l2");
    }

    #[test]
    fn left_join_keeps_unmatched_rows_and_projects_null() {
        let select = Select::new(Entity::LedgerEntry)
            .left_join(Entity::Member, "m", "id", "member_id")
            .column("m", "name", "member_name")
            .order_by("id", Direction::Asc);
        let rows = store().fetch(&select).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["member_name"], "Ana");
        assert_eq!(rows[1]["member_name"], Json::Null);
    }

    #[test]
    fn left_join_condition_filters_the_joined_side_only() {
        let select = Select::new(Entity::LedgerEntry)
            .left_join(Entity::Member, "m", "id", "member_id")
            .column("m", "name", "member_name")
            .filter("m", "tenant_id", Filter::Eq("t2".into()));
        let rows = store().fetch(&select).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r["member_name"].is_null()));
    }

    #[test]
    fn inner_join_drops_unmatched_rows() {
        let select = Select::new(Entity::LedgerEntry).inner_join(Entity::Member, "m", "id", "member_id");
        assert_eq!(store().fetch(&select).unwrap().len(), 1);
    }

    #[test]
    fn subsecond_timestamps_sort_chronologically() {
        let store = MemoryStore::new();
        store.insert(Entity::Member, &json!({"id": "a", "name": "Older", "created_at": "2024-01-01T12:00:00Z"})).unwrap();
        store.insert(Entity::Member, &json!({"id": "b", "name": "Newer", "created_at": "2024-01-01T12:00:00.500Z"})).unwrap();
        store.insert(Entity::Member, &json!({"id": "c", "name": "Micro", "created_at": "2024-01-01T12:00:00.123456Z"})).unwrap();
        store.insert(Entity::Member, &json!({"id": "d", "name": "Milli", "created_at": "2024-01-01T12:00:00.123Z"})).unwrap();

        let rows = store
            .fetch(&Select::new(Entity::Member).order_by("created_at", Direction::Desc))
            .unwrap();
        let names: Vec<_> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Newer", "Micro", "Milli", "Older"]);
    }

    #[test]
    fn non_timestamp_strings_still_sort_as_text() {
        let rows = store()
            .fetch(&Select::new(Entity::Member).order_by("name", Direction::Desc))
            .unwrap();
        assert_eq!(rows[0]["name"], "Bia");
    }

    #[test]
    fn never_on_a_left_join_keeps_root_rows() {
        let store = store();
        store.insert(Entity::Organization, &json!({"id": "t1", "name": "Igreja A"})).unwrap();

        let mut select = Select::new(Entity::Organization)
            .left_join(Entity::Member, "m", "tenant_id", "id")
            .column("m", "name", "member_name");
        select.constrain(Condition::NeverOn { alias: "m" });

        let rows = store.fetch(&select).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "Igreja A");
        assert!(rows[0]["member_name"].is_null());
    }

    #[test]
    fn never_condition_returns_nothing() {
        let mut select = Select::new(Entity::Member);
        select.constrain(Condition::Never);
        assert!(store().fetch(&select).unwrap().is_empty());
    }
}
