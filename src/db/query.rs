// src/db/query.rs
//
// Representação mínima das operações de leitura. Não é um ORM: só o
// suficiente para que o interceptor enxergue cada tabela (e cada alias)
// antes da consulta chegar ao banco.

use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::tenancy::TenantId;

/// Tipos de entidade conhecidos pela camada de dados.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Organization,
    User,
    Member,
    LedgerEntry,
    AuditEntry,
}

impl Entity {
    pub const ALL: [Entity; 5] = [
        Entity::Organization,
        Entity::User,
        Entity::Member,
        Entity::LedgerEntry,
        Entity::AuditEntry,
    ];

    pub fn table(self) -> &'static str {
        match self {
            Entity::Organization => "organizations",
            Entity::User => "users",
            Entity::Member => "members",
            Entity::LedgerEntry => "ledger_entries",
            Entity::AuditEntry => "audit_log",
        }
    }

    /// Espelha o schema das migrações: a tabela tem coluna `tenant_id`?
    pub fn has_tenant_column(self) -> bool {
        matches!(self, Entity::User | Entity::Member | Entity::LedgerEntry)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Uuid(Uuid),
    Text(String),
    Bool(bool),
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Value::Uuid(value)
    }
}

impl From<TenantId> for Value {
    fn from(value: TenantId) -> Self {
        Value::Uuid(value.0)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(Value),
    IsNull,
    IsNotNull,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Column {
        alias: &'static str,
        column: &'static str,
        filter: Filter,
    },
    // Nunca verdadeiro: usado pela política "fechada" sem tenant.
    Never,
    // Idem, mas preso a um alias: num LEFT JOIN vai no ON e só esvazia o lado juntado.
    NeverOn { alias: &'static str },
}

impl Condition {
    /// Alias a que a condição se refere; `Never` vale para a linha inteira.
    pub fn alias(&self) -> Option<&'static str> {
        match self {
            Condition::Column { alias, .. } | Condition::NeverOn { alias } => Some(*alias),
            Condition::Never => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub entity: Entity,
    pub alias: &'static str,
    // ON alias.column = from_alias.from_column
    pub column: &'static str,
    pub from_alias: &'static str,
    pub from_column: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub alias: &'static str,
    pub column: &'static str,
    pub as_name: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    root: Entity,
    joins: Vec<Join>,
    conditions: Vec<Condition>,
    projections: Vec<Projection>,
    order: Vec<(&'static str, &'static str, Direction)>,
    limit: Option<i64>,
}

impl Select {
    /// A raiz usa o nome da tabela como alias.
    pub fn new(root: Entity) -> Self {
        Self {
            root,
            joins: Vec::new(),
            conditions: Vec::new(),
            projections: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    pub fn root(&self) -> Entity {
        self.root
    }

    pub fn root_alias(&self) -> &'static str {
        self.root.table()
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn projections(&self) -> &[Projection] {
        &self.projections
    }

    pub fn ordering(&self) -> &[(&'static str, &'static str, Direction)] {
        &self.order
    }

    pub fn limit_value(&self) -> Option<i64> {
        self.limit
    }

    /// Todas as tabelas que aparecem na operação: raiz + joins.
    pub fn sources(&self) -> impl Iterator<Item = (&'static str, Entity)> + '_ {
        std::iter::once((self.root_alias(), self.root))
            .chain(self.joins.iter().map(|j| (j.alias, j.entity)))
    }

    pub fn join_kind(&self, alias: &str) -> Option<JoinKind> {
        self.joins.iter().find(|j| j.alias == alias).map(|j| j.kind)
    }

    pub fn where_eq(self, column: &'static str, value: impl Into<Value>) -> Self {
        let alias = self.root_alias();
        self.filter(alias, column, Filter::Eq(value.into()))
    }

    pub fn where_null(self, column: &'static str) -> Self {
        let alias = self.root_alias();
        self.filter(alias, column, Filter::IsNull)
    }

    pub fn where_not_null(self, column: &'static str) -> Self {
        let alias = self.root_alias();
        self.filter(alias, column, Filter::IsNotNull)
    }

    pub fn filter(mut self, alias: &'static str, column: &'static str, filter: Filter) -> Self {
        self.constrain(Condition::Column { alias, column, filter });
        self
    }

    /// Adiciona uma condição conjuntiva. Condições repetidas são ignoradas.
    pub fn constrain(&mut self, condition: Condition) -> bool {
        if self.conditions.contains(&condition) {
            return false;
        }
        self.conditions.push(condition);
        true
    }

    pub fn left_join(
        self,
        entity: Entity,
        alias: &'static str,
        column: &'static str,
        from_column: &'static str,
    ) -> Self {
        self.join(JoinKind::Left, entity, alias, column, from_column)
    }

    pub fn inner_join(
        self,
        entity: Entity,
        alias: &'static str,
        column: &'static str,
        from_column: &'static str,
    ) -> Self {
        self.join(JoinKind::Inner, entity, alias, column, from_column)
    }

    fn join(
        mut self,
        kind: JoinKind,
        entity: Entity,
        alias: &'static str,
        column: &'static str,
        from_column: &'static str,
    ) -> Self {
        let from_alias = self.root_alias();
        self.joins.push(Join { kind, entity, alias, column, from_alias, from_column });
        self
    }

    pub fn column(mut self, alias: &'static str, column: &'static str, as_name: &'static str) -> Self {
        self.projections.push(Projection { alias, column, as_name });
        self
    }

    pub fn order_by(mut self, column: &'static str, direction: Direction) -> Self {
        let alias = self.root_alias();
        self.order.push((alias, column, direction));
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    // Condições de um alias em LEFT JOIN vão no ON (senão o LEFT vira INNER).
    fn is_join_condition(&self, condition: &Condition) -> bool {
        condition
            .alias()
            .is_some_and(|alias| self.join_kind(alias) == Some(JoinKind::Left))
    }

    /// Monta o SQL. Identificadores vêm sempre do código (`&'static str`);
    /// valores são sempre passados por bind.
    pub fn to_query_builder(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT ");
        self.push_sql(&mut qb);
        qb
    }

    pub fn to_count_builder(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM (SELECT ");
        self.push_sql(&mut qb);
        qb.push(") AS counted");
        qb
    }

    fn push_sql(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        let root = self.root_alias();
        qb.push(format!("{root}.*"));
        for p in &self.projections {
            qb.push(format!(", {}.{} AS {}", p.alias, p.column, p.as_name));
        }
        qb.push(format!(" FROM {} AS {}", self.root.table(), root));

        for join in &self.joins {
            let keyword = match join.kind {
                JoinKind::Inner => "INNER JOIN",
                JoinKind::Left => "LEFT JOIN",
            };
            qb.push(format!(
                " {} {} AS {} ON {}.{} = {}.{}",
                keyword,
                join.entity.table(),
                join.alias,
                join.alias,
                join.column,
                join.from_alias,
                join.from_column
            ));
            if join.kind == JoinKind::Left {
                for condition in self.conditions.iter().filter(|c| c.alias() == Some(join.alias)) {
                    qb.push(" AND ");
                    push_condition(qb, condition);
                }
            }
        }

        let mut first = true;
        for condition in self.conditions.iter().filter(|c| !self.is_join_condition(c)) {
            qb.push(if first { " WHERE " } else { " AND " });
            push_condition(qb, condition);
            first = false;
        }

        for (i, (alias, column, direction)) in self.order.iter().enumerate() {
            qb.push(if i == 0 { " ORDER BY " } else { ", " });
            let dir = match direction {
                Direction::Asc => "ASC",
                Direction::Desc => "DESC",
            };
            qb.push(format!("{alias}.{column} {dir}"));
        }

        if let Some(limit) = self.limit {
            qb.push(" LIMIT ");
            qb.push_bind(limit);
        }
    }
}

fn push_condition(qb: &mut QueryBuilder<'static, Postgres>, condition: &Condition) {
    match condition {
        Condition::Never | Condition::NeverOn { .. } => {
            qb.push("FALSE");
        }
        Condition::Column { alias, column, filter } => {
            qb.push(format!("{alias}.{column}"));
            match filter {
                Filter::IsNull => {
                    qb.push(" IS NULL");
                }
                Filter::IsNotNull => {
                    qb.push(" IS NOT NULL");
                }
                Filter::Eq(value) => {
                    qb.push(" = ");
                    match value {
                        Value::Uuid(v) => qb.push_bind(*v),
                        Value::Text(v) => qb.push_bind(v.clone()),
                        Value::Bool(v) => qb.push_bind(*v),
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_select_renders_where_order_and_limit() {
        let select = Select::new(Entity::Member)
            .where_null("deleted_at")
            .where_eq("active", true)
            .order_by("created_at", Direction::Desc)
            .limit(5);

        let sql = select.to_query_builder().into_sql();
        assert_eq!(
            sql,
            "SELECT members.* FROM members AS members \
             WHERE members.deleted_at IS NULL AND members.active = $1 \
             ORDER BY members.created_at DESC LIMIT $2"
        );
    }

    #[test]
    fn left_join_conditions_go_into_the_on_clause() {
        let tenant = TenantId(Uuid::nil());
        let mut select = Select::new(Entity::LedgerEntry)
            .left_join(Entity::Member, "m", "id", "member_id")
            .column("m", "name", "member_name");
        select.constrain(Condition::Column {
            alias: "m",
            column: "tenant_id",
            filter: Filter::Eq(tenant.into()),
        });

        let sql = select.to_query_builder().into_sql();
        assert_eq!(
            sql,
            "SELECT ledger_entries.*, m.name AS member_name FROM ledger_entries AS ledger_entries \
             LEFT JOIN members AS m ON m.id = ledger_entries.member_id AND m.tenant_id = $1"
        );
    }

    #[test]
    fn never_on_a_left_joined_alias_empties_only_the_joined_side() {
        let mut select = Select::new(Entity::Organization)
            .left_join(Entity::Member, "m", "tenant_id", "id")
            .column("m", "name", "member_name");
        select.constrain(Condition::NeverOn { alias: "m" });

        let sql = select.to_query_builder().into_sql();
        assert_eq!(
            sql,
            "SELECT organizations.*, m.name AS member_name FROM organizations AS organizations \
             LEFT JOIN members AS m ON m.tenant_id = organizations.id AND FALSE"
        );
    }

    #[test]
    fn constrain_ignores_duplicates() {
        let mut select = Select::new(Entity::Member);
        assert!(select.constrain(Condition::Never));
        assert!(!select.constrain(Condition::Never));
        assert_eq!(select.conditions().len(), 1);
    }

    #[test]
    fn count_wraps_the_select() {
        let sql = Select::new(Entity::Member).where_null("deleted_at").to_count_builder().into_sql();
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM (SELECT members.* FROM members AS members \
             WHERE members.deleted_at IS NULL) AS counted"
        );
    }

    #[test]
    fn sources_include_every_alias() {
        let select = Select::new(Entity::LedgerEntry)
            .left_join(Entity::Member, "m", "id", "member_id")
            .inner_join(Entity::Member, "m2", "id", "member_id");
        let sources: Vec<_> = select.sources().collect();
        assert_eq!(
            sources,
            vec![
                ("ledger_entries", Entity::LedgerEntry),
                ("m", Entity::Member),
                ("m2", Entity::Member)
            ]
        );
    }
}
