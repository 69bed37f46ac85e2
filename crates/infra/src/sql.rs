//! Postgres-backed implementation of the persistence facade.
//!
//! One generic implementation serves every entity family: SQL is built
//! from the family's field descriptors, parameters are bound by declared
//! column type, and rows come back via `FromRow`. Identifiers and audit
//! timestamps are populated by the database (`gen_random_uuid()` /
//! `now()` column defaults), so every write uses `RETURNING` to hand the
//! server-populated instance back to the caller.

use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgArguments, PgConnection, PgRow};
use sqlx::Postgres;
use tracing::instrument;
use uuid::Uuid;

use finpuls_core::{FieldKind, FieldValue, Persistable};

use crate::error::{StorageError, map_sqlx_error};
use crate::probe::Probe;
use crate::store::{EntityStore, require_id};
use crate::unit::StorageUnit;

type EntityQuery<'q, E> = sqlx::query::QueryAs<'q, Postgres, E, PgArguments>;

/// Generic repository over the storage unit that owns `E`.
#[derive(Debug, Clone)]
pub struct SqlRepository<E: Persistable> {
    unit: StorageUnit<E::Unit>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> SqlRepository<E>
where
    E: Persistable + Unpin + for<'r> sqlx::FromRow<'r, PgRow> + 'static,
{
    pub fn new(unit: StorageUnit<E::Unit>) -> Self {
        Self { unit, _entity: PhantomData }
    }

    pub fn unit(&self) -> &StorageUnit<E::Unit> {
        &self.unit
    }

    fn select_list() -> String {
        let mut columns = vec!["id", "created_at", "updated_at"];
        columns.extend(E::fields().iter().map(|d| d.column));
        columns.join(", ")
    }

    fn select_sql(where_body: Option<&str>) -> String {
        match where_body {
            Some(body) if !body.is_empty() => {
                format!("SELECT {} FROM {} WHERE {body}", Self::select_list(), E::TABLE)
            }
            _ => format!("SELECT {} FROM {}", Self::select_list(), E::TABLE),
        }
    }

    fn insert_sql(with_id: bool) -> String {
        let data_columns: Vec<&str> = E::fields().iter().map(|d| d.column).collect();
        let mut columns: Vec<&str> = Vec::new();
        if with_id {
            columns.push("id");
        }
        columns.extend(&data_columns);
        let placeholders: Vec<String> = (1..=columns.len()).map(|n| format!("${n}")).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            E::TABLE,
            columns.join(", "),
            placeholders.join(", "),
            Self::select_list(),
        )
    }

    fn update_sql() -> String {
        let assignments: Vec<String> = E::fields()
            .iter()
            .enumerate()
            .map(|(i, d)| format!("{} = ${}", d.column, i + 1))
            .collect();
        format!(
            "UPDATE {} SET {}, updated_at = now() WHERE id = ${} RETURNING {}",
            E::TABLE,
            assignments.join(", "),
            E::fields().len() + 1,
            Self::select_list(),
        )
    }

    #[instrument(skip(self, conn, entity), fields(table = E::TABLE), err)]
    async fn insert(
        &self,
        conn: &mut PgConnection,
        entity: &E,
        explicit_id: Option<Uuid>,
    ) -> Result<E, StorageError> {
        let sql = Self::insert_sql(explicit_id.is_some());
        let mut query = sqlx::query_as::<_, E>(&sql);
        if let Some(id) = explicit_id {
            query = query.bind(id);
        }
        for descriptor in E::fields() {
            query = bind_field(query, descriptor.kind, (descriptor.get)(entity));
        }
        query.fetch_one(conn).await.map_err(|e| map_sqlx_error("insert", e))
    }

    #[instrument(skip(self, conn, entity), fields(table = E::TABLE), err)]
    async fn update(
        &self,
        conn: &mut PgConnection,
        entity: &E,
        id: Uuid,
    ) -> Result<E, StorageError> {
        let sql = Self::update_sql();
        let mut query = sqlx::query_as::<_, E>(&sql);
        for descriptor in E::fields() {
            query = bind_field(query, descriptor.kind, (descriptor.get)(entity));
        }
        query.bind(id).fetch_one(conn).await.map_err(|e| map_sqlx_error("update", e))
    }
}

#[async_trait]
impl<E> EntityStore<E> for SqlRepository<E>
where
    E: Persistable + Unpin + for<'r> sqlx::FromRow<'r, PgRow> + 'static,
{
    async fn find_by_id(&self, id: Uuid) -> Result<Option<E>, StorageError> {
        let id = require_id(id)?;
        let sql = Self::select_sql(Some("id = $1"));
        sqlx::query_as::<_, E>(&sql)
            .bind(id)
            .fetch_optional(self.unit.pool())
            .await
            .map_err(|e| map_sqlx_error("find_by_id", e))
    }

    async fn find_all(&self) -> Result<Vec<E>, StorageError> {
        // Consistent snapshot for the whole scan, without write-ahead
        // overhead.
        let mut tx = self.unit.begin_read_only().await?;
        let sql = Self::select_sql(None);
        let rows = sqlx::query_as::<_, E>(&sql)
            .fetch_all(tx.conn())
            .await
            .map_err(|e| map_sqlx_error("find_all", e))?;
        tx.commit().await?;
        Ok(rows)
    }

    async fn save(&self, entity: E) -> Result<E, StorageError> {
        // Existence check and write commit or roll back together.
        let mut tx = self.unit.begin().await?;
        let saved = match entity.id() {
            None => self.insert(tx.conn(), &entity, None).await?,
            Some(id) => {
                let id = require_id(id)?;
                let exists: bool = sqlx::query_scalar(&format!(
                    "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)",
                    E::TABLE
                ))
                .bind(id)
                .fetch_one(tx.conn())
                .await
                .map_err(|e| map_sqlx_error("save", e))?;

                if exists {
                    self.update(tx.conn(), &entity, id).await?
                } else {
                    self.insert(tx.conn(), &entity, Some(id)).await?
                }
            }
        };
        tx.commit().await?;
        Ok(saved)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), StorageError> {
        let id = require_id(id)?;
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", E::TABLE))
            .bind(id)
            .execute(self.unit.pool())
            .await
            .map_err(|e| map_sqlx_error("delete_by_id", e))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("no {} row with id {id}", E::TABLE)));
        }
        tracing::debug!(table = E::TABLE, %id, "row deleted");
        Ok(())
    }

    async fn find_by_probe(&self, probe: Probe) -> Result<Option<E>, StorageError> {
        let sql = format!("{} LIMIT 1", Self::select_sql(Some(&probe.where_clause(1))));
        let mut query = sqlx::query_as::<_, E>(&sql);
        for predicate in probe.predicates() {
            query = bind_field(query, predicate.kind, Some(predicate.value.clone()));
        }
        query
            .fetch_optional(self.unit.pool())
            .await
            .map_err(|e| map_sqlx_error("find_by_probe", e))
    }

    async fn find_all_by_probe(&self, probe: Probe) -> Result<Vec<E>, StorageError> {
        let mut tx = self.unit.begin_read_only().await?;
        let sql = if probe.is_empty() {
            Self::select_sql(None)
        } else {
            Self::select_sql(Some(&probe.where_clause(1)))
        };
        let mut query = sqlx::query_as::<_, E>(&sql);
        for predicate in probe.predicates() {
            query = bind_field(query, predicate.kind, Some(predicate.value.clone()));
        }
        let rows = query
            .fetch_all(tx.conn())
            .await
            .map_err(|e| map_sqlx_error("find_all_by_probe", e))?;
        tx.commit().await?;
        Ok(rows)
    }

    async fn exists_by_id(&self, id: Uuid) -> Result<bool, StorageError> {
        let id = require_id(id)?;
        sqlx::query_scalar(&format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)",
            E::TABLE
        ))
        .bind(id)
        .fetch_one(self.unit.pool())
        .await
        .map_err(|e| map_sqlx_error("exists_by_id", e))
    }
}

/// Bind one described value, using a typed NULL for absent values so the
/// parameter's SQL type is always known to the driver.
fn bind_field<'q, E>(
    query: EntityQuery<'q, E>,
    kind: FieldKind,
    value: Option<FieldValue>,
) -> EntityQuery<'q, E> {
    match (kind, value) {
        (FieldKind::Text, Some(FieldValue::Text(v))) => query.bind(v),
        (FieldKind::Text, _) => query.bind(None::<String>),
        (FieldKind::Uuid, Some(FieldValue::Uuid(v))) => query.bind(v),
        (FieldKind::Uuid, _) => query.bind(None::<Uuid>),
        (FieldKind::Bool, Some(FieldValue::Bool(v))) => query.bind(v),
        (FieldKind::Bool, _) => query.bind(None::<bool>),
        (FieldKind::Int, Some(FieldValue::Int(v))) => query.bind(v),
        (FieldKind::Int, _) => query.bind(None::<i64>),
        (FieldKind::Float, Some(FieldValue::Float(v))) => query.bind(v),
        (FieldKind::Float, _) => query.bind(None::<f64>),
        (FieldKind::Timestamp, Some(FieldValue::Timestamp(v))) => query.bind(v),
        (FieldKind::Timestamp, _) => query.bind(None::<DateTime<Utc>>),
    }
}

#[cfg(test)]
mod tests {
    use finpuls_core::{FieldDescriptor, Main};

    use super::*;

    #[derive(Debug, Clone, Default, sqlx::FromRow)]
    struct Plan {
        id: Option<Uuid>,
        name: String,
        #[sqlx(rename = "is_active")]
        active: bool,
        created_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
    }

    impl Persistable for Plan {
        const TABLE: &'static str = "plans";
        type Unit = Main;

        fn id(&self) -> Option<Uuid> {
            self.id
        }

        fn fields() -> &'static [FieldDescriptor<Self>] {
            const FIELDS: &[FieldDescriptor<Plan>] = &[
                FieldDescriptor {
                    name: "name",
                    column: "name",
                    kind: FieldKind::Text,
                    get: |p| Some(FieldValue::Text(p.name.clone())),
                },
                FieldDescriptor {
                    name: "active",
                    column: "is_active",
                    kind: FieldKind::Bool,
                    get: |p| Some(FieldValue::Bool(p.active)),
                },
            ];
            FIELDS
        }

        fn created_at(&self) -> Option<DateTime<Utc>> {
            self.created_at
        }

        fn stamp(&mut self, id: Uuid, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) {
            self.id = Some(id);
            self.created_at = Some(created_at);
            self.updated_at = Some(updated_at);
        }
    }

    #[test]
    fn select_sql_lists_audit_columns_first() {
        assert_eq!(
            SqlRepository::<Plan>::select_sql(None),
            "SELECT id, created_at, updated_at, name, is_active FROM plans"
        );
        assert_eq!(
            SqlRepository::<Plan>::select_sql(Some("id = $1")),
            "SELECT id, created_at, updated_at, name, is_active FROM plans WHERE id = $1"
        );
    }

    #[test]
    fn insert_sql_lets_the_database_generate_the_id() {
        assert_eq!(
            SqlRepository::<Plan>::insert_sql(false),
            "INSERT INTO plans (name, is_active) VALUES ($1, $2) \
             RETURNING id, created_at, updated_at, name, is_active"
        );
        assert_eq!(
            SqlRepository::<Plan>::insert_sql(true),
            "INSERT INTO plans (id, name, is_active) VALUES ($1, $2, $3) \
             RETURNING id, created_at, updated_at, name, is_active"
        );
    }

    #[test]
    fn update_sql_touches_updated_at_and_keys_on_id() {
        assert_eq!(
            SqlRepository::<Plan>::update_sql(),
            "UPDATE plans SET name = $1, is_active = $2, updated_at = now() WHERE id = $3 \
             RETURNING id, created_at, updated_at, name, is_active"
        );
    }
}
