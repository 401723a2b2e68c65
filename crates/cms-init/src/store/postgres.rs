//! PostgreSQL-backed store.
//!
//! The CMS owns the schema and its migrations; this store only assumes the
//! registered tables exist. Expected shape per table: an `id uuid` primary
//! key defaulting to `gen_random_uuid()`, the registered columns, a unique
//! constraint over the registry's unique fields, and a `created_at` default.

use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};

use super::{CollectionSpec, Field, FieldType, Store, StoreError, collection};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Builds the store without establishing a connection, so an unreachable
    /// database surfaces in the connectivity check rather than at startup.
    pub fn connect_lazy(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_lazy(database_url)?;
        Ok(Self { pool })
    }

    /// Returns a reference to the pool for advanced usage.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn resolve<'s>(
        spec: &'s CollectionSpec,
        field: &str,
    ) -> Result<&'s Field, StoreError> {
        spec.field(field).ok_or_else(|| StoreError::InvalidRecord {
            collection: spec.name.to_string(),
            reason: format!("no field named {field}"),
        })
    }
}

/// Explicit cast suffix for a bound placeholder. Text parameters assign to
/// uuid columns only through an explicit cast; the other types coerce.
fn cast(ty: FieldType) -> &'static str {
    match ty {
        FieldType::Uuid => "::uuid",
        _ => "",
    }
}

fn bind_field<'q>(
    query: Query<'q, Postgres, PgArguments>,
    spec: &CollectionSpec,
    field: &Field,
    value: &'q Value,
) -> Result<Query<'q, Postgres, PgArguments>, StoreError> {
    let mismatch = || StoreError::InvalidRecord {
        collection: spec.name.to_string(),
        reason: format!("field {} expects a {} value", field.name, field.ty.label()),
    };
    Ok(match field.ty {
        FieldType::Text | FieldType::Uuid => query.bind(value.as_str().ok_or_else(mismatch)?),
        FieldType::Integer => query.bind(value.as_i64().ok_or_else(mismatch)?),
        FieldType::Boolean => query.bind(value.as_bool().ok_or_else(mismatch)?),
    })
}

#[async_trait::async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_one(
        &self,
        collection_name: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Value>, StoreError> {
        let spec = collection(collection_name)?;
        let field = Self::resolve(spec, field)?;
        let sql = format!(
            "SELECT to_jsonb({t}) AS record FROM {t} WHERE {f} = $1{c} LIMIT 1",
            t = spec.table,
            f = field.name,
            c = cast(field.ty),
        );
        let query = bind_field(sqlx::query(&sql), spec, field, value)?;
        let row = query.fetch_optional(&self.pool).await?;
        row.map(|r| r.try_get::<Value, _>("record").map_err(StoreError::from))
            .transpose()
    }

    async fn find_many(
        &self,
        collection_name: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>, StoreError> {
        let spec = collection(collection_name)?;
        let field = Self::resolve(spec, field)?;
        let sql = format!(
            "SELECT to_jsonb({t}) AS record FROM {t} WHERE {f} = $1{c}",
            t = spec.table,
            f = field.name,
            c = cast(field.ty),
        );
        let query = bind_field(sqlx::query(&sql), spec, field, value)?;
        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|r| r.try_get::<Value, _>("record").map_err(StoreError::from))
            .collect()
    }

    async fn create(&self, collection_name: &str, data: &Value) -> Result<Value, StoreError> {
        let spec = collection(collection_name)?;
        let object = data.as_object().ok_or_else(|| StoreError::InvalidRecord {
            collection: spec.name.to_string(),
            reason: "record is not an object".to_string(),
        })?;
        if let Some(unknown) = object.keys().find(|k| spec.field(k).is_none()) {
            return Err(StoreError::InvalidRecord {
                collection: spec.name.to_string(),
                reason: format!("no field named {unknown}"),
            });
        }

        // Columns in registry order, restricted to the keys actually present.
        let mut columns = Vec::new();
        let mut values = Vec::new();
        for field in spec.fields {
            if let Some(value) = object.get(field.name) {
                columns.push(field);
                values.push(value);
            }
        }
        let names: Vec<&str> = columns.iter().map(|f| f.name).collect();
        let placeholders: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, f)| format!("${}{}", i + 1, cast(f.ty)))
            .collect();
        let sql = format!(
            "INSERT INTO {t} ({cols}) VALUES ({vals}) RETURNING to_jsonb({t}) AS record",
            t = spec.table,
            cols = names.join(", "),
            vals = placeholders.join(", "),
        );

        let mut query = sqlx::query(&sql);
        for (field, value) in columns.iter().copied().zip(values) {
            query = bind_field(query, spec, field, value)?;
        }
        let row = query.fetch_one(&self.pool).await.map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::UniqueViolation {
                collection: spec.name.to_string(),
                field: spec.unique_fields.join("+"),
            },
            _ => StoreError::Database(e),
        })?;
        row.try_get::<Value, _>("record").map_err(StoreError::from)
    }

    async fn count(&self, collection_name: &str) -> Result<i64, StoreError> {
        let spec = collection(collection_name)?;
        let sql = format!("SELECT COUNT(*) AS count FROM {t}", t = spec.table);
        let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
        row.try_get::<i64, _>("count").map_err(StoreError::from)
    }
}
