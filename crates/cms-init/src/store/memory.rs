//! In-memory store with the same contract and uniqueness semantics as
//! [`PgStore`](super::PgStore). Backs the test suite; cheap to clone and
//! share, so a test can inspect state after a run.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use uuid::Uuid;

use super::{Store, StoreError, collection};

type Collections = HashMap<String, Vec<Value>>;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<Mutex<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Collections> {
        self.collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_one(
        &self,
        collection_name: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Value>, StoreError> {
        Ok(self
            .find_many(collection_name, field, value)
            .await?
            .into_iter()
            .next())
    }

    async fn find_many(
        &self,
        collection_name: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>, StoreError> {
        let spec = collection(collection_name)?;
        if spec.field(field).is_none() {
            return Err(StoreError::InvalidRecord {
                collection: spec.name.to_string(),
                reason: format!("no field named {field}"),
            });
        }
        let guard = self.guard();
        let rows = guard.get(spec.name).map(Vec::as_slice).unwrap_or(&[]);
        Ok(rows
            .iter()
            .filter(|row| row.get(field) == Some(value))
            .cloned()
            .collect())
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

        let mut guard = self.guard();
        let rows = guard.entry(spec.name.to_string()).or_default();
        let duplicate = rows.iter().any(|row| {
            spec.unique_fields
                .iter()
                .all(|f| row.get(*f) == object.get(*f))
        });
        if duplicate {
            return Err(StoreError::UniqueViolation {
                collection: spec.name.to_string(),
                field: spec.unique_fields.join("+"),
            });
        }

        let mut stored = object.clone();
        stored.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        let stored = Value::Object(stored);
        rows.push(stored.clone());
        Ok(stored)
    }

    async fn count(&self, collection_name: &str) -> Result<i64, StoreError> {
        let spec = collection(collection_name)?;
        let guard = self.guard();
        Ok(guard.get(spec.name).map(Vec::len).unwrap_or(0) as i64)
    }
}
