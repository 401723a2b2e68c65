//! Storage abstraction for the seeding run.
//!
//! The seeder only depends on this narrow contract: a connectivity probe,
//! exact-match lookups, record creation, and counting. Collections and their
//! fields come from a static registry, so caller data never reaches SQL as
//! an identifier.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("unique constraint rejected {collection}.{field}")]
    UniqueViolation { collection: String, field: String },

    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    #[error("invalid record for {collection}: {reason}")]
    InvalidRecord { collection: String, reason: String },
}

impl StoreError {
    /// True when a write lost to an existing row under a unique constraint.
    /// The seeder treats this as "already exists", not as a failure.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation { .. })
    }
}

/// Persistent-store collaborator the seeder runs against.
///
/// Lookups are exact-match and case-sensitive. `create` must surface unique
/// constraint violations as [`StoreError::UniqueViolation`]; the constraint,
/// not the caller's existence check, is what prevents duplicates under
/// concurrent invocations.
#[async_trait]
pub trait Store: Send + Sync {
    /// Trivial round-trip query (`SELECT 1` for SQL stores).
    async fn ping(&self) -> Result<(), StoreError>;

    async fn find_one(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Value>, StoreError>;

    async fn find_many(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>, StoreError>;

    /// Inserts a record and returns it as stored (including its id).
    async fn create(&self, collection: &str, data: &Value) -> Result<Value, StoreError>;

    async fn count(&self, collection: &str) -> Result<i64, StoreError>;
}

/// Column type of a registered field, used for bind/cast decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Integer,
    Boolean,
    Uuid,
}

impl FieldType {
    fn label(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Uuid => "uuid",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
}

/// Registered collection: logical name, backing table, the fields that form
/// its unique key, and the writable fields.
#[derive(Debug, Clone, Copy)]
pub struct CollectionSpec {
    pub name: &'static str,
    pub table: &'static str,
    pub unique_fields: &'static [&'static str],
    pub fields: &'static [Field],
}

const ID_FIELD: Field = Field {
    name: "id",
    ty: FieldType::Uuid,
};

impl CollectionSpec {
    /// Resolves a field by name; `id` is available on every collection.
    pub fn field(&self, name: &str) -> Option<&Field> {
        if name == "id" {
            return Some(&ID_FIELD);
        }
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Every collection the seeder may touch.
pub const COLLECTIONS: &[CollectionSpec] = &[
    CollectionSpec {
        name: "admin_users",
        table: "admin_users",
        unique_fields: &["email"],
        fields: &[
            Field { name: "username", ty: FieldType::Text },
            Field { name: "email", ty: FieldType::Text },
            Field { name: "firstname", ty: FieldType::Text },
            Field { name: "lastname", ty: FieldType::Text },
            Field { name: "password_hash", ty: FieldType::Text },
            Field { name: "is_active", ty: FieldType::Boolean },
        ],
    },
    CollectionSpec {
        name: "roles",
        table: "roles",
        unique_fields: &["role_type"],
        fields: &[
            Field { name: "name", ty: FieldType::Text },
            Field { name: "role_type", ty: FieldType::Text },
            Field { name: "description", ty: FieldType::Text },
        ],
    },
    CollectionSpec {
        name: "permissions",
        table: "permissions",
        unique_fields: &["role_id", "action"],
        fields: &[
            Field { name: "action", ty: FieldType::Text },
            Field { name: "role_id", ty: FieldType::Uuid },
        ],
    },
    CollectionSpec {
        name: "room_types",
        table: "room_types",
        unique_fields: &["name"],
        fields: &[
            Field { name: "name", ty: FieldType::Text },
            Field { name: "capacity", ty: FieldType::Integer },
            Field { name: "description", ty: FieldType::Text },
        ],
    },
    CollectionSpec {
        name: "facilities",
        table: "facilities",
        unique_fields: &["name"],
        fields: &[
            Field { name: "name", ty: FieldType::Text },
            Field { name: "icon", ty: FieldType::Text },
            Field { name: "description", ty: FieldType::Text },
        ],
    },
];

/// Looks up a collection spec by logical name.
pub fn collection(name: &str) -> Result<&'static CollectionSpec, StoreError> {
    COLLECTIONS
        .iter()
        .find(|c| c.name == name)
        .ok_or_else(|| StoreError::UnknownCollection(name.to_string()))
}
