//! Integration tests for the full seeding sequence.
//!
//! These run against the in-memory store, with a fault-injecting wrapper to
//! simulate database failures and concurrent writers. Covered properties:
//! idempotence across runs, no-overwrite of an existing admin account,
//! zero side effects on a must-succeed failure, and isolation of
//! single-record failures from the rest of the run.

use async_trait::async_trait;
use serde_json::{Value, json};

use cms_init::manifest::{AdminDescriptor, Manifest};
use cms_init::password::verify_password;
use cms_init::report::{Outcome, SeedRunReport};
use cms_init::seeder::{RunState, Seeder};
use cms_init::store::{MemoryStore, Store, StoreError};

fn test_admin() -> AdminDescriptor {
    AdminDescriptor {
        username: "admin".to_string(),
        email: "admin@hostel.local".to_string(),
        firstname: "Hostel".to_string(),
        lastname: "Admin".to_string(),
        password: "CorrectHorse9!".to_string(),
        is_active: true,
    }
}

fn entry_outcome(report: &SeedRunReport, identity: &str) -> Outcome {
    report
        .entries
        .iter()
        .find(|e| e.identity == identity)
        .unwrap_or_else(|| panic!("no report entry for {identity}"))
        .outcome
}

/// Wraps a store and injects failures keyed on a record's `name` (or
/// `email`) value: `fail` produces a database error, `conflict` a unique
/// violation as if a concurrent writer had won the insert.
struct FaultyStore {
    inner: MemoryStore,
    fail_ping: bool,
    fail: Vec<String>,
    conflict: Vec<String>,
}

impl FaultyStore {
    fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail_ping: false,
            fail: Vec::new(),
            conflict: Vec::new(),
        }
    }

    fn record_key(data: &Value) -> Option<&str> {
        data.get("name").or_else(|| data.get("email"))?.as_str()
    }
}

#[async_trait]
impl Store for FaultyStore {
    async fn ping(&self) -> Result<(), StoreError> {
        if self.fail_ping {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }
        self.inner.ping().await
    }

    async fn find_one(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Value>, StoreError> {
        self.inner.find_one(collection, field, value).await
    }

    async fn find_many(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>, StoreError> {
        self.inner.find_many(collection, field, value).await
    }

    async fn create(&self, collection: &str, data: &Value) -> Result<Value, StoreError> {
        if let Some(key) = Self::record_key(data) {
            if self.fail.iter().any(|k| k == key) {
                return Err(StoreError::Database(sqlx::Error::PoolClosed));
            }
            if self.conflict.iter().any(|k| k == key) {
                return Err(StoreError::UniqueViolation {
                    collection: collection.to_string(),
                    field: "name".to_string(),
                });
            }
        }
        self.inner.create(collection, data).await
    }

    async fn count(&self, collection: &str) -> Result<i64, StoreError> {
        self.inner.count(collection).await
    }
}

#[tokio::test]
async fn first_run_creates_everything_second_run_skips() {
    let store = MemoryStore::new();
    let seeder = Seeder::new(store.clone());
    let manifest = Manifest::baseline(test_admin());

    let first = seeder.run(&manifest).await;
    assert_eq!(first.state(), RunState::Completed);
    assert_eq!(entry_outcome(&first, "admin:admin@hostel.local"), Outcome::Created);
    // No built-in roles exist yet, so access configuration is skipped.
    assert_eq!(entry_outcome(&first, "access:public"), Outcome::Skipped);
    assert_eq!(entry_outcome(&first, "access:authenticated"), Outcome::Skipped);
    assert_eq!(first.created(), 1 + 5 + 8);
    assert_eq!(first.failed(), 0);
    assert_eq!(store.count("admin_users").await.unwrap(), 1);
    assert_eq!(store.count("room_types").await.unwrap(), 5);
    assert_eq!(store.count("facilities").await.unwrap(), 8);

    let second = seeder.run(&manifest).await;
    assert_eq!(second.state(), RunState::Completed);
    assert_eq!(second.created(), 0);
    assert_eq!(second.failed(), 0);
    assert_eq!(second.skipped(), second.entries.len());
    assert_eq!(store.count("admin_users").await.unwrap(), 1);
    assert_eq!(store.count("room_types").await.unwrap(), 5);
    assert_eq!(store.count("facilities").await.unwrap(), 8);
}

#[tokio::test]
async fn room_types_are_seeded_exactly_once() {
    let store = MemoryStore::new();
    let seeder = Seeder::new(store.clone());
    let manifest = Manifest::baseline(test_admin());

    let first = seeder.run(&manifest).await;
    for name in ["Single Room", "Double Room", "Dormitory 4", "Dormitory 6", "Dormitory 8"] {
        assert_eq!(entry_outcome(&first, &format!("room_types/{name}")), Outcome::Created);
    }

    let second = seeder.run(&manifest).await;
    for name in ["Single Room", "Double Room", "Dormitory 4", "Dormitory 6", "Dormitory 8"] {
        assert_eq!(entry_outcome(&second, &format!("room_types/{name}")), Outcome::Skipped);
    }
    assert_eq!(store.count("room_types").await.unwrap(), 5);
}

#[tokio::test]
async fn existing_admin_account_is_left_untouched() {
    let store = MemoryStore::new();
    let original_hash = cms_init::password::hash_password("OriginalPass1!").unwrap();
    store
        .create(
            "admin_users",
            &json!({
                "username": "admin",
                "email": "admin@hostel.local",
                "firstname": "Existing",
                "lastname": "Operator",
                "password_hash": original_hash,
                "is_active": true,
            }),
        )
        .await
        .unwrap();

    let seeder = Seeder::new(store.clone());
    let mut admin = test_admin();
    admin.password = "CompletelyDifferent2!".to_string();
    let report = seeder.run(&Manifest::baseline(admin)).await;

    assert_eq!(entry_outcome(&report, "admin:admin@hostel.local"), Outcome::Skipped);
    assert_eq!(store.count("admin_users").await.unwrap(), 1);

    let stored = store
        .find_one("admin_users", "email", &json!("admin@hostel.local"))
        .await
        .unwrap()
        .unwrap();
    let stored_hash = stored.get("password_hash").and_then(Value::as_str).unwrap();
    assert!(verify_password("OriginalPass1!", stored_hash).unwrap());
    assert!(!verify_password("CompletelyDifferent2!", stored_hash).unwrap());
}

#[tokio::test]
async fn connectivity_failure_aborts_with_no_side_effects() {
    let inner = MemoryStore::new();
    let mut store = FaultyStore::new(inner.clone());
    store.fail_ping = true;

    let seeder = Seeder::new(store);
    let report = seeder.run(&Manifest::baseline(test_admin())).await;

    assert_eq!(report.state(), RunState::Aborted);
    assert!(report.aborted());
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].identity, "connectivity");
    assert_eq!(report.entries[0].outcome, Outcome::Failed);
    assert!(report.entries[0].detail.is_some());

    for collection in ["admin_users", "room_types", "facilities", "permissions"] {
        assert_eq!(inner.count(collection).await.unwrap(), 0);
    }
}

#[tokio::test]
async fn admin_insert_failure_aborts_before_record_seeding() {
    let inner = MemoryStore::new();
    let mut store = FaultyStore::new(inner.clone());
    store.fail = vec!["admin@hostel.local".to_string()];

    let seeder = Seeder::new(store);
    let report = seeder.run(&Manifest::baseline(test_admin())).await;

    assert_eq!(report.state(), RunState::Aborted);
    assert_eq!(entry_outcome(&report, "admin:admin@hostel.local"), Outcome::Failed);
    assert_eq!(inner.count("room_types").await.unwrap(), 0);
    assert_eq!(inner.count("facilities").await.unwrap(), 0);
}

#[tokio::test]
async fn record_failure_does_not_block_other_records_or_sets() {
    let inner = MemoryStore::new();
    let mut store = FaultyStore::new(inner.clone());
    store.fail = vec!["Double Room".to_string()];

    let seeder = Seeder::new(store);
    let report = seeder.run(&Manifest::baseline(test_admin())).await;

    assert_eq!(report.state(), RunState::Completed);
    assert!(!report.aborted());
    assert_eq!(entry_outcome(&report, "room_types/Double Room"), Outcome::Failed);
    assert_eq!(entry_outcome(&report, "room_types/Dormitory 8"), Outcome::Created);
    assert_eq!(inner.count("room_types").await.unwrap(), 4);
    // The second record set is unaffected by the first set's failure.
    assert_eq!(inner.count("facilities").await.unwrap(), 8);
    assert_eq!(report.failed(), 1);
}

#[tokio::test]
async fn losing_an_insert_race_reports_skipped() {
    let inner = MemoryStore::new();
    let mut store = FaultyStore::new(inner.clone());
    store.conflict = vec!["WiFi".to_string(), "admin@hostel.local".to_string()];

    let seeder = Seeder::new(store);
    let report = seeder.run(&Manifest::baseline(test_admin())).await;

    assert_eq!(report.state(), RunState::Completed);
    assert_eq!(entry_outcome(&report, "admin:admin@hostel.local"), Outcome::Skipped);
    assert_eq!(entry_outcome(&report, "facilities/WiFi"), Outcome::Skipped);
    assert_eq!(report.failed(), 0);
}

#[tokio::test]
async fn permissions_are_granted_once_roles_exist() {
    let store = MemoryStore::new();
    for (name, role_type) in [("Public", "public"), ("Authenticated", "authenticated")] {
        store
            .create(
                "roles",
                &json!({"name": name, "role_type": role_type, "description": "Built-in role"}),
            )
            .await
            .unwrap();
    }

    let seeder = Seeder::new(store.clone());
    let manifest = Manifest::baseline(test_admin());

    let first = seeder.run(&manifest).await;
    assert_eq!(
        entry_outcome(&first, "access:public:api::room.room.find"),
        Outcome::Created
    );
    assert_eq!(
        entry_outcome(&first, "access:authenticated:api::booking.booking.create"),
        Outcome::Created
    );
    // 4 public actions + 5 authenticated actions.
    assert_eq!(store.count("permissions").await.unwrap(), 9);

    let second = seeder.run(&manifest).await;
    assert_eq!(store.count("permissions").await.unwrap(), 9);
    assert_eq!(
        entry_outcome(&second, "access:public:api::room.room.find"),
        Outcome::Skipped
    );
    assert_eq!(second.created(), 0);
}

#[tokio::test]
async fn health_check_reports_admin_count() {
    let store = MemoryStore::new();
    assert_eq!(cms_init::seeder::health_check(&store).await.unwrap(), 0);

    let seeder = Seeder::new(store.clone());
    seeder.run(&Manifest::baseline(test_admin())).await;
    assert_eq!(cms_init::seeder::health_check(&store).await.unwrap(), 1);

    let mut unreachable = FaultyStore::new(MemoryStore::new());
    unreachable.fail_ping = true;
    assert!(cms_init::seeder::health_check(&unreachable).await.is_err());
}
