//! The seeder applies a [`Manifest`] to a [`Store`], creating each entry at
//! most once across arbitrarily many invocations.
//!
//! Connectivity and the admin account are must-succeed steps; permission
//! configuration and record seeding are best-effort, with failures scoped to
//! the smallest unit (one action, one record) and recorded in the report.
//! There are no retries and no rollback. An insert that loses a race to a
//! concurrent invocation surfaces as a unique violation and is reported as
//! skipped, the same as if the row had existed up front.

use serde_json::json;
use tracing::{debug, info};

use crate::errors::{AdminError, PermissionError, RecordSeedError, SeedError};
use crate::manifest::{AccessPolicy, AdminDescriptor, LookupRecord, Manifest, RecordSet};
use crate::password;
use crate::report::{Outcome, SeedRunReport};
use crate::store::Store;

/// Progress of a seeding run. Transitions are strictly sequential and
/// forward-only; a must-succeed failure jumps straight to `Aborted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunState {
    NotStarted,
    ConnectivityVerified,
    AdminHandled,
    AccessConfigured,
    RecordsSeeded,
    Completed,
    Aborted,
}

pub struct Seeder<S> {
    store: S,
}

impl<S: Store> Seeder<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Applies the manifest in order: connectivity, admin account, default
    /// access, record sets. Returns the full report; `report.aborted()`
    /// tells the caller whether a must-succeed step failed.
    pub async fn run(&self, manifest: &Manifest) -> SeedRunReport {
        let mut report = SeedRunReport::new();

        if let Err(e) = self.verify_connectivity().await {
            report.record("connectivity", Outcome::Failed, Some(e.to_string()));
            report.abort();
            return report;
        }
        report.advance(RunState::ConnectivityVerified);
        info!("store reachable, beginning seed run");

        let admin_identity = format!("admin:{}", manifest.admin.email);
        match self.upsert_admin_account(&manifest.admin).await {
            Ok(outcome) => report.record(admin_identity, outcome, None),
            Err(e) => {
                report.record(admin_identity, Outcome::Failed, Some(e.to_string()));
                report.abort();
                return report;
            }
        }
        report.advance(RunState::AdminHandled);

        self.configure_default_access(&manifest.access, &mut report)
            .await;
        report.advance(RunState::AccessConfigured);

        for set in &manifest.record_sets {
            self.seed_record_set(set, &mut report).await;
        }
        report.advance(RunState::RecordsSeeded);

        report.complete();
        report
    }

    /// Must-succeed: a trivial round-trip to the store. Nothing downstream
    /// can proceed without it, so failure aborts with zero side effects.
    pub async fn verify_connectivity(&self) -> Result<(), SeedError> {
        self.store.ping().await.map_err(SeedError::Connectivity)
    }

    /// Must-succeed: ensures the admin account exists. An existing account
    /// is left untouched, whatever the manifest's password says.
    pub async fn upsert_admin_account(
        &self,
        admin: &AdminDescriptor,
    ) -> Result<Outcome, AdminError> {
        let email = json!(admin.email);
        if self
            .store
            .find_one("admin_users", "email", &email)
            .await?
            .is_some()
        {
            debug!(email = %admin.email, "admin account already present, leaving untouched");
            return Ok(Outcome::Skipped);
        }

        let password_hash = password::hash_password(&admin.password)?;
        let record = json!({
            "username": admin.username,
            "email": admin.email,
            "firstname": admin.firstname,
            "lastname": admin.lastname,
            "password_hash": password_hash,
            "is_active": admin.is_active,
        });
        match self.store.create("admin_users", &record).await {
            Ok(_) => {
                info!(email = %admin.email, "admin account created");
                Ok(Outcome::Created)
            }
            Err(e) if e.is_unique_violation() => Ok(Outcome::Skipped),
            Err(e) => Err(AdminError::Store(e)),
        }
    }

    /// Best-effort: grants each policy's actions to its built-in role. A
    /// missing role skips the policy; failures are recorded per entry and
    /// never stop the remaining policies or steps.
    pub async fn configure_default_access(
        &self,
        policies: &[AccessPolicy],
        report: &mut SeedRunReport,
    ) {
        for policy in policies {
            if let Err(e) = self.apply_access_policy(policy, report).await {
                report.record(
                    format!("access:{}", policy.role_type),
                    Outcome::Failed,
                    Some(e.to_string()),
                );
            }
        }
    }

    async fn apply_access_policy(
        &self,
        policy: &AccessPolicy,
        report: &mut SeedRunReport,
    ) -> Result<(), PermissionError> {
        let key = json!(policy.role_type);
        let Some(role) = self.store.find_one("roles", "role_type", &key).await? else {
            debug!(role = %policy.role_type, "role not present, skipping access configuration");
            report.record(format!("access:{}", policy.role_type), Outcome::Skipped, None);
            return Ok(());
        };
        let role_id = role
            .get("id")
            .cloned()
            .ok_or_else(|| PermissionError::MalformedRole(policy.role_type.clone()))?;

        for action in &policy.actions {
            let identity = format!("access:{}:{action}", policy.role_type);
            let existing = self
                .store
                .find_many("permissions", "action", &json!(action))
                .await?;
            if existing.iter().any(|p| p.get("role_id") == Some(&role_id)) {
                report.record(identity, Outcome::Skipped, None);
                continue;
            }
            let permission = json!({"action": action, "role_id": role_id});
            match self.store.create("permissions", &permission).await {
                Ok(_) => report.record(identity, Outcome::Created, None),
                Err(e) if e.is_unique_violation() => {
                    report.record(identity, Outcome::Skipped, None)
                }
                Err(e) => report.record(identity, Outcome::Failed, Some(e.to_string())),
            }
        }
        Ok(())
    }

    /// Best-effort: seeds one record set in manifest order. A failing record
    /// is reported and skipped; the rest of the set and the remaining sets
    /// are still processed.
    pub async fn seed_record_set(&self, set: &RecordSet, report: &mut SeedRunReport) {
        info!(collection = %set.collection, count = set.records.len(), "seeding record set");
        for record in &set.records {
            let identity = format!("{}/{}", set.collection, record.name);
            match self.seed_record(&set.collection, record).await {
                Ok(outcome) => report.record(identity, outcome, None),
                Err(e) => report.record(identity, Outcome::Failed, Some(e.to_string())),
            }
        }
    }

    /// First write wins: an existing record is never updated, even when the
    /// manifest's attributes differ from what is stored.
    async fn seed_record(
        &self,
        collection: &str,
        record: &LookupRecord,
    ) -> Result<Outcome, RecordSeedError> {
        let name = json!(record.name);
        let existing = self.store.find_many(collection, "name", &name).await?;
        if !existing.is_empty() {
            return Ok(Outcome::Skipped);
        }
        match self.store.create(collection, &record.to_value()).await {
            Ok(_) => Ok(Outcome::Created),
            Err(e) if e.is_unique_violation() => Ok(Outcome::Skipped),
            Err(e) => Err(RecordSeedError::from(e)),
        }
    }
}

/// Health probe: connectivity plus the admin-account count, used by the
/// `health` command.
pub async fn health_check<S: Store>(store: &S) -> Result<i64, crate::store::StoreError> {
    store.ping().await?;
    store.count("admin_users").await
}
