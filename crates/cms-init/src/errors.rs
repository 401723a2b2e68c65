//! Error taxonomy for the seeding run.
//!
//! Fatal errors ([`SeedError`], [`AdminError`]) abort the run; recoverable
//! ones ([`PermissionError`], [`RecordSeedError`]) are captured into the run
//! report as per-entry detail and never propagate.

use thiserror::Error;

use crate::store::StoreError;

/// A must-succeed step failed; the run moves to its aborted state and halts.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("store connectivity check failed: {0}")]
    Connectivity(#[source] StoreError),

    #[error("admin account setup failed: {0}")]
    Admin(#[from] AdminError),
}

/// Failure while ensuring the baseline admin account exists.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("database error: {0}")]
    Store(#[from] StoreError),
}

/// Recoverable failure while configuring default role permissions.
#[derive(Debug, Error)]
pub enum PermissionError {
    #[error("database error: {0}")]
    Store(#[from] StoreError),

    #[error("role record for {0} has no id")]
    MalformedRole(String),
}

/// A single lookup record failed to insert; scoped to that record only.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct RecordSeedError(#[from] StoreError);
