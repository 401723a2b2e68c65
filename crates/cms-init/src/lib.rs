//! Idempotent initialization and seeding for the hostel CMS backing store.
//!
//! The seeder applies a fixed declarative manifest (admin account, default
//! role access, baseline lookup records) to a persistent store, creating
//! each entry at most once across arbitrarily many invocations, including
//! concurrent ones.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use cms_init::prelude::*;
//!
//! let store = PgStore::connect_lazy(&config.database_url, config.max_connections)?;
//! let seeder = Seeder::new(store);
//! let report = seeder.run(&Manifest::baseline(config.admin.clone())).await;
//! ```

pub mod config;
pub mod errors;
pub mod manifest;
pub mod password;
pub mod report;
pub mod seeder;
pub mod signals;
pub mod store;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::config::Config;
    pub use crate::manifest::{AccessPolicy, AdminDescriptor, LookupRecord, Manifest, RecordSet};
    pub use crate::report::{Outcome, SeedRunReport};
    pub use crate::seeder::{RunState, Seeder};
    pub use crate::store::{MemoryStore, PgStore, Store};
}
