//! Per-invocation run report. Outcomes are logged as they are recorded, so
//! an operator watching the run sees each entry as it happens; the report
//! itself is transient and never persisted.

use time::OffsetDateTime;
use tracing::{info, warn};

use crate::seeder::RunState;

/// What happened to a single manifest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Skipped,
    Failed,
}

#[derive(Debug, Clone)]
pub struct ReportEntry {
    pub identity: String,
    pub outcome: Outcome,
    pub detail: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SeedRunReport {
    pub entries: Vec<ReportEntry>,
    state: RunState,
    pub started_at: OffsetDateTime,
    pub finished_at: Option<OffsetDateTime>,
}

impl SeedRunReport {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            state: RunState::NotStarted,
            started_at: OffsetDateTime::now_utc(),
            finished_at: None,
        }
    }

    /// Records one entry and logs it immediately.
    pub fn record(&mut self, identity: impl Into<String>, outcome: Outcome, detail: Option<String>) {
        let identity = identity.into();
        match (&outcome, &detail) {
            (Outcome::Created, _) => info!(entry = %identity, "created"),
            (Outcome::Skipped, _) => info!(entry = %identity, "skipped (already exists)"),
            (Outcome::Failed, Some(detail)) => warn!(entry = %identity, error = %detail, "failed"),
            (Outcome::Failed, None) => warn!(entry = %identity, "failed"),
        }
        self.entries.push(ReportEntry {
            identity,
            outcome,
            detail,
        });
    }

    /// Advances the run state; transitions are forward-only.
    pub(crate) fn advance(&mut self, state: RunState) {
        if state > self.state {
            self.state = state;
        }
    }

    pub(crate) fn complete(&mut self) {
        self.advance(RunState::Completed);
        self.finished_at = Some(OffsetDateTime::now_utc());
    }

    pub(crate) fn abort(&mut self) {
        self.advance(RunState::Aborted);
        self.finished_at = Some(OffsetDateTime::now_utc());
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn aborted(&self) -> bool {
        self.state == RunState::Aborted
    }

    pub fn created(&self) -> usize {
        self.count(Outcome::Created)
    }

    pub fn skipped(&self) -> usize {
        self.count(Outcome::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(Outcome::Failed)
    }

    fn count(&self, outcome: Outcome) -> usize {
        self.entries.iter().filter(|e| e.outcome == outcome).count()
    }
}

impl Default for SeedRunReport {
    fn default() -> Self {
        Self::new()
    }
}
