// ── Run report ──
//
// Every executed step is recorded with its host, outcome and elapsed
// time so the CLI can print a summary even when the run fails.

use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

use crate::error::CoreError;
use crate::model::{HaPairState, HaPhase};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded,
    /// Nothing to do (e.g. no pending changes to commit).
    Skipped(String),
    Failed(String),
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub name: String,
    pub host: String,
    pub outcome: StepOutcome,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub steps: Vec<StepRecord>,
    pub ha_phase: HaPhase,
    /// Host selected for Phase 2, once identified.
    pub active_host: Option<String>,
    /// The active peer's last HA view.
    pub final_ha: Option<HaPairState>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            steps: Vec::new(),
            ha_phase: HaPhase::Unconfigured,
            active_host: None,
            final_ha: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn push(&mut self, name: impl Into<String>, host: &str, outcome: StepOutcome, started: Instant) {
        self.steps.push(StepRecord {
            name: name.into(),
            host: host.to_string(),
            outcome,
            elapsed: started.elapsed(),
        });
    }

    /// Record the outcome of a step that began at `started`.
    pub fn record<T>(
        &mut self,
        name: impl Into<String>,
        host: &str,
        started: Instant,
        result: &Result<T, CoreError>,
    ) {
        let outcome = match result {
            Ok(_) => StepOutcome::Succeeded,
            Err(e) => StepOutcome::Failed(e.to_string()),
        };
        self.push(name, host, outcome, started);
    }

    pub fn failed_step(&self) -> Option<&StepRecord> {
        self.steps.iter().find(|s| !s.outcome.is_success())
    }
}
