// pylo-core: HA pairing and configuration workflow for a Palo Alto firewall pair.

pub mod api;
pub mod config;
pub mod convert;
pub mod deploy;
pub mod error;
pub mod ha;
pub mod job;
pub mod model;
pub mod progress;
pub mod report;
pub mod run;
pub mod step;
pub mod template;

#[cfg(test)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use api::FirewallApi;
pub use config::{
    DeviceCredentials, HaPeerSettings, HaSettings, Layout, PollSettings, RunSettings,
    SyncSettings,
};
pub use deploy::{ActivePeer, ConfigOrchestrator, identify_active};
pub use error::CoreError;
pub use ha::HaOrchestrator;
pub use job::{commit_and_wait, wait_for_completion};
pub use model::{Device, HaPairState, HaPhase, Job, JobStatus, MemberState, Role, SyncState};
pub use progress::{NoProgress, Progress, Stage};
pub use report::{RunReport, StepOutcome, StepRecord};
pub use run::{RunContext, RunFailure, run};
pub use step::{ConfigurationStep, StepKind};
pub use template::{Template, TemplateError, TemplateKind, TemplateParams, TemplateSet};
