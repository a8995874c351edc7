// ── Progress reporting ──
//
// The workflow announces stages and job progress through this trait; the
// CLI renders them as progress bars. Every method has a no-op default.

use std::fmt;

use pylo_api::JobId;

use crate::step::StepKind;

/// A visible stage of the bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Authenticate,
    EnableHaInterfaces,
    CommitHaInterfaces,
    ConfigureHa,
    CommitHa,
    AwaitHaSync,
    IdentifyActive,
    Configure(StepKind),
    CommitActive,
    SyncPeer,
}

impl Stage {
    /// All stages in execution order.
    pub fn all() -> Vec<Self> {
        let mut stages = vec![
            Self::Authenticate,
            Self::EnableHaInterfaces,
            Self::CommitHaInterfaces,
            Self::ConfigureHa,
            Self::CommitHa,
            Self::AwaitHaSync,
            Self::IdentifyActive,
        ];
        stages.extend(StepKind::ORDER.iter().copied().map(Self::Configure));
        stages.extend([Self::CommitActive, Self::SyncPeer]);
        stages
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authenticate => f.write_str("Generating API keys"),
            Self::EnableHaInterfaces => f.write_str("Enabling HA interfaces"),
            Self::CommitHaInterfaces => f.write_str("Committing HA interfaces"),
            Self::ConfigureHa => f.write_str("Configuring HA"),
            Self::CommitHa => f.write_str("Committing HA configuration"),
            Self::AwaitHaSync => f.write_str("Waiting for HA pairing"),
            Self::IdentifyActive => f.write_str("Identifying active firewall"),
            Self::Configure(step) => write!(f, "Configuring {}", step.label()),
            Self::CommitActive => f.write_str("Committing on active firewall"),
            Self::SyncPeer => f.write_str("Syncing running config"),
        }
    }
}

/// Sink for workflow progress.
pub trait Progress {
    /// A stage begins; `total` is the number of units it will advance.
    fn stage_started(&self, _stage: Stage, _total: u64) {}

    /// One unit of a stage completed (usually one device).
    fn stage_advanced(&self, _stage: Stage, _host: &str) {}

    fn stage_finished(&self, _stage: Stage) {}

    fn stage_failed(&self, _stage: Stage, _error: &str) {}

    /// A job poll returned.
    fn job_progress(&self, _host: &str, _job: JobId, _percent: u8) {}

    /// An HA state check returned.
    fn sync_check(&self, _attempt: u32, _max_attempts: u32, _state: &str) {}
}

/// Progress sink that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}
