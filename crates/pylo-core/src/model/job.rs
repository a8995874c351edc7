use pylo_api::JobId;
use strum::Display;

/// Lifecycle of a device job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Snapshot of a commit (or other) job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    /// 0..=100. Unknown progress is reported as 0 while the job runs.
    pub progress: u8,
    pub details: Vec<String>,
}

impl Job {
    /// Detail lines joined for error messages.
    pub fn summary(&self) -> String {
        if self.details.is_empty() {
            format!("job {} {}", self.id, self.status)
        } else {
            self.details.join("; ")
        }
    }
}
