// ── API-to-domain conversions ──
//
// Maps the raw PAN-OS strings carried by `pylo_api` types onto the
// domain enums in `model`.

use pylo_api::{HaStatus, JobInfo};

use crate::model::{HaPairState, Job, JobStatus, MemberState, SyncState};

// ── Job ─────────────────────────────────────────────────────────────

/// `PEND` → pending, `ACT` → running, `FIN` + `OK` → succeeded,
/// `FIN` + anything else → failed.
fn job_status(status: &str, result: Option<&str>) -> JobStatus {
    match status.trim().to_ascii_uppercase().as_str() {
        "FIN" => match result.map(|r| r.trim().to_ascii_uppercase()) {
            Some(r) if r == "OK" => JobStatus::Succeeded,
            _ => JobStatus::Failed,
        },
        "ACT" => JobStatus::Running,
        _ => JobStatus::Pending,
    }
}

impl From<JobInfo> for Job {
    fn from(info: JobInfo) -> Self {
        let status = job_status(&info.status, info.result.as_deref());
        let progress = match status {
            JobStatus::Succeeded => 100,
            _ => info.progress.unwrap_or(0).min(100),
        };
        Self {
            id: info.id,
            status,
            progress,
            details: info.details,
        }
    }
}

// ── HA ──────────────────────────────────────────────────────────────

impl From<HaStatus> for HaPairState {
    fn from(status: HaStatus) -> Self {
        Self {
            enabled: status.enabled,
            local: MemberState::parse(status.local_state.as_deref()),
            peer: MemberState::parse(status.peer_state.as_deref()),
            sync: SyncState::parse(status.running_sync.as_deref()),
        }
    }
}
