// ── Domain model ──
//
// Canonical types for the two firewalls, their HA view of each other and
// the asynchronous jobs they run. Raw PAN-OS strings from `pylo-api` are
// mapped onto these in `convert`.

pub mod device;
pub mod ha;
pub mod job;

pub use device::{Device, Role};
pub use ha::{HaPairState, HaPhase, MemberState, SyncState};
pub use job::{Job, JobStatus};
