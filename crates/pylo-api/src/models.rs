// PAN-OS response payloads
//
// Wire-level shapes of the `<result>` bodies this crate reads, plus the
// flattened public types handed to callers. Raw PAN-OS strings are kept
// as-is; `pylo-core` maps them onto its domain enums.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

// ── Public types ────────────────────────────────────────────────────

/// Identifier of an asynchronous device job (commit, sync, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// What the device said when asked to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A commit job was enqueued.
    Enqueued(JobId),
    /// The candidate configuration had no changes.
    NothingToCommit,
}

/// Snapshot of a job as reported by `show jobs id <n>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInfo {
    pub id: JobId,
    /// Job type, e.g. `Commit`.
    pub kind: Option<String>,
    /// `PEND`, `ACT` or `FIN`.
    pub status: String,
    /// `PEND`, `OK` or `FAIL`.
    pub result: Option<String>,
    /// Percentage while running. Finished jobs often report a timestamp
    /// here instead, which parses to `None`.
    pub progress: Option<u8>,
    /// Detail lines (warnings, validation errors).
    pub details: Vec<String>,
}

/// HA state as reported by `show high-availability state`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HaStatus {
    pub enabled: bool,
    pub mode: Option<String>,
    /// This device's state: `active`, `passive`, `initial`, `non-functional`, ...
    pub local_state: Option<String>,
    /// What this device believes its peer's state is.
    pub peer_state: Option<String>,
    /// HA1 link state towards the peer (`up` / `down`).
    pub peer_connection: Option<String>,
    /// `synchronized`, `synchronization in progress`, `not synchronized`, ...
    pub running_sync: Option<String>,
}

// ── Wire shapes ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct KeygenResult {
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitResult {
    #[serde(default)]
    pub job: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobsResult {
    pub job: RawJob,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawJob {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub status: String,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub progress: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HaStateResult {
    #[serde(default)]
    pub enabled: Option<String>,
    #[serde(default)]
    pub group: Option<HaGroup>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HaGroup {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(rename = "local-info", default)]
    pub local_info: Option<HaMemberInfo>,
    #[serde(rename = "peer-info", default)]
    pub peer_info: Option<HaMemberInfo>,
    #[serde(rename = "running-sync", default)]
    pub running_sync: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HaMemberInfo {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(rename = "conn-status", default)]
    pub conn_status: Option<String>,
}

impl From<HaStateResult> for HaStatus {
    fn from(raw: HaStateResult) -> Self {
        let group = raw.group;
        let (mode, local, peer, running_sync) = match group {
            Some(g) => (g.mode, g.local_info, g.peer_info, g.running_sync),
            None => (None, None, None, None),
        };
        let peer_connection = peer.as_ref().and_then(|p| p.conn_status.clone());
        Self {
            enabled: raw.enabled.as_deref() == Some("yes"),
            mode,
            local_state: local.and_then(|l| l.state),
            peer_state: peer.and_then(|p| p.state),
            peer_connection,
            running_sync,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::xml::parse_result;

    #[test]
    fn ha_state_from_active_member() {
        let body = r"<response status='success'><result>
            <enabled>yes</enabled>
            <group>
              <mode>Active-Passive</mode>
              <local-info><version>1</version><state>active</state><priority>100</priority></local-info>
              <peer-info><conn-ha1><conn-status>up</conn-status></conn-ha1><state>passive</state><conn-status>up</conn-status></peer-info>
              <running-sync>synchronized</running-sync>
              <running-sync-enabled>yes</running-sync-enabled>
            </group>
          </result></response>";
        let raw: HaStateResult = parse_result(body).unwrap().unwrap();
        let status = HaStatus::from(raw);
        assert!(status.enabled);
        assert_eq!(status.mode.as_deref(), Some("Active-Passive"));
        assert_eq!(status.local_state.as_deref(), Some("active"));
        assert_eq!(status.peer_state.as_deref(), Some("passive"));
        assert_eq!(status.peer_connection.as_deref(), Some("up"));
        assert_eq!(status.running_sync.as_deref(), Some("synchronized"));
    }

    #[test]
    fn ha_disabled_has_no_group() {
        let body = "<response status='success'><result><enabled>no</enabled></result></response>";
        let raw: HaStateResult = parse_result(body).unwrap().unwrap();
        let status = HaStatus::from(raw);
        assert!(!status.enabled);
        assert_eq!(status.local_state, None);
        assert_eq!(status.running_sync, None);
    }

    #[test]
    fn job_id_parses_with_whitespace() {
        assert_eq!(" 42 ".parse::<JobId>().unwrap(), JobId(42));
        assert!("abc".parse::<JobId>().is_err());
    }
}
