use std::fmt;

use strum::Display;

/// HA member state as reported by `show high-availability state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberState {
    Active,
    Passive,
    Initial,
    NonFunctional,
    Suspended,
    Tentative,
    /// HA disabled or the field was missing.
    Unknown,
    Other(String),
}

impl MemberState {
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::Unknown;
        };
        match raw.to_ascii_lowercase().as_str() {
            "active" => Self::Active,
            "passive" => Self::Passive,
            "initial" => Self::Initial,
            "non-functional" => Self::NonFunctional,
            "suspended" => Self::Suspended,
            "tentative" => Self::Tentative,
            "unknown" => Self::Unknown,
            _ => Self::Other(raw.to_string()),
        }
    }
}

/// Running-configuration sync status between the peers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    Synchronized,
    InProgress,
    NotSynchronized,
    Unknown,
    Other(String),
}

impl SyncState {
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::Unknown;
        };
        let lower = raw.to_ascii_lowercase();
        match lower.as_str() {
            "synchronized" => Self::Synchronized,
            "not synchronized" | "not-synchronized" => Self::NotSynchronized,
            "unknown" => Self::Unknown,
            s if s.contains("in progress") || s == "syncing" => Self::InProgress,
            _ => Self::Other(raw.to_string()),
        }
    }
}

impl fmt::Display for MemberState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Active => "active",
            Self::Passive => "passive",
            Self::Initial => "initial",
            Self::NonFunctional => "non-functional",
            Self::Suspended => "suspended",
            Self::Tentative => "tentative",
            Self::Unknown => "unknown",
            Self::Other(raw) => raw,
        })
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Synchronized => "synchronized",
            Self::InProgress => "synchronization in progress",
            Self::NotSynchronized => "not synchronized",
            Self::Unknown => "unknown",
            Self::Other(raw) => raw,
        })
    }
}

/// One device's view of the HA pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaPairState {
    pub enabled: bool,
    pub local: MemberState,
    pub peer: MemberState,
    pub sync: SyncState,
}

impl HaPairState {
    /// Both views agree the pair is formed and config is synchronized.
    ///
    /// One side is active, the other passive, each side's view of its peer
    /// matches what the peer reports about itself, and both report
    /// `synchronized`.
    pub fn pair_in_sync(a: &Self, b: &Self) -> bool {
        let roles = matches!(
            (&a.local, &b.local),
            (MemberState::Active, MemberState::Passive) | (MemberState::Passive, MemberState::Active)
        );
        roles
            && a.peer == b.local
            && b.peer == a.local
            && a.sync == SyncState::Synchronized
            && b.sync == SyncState::Synchronized
    }
}

/// Progress of the HA pairing state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum HaPhase {
    Unconfigured,
    InterfacesEnabled,
    Paired,
    Syncing,
    InSync,
    Failed,
}
