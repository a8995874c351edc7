// ── Run settings ──
//
// These types describe *how* a run behaves: credentials, poll timing and
// HA parameters. They never touch disk; `pylo-config` builds them from
// files and hands them in.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::CoreError;

/// Login details for one firewall.
#[derive(Debug, Clone)]
pub struct DeviceCredentials {
    /// Hostname or IP, optionally with `:port` or a scheme.
    pub host: String,
    pub username: String,
    pub password: SecretString,
}

// ── Polling ─────────────────────────────────────────────────────────

/// Interval and overall budget for a bounded wait loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollSettings {
    /// Build poll settings, rejecting a zero interval.
    pub fn new(interval: Duration, timeout: Duration) -> Result<Self, CoreError> {
        let settings = Self { interval, timeout };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.interval.is_zero() {
            return Err(CoreError::Config {
                message: "poll interval must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            timeout: Duration::from_secs(600),
        }
    }
}

/// Attempt-bounded wait used for HA state checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    pub interval: Duration,
    pub attempts: u32,
}

impl SyncSettings {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.interval.is_zero() || self.attempts == 0 {
            return Err(CoreError::Config {
                message: "sync checks need a non-zero interval and at least one attempt".into(),
            });
        }
        Ok(())
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            attempts: 8,
        }
    }
}

// ── HA ──────────────────────────────────────────────────────────────

/// HA group parameters for one member of the pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaPeerSettings {
    pub device_priority: u16,
    pub preemptive: bool,
    /// HA1 address of the *other* device.
    pub peer_ip: String,
    /// This device's own HA1 address.
    pub ha1_ip: String,
}

impl HaPeerSettings {
    /// Two-node lab defaults: primary first, secondary second.
    pub fn lab_defaults() -> [Self; 2] {
        [
            Self {
                device_priority: 100,
                preemptive: true,
                peer_ip: "1.1.1.2".into(),
                ha1_ip: "1.1.1.1".into(),
            },
            Self {
                device_priority: 110,
                preemptive: false,
                peer_ip: "1.1.1.1".into(),
                ha1_ip: "1.1.1.2".into(),
            },
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaSettings {
    /// Data-plane ports switched to type `ha`.
    pub interfaces: Vec<String>,
    /// Primary, secondary.
    pub peers: [HaPeerSettings; 2],
}

impl Default for HaSettings {
    fn default() -> Self {
        Self {
            interfaces: vec!["ethernet1/4".into(), "ethernet1/5".into()],
            peers: HaPeerSettings::lab_defaults(),
        }
    }
}

// ── Layout ──────────────────────────────────────────────────────────

/// Names baked into configuration xpaths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub vsys: String,
    pub virtual_router: String,
    pub static_route: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            vsys: "vsys1".into(),
            virtual_router: "default".into(),
            static_route: "default_route".into(),
        }
    }
}

// ── RunSettings ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSettings {
    /// Commit job polling.
    pub commit: PollSettings,
    /// HA pairing and running-config sync checks.
    pub sync: SyncSettings,
    pub ha: HaSettings,
    pub layout: Layout,
}

impl RunSettings {
    pub fn validate(&self) -> Result<(), CoreError> {
        self.commit.validate()?;
        self.sync.validate()?;
        if self.ha.interfaces.is_empty() {
            return Err(CoreError::Config {
                message: "at least one HA interface is required".into(),
            });
        }
        Ok(())
    }
}
