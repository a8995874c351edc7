// ── Configuration orchestrator ──
//
// Phase 2 of the bring-up. The active firewall is identified first; only
// an `ActivePeer` handle lets the orchestrator be built. The ordered
// configuration steps are pushed to that device, committed, and the
// running config is synchronized to the passive peer.
//
// A failure stops the sequence. Steps already applied stay in the
// candidate configuration; nothing is rolled back.

use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::api::FirewallApi;
use crate::config::RunSettings;
use crate::error::CoreError;
use crate::job::commit_and_wait;
use crate::model::{Device, HaPairState, MemberState, SyncState};
use crate::progress::{Progress, Stage};
use crate::report::{RunReport, StepOutcome};
use crate::step::{self, ConfigurationStep};
use crate::template::{TemplateParams, TemplateSet};

// ── Active peer ─────────────────────────────────────────────────────

/// A device that reported HA state `active`.
///
/// Only [`identify_active`] creates one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivePeer {
    index: usize,
    host: String,
}

impl ActivePeer {
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Position of the device in the run's device list.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Query HA state on each device in order and pick the active one.
pub async fn identify_active<A: FirewallApi>(
    devices: &mut [Device<A>],
    progress: &dyn Progress,
) -> Result<ActivePeer, CoreError> {
    let stage = Stage::IdentifyActive;
    progress.stage_started(stage, u64::try_from(devices.len()).unwrap_or(u64::MAX));

    for (index, device) in devices.iter_mut().enumerate() {
        let host = device.host();
        let state = match device.api.ha_state().await {
            Ok(status) => HaPairState::from(status),
            Err(e) => {
                let err = CoreError::from_api(&host, "identify active firewall", e);
                progress.stage_failed(stage, &err.to_string());
                return Err(err);
            }
        };
        debug!(host = %host, local = %state.local, peer = %state.peer, "HA state");
        let is_active = state.local == MemberState::Active;
        device.ha = Some(state);
        progress.stage_advanced(stage, &host);

        if is_active {
            info!(host = %host, role = %device.role, "active firewall identified");
            progress.stage_finished(stage);
            return Ok(ActivePeer { index, host });
        }
    }

    let hosts = devices
        .iter()
        .map(|d| {
            let state = d.ha.as_ref().map_or_else(|| "unknown".to_string(), |s| s.local.to_string());
            format!("{} ({state})", d.host())
        })
        .collect::<Vec<_>>()
        .join(", ");
    let err = CoreError::NoActivePeer { hosts };
    progress.stage_failed(stage, &err.to_string());
    Err(err)
}

// ── ConfigOrchestrator ──────────────────────────────────────────────

pub struct ConfigOrchestrator<'a, A> {
    device: &'a Device<A>,
    active: ActivePeer,
    templates: &'a TemplateSet,
    params: &'a TemplateParams,
    settings: &'a RunSettings,
    progress: &'a dyn Progress,
}

impl<'a, A: FirewallApi> ConfigOrchestrator<'a, A> {
    pub fn new(
        devices: &'a [Device<A>],
        active: ActivePeer,
        templates: &'a TemplateSet,
        params: &'a TemplateParams,
        settings: &'a RunSettings,
        progress: &'a dyn Progress,
    ) -> Result<Self, CoreError> {
        let device = devices
            .get(active.index)
            .ok_or_else(|| CoreError::NoActivePeer {
                hosts: active.host.clone(),
            })?;
        Ok(Self {
            device,
            active,
            templates,
            params,
            settings,
            progress,
        })
    }

    /// Push, commit and sync. Returns the active peer's final HA view.
    pub async fn run(&self, report: &mut RunReport) -> Result<HaPairState, CoreError> {
        report.active_host = Some(self.active.host.clone());
        self.push_steps(report).await?;
        self.commit(report).await?;
        let state = self.sync_peer(report).await?;
        report.final_ha = Some(state.clone());
        Ok(state)
    }

    /// Apply every configuration step in order, stopping at the first failure.
    pub async fn push_steps(&self, report: &mut RunReport) -> Result<(), CoreError> {
        let host = self.active.host();
        let steps = step::plan(&self.settings.layout);
        let mut applied = 0usize;

        for step in &steps {
            let stage = Stage::Configure(step.kind);
            self.progress.stage_started(stage, 1);

            let started = Instant::now();
            let result = self.apply(step).await;
            report.record(step.name(), host, started, &result);

            if let Err(e) = result {
                self.progress.stage_failed(stage, &e.to_string());
                if applied > 0 {
                    warn!(
                        host,
                        failed = %step.kind,
                        applied,
                        "candidate configuration keeps the steps applied so far"
                    );
                }
                return Err(e);
            }
            applied += 1;
            self.progress.stage_advanced(stage, host);
            self.progress.stage_finished(stage);
        }
        Ok(())
    }

    async fn apply(&self, step: &ConfigurationStep) -> Result<(), CoreError> {
        let host = self.active.host();
        let element = self.templates.render(step.template, self.params)?;
        debug!(host, step = %step.kind, xpath = %step.xpath, bytes = element.len(), "applying step");

        self.device
            .api
            .set_config(&step.xpath, &element)
            .await
            .map_err(|e| CoreError::from_api(host, &step.name(), e))?;
        info!(host, step = %step.kind, "step applied");
        Ok(())
    }

    async fn commit(&self, report: &mut RunReport) -> Result<(), CoreError> {
        let stage = Stage::CommitActive;
        let host = self.active.host();
        self.progress.stage_started(stage, 1);

        let started = Instant::now();
        let result = commit_and_wait(&self.device.api, &self.settings.commit, self.progress).await;
        match &result {
            Ok(None) => report.push("commit", host, StepOutcome::Skipped("no changes".into()), started),
            _ => report.record("commit", host, started, &result),
        }
        if let Err(e) = result {
            self.progress.stage_failed(stage, &e.to_string());
            return Err(e);
        }
        self.progress.stage_advanced(stage, host);
        self.progress.stage_finished(stage);
        Ok(())
    }

    // ── HA config sync ───────────────────────────────────────────────

    async fn sync_peer(&self, report: &mut RunReport) -> Result<HaPairState, CoreError> {
        let stage = Stage::SyncPeer;
        let host = self.active.host();
        self.progress.stage_started(stage, 1);

        let started = Instant::now();
        let result = self.ensure_synced().await;
        report.record("HA config sync", host, started, &result);
        match result {
            Ok(state) => {
                self.progress.stage_advanced(stage, host);
                self.progress.stage_finished(stage);
                Ok(state)
            }
            Err(e) => {
                self.progress.stage_failed(stage, &e.to_string());
                Err(e)
            }
        }
    }

    async fn ensure_synced(&self) -> Result<HaPairState, CoreError> {
        let host = self.active.host();
        let state = self.ha_state().await?;
        info!(host, running_sync = %state.sync, "running-config sync state");

        match state.sync {
            SyncState::Synchronized => return Ok(state),
            SyncState::InProgress => {}
            _ => {
                self.device
                    .api
                    .sync_to_remote()
                    .await
                    .map_err(|e| CoreError::from_api(host, "HA config sync", e))?;
                info!(host, "sync-to-remote requested");
            }
        }
        self.wait_for_sync().await
    }

    /// Sleep, then check; bounded by the sync attempts.
    async fn wait_for_sync(&self) -> Result<HaPairState, CoreError> {
        let host = self.active.host();
        let sync = self.settings.sync;
        let started = Instant::now();
        let mut last = None;

        for attempt in 1..=sync.attempts {
            sleep(sync.interval).await;
            let state = match self.device.api.ha_state().await {
                Ok(status) => HaPairState::from(status),
                Err(e) if e.is_transient() => {
                    warn!(host, attempt, error = %e, "sync check failed, retrying");
                    continue;
                }
                Err(e) => return Err(CoreError::from_api(host, "HA config sync", e)),
            };
            self.progress
                .sync_check(attempt, sync.attempts, &state.sync.to_string());
            info!(host, attempt, max = sync.attempts, state = %state.sync, "sync check");
            if state.sync == SyncState::Synchronized {
                return Ok(state);
            }
            last = Some(state);
        }

        warn!(host, last = ?last.as_ref().map(|s| s.sync.to_string()), "running-config sync did not finish");
        Err(CoreError::JobTimeout {
            host: host.to_string(),
            operation: "running-config sync".into(),
            last_progress: None,
            waited: started.elapsed(),
        })
    }

    async fn ha_state(&self) -> Result<HaPairState, CoreError> {
        let host = self.active.host();
        self.device
            .api
            .ha_state()
            .await
            .map(HaPairState::from)
            .map_err(|e| CoreError::from_api(host, "HA config sync", e))
    }
}
