// ── HA orchestrator ──
//
// Phase 1 of the bring-up: switch the HA ports, enable HA with per-device
// group parameters, commit both devices, then wait until both report a
// formed and synchronized pair.
//
//   Unconfigured → InterfacesEnabled → Paired → Syncing → InSync
//                                                   ↘ Failed

use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::api::FirewallApi;
use crate::config::{HaPeerSettings, RunSettings};
use crate::error::CoreError;
use crate::job::commit_and_wait;
use crate::model::{Device, HaPairState, HaPhase};
use crate::progress::{Progress, Stage};
use crate::report::{RunReport, StepOutcome};
use crate::step::xpath;
use crate::template::{TemplateKind, TemplateParams, TemplateSet};

const HA_ENABLED: &str = "<enabled>yes</enabled>";
const HA_PORT: &str = "<ha/>";

/// Template parameters for one member's HA group and HA1 interface.
pub fn peer_params(peer: &HaPeerSettings) -> TemplateParams {
    TemplateParams::new()
        .with("device_priority", peer.device_priority.to_string())
        .with("preemptive", if peer.preemptive { "yes" } else { "no" })
        .with("peer_ip", peer.peer_ip.as_str())
        .with("ha1_ip", peer.ha1_ip.as_str())
}

/// Rendered HA group and HA1 interface elements for one member.
struct HaPayload {
    group: String,
    ha1: String,
}

pub struct HaOrchestrator<'a, A> {
    devices: &'a mut [Device<A>],
    templates: &'a TemplateSet,
    params: &'a TemplateParams,
    settings: &'a RunSettings,
    progress: &'a dyn Progress,
    phase: HaPhase,
}

impl<'a, A: FirewallApi> HaOrchestrator<'a, A> {
    pub fn new(
        devices: &'a mut [Device<A>],
        templates: &'a TemplateSet,
        params: &'a TemplateParams,
        settings: &'a RunSettings,
        progress: &'a dyn Progress,
    ) -> Self {
        Self {
            devices,
            templates,
            params,
            settings,
            progress,
            phase: HaPhase::Unconfigured,
        }
    }

    pub fn phase(&self) -> HaPhase {
        self.phase
    }

    /// Drive the state machine to `InSync`, or to `Failed` on the first error.
    pub async fn run(&mut self, report: &mut RunReport) -> Result<(), CoreError> {
        let result = self.drive(report).await;
        if result.is_err() {
            self.transition(HaPhase::Failed);
        }
        report.ha_phase = self.phase;
        result
    }

    async fn drive(&mut self, report: &mut RunReport) -> Result<(), CoreError> {
        let payloads = self.render_payloads(report)?;

        self.enable_interfaces(report).await?;
        self.commit_all(Stage::CommitHaInterfaces, report).await?;
        self.transition(HaPhase::InterfacesEnabled);

        self.configure_ha(&payloads, report).await?;
        self.commit_all(Stage::CommitHa, report).await?;
        self.transition(HaPhase::Paired);

        self.transition(HaPhase::Syncing);
        self.await_in_sync(report).await?;
        self.transition(HaPhase::InSync);
        Ok(())
    }

    fn transition(&mut self, next: HaPhase) {
        if self.phase != next {
            info!(from = %self.phase, to = %next, "HA phase");
            self.phase = next;
        }
    }

    fn stage_total(&self) -> u64 {
        u64::try_from(self.devices.len()).unwrap_or(u64::MAX)
    }

    fn fail_stage<T>(&self, stage: Stage, result: Result<T, CoreError>) -> Result<T, CoreError> {
        if let Err(e) = &result {
            self.progress.stage_failed(stage, &e.to_string());
        }
        result
    }

    /// Render both members' HA elements. Runs before any device is touched.
    fn render_payloads(&self, report: &mut RunReport) -> Result<Vec<HaPayload>, CoreError> {
        let mut payloads = Vec::with_capacity(self.devices.len());
        for device in self.devices.iter() {
            let started = Instant::now();
            let peer = &self.settings.ha.peers[device.role.index()];
            let params = self.params.overlay(&peer_params(peer));
            let result = self.templates.render(TemplateKind::HaConfig, &params).and_then(|group| {
                let ha1 = self.templates.render(TemplateKind::HaInterface, &params)?;
                Ok(HaPayload { group, ha1 })
            });
            let result = result.map_err(CoreError::from);
            if result.is_err() {
                report.record("render HA templates", &device.host(), started, &result);
            }
            payloads.push(self.fail_stage(Stage::ConfigureHa, result)?);
        }
        Ok(payloads)
    }

    // ── InterfacesEnabled ────────────────────────────────────────────

    async fn enable_interfaces(&self, report: &mut RunReport) -> Result<(), CoreError> {
        let stage = Stage::EnableHaInterfaces;
        self.progress.stage_started(stage, self.stage_total());

        for device in self.devices.iter() {
            let host = device.host();
            let started = Instant::now();
            let result = self.enable_interfaces_on(device, &host).await;
            report.record("enable HA interfaces", &host, started, &result);
            self.fail_stage(stage, result)?;
            self.progress.stage_advanced(stage, &host);
        }
        self.progress.stage_finished(stage);
        Ok(())
    }

    async fn enable_interfaces_on(&self, device: &Device<A>, host: &str) -> Result<(), CoreError> {
        for iface in &self.settings.ha.interfaces {
            device
                .api
                .set_config(&xpath::ethernet_entry(iface), HA_PORT)
                .await
                .map_err(|e| CoreError::from_api(host, "enable HA interfaces", e))?;
            debug!(host, interface = %iface, "interface set to HA");
        }
        Ok(())
    }

    // ── Paired ───────────────────────────────────────────────────────

    async fn configure_ha(
        &self,
        payloads: &[HaPayload],
        report: &mut RunReport,
    ) -> Result<(), CoreError> {
        let stage = Stage::ConfigureHa;
        self.progress.stage_started(stage, self.stage_total());

        for (device, payload) in self.devices.iter().zip(payloads) {
            let host = device.host();
            let started = Instant::now();
            let result = self.configure_ha_on(device, &host, payload).await;
            report.record("configure HA", &host, started, &result);
            self.fail_stage(stage, result)?;
            self.progress.stage_advanced(stage, &host);
        }
        self.progress.stage_finished(stage);
        Ok(())
    }

    async fn configure_ha_on(
        &self,
        device: &Device<A>,
        host: &str,
        payload: &HaPayload,
    ) -> Result<(), CoreError> {
        let peer = &self.settings.ha.peers[device.role.index()];

        device
            .api
            .set_config(&xpath::high_availability(), HA_ENABLED)
            .await
            .map_err(|e| CoreError::from_api(host, "enable HA", e))?;

        device
            .api
            .set_config(&xpath::ha_group(), &payload.group)
            .await
            .map_err(|e| CoreError::from_api(host, "HA group", e))?;

        device
            .api
            .set_config(&xpath::ha_interface(), &payload.ha1)
            .await
            .map_err(|e| CoreError::from_api(host, "HA interface", e))?;

        info!(
            host,
            role = %device.role,
            priority = peer.device_priority,
            preemptive = peer.preemptive,
            "HA configured"
        );
        Ok(())
    }

    // ── Commits ──────────────────────────────────────────────────────

    /// Commit each device in turn, waiting for each job before the next.
    async fn commit_all(&self, stage: Stage, report: &mut RunReport) -> Result<(), CoreError> {
        self.progress.stage_started(stage, self.stage_total());

        for device in self.devices.iter() {
            let host = device.host();
            let started = Instant::now();
            let result = commit_and_wait(&device.api, &self.settings.commit, self.progress).await;
            match &result {
                Ok(None) => report.push(
                    "commit",
                    &host,
                    StepOutcome::Skipped("no changes".into()),
                    started,
                ),
                _ => report.record("commit", &host, started, &result),
            }
            self.fail_stage(stage, result)?;
            self.progress.stage_advanced(stage, &host);
        }
        self.progress.stage_finished(stage);
        Ok(())
    }

    // ── Syncing → InSync ─────────────────────────────────────────────

    async fn await_in_sync(&mut self, report: &mut RunReport) -> Result<(), CoreError> {
        let stage = Stage::AwaitHaSync;
        let sync = self.settings.sync;
        self.progress.stage_started(stage, u64::from(sync.attempts));

        let hosts: Vec<String> = self.devices.iter().map(Device::host).collect();
        let host_list = hosts.join(", ");
        let started = Instant::now();

        for attempt in 1..=sync.attempts {
            let mut views = Vec::with_capacity(self.devices.len());
            for device in self.devices.iter_mut() {
                match device.api.ha_state().await {
                    Ok(status) => {
                        let view = HaPairState::from(status);
                        device.ha = Some(view.clone());
                        views.push(view);
                    }
                    Err(e) if e.is_transient() => {
                        warn!(host = %device.host(), error = %e, "HA state check failed, retrying");
                    }
                    Err(e) => {
                        let result: Result<(), CoreError> =
                            Err(CoreError::from_api(&device.host(), "HA sync check", e));
                        report.record("HA sync", &host_list, started, &result);
                        return self.fail_stage(stage, result);
                    }
                }
            }

            let summary = describe(&hosts, &views);
            self.progress.sync_check(attempt, sync.attempts, &summary);
            info!(attempt, max = sync.attempts, state = %summary, "HA sync check");

            let in_sync = matches!(views.as_slice(), [a, b] if HaPairState::pair_in_sync(a, b));
            if in_sync {
                report.push("HA sync", &host_list, StepOutcome::Succeeded, started);
                self.progress.stage_finished(stage);
                return Ok(());
            }
            if attempt < sync.attempts {
                sleep(sync.interval).await;
            }
        }

        let err = CoreError::JobTimeout {
            host: host_list.clone(),
            operation: "HA pairing".into(),
            last_progress: None,
            waited: started.elapsed(),
        };
        report.push("HA sync", &host_list, StepOutcome::Failed(err.to_string()), started);
        self.fail_stage(stage, Err(err))
    }
}

fn describe(hosts: &[String], views: &[HaPairState]) -> String {
    if views.len() != hosts.len() {
        return "state unavailable".into();
    }
    hosts
        .iter()
        .zip(views)
        .map(|(host, v)| format!("{host}: {}/{}", v.local, v.sync))
        .collect::<Vec<_>>()
        .join(", ")
}
