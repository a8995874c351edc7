// ── Run coordinator ──
//
// Owns the explicit run context and drives the whole bring-up:
// authenticate every device, Phase 1 (HA), Phase 2 (configuration).

use strum::IntoEnumIterator;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use crate::api::FirewallApi;
use crate::config::{DeviceCredentials, RunSettings};
use crate::deploy::{ConfigOrchestrator, identify_active};
use crate::error::CoreError;
use crate::ha::HaOrchestrator;
use crate::model::{Device, Role};
use crate::progress::{Progress, Stage};
use crate::report::RunReport;
use crate::template::{TemplateKind, TemplateParams, TemplateSet};

/// Everything a run needs. No global state.
pub struct RunContext<A> {
    pub run_id: Uuid,
    pub devices: Vec<Device<A>>,
    pub templates: TemplateSet,
    pub params: TemplateParams,
    pub settings: RunSettings,
}

impl<A: FirewallApi> RunContext<A> {
    /// Pair credentials with API clients and validate the inputs.
    ///
    /// Exactly two devices are required: the first is the primary, the
    /// second the secondary. Every template must be loaded.
    pub fn new(
        devices: Vec<(DeviceCredentials, A)>,
        templates: TemplateSet,
        params: TemplateParams,
        settings: RunSettings,
    ) -> Result<Self, CoreError> {
        if devices.len() != 2 {
            return Err(CoreError::Config {
                message: format!(
                    "exactly two firewalls are required, found {}",
                    devices.len()
                ),
            });
        }
        settings.validate()?;

        let missing: Vec<&str> = TemplateKind::iter()
            .filter(|k| !templates.contains(*k))
            .map(<&'static str>::from)
            .collect();
        if !missing.is_empty() {
            return Err(CoreError::Config {
                message: format!("missing template(s): {}", missing.join(", ")),
            });
        }

        let devices = devices
            .into_iter()
            .zip([Role::Primary, Role::Secondary])
            .map(|((credentials, api), role)| Device::new(role, credentials, api))
            .collect();

        Ok(Self {
            run_id: Uuid::new_v4(),
            devices,
            templates,
            params,
            settings,
        })
    }
}

/// A failed run, with everything recorded up to the failure.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct RunFailure {
    pub error: CoreError,
    pub report: RunReport,
}

/// Run the full bring-up.
pub async fn run<A: FirewallApi>(
    ctx: &mut RunContext<A>,
    progress: &dyn Progress,
) -> Result<RunReport, RunFailure> {
    let span = info_span!("run", run_id = %ctx.run_id);
    let started = Instant::now();
    let mut report = RunReport::new(ctx.run_id);

    let result = drive(ctx, progress, &mut report).instrument(span.clone()).await;
    report.elapsed = started.elapsed();

    let _enter = span.enter();
    match result {
        Ok(()) => {
            info!(elapsed = ?report.elapsed, active = ?report.active_host, "run completed");
            Ok(report)
        }
        Err(error) => {
            error!(error = %error, step = ?error.step(), "run failed");
            Err(RunFailure { error, report })
        }
    }
}

async fn drive<A: FirewallApi>(
    ctx: &mut RunContext<A>,
    progress: &dyn Progress,
    report: &mut RunReport,
) -> Result<(), CoreError> {
    authenticate_all(&mut ctx.devices, progress, report).await?;

    info!("phase 1: HA pairing");
    HaOrchestrator::new(
        &mut ctx.devices,
        &ctx.templates,
        &ctx.params,
        &ctx.settings,
        progress,
    )
    .run(report)
    .await?;

    info!("phase 2: configuration of the active firewall");
    let active = identify_active(&mut ctx.devices, progress).await?;
    ConfigOrchestrator::new(
        &ctx.devices,
        active,
        &ctx.templates,
        &ctx.params,
        &ctx.settings,
        progress,
    )?
    .run(report)
    .await?;
    Ok(())
}

/// Generate API keys for every device before any configuration call.
async fn authenticate_all<A: FirewallApi>(
    devices: &mut [Device<A>],
    progress: &dyn Progress,
    report: &mut RunReport,
) -> Result<(), CoreError> {
    let stage = Stage::Authenticate;
    progress.stage_started(stage, u64::try_from(devices.len()).unwrap_or(u64::MAX));

    for device in devices.iter_mut() {
        let host = device.host();
        let started = Instant::now();
        let result = device.authenticate().await;
        report.record("authenticate", &host, started, &result);
        if let Err(e) = result {
            progress.stage_failed(stage, &e.to_string());
            return Err(e);
        }
        progress.stage_advanced(stage, &host);
    }
    progress.stage_finished(stage);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::model::HaPhase;
    use crate::progress::NoProgress;
    use crate::testing::{Call, FakeFirewall, Journal, ha};

    fn credentials(host: &str) -> DeviceCredentials {
        DeviceCredentials {
            host: host.into(),
            username: "admin".into(),
            password: SecretString::from("paloalto".to_string()),
        }
    }

    fn templates() -> TemplateSet {
        let mut set = TemplateSet::new();
        for kind in TemplateKind::iter() {
            set.add_source(kind, "<entry name='x'/>").unwrap();
        }
        set
    }

    fn context(a: FakeFirewall, b: FakeFirewall) -> RunContext<FakeFirewall> {
        RunContext::new(
            vec![(credentials("fw-a"), a), (credentials("fw-b"), b)],
            templates(),
            TemplateParams::new(),
            RunSettings::default(),
        )
        .unwrap()
    }

    #[test]
    fn requires_exactly_two_devices() {
        let journal = Journal::default();
        let err = RunContext::new(
            vec![(credentials("fw-a"), FakeFirewall::new("fw-a", &journal))],
            templates(),
            TemplateParams::new(),
            RunSettings::default(),
        )
        .err()
        .unwrap();
        assert!(err.to_string().contains("exactly two firewalls"));
    }

    #[test]
    fn requires_every_template() {
        let journal = Journal::default();
        let mut set = TemplateSet::new();
        set.add_source(TemplateKind::Zone, "<z/>").unwrap();
        let err = RunContext::new(
            vec![
                (credentials("fw-a"), FakeFirewall::new("fw-a", &journal)),
                (credentials("fw-b"), FakeFirewall::new("fw-b", &journal)),
            ],
            set,
            TemplateParams::new(),
            RunSettings::default(),
        )
        .err()
        .unwrap();
        assert!(err.to_string().contains("ha_config"), "{err}");
        assert!(!err.to_string().contains("zone"), "{err}");
    }

    #[test]
    fn roles_follow_credential_order() {
        let journal = Journal::default();
        let ctx = context(FakeFirewall::new("fw-a", &journal), FakeFirewall::new("fw-b", &journal));
        assert_eq!(ctx.devices[0].role, Role::Primary);
        assert_eq!(ctx.devices[1].role, Role::Secondary);
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_host_aborts_before_configuration() {
        let journal = Journal::default();
        let mut ctx = context(
            FakeFirewall::new("fw-a", &journal),
            FakeFirewall::new("fw-b", &journal).unreachable(),
        );

        let failure = run(&mut ctx, &NoProgress).await.unwrap_err();

        assert!(matches!(failure.error, CoreError::Authentication { ref host, .. } if host == "fw-b"));
        let calls: Vec<Call> = journal.borrow().iter().map(|(_, c)| c.clone()).collect();
        assert_eq!(calls, vec![Call::Keygen, Call::Keygen]);
        assert_eq!(failure.report.steps.len(), 2);
        assert_eq!(failure.report.ha_phase, HaPhase::Unconfigured);
    }

    #[tokio::test(start_paused = true)]
    async fn bad_credentials_on_first_device_stop_immediately() {
        let journal = Journal::default();
        let mut ctx = context(
            FakeFirewall::new("fw-a", &journal).reject_auth("Invalid Credential"),
            FakeFirewall::new("fw-b", &journal),
        );

        let failure = run(&mut ctx, &NoProgress).await.unwrap_err();
        assert_eq!(
            failure.error.to_string(),
            "Authentication failed for fw-a: Invalid Credential"
        );
        assert_eq!(journal.borrow().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn full_run_reports_every_step() {
        let journal = Journal::default();
        let mut ctx = context(
            FakeFirewall::new("fw-a", &journal).ha_states([ha("active", "passive", "synchronized")]),
            FakeFirewall::new("fw-b", &journal).ha_states([ha("passive", "active", "synchronized")]),
        );

        let report = run(&mut ctx, &NoProgress).await.unwrap();

        assert_eq!(report.ha_phase, HaPhase::InSync);
        assert_eq!(report.active_host.as_deref(), Some("fw-a"));
        assert!(report.failed_step().is_none());
        let names: Vec<(&str, &str)> = report
            .steps
            .iter()
            .map(|s| (s.name.as_str(), s.host.as_str()))
            .collect();
        insta::assert_debug_snapshot!(names);
    }
}
