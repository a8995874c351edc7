//! Terminal output: start-up banner and the end-of-run summary table.

use std::io::{self, IsTerminal};
use std::time::Duration;

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use pylo_core::{RunReport, StepOutcome, StepRecord};

// ── Banner ──────────────────────────────────────────────────────────

pub fn banner() -> String {
    let title = format!("pylo {}", env!("CARGO_PKG_VERSION"));
    let tagline = "Palo Alto HA pair bring-up";
    if color_enabled() {
        format!("{}\n{}", title.bold().cyan(), tagline.dimmed())
    } else {
        format!("{title}\n{tagline}")
    }
}

fn color_enabled() -> bool {
    io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

// ── Summary ─────────────────────────────────────────────────────────

#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "Step")]
    name: String,
    #[tabled(rename = "Firewall")]
    host: String,
    #[tabled(rename = "Result")]
    outcome: String,
    #[tabled(rename = "Time")]
    elapsed: String,
}

impl From<&StepRecord> for StepRow {
    fn from(step: &StepRecord) -> Self {
        let outcome = match &step.outcome {
            StepOutcome::Succeeded => "ok".to_string(),
            StepOutcome::Skipped(why) => format!("skipped ({why})"),
            StepOutcome::Failed(err) => format!("FAILED: {err}"),
        };
        Self {
            name: step.name.clone(),
            host: step.host.clone(),
            outcome,
            elapsed: human_duration(step.elapsed),
        }
    }
}

/// Whole seconds above one second, milliseconds below.
pub fn human_duration(d: Duration) -> String {
    let rounded = if d >= Duration::from_secs(1) {
        Duration::from_secs(d.as_secs())
    } else {
        Duration::from_millis(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    };
    humantime::format_duration(rounded).to_string()
}

pub fn summary(report: &RunReport) -> String {
    let rows: Vec<StepRow> = report.steps.iter().map(StepRow::from).collect();
    let table = Table::new(rows).with(Style::rounded()).to_string();

    let status = match report.failed_step() {
        None => "completed".to_string(),
        Some(step) => format!("failed at '{}' on {}", step.name, step.host),
    };
    let mut lines = vec![
        table,
        format!("Run {}: {status}", report.run_id),
        format!("HA phase: {}", report.ha_phase),
    ];
    if let Some(active) = &report.active_host {
        lines.push(format!("Active firewall: {active}"));
    }
    lines.push(format!("Elapsed: {}", human_duration(report.elapsed)));
    lines.join("\n")
}
