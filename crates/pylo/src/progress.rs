//! Terminal progress: one indicatif bar per workflow stage plus a job bar
//! for commit progress and HA sync checks.

use std::cell::Cell;
use std::collections::HashMap;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use pylo_api::JobId;
use pylo_core::{Progress, Stage};

const STAGE_TEMPLATE: &str = "{prefix:>32.bold} [{bar:20.cyan/blue}] {pos}/{len} {msg}";
const JOB_TEMPLATE: &str = "{spinner:.green} {prefix:>30.bold} [{bar:20.green}] {percent:>3}% {msg}";

pub struct BarProgress {
    multi: MultiProgress,
    stages: HashMap<Stage, ProgressBar>,
    job: ProgressBar,
    job_visible: Cell<bool>,
    current_job: Cell<Option<u64>>,
}

impl BarProgress {
    pub fn new(hidden: bool) -> Self {
        let target = if hidden {
            ProgressDrawTarget::hidden()
        } else {
            ProgressDrawTarget::stderr()
        };
        let multi = MultiProgress::with_draw_target(target);

        let stage_style = ProgressStyle::with_template(STAGE_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        let stages = Stage::all()
            .into_iter()
            .map(|stage| {
                let bar = ProgressBar::new(0)
                    .with_style(stage_style.clone())
                    .with_prefix(stage.to_string());
                (stage, bar)
            })
            .collect();

        let job = ProgressBar::new(100)
            .with_style(
                ProgressStyle::with_template(JOB_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
            )
            .with_prefix("Device job");

        Self {
            multi,
            stages,
            job,
            job_visible: Cell::new(false),
            current_job: Cell::new(None),
        }
    }

    fn show_job_bar(&self) {
        if !self.job_visible.replace(true) {
            self.multi.add(self.job.clone());
            self.job.enable_steady_tick(Duration::from_millis(120));
        }
    }

    /// Remove the job bar once the workflow is over.
    pub fn finish(&self) {
        if self.job_visible.get() {
            self.job.finish_and_clear();
        }
    }
}

impl Progress for BarProgress {
    fn stage_started(&self, stage: Stage, total: u64) {
        if let Some(bar) = self.stages.get(&stage) {
            bar.set_length(total);
            bar.set_position(0);
            self.multi.add(bar.clone());
        }
    }

    fn stage_advanced(&self, stage: Stage, host: &str) {
        if let Some(bar) = self.stages.get(&stage) {
            bar.set_message(host.to_string());
            bar.inc(1);
        }
    }

    fn stage_finished(&self, stage: Stage) {
        if let Some(bar) = self.stages.get(&stage) {
            bar.finish_with_message("done");
        }
    }

    fn stage_failed(&self, stage: Stage, error: &str) {
        if let Some(bar) = self.stages.get(&stage) {
            bar.abandon_with_message(format!("failed: {error}"));
        }
    }

    fn job_progress(&self, host: &str, job: JobId, percent: u8) {
        self.show_job_bar();
        if self.current_job.replace(Some(job.0)) != Some(job.0) {
            self.job.reset();
        }
        self.job.set_message(format!("job {job} on {host}"));
        self.job.set_position(u64::from(percent));
    }

    fn sync_check(&self, attempt: u32, max_attempts: u32, state: &str) {
        self.show_job_bar();
        self.current_job.set(None);
        self.job.set_position(0);
        self.job
            .set_message(format!("HA check {attempt}/{max_attempts}: {state}"));
    }
}
