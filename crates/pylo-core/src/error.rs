// ── Core error types ──
//
// Domain errors from pylo-core. Every variant carries the host and, where
// one applies, the workflow step that failed, so the operator sees *where*
// the run stopped and the device's own words for *why*.

use std::time::Duration;

use thiserror::Error;

use pylo_api::JobId;

use crate::template::TemplateError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed for {host}: {message}")]
    Authentication { host: String, message: String },

    // ── Device-side rejections ───────────────────────────────────────
    #[error("Step '{step}' rejected by {host}: {message}")]
    Configuration {
        step: String,
        host: String,
        message: String,
    },

    #[error("Commit job {job_id} failed on {host}: {details}")]
    CommitFailed {
        host: String,
        job_id: JobId,
        details: String,
    },

    #[error("No device reported HA state 'active' (checked: {hosts})")]
    NoActivePeer { hosts: String },

    // ── Timeouts ─────────────────────────────────────────────────────
    #[error(
        "{operation} on {host} did not finish within {}s (last progress: {})",
        waited.as_secs(),
        last_progress.map_or_else(|| "unknown".to_string(), |p| format!("{p}%"))
    )]
    JobTimeout {
        host: String,
        operation: String,
        last_progress: Option<u8>,
        waited: Duration,
    },

    // ── Local validation ─────────────────────────────────────────────
    #[error(transparent)]
    TemplateRender(#[from] TemplateError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Other API failures (transport, malformed responses) ──────────
    #[error("Step '{step}' failed on {host}: {message}")]
    Api {
        step: String,
        host: String,
        message: String,
    },
}

impl CoreError {
    /// Attach host and step context to a transport-layer error.
    pub(crate) fn from_api(host: &str, step: &str, err: pylo_api::Error) -> Self {
        match err {
            pylo_api::Error::Authentication { message } => Self::Authentication {
                host: host.to_string(),
                message,
            },
            pylo_api::Error::MissingApiKey => Self::Authentication {
                host: host.to_string(),
                message: err.to_string(),
            },
            pylo_api::Error::Api { message, .. } => Self::Configuration {
                step: step.to_string(),
                host: host.to_string(),
                message,
            },
            other => Self::Api {
                step: step.to_string(),
                host: host.to_string(),
                message: other.to_string(),
            },
        }
    }

    /// The workflow step this error is attached to, if any.
    pub fn step(&self) -> Option<&str> {
        match self {
            Self::Configuration { step, .. } | Self::Api { step, .. } => Some(step),
            Self::TemplateRender(e) => Some(e.template_name()),
            _ => None,
        }
    }
}
