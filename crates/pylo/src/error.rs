//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into operator-facing errors with
//! help text and a distinct exit code per error class.

use miette::Diagnostic;
use thiserror::Error;

use pylo_config::ConfigError;
use pylo_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const CONFIG: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const REJECTED: i32 = 4;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(pylo::config),
        help("Check the run configuration. Show the effective settings with: pylo --print-config")
    )]
    Config(#[from] ConfigError),

    #[error("Invalid run setup: {message}")]
    #[diagnostic(code(pylo::invalid_setup))]
    Setup { message: String },

    #[error("Template error: {message}")]
    #[diagnostic(
        code(pylo::template),
        help("Add the missing value under [parameters] in the run configuration")
    )]
    Template { message: String },

    #[error("Invalid firewall address '{host}': {message}")]
    #[diagnostic(code(pylo::invalid_host))]
    InvalidHost { host: String, message: String },

    #[error("Failed to open log file in {path}: {message}")]
    #[diagnostic(code(pylo::log_file), help("Pass a writable directory with --log-dir"))]
    LogFile { path: String, message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed for {host}: {message}")]
    #[diagnostic(
        code(pylo::auth_failed),
        help(
            "Check the credentials entry for {host} and that its management \
             interface is reachable. Use --insecure for self-signed certificates."
        )
    )]
    AuthFailed { host: String, message: String },

    // ── Device rejections ────────────────────────────────────────────
    #[error("Step '{step}' rejected by {host}: {message}")]
    #[diagnostic(
        code(pylo::rejected),
        help(
            "Earlier steps stay in the candidate configuration of {host}. \
             Fix the template and re-run, or revert the candidate on the device."
        )
    )]
    Rejected {
        step: String,
        host: String,
        message: String,
    },

    #[error("Commit failed on {host}: {details}")]
    #[diagnostic(code(pylo::commit_failed), help("Review the commit job details on {host}"))]
    CommitFailed { host: String, details: String },

    // ── Timeouts ─────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(pylo::timeout),
        help("Raise timing.commit_timeout or timing.sync_attempts in the run configuration")
    )]
    Timeout { message: String },

    // ── Everything else ──────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(pylo::error))]
    General { message: String },
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_)
            | Self::Setup { .. }
            | Self::Template { .. }
            | Self::InvalidHost { .. }
            | Self::LogFile { .. } => exit_code::CONFIG,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::Rejected { .. } | Self::CommitFailed { .. } => exit_code::REJECTED,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::General { .. } => exit_code::GENERAL,
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Authentication { host, message } => Self::AuthFailed { host, message },
            CoreError::Configuration {
                step,
                host,
                message,
            } => Self::Rejected {
                step,
                host,
                message,
            },
            CoreError::CommitFailed { host, details, .. } => Self::CommitFailed { host, details },
            err @ CoreError::JobTimeout { .. } => Self::Timeout {
                message: err.to_string(),
            },
            CoreError::TemplateRender(e) => Self::Template {
                message: e.to_string(),
            },
            CoreError::Config { message } => Self::Setup { message },
            err @ (CoreError::NoActivePeer { .. } | CoreError::Api { .. }) => Self::General {
                message: err.to_string(),
            },
        }
    }
}
