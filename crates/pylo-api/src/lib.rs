// pylo-api: Async Rust client for the PAN-OS XML management API

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod ha;
pub mod jobs;
pub mod models;
pub mod transport;
pub mod xml;

pub use client::{PanClient, RequestSummary, redact};
pub use error::Error;
pub use models::{CommitOutcome, HaStatus, JobId, JobInfo};
pub use transport::{TlsMode, TransportConfig};
