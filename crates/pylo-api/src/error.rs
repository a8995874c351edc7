use thiserror::Error;

/// Top-level error type for the `pylo-api` crate.
///
/// Covers transport, TLS, envelope and payload failures of the PAN-OS
/// XML API. `pylo-core` attaches host and step context to these.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Key generation rejected (wrong credentials, locked account, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// A keyed call was attempted before `generate_api_key` succeeded.
    #[error("No API key -- authenticate before issuing commands")]
    MissingApiKey,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Non-success HTTP status without a parseable PAN-OS envelope.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    // ── Device ──────────────────────────────────────────────────────
    /// The device answered with `<response status="error">`.
    ///
    /// `message` is the device's own text (joined `<line>` entries).
    #[error("{message}")]
    Api {
        code: Option<String>,
        message: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// XML deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth polling through.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Http { status, .. } => *status == 502 || *status == 503 || *status == 504,
            _ => false,
        }
    }

    /// Returns `true` if the device could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_connect() || e.is_timeout())
    }
}
