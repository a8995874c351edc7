// PAN-OS XML API HTTP client
//
// Wraps `reqwest::Client` with the `/api/` endpoint, `X-PAN-KEY` header
// handling and `<response>` envelope checking. Endpoint families (keygen,
// config, jobs, HA) live in sibling modules as inherent methods so this
// file stays focused on transport mechanics.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::xml;

const MASK: &str = "********";

/// Loggable description of one API request. Never carries secrets.
#[derive(Debug, Clone, Default)]
pub struct RequestSummary {
    pub kind: &'static str,
    pub action: Option<&'static str>,
    pub xpath: Option<String>,
    pub cmd: Option<String>,
}

impl fmt::Display for RequestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type={}", self.kind)?;
        if let Some(action) = self.action {
            write!(f, " action={action}")?;
        }
        if let Some(ref xpath) = self.xpath {
            write!(f, " xpath={xpath}")?;
        }
        if let Some(ref cmd) = self.cmd {
            write!(f, " cmd={cmd}")?;
        }
        Ok(())
    }
}

/// Replace every occurrence of each non-empty secret with a fixed mask.
pub fn redact(input: &str, secrets: &[&str]) -> String {
    secrets
        .iter()
        .filter(|s| !s.is_empty())
        .fold(input.to_string(), |acc, secret| acc.replace(secret, MASK))
}

/// HTTP client for one firewall's XML management API.
///
/// Holds the API key once [`generate_api_key`](Self::generate_api_key)
/// succeeds; every later request carries it in the `X-PAN-KEY` header so
/// it never appears in URLs or logs.
pub struct PanClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<SecretString>,
}

impl fmt::Debug for PanClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanClient")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.api_key.is_some())
            .finish_non_exhaustive()
    }
}

impl PanClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the management root, e.g. `https://192.168.1.10`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            api_key: None,
        }
    }

    /// Parse a credentials-file host into a management URL.
    ///
    /// Bare hosts (`10.0.0.1`, `fw1:8443`) get an `https://` scheme;
    /// anything that already carries a scheme is used verbatim.
    pub fn base_url_for(host: &str) -> Result<Url, Error> {
        let host = host.trim().trim_end_matches('/');
        if host.contains("://") {
            Ok(Url::parse(host)?)
        } else {
            Ok(Url::parse(&format!("https://{host}"))?)
        }
    }

    /// The management base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Host (and port, if any) for log and error messages.
    pub fn host(&self) -> String {
        match (self.base_url.host_str(), self.base_url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            _ => self.base_url.to_string(),
        }
    }

    /// Whether an API key has been obtained.
    pub fn is_authenticated(&self) -> bool {
        self.api_key.is_some()
    }

    /// Install an API key (normally done by `generate_api_key`).
    pub fn set_api_key(&mut self, key: SecretString) {
        debug!(host = %self.host(), "storing API key");
        self.api_key = Some(key);
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// `{base}/api/`
    pub(crate) fn api_url(&self) -> Result<Url, Error> {
        Ok(self.base_url.join("/api/")?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a keyed request and return the raw body of a successful
    /// envelope.
    pub(crate) async fn call(
        &self,
        summary: &RequestSummary,
        form: &[(&str, &str)],
    ) -> Result<String, Error> {
        let key = self.api_key.as_ref().ok_or(Error::MissingApiKey)?;
        let url = self.api_url()?;

        debug!(host = %self.host(), "{summary}");

        let resp = self
            .http
            .post(url)
            .header("X-PAN-KEY", key.expose_secret())
            .form(form)
            .send()
            .await
            .map_err(Error::Transport)?;

        self.check_envelope(resp).await
    }

    /// Validate HTTP status and the `<response status=...>` attribute.
    ///
    /// Error envelopes are reported with the device's message even when
    /// they arrive with a non-2xx status (PAN-OS answers 403 for bad keys).
    pub(crate) async fn check_envelope(&self, resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;
        let secrets: Vec<&str> = self
            .api_key
            .as_ref()
            .map(|k| vec![k.expose_secret()])
            .unwrap_or_default();
        trace!(
            host = %self.host(),
            %status,
            body = %redact(xml::preview(&body), &secrets),
            "response"
        );

        let envelope = xml::parse_envelope(&body);
        if let Ok(ref envelope) = envelope {
            if !envelope.is_success() {
                let err = xml::api_error(envelope, &body);
                debug!(host = %self.host(), error = %err, "device rejected request");
                return Err(err);
            }
        }

        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                body: redact(xml::preview(&body), &secrets),
            });
        }

        envelope?;
        Ok(body)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn redact_masks_every_secret() {
        let out = redact("user=admin&password=hunter2&again=hunter2", &["hunter2", ""]);
        assert_eq!(out, "user=admin&password=********&again=********");
    }

    #[test]
    fn summary_never_includes_key_material() {
        let summary = RequestSummary {
            kind: "config",
            action: Some("set"),
            xpath: Some("/config/devices".into()),
            cmd: None,
        };
        assert_eq!(summary.to_string(), "type=config action=set xpath=/config/devices");
    }

    #[test]
    fn bare_hosts_get_https() {
        let url = PanClient::base_url_for("192.168.1.10").unwrap();
        assert_eq!(url.as_str(), "https://192.168.1.10/");

        let url = PanClient::base_url_for("http://127.0.0.1:8080/").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/");
    }

    #[test]
    fn host_includes_explicit_port() {
        let client = PanClient::with_client(
            reqwest::Client::new(),
            Url::parse("https://fw1.lab:8443").unwrap(),
        );
        assert_eq!(client.host(), "fw1.lab:8443");
        assert!(!client.is_authenticated());
    }
}
