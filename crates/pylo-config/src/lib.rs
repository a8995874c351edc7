//! Run configuration for pylo.
//!
//! A TOML or JSON file (chosen by extension) layered over built-in
//! defaults and `PYLO_*` environment overrides, the credentials list,
//! the XML templates it points at, and translation into
//! `pylo_core::RunSettings`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml},
};
use indexmap::IndexMap;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use pylo_api::{TlsMode, TransportConfig};
use pylo_core::{
    DeviceCredentials, HaPeerSettings, HaSettings, Layout, PollSettings, RunSettings,
    SyncSettings, TemplateError, TemplateKind, TemplateParams, TemplateSet,
};

const KEYRING_SERVICE: &str = "pylo";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password for {host}: set `password`, `password_env`, or store one in the keyring (service 'pylo', user '{host}')")]
    NoPassword { host: String },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid credentials file {}: {source}", path.display())]
    Credentials {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Config structs ──────────────────────────────────────────────────

/// Top-level run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// JSON list of `{host, username, password?, password_env?}`.
    pub credentials_file: PathBuf,

    /// Logical template name → XML file.
    #[serde(default = "default_templates")]
    pub templates: IndexMap<String, PathBuf>,

    /// Values substituted into template placeholders.
    #[serde(default)]
    pub parameters: IndexMap<String, String>,

    #[serde(default)]
    pub ha: HaConfig,

    #[serde(default)]
    pub timing: Timing,

    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub tls: TlsConfig,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Directory for run log files.
    pub log_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials_file: PathBuf::from("credentials.json"),
            templates: default_templates(),
            parameters: IndexMap::new(),
            ha: HaConfig::default(),
            timing: Timing::default(),
            layout: LayoutConfig::default(),
            tls: TlsConfig::default(),
            timeout: default_timeout(),
            log_dir: default_log_dir(),
        }
    }
}

fn default_templates() -> IndexMap<String, PathBuf> {
    [
        (TemplateKind::HaConfig, "ha_config.xml"),
        (TemplateKind::HaInterface, "ha_interface.xml"),
        (TemplateKind::Interface, "interface.xml"),
        (TemplateKind::Zone, "zone.xml"),
        (TemplateKind::VirtualRouter, "virtual_router.xml"),
        (TemplateKind::StaticRoute, "static_route.xml"),
        (TemplateKind::SecurityPolicy, "security_policy.xml"),
        (TemplateKind::SourceNat, "source_nat.xml"),
    ]
    .into_iter()
    .map(|(kind, file)| (kind.to_string(), PathBuf::from("templates").join(file)))
    .collect()
}

fn default_timeout() -> u64 {
    30
}

fn default_log_dir() -> PathBuf {
    project_dirs().map_or_else(
        || PathBuf::from("logs"),
        |dirs| dirs.data_local_dir().join("logs"),
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HaConfig {
    #[serde(default = "default_ha_interfaces")]
    pub interfaces: Vec<String>,
    #[serde(default = "default_primary")]
    pub primary: PeerConfig,
    #[serde(default = "default_secondary")]
    pub secondary: PeerConfig,
}

impl Default for HaConfig {
    fn default() -> Self {
        Self {
            interfaces: default_ha_interfaces(),
            primary: default_primary(),
            secondary: default_secondary(),
        }
    }
}

fn default_ha_interfaces() -> Vec<String> {
    HaSettings::default().interfaces
}

fn default_primary() -> PeerConfig {
    let [primary, _] = HaPeerSettings::lab_defaults();
    primary.into()
}

fn default_secondary() -> PeerConfig {
    let [_, secondary] = HaPeerSettings::lab_defaults();
    secondary.into()
}

/// HA group parameters for one member.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PeerConfig {
    pub device_priority: u16,
    pub preemptive: bool,
    pub peer_ip: String,
    pub ha1_ip: String,
}

impl From<HaPeerSettings> for PeerConfig {
    fn from(s: HaPeerSettings) -> Self {
        Self {
            device_priority: s.device_priority,
            preemptive: s.preemptive,
            peer_ip: s.peer_ip,
            ha1_ip: s.ha1_ip,
        }
    }
}

impl From<&PeerConfig> for HaPeerSettings {
    fn from(p: &PeerConfig) -> Self {
        Self {
            device_priority: p.device_priority,
            preemptive: p.preemptive,
            peer_ip: p.peer_ip.clone(),
            ha1_ip: p.ha1_ip.clone(),
        }
    }
}

/// Poll timing, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Timing {
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
    #[serde(default = "default_commit_timeout")]
    pub commit_timeout: u64,
    #[serde(default = "default_sync_interval")]
    pub sync_interval: u64,
    #[serde(default = "default_sync_attempts")]
    pub sync_attempts: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            commit_timeout: default_commit_timeout(),
            sync_interval: default_sync_interval(),
            sync_attempts: default_sync_attempts(),
        }
    }
}

fn default_poll_interval() -> u64 {
    PollSettings::default().interval.as_secs()
}
fn default_commit_timeout() -> u64 {
    PollSettings::default().timeout.as_secs()
}
fn default_sync_interval() -> u64 {
    SyncSettings::default().interval.as_secs()
}
fn default_sync_attempts() -> u32 {
    SyncSettings::default().attempts
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LayoutConfig {
    #[serde(default = "default_vsys")]
    pub vsys: String,
    #[serde(default = "default_virtual_router")]
    pub virtual_router: String,
    #[serde(default = "default_static_route")]
    pub static_route: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let layout = Layout::default();
        Self {
            vsys: layout.vsys,
            virtual_router: layout.virtual_router,
            static_route: layout.static_route,
        }
    }
}

fn default_vsys() -> String {
    Layout::default().vsys
}
fn default_virtual_router() -> String {
    Layout::default().virtual_router
}
fn default_static_route() -> String {
    Layout::default().static_route
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Accept self-signed device certificates.
    #[serde(default)]
    pub insecure: bool,
    /// PEM root certificate for the management interfaces.
    pub ca_cert: Option<PathBuf>,
}

// ── Config file path ────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("io", "pylo", "pylo")
}

/// Default config file location for this platform.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || PathBuf::from("pylo.toml"),
        |dirs| dirs.config_dir().join("pylo.toml"),
    )
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load defaults + file at `path` + `PYLO_*` environment.
///
/// Relative paths inside the file are resolved against the file's
/// directory.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let figment = Figment::new().merge(Serialized::defaults(Config::default()));
    let figment = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => figment.merge(Json::file(path)),
        _ => figment.merge(Toml::file(path)),
    };
    let mut config: Config = figment
        .merge(Env::prefixed("PYLO_").split("__"))
        .extract()?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    config.resolve_paths(base);
    config.validate()?;
    debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

impl Config {
    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.credentials_file);
        resolve(&mut self.log_dir);
        for path in self.templates.values_mut() {
            resolve(path);
        }
        if let Some(ca) = self.tls.ca_cert.as_mut() {
            resolve(ca);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &str, reason: &str| ConfigError::Validation {
            field: field.into(),
            reason: reason.into(),
        };
        if self.timing.poll_interval == 0 {
            return Err(invalid("timing.poll_interval", "must be greater than zero"));
        }
        if self.timing.sync_interval == 0 {
            return Err(invalid("timing.sync_interval", "must be greater than zero"));
        }
        if self.timing.sync_attempts == 0 {
            return Err(invalid("timing.sync_attempts", "must be at least 1"));
        }
        if self.ha.interfaces.is_empty() {
            return Err(invalid("ha.interfaces", "at least one interface is required"));
        }
        for name in self.templates.keys() {
            name.parse::<TemplateKind>().map_err(|_| ConfigError::Validation {
                field: format!("templates.{name}"),
                reason: "unknown template name".into(),
            })?;
        }
        Ok(())
    }

    /// Effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            commit: PollSettings {
                interval: Duration::from_secs(self.timing.poll_interval),
                timeout: Duration::from_secs(self.timing.commit_timeout),
            },
            sync: SyncSettings {
                interval: Duration::from_secs(self.timing.sync_interval),
                attempts: self.timing.sync_attempts,
            },
            ha: HaSettings {
                interfaces: self.ha.interfaces.clone(),
                peers: [(&self.ha.primary).into(), (&self.ha.secondary).into()],
            },
            layout: Layout {
                vsys: self.layout.vsys.clone(),
                virtual_router: self.layout.virtual_router.clone(),
                static_route: self.layout.static_route.clone(),
            },
        }
    }

    /// HTTP transport settings. `insecure` from the CLI wins over the file.
    pub fn transport(&self, insecure: bool) -> TransportConfig {
        let tls = if insecure || self.tls.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ca) = &self.tls.ca_cert {
            TlsMode::CustomCa(ca.clone())
        } else {
            TlsMode::System
        };
        TransportConfig {
            tls,
            timeout: Duration::from_secs(self.timeout),
        }
    }

    pub fn template_params(&self) -> TemplateParams {
        TemplateParams::from(self.parameters.clone())
    }
}

// ── Templates ───────────────────────────────────────────────────────

/// Read and parse every template named in the config.
pub fn load_templates(config: &Config) -> Result<TemplateSet, ConfigError> {
    let mut set = TemplateSet::new();
    for (name, path) in &config.templates {
        let kind: TemplateKind = name.parse().map_err(|_| ConfigError::Validation {
            field: format!("templates.{name}"),
            reason: "unknown template name".into(),
        })?;
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        set.add_source(kind, &source)?;
        debug!(template = %kind, path = %path.display(), "template loaded");
    }
    Ok(set)
}

// ── Credentials ─────────────────────────────────────────────────────

/// One entry of the credentials file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CredentialRecord {
    pub host: String,
    pub username: String,
    /// Plaintext; prefer `password_env` or the keyring.
    pub password: Option<String>,
    /// Environment variable holding the password.
    pub password_env: Option<String>,
}

/// Parse the credentials file and resolve every password.
pub fn load_credentials(path: &Path) -> Result<Vec<DeviceCredentials>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let records: Vec<CredentialRecord> =
        serde_json::from_str(&raw).map_err(|source| ConfigError::Credentials {
            path: path.to_path_buf(),
            source,
        })?;
    records.iter().map(resolve_credentials).collect()
}

/// Password chain: plaintext, then `password_env`, then the keyring.
pub fn resolve_credentials(record: &CredentialRecord) -> Result<DeviceCredentials, ConfigError> {
    if record.host.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: "must not be empty".into(),
        });
    }

    let password = resolve_password(record).ok_or_else(|| ConfigError::NoPassword {
        host: record.host.clone(),
    })?;

    Ok(DeviceCredentials {
        host: record.host.clone(),
        username: record.username.clone(),
        password,
    })
}

fn resolve_password(record: &CredentialRecord) -> Option<SecretString> {
    if let Some(pw) = &record.password {
        return Some(SecretString::from(pw.clone()));
    }

    if let Some(var) = &record.password_env {
        if let Ok(pw) = std::env::var(var) {
            return Some(SecretString::from(pw));
        }
    }

    keyring::Entry::new(KEYRING_SERVICE, &record.host)
        .and_then(|entry| entry.get_password())
        .ok()
        .map(SecretString::from)
}
