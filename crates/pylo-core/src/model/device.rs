use std::fmt;

use strum::Display;
use tracing::info;

use crate::api::FirewallApi;
use crate::config::DeviceCredentials;
use crate::error::CoreError;
use crate::model::ha::HaPairState;

/// Position of a device in the credentials list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Primary,
    Secondary,
}

impl Role {
    /// Index into per-device settings (`0` primary, `1` secondary).
    pub fn index(self) -> usize {
        match self {
            Self::Primary => 0,
            Self::Secondary => 1,
        }
    }
}

/// One firewall of the pair, bound to its API client.
///
/// The session key lives inside `api` once [`authenticate`](Self::authenticate)
/// succeeds.
pub struct Device<A> {
    pub role: Role,
    pub username: String,
    password: secrecy::SecretString,
    pub api: A,
    /// Last HA view reported by this device.
    pub ha: Option<HaPairState>,
}

impl<A: FirewallApi> Device<A> {
    pub fn new(role: Role, credentials: DeviceCredentials, api: A) -> Self {
        Self {
            role,
            username: credentials.username,
            password: credentials.password,
            api,
            ha: None,
        }
    }

    /// `host[:port]` as used in logs and errors.
    pub fn host(&self) -> String {
        self.api.host()
    }

    /// Generate an API key and keep it in the client.
    pub async fn authenticate(&mut self) -> Result<(), CoreError> {
        let host = self.host();
        self.api
            .authenticate(&self.username, &self.password)
            .await
            .map_err(|e| CoreError::Authentication {
                host: host.clone(),
                message: match e {
                    pylo_api::Error::Authentication { message } => message,
                    other => other.to_string(),
                },
            })?;
        info!(host = %host, role = %self.role, "API key generated");
        Ok(())
    }
}

impl<A> fmt::Debug for Device<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("role", &self.role)
            .field("username", &self.username)
            .field("password", &"****")
            .field("ha", &self.ha)
            .finish_non_exhaustive()
    }
}
