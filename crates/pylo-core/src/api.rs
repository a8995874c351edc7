// ── Firewall API seam ──
//
// The orchestrators talk to devices through this trait so they can be
// driven against an in-memory device in tests. `PanClient` is the real
// implementation.

use secrecy::SecretString;

use pylo_api::{CommitOutcome, Error, HaStatus, JobId, JobInfo, PanClient};

/// The device operations the bring-up workflow needs.
#[allow(async_fn_in_trait)]
pub trait FirewallApi {
    /// `host[:port]` for logs and errors.
    fn host(&self) -> String;

    /// Generate and store an API key.
    async fn authenticate(&mut self, username: &str, password: &SecretString) -> Result<(), Error>;

    /// `type=config&action=set`
    async fn set_config(&self, xpath: &str, element: &str) -> Result<(), Error>;

    /// `type=commit`
    async fn commit(&self) -> Result<CommitOutcome, Error>;

    async fn job_status(&self, id: JobId) -> Result<JobInfo, Error>;

    async fn ha_state(&self) -> Result<HaStatus, Error>;

    async fn sync_to_remote(&self) -> Result<(), Error>;
}

impl FirewallApi for PanClient {
    fn host(&self) -> String {
        PanClient::host(self)
    }

    async fn authenticate(&mut self, username: &str, password: &SecretString) -> Result<(), Error> {
        self.generate_api_key(username, password).await
    }

    async fn set_config(&self, xpath: &str, element: &str) -> Result<(), Error> {
        PanClient::set_config(self, xpath, element).await
    }

    async fn commit(&self) -> Result<CommitOutcome, Error> {
        PanClient::commit(self).await
    }

    async fn job_status(&self, id: JobId) -> Result<JobInfo, Error> {
        PanClient::job_status(self, id).await
    }

    async fn ha_state(&self) -> Result<HaStatus, Error> {
        PanClient::ha_state(self).await
    }

    async fn sync_to_remote(&self) -> Result<(), Error> {
        PanClient::sync_to_remote(self).await
    }
}
