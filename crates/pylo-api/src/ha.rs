// High-availability operational commands

use tracing::debug;

use crate::client::PanClient;
use crate::error::Error;
use crate::models::{HaStateResult, HaStatus};
use crate::xml;

const SHOW_HA_STATE: &str = "<show><high-availability><state></state></high-availability></show>";
const SYNC_TO_REMOTE: &str = "<request><high-availability><sync-to-remote><running-config></running-config></sync-to-remote></high-availability></request>";

impl PanClient {
    /// Current HA state of this device and its view of the peer.
    ///
    /// `type=op` with `<show><high-availability><state/>...`
    pub async fn ha_state(&self) -> Result<HaStatus, Error> {
        let body = self.op(SHOW_HA_STATE).await?;
        let status: HaStatus = xml::parse_result::<HaStateResult>(&body)?
            .map(HaStatus::from)
            .unwrap_or_default();
        debug!(
            host = %self.host(),
            enabled = status.enabled,
            local = ?status.local_state,
            peer = ?status.peer_state,
            running_sync = ?status.running_sync,
            "HA state"
        );
        Ok(status)
    }

    /// Push this device's running config to its HA peer.
    ///
    /// `type=op` with `<request><high-availability><sync-to-remote>...`
    pub async fn sync_to_remote(&self) -> Result<(), Error> {
        let body = self.op(SYNC_TO_REMOTE).await?;
        debug!(
            host = %self.host(),
            msg = %xml::collect_lines(&body, "result").join("; "),
            "running-config sync requested"
        );
        Ok(())
    }
}
