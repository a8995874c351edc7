// Configuration endpoints
//
// `type=config&action=set` against the candidate configuration, plus
// `type=commit` to activate it.

use tracing::{debug, warn};

use crate::client::{PanClient, RequestSummary};
use crate::error::Error;
use crate::models::{CommitOutcome, CommitResult, JobId};
use crate::xml;

impl PanClient {
    /// Merge `element` into the candidate config at `xpath`.
    ///
    /// `POST /api/` with `type=config&action=set`
    pub async fn set_config(&self, xpath: &str, element: &str) -> Result<(), Error> {
        let summary = RequestSummary {
            kind: "config",
            action: Some("set"),
            xpath: Some(xpath.to_string()),
            cmd: None,
        };
        let body = self
            .call(
                &summary,
                &[
                    ("type", "config"),
                    ("action", "set"),
                    ("xpath", xpath),
                    ("element", element),
                ],
            )
            .await?;
        debug!(host = %self.host(), msg = %xml::collect_lines(&body, "msg").join("; "), "config set accepted");
        Ok(())
    }

    /// Commit the candidate configuration.
    ///
    /// `POST /api/` with `type=commit&cmd=<commit></commit>`
    ///
    /// Returns [`CommitOutcome::NothingToCommit`] when the device reports
    /// no pending changes (no job is created in that case). Any other reply
    /// without a job id is an [`Error::Api`] carrying the device message.
    pub async fn commit(&self) -> Result<CommitOutcome, Error> {
        let summary = RequestSummary {
            kind: "commit",
            action: None,
            xpath: None,
            cmd: Some("<commit></commit>".into()),
        };
        let body = self
            .call(&summary, &[("type", "commit"), ("cmd", "<commit></commit>")])
            .await?;

        let job = xml::parse_result::<CommitResult>(&body)?.and_then(|r| r.job);
        match job {
            Some(raw) => {
                let id: JobId = raw.parse().map_err(|_| Error::Deserialization {
                    message: format!("commit job id is not a number: {raw:?}"),
                    body: body.clone(),
                })?;
                debug!(host = %self.host(), job = %id, "commit enqueued");
                Ok(CommitOutcome::Enqueued(id))
            }
            None => {
                let msg = xml::collect_lines(&body, "msg").join("; ");
                if msg.to_ascii_lowercase().contains("no changes") {
                    return Ok(CommitOutcome::NothingToCommit);
                }
                warn!(host = %self.host(), msg, "commit response carried no job id");
                Err(Error::Api {
                    code: xml::parse_envelope(&body)?.code,
                    message: if msg.is_empty() {
                        "commit response carried no job id".into()
                    } else {
                        msg
                    },
                })
            }
        }
    }
}
