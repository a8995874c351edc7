// Operational commands: raw `type=op` and job status

use tracing::debug;

use crate::client::{PanClient, RequestSummary};
use crate::error::Error;
use crate::models::{JobId, JobInfo, JobsResult};
use crate::xml;

impl PanClient {
    /// Run an operational command and return the raw response body.
    ///
    /// `POST /api/` with `type=op&cmd=<xml command>`
    pub async fn op(&self, cmd: &str) -> Result<String, Error> {
        let summary = RequestSummary {
            kind: "op",
            action: None,
            xpath: None,
            cmd: Some(cmd.to_string()),
        };
        self.call(&summary, &[("type", "op"), ("cmd", cmd)]).await
    }

    /// Query one job.
    ///
    /// `type=op` with `<show><jobs><id>N</id></jobs></show>`
    pub async fn job_status(&self, id: JobId) -> Result<JobInfo, Error> {
        let cmd = format!("<show><jobs><id>{id}</id></jobs></show>");
        let body = self.op(&cmd).await?;

        let raw = xml::parse_result::<JobsResult>(&body)?
            .map(|r| r.job)
            .ok_or_else(|| Error::Deserialization {
                message: format!("job {id} missing from response"),
                body: body.clone(),
            })?;

        let finished = raw.status == "FIN";
        let progress = raw
            .progress
            .as_deref()
            .and_then(|p| p.trim().parse::<u8>().ok())
            .or(if finished { Some(100) } else { None });

        let info = JobInfo {
            id: raw.id.parse().unwrap_or(id),
            kind: raw.kind,
            status: raw.status,
            result: raw.result,
            progress,
            details: xml::collect_lines(&body, "details"),
        };
        debug!(
            host = %self.host(),
            job = %info.id,
            status = %info.status,
            progress = ?info.progress,
            "job status"
        );
        Ok(info)
    }
}
