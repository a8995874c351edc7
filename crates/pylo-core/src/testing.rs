// In-memory firewall used by unit tests.
//
// Records every call into a journal shared by all fakes of a test, so
// ordering across both devices can be asserted.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use secrecy::SecretString;
use tokio::time::Instant;

use pylo_api::{CommitOutcome, Error, HaStatus, JobId, JobInfo};

use crate::api::FirewallApi;
use crate::config::DeviceCredentials;
use crate::model::{Device, Role};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Keygen,
    Set { xpath: String, element: String },
    Commit,
    JobStatus(JobId),
    HaState,
    SyncToRemote,
}

pub(crate) type Journal = Rc<RefCell<Vec<(String, Call)>>>;

/// Scripted answer to `show jobs`.
#[derive(Debug, Clone)]
pub(crate) enum JobReply {
    Info {
        status: &'static str,
        result: &'static str,
        progress: Option<u8>,
        details: Vec<String>,
    },
    /// HTTP 503 from the management plane.
    Transient,
}

/// Scripted answer to `show high-availability state`.
#[derive(Debug, Clone)]
pub(crate) enum HaReply {
    State(HaStatus),
    /// HTTP 503 from the management plane.
    Transient,
    /// Error envelope carrying the device message.
    Rejected(&'static str),
}

pub(crate) fn running(progress: u8) -> JobReply {
    JobReply::Info {
        status: "ACT",
        result: "PEND",
        progress: Some(progress),
        details: vec![],
    }
}

pub(crate) fn succeeded() -> JobReply {
    JobReply::Info {
        status: "FIN",
        result: "OK",
        progress: Some(100),
        details: vec![],
    }
}

pub(crate) fn failed(details: &[&str]) -> JobReply {
    JobReply::Info {
        status: "FIN",
        result: "FAIL",
        progress: None,
        details: details.iter().map(ToString::to_string).collect(),
    }
}

pub(crate) fn ha(local: &str, peer: &str, sync: &str) -> HaStatus {
    HaStatus {
        enabled: true,
        mode: Some("Active-Passive".into()),
        local_state: Some(local.into()),
        peer_state: Some(peer.into()),
        peer_connection: Some("up".into()),
        running_sync: Some(sync.into()),
    }
}

#[derive(Debug, Default)]
struct Script {
    auth_error: Option<String>,
    unreachable: bool,
    /// (xpath fragment, device message)
    rejections: Vec<(String, String)>,
    commits: VecDeque<CommitOutcome>,
    next_job: u64,
    /// The last entry repeats once the queue is down to one.
    jobs: VecDeque<JobReply>,
    ha: VecDeque<HaReply>,
    polls: Vec<Instant>,
}

pub(crate) struct FakeFirewall {
    host: String,
    journal: Journal,
    script: RefCell<Script>,
}

impl FakeFirewall {
    pub(crate) fn new(host: &str, journal: &Journal) -> Self {
        Self {
            host: host.to_string(),
            journal: Rc::clone(journal),
            script: RefCell::new(Script {
                next_job: 1,
                ..Script::default()
            }),
        }
    }

    pub(crate) fn reject_auth(self, message: &str) -> Self {
        self.script.borrow_mut().auth_error = Some(message.to_string());
        self
    }

    pub(crate) fn unreachable(self) -> Self {
        self.script.borrow_mut().unreachable = true;
        self
    }

    pub(crate) fn reject_xpath(self, fragment: &str, message: &str) -> Self {
        self.script
            .borrow_mut()
            .rejections
            .push((fragment.to_string(), message.to_string()));
        self
    }

    pub(crate) fn commits(self, outcomes: impl IntoIterator<Item = CommitOutcome>) -> Self {
        self.script.borrow_mut().commits.extend(outcomes);
        self
    }

    pub(crate) fn jobs(self, replies: impl IntoIterator<Item = JobReply>) -> Self {
        self.script.borrow_mut().jobs.extend(replies);
        self
    }

    pub(crate) fn ha_states(self, states: impl IntoIterator<Item = HaStatus>) -> Self {
        self.ha_replies(states.into_iter().map(HaReply::State))
    }

    pub(crate) fn ha_replies(self, replies: impl IntoIterator<Item = HaReply>) -> Self {
        self.script.borrow_mut().ha.extend(replies);
        self
    }

    pub(crate) fn poll_times(&self) -> Vec<Instant> {
        self.script.borrow().polls.clone()
    }

    fn record(&self, call: Call) {
        self.journal.borrow_mut().push((self.host.clone(), call));
    }
}

fn next_or_last<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

impl FirewallApi for FakeFirewall {
    fn host(&self) -> String {
        self.host.clone()
    }

    async fn authenticate(&mut self, _username: &str, _password: &SecretString) -> Result<(), Error> {
        self.record(Call::Keygen);
        let script = self.script.borrow();
        if script.unreachable {
            return Err(Error::Tls(format!("{} is unreachable", self.host)));
        }
        match &script.auth_error {
            Some(message) => Err(Error::Authentication {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    async fn set_config(&self, xpath: &str, element: &str) -> Result<(), Error> {
        self.record(Call::Set {
            xpath: xpath.to_string(),
            element: element.to_string(),
        });
        let script = self.script.borrow();
        match script.rejections.iter().find(|(frag, _)| xpath.contains(frag.as_str())) {
            Some((_, message)) => Err(Error::Api {
                code: Some("12".into()),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    async fn commit(&self) -> Result<CommitOutcome, Error> {
        self.record(Call::Commit);
        let mut script = self.script.borrow_mut();
        if let Some(outcome) = script.commits.pop_front() {
            return Ok(outcome);
        }
        let id = JobId(script.next_job);
        script.next_job += 1;
        Ok(CommitOutcome::Enqueued(id))
    }

    async fn job_status(&self, id: JobId) -> Result<JobInfo, Error> {
        self.record(Call::JobStatus(id));
        let mut script = self.script.borrow_mut();
        script.polls.push(Instant::now());
        match next_or_last(&mut script.jobs).unwrap_or_else(succeeded) {
            JobReply::Transient => Err(Error::Http {
                status: 503,
                body: "Service Unavailable".into(),
            }),
            JobReply::Info {
                status,
                result,
                progress,
                details,
            } => Ok(JobInfo {
                id,
                kind: Some("Commit".into()),
                status: status.into(),
                result: Some(result.into()),
                progress,
                details,
            }),
        }
    }

    async fn ha_state(&self) -> Result<HaStatus, Error> {
        self.record(Call::HaState);
        let mut script = self.script.borrow_mut();
        match next_or_last(&mut script.ha) {
            None => Ok(HaStatus::default()),
            Some(HaReply::State(status)) => Ok(status),
            Some(HaReply::Transient) => Err(Error::Http {
                status: 503,
                body: "Service Unavailable".into(),
            }),
            Some(HaReply::Rejected(message)) => Err(Error::Api {
                code: Some("17".into()),
                message: message.into(),
            }),
        }
    }

    async fn sync_to_remote(&self) -> Result<(), Error> {
        self.record(Call::SyncToRemote);
        Ok(())
    }
}

pub(crate) fn device(role: Role, api: FakeFirewall) -> Device<FakeFirewall> {
    let credentials = DeviceCredentials {
        host: api.host(),
        username: "admin".into(),
        password: SecretString::from("paloalto".to_string()),
    };
    Device::new(role, credentials, api)
}

/// Journal entries for `host`, in order.
pub(crate) fn calls_for(journal: &Journal, host: &str) -> Vec<Call> {
    journal
        .borrow()
        .iter()
        .filter(|(h, _)| h == host)
        .map(|(_, c)| c.clone())
        .collect()
}

/// xpaths of all `set` calls, across devices, in order.
pub(crate) fn set_xpaths(journal: &Journal) -> Vec<(String, String)> {
    journal
        .borrow()
        .iter()
        .filter_map(|(h, c)| match c {
            Call::Set { xpath, .. } => Some((h.clone(), xpath.clone())),
            _ => None,
        })
        .collect()
}
