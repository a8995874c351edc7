#![allow(clippy::unwrap_used)]
// Integration tests for `PanClient` using wiremock.

use secrecy::SecretString;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pylo_api::{CommitOutcome, Error, JobId, PanClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, PanClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = PanClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

async fn authenticated() -> (MockServer, PanClient) {
    let (server, mut client) = setup().await;
    client.set_api_key(SecretString::from("LUFRPT1key==".to_string()));
    (server, client)
}

fn xml(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "application/xml")
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_keygen_success_stores_key() {
    let (server, mut client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(body_string_contains("type=keygen"))
        .and(body_string_contains("user=admin"))
        .respond_with(xml(
            r#"<response status="success"><result><key>LUFRPT1key==</key></result></response>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let password = SecretString::from("paloalto".to_string());
    client.generate_api_key("admin", &password).await.unwrap();
    assert!(client.is_authenticated());
}

#[tokio::test]
async fn test_keygen_bad_credentials() {
    let (server, mut client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(body_string_contains("type=keygen"))
        .respond_with(
            ResponseTemplate::new(403).set_body_string(
                r#"<response status="error" code="403"><result><msg>Invalid Credential</msg></result></response>"#,
            ),
        )
        .mount(&server)
        .await;

    let password = SecretString::from("wrong".to_string());
    let result = client.generate_api_key("admin", &password).await;

    match result {
        Err(Error::Authentication { ref message }) => {
            assert!(message.contains("Invalid Credential"), "got: {message}");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_keygen_unreachable_host_is_transport_error() {
    // Port 9 (discard) on localhost is not listening in CI sandboxes.
    let mut client = PanClient::with_client(
        reqwest::Client::new(),
        Url::parse("http://127.0.0.1:9").unwrap(),
    );
    let password = SecretString::from("paloalto".to_string());
    let err = client.generate_api_key("admin", &password).await.unwrap_err();
    assert!(err.is_unreachable(), "expected connect error, got: {err:?}");
}

#[tokio::test]
async fn test_keyed_call_without_key_is_rejected_locally() {
    let (server, client) = setup().await;

    let err = client.commit().await.unwrap_err();
    assert!(matches!(err, Error::MissingApiKey));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_debug_output_hides_password_and_key() {
    let (server, mut client) = setup().await;

    Mock::given(method("POST"))
        .and(body_string_contains("type=keygen"))
        .respond_with(xml(
            r#"<response status="success"><result><key>SECRETKEY==</key></result></response>"#,
        ))
        .mount(&server)
        .await;

    let password = SecretString::from("hunter2-secret".to_string());
    client.generate_api_key("admin", &password).await.unwrap();

    let rendered = format!("{client:?} {password:?}");
    assert!(!rendered.contains("SECRETKEY"), "key leaked: {rendered}");
    assert!(!rendered.contains("hunter2-secret"), "password leaked: {rendered}");
}

// ── Config tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_set_config_sends_key_header_and_xpath() {
    let (server, client) = authenticated().await;

    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(header("X-PAN-KEY", "LUFRPT1key=="))
        .and(body_string_contains("type=config"))
        .and(body_string_contains("action=set"))
        .and(body_string_contains("vsys1"))
        .respond_with(xml(
            r#"<response status="success" code="20"><msg>command succeeded</msg></response>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    client
        .set_config(
            "/config/devices/entry[@name='localhost.localdomain']/vsys/entry[@name='vsys1']/zone",
            "<entry name='trust'><network><layer3/></network></entry>",
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_set_config_rejection_carries_device_message() {
    let (server, client) = authenticated().await;

    Mock::given(method("POST"))
        .and(path("/api/"))
        .respond_with(xml(
            r#"<response status="error" code="12"><msg><line><![CDATA[ zone -> trust -> network is invalid]]></line></msg></response>"#,
        ))
        .mount(&server)
        .await;

    let err = client.set_config("/config", "<bad/>").await.unwrap_err();
    match err {
        Error::Api { code, message } => {
            assert_eq!(code.as_deref(), Some("12"));
            assert_eq!(message, "zone -> trust -> network is invalid");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_http_error_without_envelope() {
    let (server, client) = authenticated().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = client.set_config("/config", "<x/>").await.unwrap_err();
    assert!(matches!(err, Error::Http { status: 502, .. }));
    assert!(err.is_transient());
}

// ── Commit & job tests ──────────────────────────────────────────────

#[tokio::test]
async fn test_commit_returns_job_id() {
    let (server, client) = authenticated().await;

    Mock::given(method("POST"))
        .and(body_string_contains("type=commit"))
        .respond_with(xml(
            r#"<response status="success" code="19"><result><msg><line>Commit job enqueued with jobid 7</line></msg><job>7</job></result></response>"#,
        ))
        .mount(&server)
        .await;

    assert_eq!(
        client.commit().await.unwrap(),
        CommitOutcome::Enqueued(JobId(7))
    );
}

#[tokio::test]
async fn test_commit_with_no_changes() {
    let (server, client) = authenticated().await;

    Mock::given(method("POST"))
        .and(body_string_contains("type=commit"))
        .respond_with(xml(
            r#"<response status="success" code="19"><msg>There are no changes to commit.</msg></response>"#,
        ))
        .mount(&server)
        .await;

    assert_eq!(client.commit().await.unwrap(), CommitOutcome::NothingToCommit);
}

#[tokio::test]
async fn test_commit_without_job_id_is_an_error() {
    let (server, client) = authenticated().await;

    Mock::given(method("POST"))
        .and(body_string_contains("type=commit"))
        .respond_with(xml(
            r#"<response status="success" code="13"><msg>Another commit is being performed. Please try again later</msg></response>"#,
        ))
        .mount(&server)
        .await;

    match client.commit().await {
        Err(Error::Api { code, message }) => {
            assert_eq!(code.as_deref(), Some("13"));
            assert!(message.contains("Another commit"), "got: {message}");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_job_status_running() {
    let (server, client) = authenticated().await;

    Mock::given(method("POST"))
        .and(body_string_contains("type=op"))
        .and(body_string_contains("jobs"))
        .respond_with(xml(
            r#"<response status="success"><result><job>
                <tenq>2024/05/01 10:00:00</tenq>
                <id>7</id><type>Commit</type><status>ACT</status>
                <result>PEND</result><progress>55</progress>
                <details/>
            </job></result></response>"#,
        ))
        .mount(&server)
        .await;

    let job = client.job_status(JobId(7)).await.unwrap();
    assert_eq!(job.id, JobId(7));
    assert_eq!(job.kind.as_deref(), Some("Commit"));
    assert_eq!(job.status, "ACT");
    assert_eq!(job.progress, Some(55));
    assert!(job.details.is_empty());
}

#[tokio::test]
async fn test_job_status_finished_with_failure_details() {
    let (server, client) = authenticated().await;

    Mock::given(method("POST"))
        .and(body_string_contains("type=op"))
        .respond_with(xml(
            r#"<response status="success"><result><job>
                <id>8</id><type>Commit</type><status>FIN</status>
                <result>FAIL</result><progress>2024/05/01 10:01:00</progress>
                <details><line>Validation Error:</line><line>rulebase -> nat is invalid</line></details>
            </job></result></response>"#,
        ))
        .mount(&server)
        .await;

    let job = client.job_status(JobId(8)).await.unwrap();
    assert_eq!(job.status, "FIN");
    assert_eq!(job.result.as_deref(), Some("FAIL"));
    assert_eq!(job.progress, Some(100));
    assert_eq!(
        job.details,
        vec!["Validation Error:", "rulebase -> nat is invalid"]
    );
}

// ── HA tests ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ha_state_passive_member() {
    let (server, client) = authenticated().await;

    Mock::given(method("POST"))
        .and(body_string_contains("high-availability"))
        .respond_with(xml(
            r#"<response status="success"><result><enabled>yes</enabled><group>
                <mode>Active-Passive</mode>
                <local-info><state>passive</state></local-info>
                <peer-info><state>active</state><conn-status>up</conn-status></peer-info>
                <running-sync>synchronization in progress</running-sync>
            </group></result></response>"#,
        ))
        .mount(&server)
        .await;

    let ha = client.ha_state().await.unwrap();
    assert!(ha.enabled);
    assert_eq!(ha.local_state.as_deref(), Some("passive"));
    assert_eq!(ha.peer_state.as_deref(), Some("active"));
    assert_eq!(ha.running_sync.as_deref(), Some("synchronization in progress"));
}

#[tokio::test]
async fn test_sync_to_remote() {
    let (server, client) = authenticated().await;

    Mock::given(method("POST"))
        .and(body_string_contains("sync-to-remote"))
        .respond_with(xml(
            r#"<response status="success"><result>Successfully synchronized running configuration</result></response>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    client.sync_to_remote().await.unwrap();
}
