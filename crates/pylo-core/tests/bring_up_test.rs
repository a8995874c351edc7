#![allow(clippy::unwrap_used)]
// End-to-end bring-up against two wiremock firewalls.

use std::time::Duration;

use secrecy::SecretString;
use strum::IntoEnumIterator;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pylo_api::PanClient;
use pylo_core::{
    CoreError, DeviceCredentials, HaPhase, NoProgress, PollSettings, RunContext, RunSettings,
    SyncSettings, TemplateKind, TemplateParams, TemplateSet, run,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn xml(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "application/xml")
}

async fn firewall(local: &str, peer: &str) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(body_string_contains("type=keygen"))
        .respond_with(xml(
            r#"<response status="success"><result><key>KEY==</key></result></response>"#,
        ))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("type=config"))
        .respond_with(xml(
            r#"<response status="success" code="20"><msg>command succeeded</msg></response>"#,
        ))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("type=commit"))
        .respond_with(xml(
            r#"<response status="success" code="19"><result><job>5</job></result></response>"#,
        ))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("type=op"))
        .and(body_string_contains("jobs"))
        .respond_with(xml(
            r#"<response status="success"><result><job><id>5</id><type>Commit</type><status>FIN</status><result>OK</result><progress>100</progress><details/></job></result></response>"#,
        ))
        .mount(&server)
        .await;

    let ha = format!(
        r#"<response status="success"><result><enabled>yes</enabled><group><mode>Active-Passive</mode><local-info><state>{local}</state></local-info><peer-info><state>{peer}</state><conn-status>up</conn-status></peer-info><running-sync>synchronized</running-sync></group></result></response>"#
    );
    Mock::given(method("POST"))
        .and(body_string_contains("type=op"))
        .and(body_string_contains("high-availability"))
        .respond_with(xml(&ha))
        .mount(&server)
        .await;

    server
}

fn credentials(uri: &str) -> DeviceCredentials {
    DeviceCredentials {
        host: uri.to_string(),
        username: "admin".into(),
        password: SecretString::from("paloalto".to_string()),
    }
}

fn client(uri: &str) -> PanClient {
    PanClient::with_client(reqwest::Client::new(), Url::parse(uri).unwrap())
}

fn templates() -> TemplateSet {
    let mut set = TemplateSet::new();
    for kind in TemplateKind::iter() {
        let source = match kind {
            TemplateKind::HaConfig => "<peer-ip>{peer_ip}</peer-ip>",
            TemplateKind::HaInterface => "<ha1><ip-address>{ha1_ip}</ip-address></ha1>",
            TemplateKind::StaticRoute => "<nexthop><ip-address>{next_hop}</ip-address></nexthop>",
            _ => "<entry name='lab'/>",
        };
        set.add_source(kind, source).unwrap();
    }
    set
}

fn settings() -> RunSettings {
    RunSettings {
        commit: PollSettings {
            interval: Duration::from_millis(10),
            timeout: Duration::from_secs(5),
        },
        sync: SyncSettings {
            interval: Duration::from_millis(10),
            attempts: 3,
        },
        ..RunSettings::default()
    }
}

async fn config_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| String::from_utf8_lossy(&r.body).contains("type=config"))
        .count()
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_full_bring_up() {
    let a = firewall("active", "passive").await;
    let b = firewall("passive", "active").await;

    let mut ctx = RunContext::new(
        vec![
            (credentials(&a.uri()), client(&a.uri())),
            (credentials(&b.uri()), client(&b.uri())),
        ],
        templates(),
        TemplateParams::new().with("next_hop", "203.0.113.1"),
        settings(),
    )
    .unwrap();

    let report = run(&mut ctx, &NoProgress).await.unwrap();

    assert_eq!(report.ha_phase, HaPhase::InSync);
    let active = client(&a.uri()).host();
    assert_eq!(report.active_host.as_deref(), Some(active.as_str()));
    // Primary: 2 HA ports + enable + group + interface + 6 steps.
    assert_eq!(config_requests(&a).await, 11);
    // Secondary: HA only.
    assert_eq!(config_requests(&b).await, 5);
}

#[tokio::test]
async fn test_unreachable_host_aborts_at_authentication() {
    let a = firewall("active", "passive").await;
    let dead = "http://127.0.0.1:9";

    let mut ctx = RunContext::new(
        vec![
            (credentials(&a.uri()), client(&a.uri())),
            (credentials(dead), client(dead)),
        ],
        templates(),
        TemplateParams::new().with("next_hop", "203.0.113.1"),
        settings(),
    )
    .unwrap();

    let failure = run(&mut ctx, &NoProgress).await.unwrap_err();

    assert!(
        matches!(failure.error, CoreError::Authentication { ref host, .. } if host == "127.0.0.1:9"),
        "{:?}",
        failure.error
    );
    assert_eq!(config_requests(&a).await, 0);
    assert_eq!(failure.report.steps.len(), 2);
}
