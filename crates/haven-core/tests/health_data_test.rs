#![allow(clippy::unwrap_used)]
// End-to-end health data-source flows: trigger, poll, decode, flatten.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use haven_api::{ApplianceClient, TaskPoller};
use haven_core::data::health;

const CERT: &str = "dGVzdC1jZXJ0aWZpY2F0ZQ==";

async fn setup(task_result: serde_json::Value) -> (MockServer, ApplianceClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = ApplianceClient::with_transport(
        reqwest::Client::new(),
        base_url,
        "admin",
        SecretString::from("secret"),
    );

    Mock::given(method("POST"))
        .and(path("/sessions"))
        .respond_with(ResponseTemplate::new(200).insert_header("X-Haven-Auth", "tok"))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/diagnostics/health"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"id": "health-1"})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/tasks/health-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "health-1",
            "state": "SUCCEEDED",
            "resultType": "HealthInfo",
            "result": task_result
        })))
        .mount(&server)
        .await;

    (server, client)
}

fn fast_poller() -> TaskPoller {
    TaskPoller::new(Duration::from_millis(10), Duration::from_secs(5))
}

#[tokio::test]
async fn manager_health_flattens_tunnel_ids_in_order() {
    let (_server, client) = setup(json!({
        "productName": "Haven Manager Service",
        "buildVersion": "4.7.1",
        "instanceId": "mgr-1",
        "tunnelConnectivity": [
            {"tunnelService": {"id": "t-3"}},
            {"tunnelService": {"id": "t-1"}},
            {"tunnelService": {"id": "t-2"}}
        ],
        "onlineReplicators": [{"id": "r-1"}],
        "offlineReplicators": []
    }))
    .await;

    let reconciled = health::manager_health(
        &client,
        CERT,
        None,
        &fast_poller(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(reconciled.id, "health-1");
    assert_eq!(
        reconciled.attributes["tunnels_ids"].as_str_list(),
        Some(&["t-3".to_owned(), "t-1".to_owned(), "t-2".to_owned()][..])
    );
    assert_eq!(
        reconciled.attributes["online_replicators_ids"].as_str_list(),
        Some(&["r-1".to_owned()][..])
    );
    assert_eq!(
        reconciled.attributes["product_name"].as_str(),
        Some("Haven Manager Service")
    );
}

#[tokio::test]
async fn manager_health_with_manager_id_reads_nested_section() {
    let (_server, client) = setup(json!({
        "productName": "Haven Cloud Service",
        "managerHealth": {
            "productName": "Haven Manager Service",
            "instanceId": "mgr-42",
            "tunnelConnectivity": [{"tunnelService": {"id": "t-9"}}]
        }
    }))
    .await;

    let reconciled = health::manager_health(
        &client,
        CERT,
        Some("mgr-42"),
        &fast_poller(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(
        reconciled.attributes["product_name"].as_str(),
        Some("Haven Manager Service")
    );
    assert_eq!(
        reconciled.attributes["tunnels_ids"].as_str_list(),
        Some(&["t-9".to_owned()][..])
    );
}

#[tokio::test]
async fn cloud_health_lifts_manager_id() {
    let (_server, client) = setup(json!({
        "productName": "Haven Cloud Service",
        "vcdError": {"code": "VCD_AUTH", "msg": "bad credentials"},
        "managerHealth": {"instanceId": "mgr-42"}
    }))
    .await;

    let reconciled = health::cloud_health(
        &client,
        CERT,
        &fast_poller(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(reconciled.attributes["manager_id"].as_str(), Some("mgr-42"));
    assert_eq!(
        reconciled.attributes["vcd_error_code"].as_str(),
        Some("VCD_AUTH")
    );
}

#[tokio::test]
async fn replicator_health_finds_instance_nested_under_cloud_report() {
    let (_server, client) = setup(json!({
        "productName": "Haven Cloud Service",
        "managerHealth": {
            "instanceId": "mgr-1",
            "localReplicatorsHealth": [
                {"instanceId": "r-1", "lwdError": {"code": "LWD_DOWN"}},
                {"instanceId": "r-2"}
            ]
        }
    }))
    .await;

    let reconciled = health::replicator_health(
        &client,
        CERT,
        "r-1",
        &fast_poller(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(reconciled.attributes["instance_id"].as_str(), Some("r-1"));
    assert_eq!(
        reconciled.attributes["lwd_error_code"].as_str(),
        Some("LWD_DOWN")
    );
}

#[tokio::test]
async fn replicator_health_missing_instance_is_not_found() {
    let (_server, client) = setup(json!({
        "localReplicatorsHealth": [{"instanceId": "r-1"}]
    }))
    .await;

    let err = health::replicator_health(
        &client,
        CERT,
        "r-9",
        &fast_poller(),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(
        matches!(err, haven_core::CoreError::NotFound { .. }),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn tunnel_connectivity_locates_probe_by_service_id() {
    let (_server, client) = setup(json!({
        "tunnelConnectivity": [
            {"tunnelService": {"id": "t-1", "url": "https://a.example.com"}},
            {
                "tunnelService": {"id": "t-2", "url": "https://b.example.com"},
                "error": {"code": "TUNNEL_TLS", "msg": "handshake failed"}
            }
        ]
    }))
    .await;

    let reconciled = health::tunnel_connectivity(
        &client,
        CERT,
        "t-2",
        &fast_poller(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(
        reconciled.attributes["tunnel_service_error_code"].as_str(),
        Some("TUNNEL_TLS")
    );
}

#[tokio::test]
async fn failed_health_task_carries_remote_error() {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = ApplianceClient::with_transport(
        reqwest::Client::new(),
        base_url,
        "admin",
        SecretString::from("secret"),
    );

    Mock::given(method("POST"))
        .and(path("/sessions"))
        .respond_with(ResponseTemplate::new(200).insert_header("X-Haven-Auth", "tok"))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/diagnostics/health"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"id": "health-2"})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/tasks/health-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "health-2",
            "state": "FAILED",
            "error": {"code": "DiagnosticsFailed", "msg": "collector crashed"}
        })))
        .mount(&server)
        .await;

    let err = health::cloud_health(
        &client,
        CERT,
        &fast_poller(),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    match err {
        haven_core::CoreError::TaskFailed { code, message } => {
            assert_eq!(code, "DiagnosticsFailed");
            assert_eq!(message, "collector crashed");
        }
        other => panic!("expected TaskFailed, got: {other:?}"),
    }
}
