#![allow(clippy::unwrap_used)]
// End-to-end resource flows against a wiremock appliance.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use haven_api::{ApplianceClient, TaskPoller};
use haven_core::resource::{cloud_manager, manager, pair_site, password, replicator, tunnel};

const CERT: &str = "dGVzdC1jZXJ0aWZpY2F0ZQ==";

async fn setup() -> (MockServer, ApplianceClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = ApplianceClient::with_transport(
        reqwest::Client::new(),
        base_url,
        "admin",
        SecretString::from("old-pass"),
    );

    Mock::given(method("POST"))
        .and(path("/sessions"))
        .respond_with(ResponseTemplate::new(200).insert_header("X-Haven-Auth", "tok"))
        .mount(&server)
        .await;

    (server, client)
}

fn fast_poller() -> TaskPoller {
    TaskPoller::new(Duration::from_millis(10), Duration::from_secs(5))
}

// ── Password ────────────────────────────────────────────────────────

#[tokio::test]
async fn password_rotation_updates_connection_and_reads_expiration() {
    let (server, mut client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/config/root-password"))
        .and(body_partial_json(json!({"rootPassword": "n3w-pass"})))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/config/root-password-expired"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rootPasswordExpired": false,
            "secondsUntilExpiration": 86400
        })))
        .mount(&server)
        .await;

    let desired = password::PasswordDesired {
        appliance_address: client.host().to_owned(),
        current_password: SecretString::from("old-pass"),
        new_password: Some(SecretString::from("n3w-pass")),
        password_file: None,
        service_cert: CERT.into(),
    };

    let reconciled = password::create(&mut client, &desired).await.unwrap();

    assert!(!reconciled.id.is_empty());
    assert_eq!(
        reconciled.attributes["root_password_expired"].as_bool(),
        Some(false)
    );
    assert_eq!(
        reconciled.attributes["seconds_until_expiration"].as_int(),
        Some(86400)
    );
    assert_eq!(client.local_password().expose_secret(), "n3w-pass");
}

// ── Cloud manager ───────────────────────────────────────────────────

#[tokio::test]
async fn cloud_manager_create_runs_the_full_provisioning_flow() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/license"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "key": "ABCDE-1234", "isLicensed": true, "expirationDate": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/config/site"))
        .and(body_partial_json(json!({"localSite": "cloud-east"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "site-cfg-1", "localSite": "cloud-east"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/config/endpoints"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "configured": endpoint_block(),
            "effective": endpoint_block()
        })))
        .expect(1)
        .mount(&server)
        .await;

    // The bare thumbprint must be normalized to the SHA-256: form.
    Mock::given(method("POST"))
        .and(path("/config/vcloud"))
        .and(body_partial_json(json!({
            "vcdUrl": "https://vcd.example.com/api",
            "vcdThumbprint": "SHA-256:AB:CD"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "site-cfg-1"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/config/lookup-service"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "lsUrl": "https://ls.example.com/lookupservice/sdk",
            "lsThumbprint": "SHA-256:EF"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/config/is-configured"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"isConfigured": true})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "site-cfg-1",
            "lsUrl": "https://ls.example.com/lookupservice/sdk",
            "lsThumbprint": "SHA-256:EF",
            "localSite": "cloud-east",
            "localSiteDescription": "east region",
            "vcdUrl": "https://vcd.example.com/api",
            "vcdThumbprint": "SHA-256:AB:CD",
            "vcdUsername": "administrator",
            "tunnelUrl": "https://tunnel.example.com:8047",
            "tunnelCertificate": "MIIB...",
            "isCombined": true
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/config/endpoints"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "configured": endpoint_block(),
            "effective": endpoint_block()
        })))
        .mount(&server)
        .await;

    let desired = cloud_manager::CloudManagerDesired {
        service_cert: CERT.into(),
        license_key: "ABCDE-1234".into(),
        site_name: "cloud-east".into(),
        site_description: "east region".into(),
        public_endpoint_address: "dr.example.com".into(),
        public_endpoint_port: 443,
        cloud_director_url: "https://vcd.example.com".into(),
        cloud_director_username: "administrator".into(),
        cloud_director_password: SecretString::from("vcd-pass"),
        cloud_director_thumbprint: "AB:CD".into(),
        lookup_service_url: "https://ls.example.com/lookupservice/sdk".into(),
        lookup_service_thumbprint: "SHA-256:EF".into(),
    };

    let reconciled = cloud_manager::create(
        &client,
        &desired,
        &fast_poller(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(reconciled.id, "site-cfg-1");
    assert_eq!(reconciled.attributes["is_licensed"].as_bool(), Some(true));
    assert_eq!(reconciled.attributes["expiration_date"].as_int(), Some(0));
    assert_eq!(reconciled.attributes["local_site"].as_str(), Some("cloud-east"));
    assert_eq!(reconciled.attributes["is_combined"].as_bool(), Some(true));
    assert_eq!(
        reconciled.attributes["api_public_address"].as_str(),
        Some("dr.example.com")
    );
}

fn endpoint_block() -> serde_json::Value {
    json!({
        "mgmtAddress": null,
        "mgmtPort": 8046,
        "mgmtPublicAddress": null,
        "mgmtPublicPort": null,
        "apiAddress": null,
        "apiPort": 8443,
        "apiPublicAddress": "dr.example.com",
        "apiPublicPort": 443
    })
}

// ── Manager ─────────────────────────────────────────────────────────

#[tokio::test]
async fn manager_create_registers_plugin_and_reads_site() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/license"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "key": "K", "isLicensed": true, "expirationDate": 1893456000
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/config/site"))
        .and(body_partial_json(json!({"site": "dc-east"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "site-cfg-9", "site": "dc-east"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/config/lookup-service"))
        .and(body_partial_json(json!({
            "ssoAdminCredentials": {"ssoUser": "administrator@vsphere.local"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "lsUrl": "https://ls.example.com/lookupservice/sdk",
            "lsThumbprint": "SHA-256:EF"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/config/vsphere-ui/register"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "REGISTERED"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "site-cfg-9",
            "site": "dc-east",
            "lsUrl": "https://ls.example.com/lookupservice/sdk",
            "lsThumbprint": "SHA-256:EF",
            "tunnelUrl": "https://tunnel.example.com:8047",
            "tunnelCertificate": "MIIB..."
        })))
        .mount(&server)
        .await;

    let desired = manager::ManagerDesired {
        service_cert: CERT.into(),
        license_key: "K".into(),
        site_name: "dc-east".into(),
        lookup_service_url: "https://ls.example.com/lookupservice/sdk".into(),
        lookup_service_thumbprint: "SHA-256:EF".into(),
        sso_user: "administrator@vsphere.local".into(),
        sso_password: SecretString::from("sso-pass"),
    };

    let reconciled = manager::create(&client, &desired).await.unwrap();

    assert_eq!(reconciled.id, "site-cfg-9");
    assert_eq!(reconciled.attributes["site"].as_str(), Some("dc-east"));
    assert_eq!(
        reconciled.attributes["tunnel_url"].as_str(),
        Some("https://tunnel.example.com:8047")
    );
    assert_eq!(
        reconciled.attributes["tunnel_certificate"].as_str(),
        Some("MIIB...")
    );
}

#[tokio::test]
async fn manager_delete_unregisters_plugin() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/config/vsphere-ui/unregister"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let desired = manager::ManagerDesired {
        service_cert: CERT.into(),
        license_key: String::new(),
        site_name: String::new(),
        lookup_service_url: String::new(),
        lookup_service_thumbprint: String::new(),
        sso_user: "administrator@vsphere.local".into(),
        sso_password: SecretString::from("sso-pass"),
    };

    manager::delete(&client, &desired).await.unwrap();
}

// ── Replicator ──────────────────────────────────────────────────────

#[tokio::test]
async fn replicator_create_bootstraps_lookup_service_then_registers() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/config/replicators/lookup-service"))
        .and(body_partial_json(json!({"rootPassword": "root-pass"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "lsUrl": "https://ls.example.com/lookupservice/sdk",
            "lsThumbprint": "SHA-256:EF"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/replicators"))
        .and(body_partial_json(json!({
            "owner": "org-1",
            "site": "cloud-east",
            "replicatorId": null
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "rep-1",
            "apiUrl": "https://replicator.example.com:8043",
            "isInMaintenanceMode": false,
            "dataAddress": "10.0.0.9",
            "buildVersion": "4.7.1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/replicators"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "rep-1",
            "apiUrl": "https://replicator.example.com:8043",
            "isInMaintenanceMode": false,
            "dataAddress": "10.0.0.9",
            "buildVersion": "4.7.1"
        }])))
        .mount(&server)
        .await;

    let desired = replicator::ReplicatorDesired {
        service_cert: CERT.into(),
        lookup_service_url: "https://ls.example.com/lookupservice/sdk".into(),
        lookup_service_thumbprint: "SHA-256:EF".into(),
        api_url: "https://replicator.example.com:8043".into(),
        api_thumbprint: "SHA-256:AA".into(),
        root_password: SecretString::from("root-pass"),
        sso_user: "administrator@vsphere.local".into(),
        sso_password: SecretString::from("sso-pass"),
        description: "east replicator".into(),
        owner: "org-1".into(),
        site_name: "cloud-east".into(),
    };

    let reconciled = replicator::create(&client, &desired).await.unwrap();

    assert_eq!(reconciled.id, "rep-1");
    assert_eq!(
        reconciled.attributes["replicator_ls_url"].as_str(),
        Some("https://ls.example.com/lookupservice/sdk")
    );
    assert_eq!(
        reconciled.attributes["is_in_maintenance_mode"].as_bool(),
        Some(false)
    );
    assert_eq!(reconciled.attributes["data_address"].as_str(), Some("10.0.0.9"));
    assert_eq!(reconciled.attributes["build_version"].as_str(), Some("4.7.1"));
}

// ── Tunnel ──────────────────────────────────────────────────────────

#[tokio::test]
async fn tunnel_create_registers_and_reads_back() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/config/tunnels"))
        .and(body_partial_json(json!({"url": "https://tunnel.example.com:8047"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "tun-1",
            "url": "https://tunnel.example.com:8047",
            "certificate": "MIIB..."
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/config/tunnels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tunnels": [
                {"id": "tun-0", "url": "https://other.example.com:8047", "certificate": "X"},
                {"id": "tun-1", "url": "https://tunnel.example.com:8047", "certificate": "MIIB..."}
            ]
        })))
        .mount(&server)
        .await;

    let desired = tunnel::TunnelDesired {
        service_cert: CERT.into(),
        url: "https://tunnel.example.com:8047".into(),
        certificate: "MIIB...".into(),
        root_password: SecretString::from("root-pass"),
    };

    let reconciled = tunnel::create(&client, &desired).await.unwrap();

    assert_eq!(reconciled.id, "tun-1");
    assert_eq!(
        reconciled.attributes["tunnel_url"].as_str(),
        Some("https://tunnel.example.com:8047")
    );
}

// ── Site pairing ────────────────────────────────────────────────────

#[tokio::test]
async fn pair_site_create_polls_task_then_reads_peer() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/sites"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"id": "task-5"})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/tasks/task-5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "task-5", "state": "SUCCEEDED"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "site-7",
            "site": "dc-west",
            "description": "west peer",
            "apiPublicUrl": "https://west.example.com",
            "apiVersion": "4.7",
            "isProviderDeployment": true
        }])))
        .mount(&server)
        .await;

    let desired = pair_site::PairSiteDesired {
        service_cert: CERT.into(),
        api_thumbprint: "SHA-256:AA".into(),
        api_url: "https://west.example.com".into(),
        pairing_description: "west peer".into(),
        site: None,
    };

    let reconciled = pair_site::create(
        &client,
        &desired,
        &fast_poller(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(reconciled.id, "task-5");
    assert_eq!(reconciled.attributes["site_id"].as_str(), Some("site-7"));
    assert_eq!(reconciled.attributes["site_name"].as_str(), Some("dc-west"));
    assert_eq!(
        reconciled.attributes["is_provider_deployment"].as_bool(),
        Some(true)
    );
}

#[tokio::test]
async fn pair_site_failed_task_surfaces_code_and_message() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/sites"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"id": "task-6"})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/tasks/task-6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "task-6",
            "state": "FAILED",
            "error": {"code": "ThumbprintMismatch", "msg": "peer thumbprint changed"}
        })))
        .mount(&server)
        .await;

    let desired = pair_site::PairSiteDesired {
        service_cert: CERT.into(),
        api_thumbprint: "SHA-256:AA".into(),
        api_url: "https://west.example.com".into(),
        pairing_description: String::new(),
        site: None,
    };

    let err = pair_site::create(
        &client,
        &desired,
        &fast_poller(),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    match err {
        haven_core::CoreError::TaskFailed { code, message } => {
            assert_eq!(code, "ThumbprintMismatch");
            assert_eq!(message, "peer thumbprint changed");
        }
        other => panic!("expected TaskFailed, got: {other:?}"),
    }
}
