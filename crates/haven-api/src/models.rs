// Appliance API request/response types.
//
// Field names follow the wire contract exactly (camelCase JSON keys).
// Response models use `#[serde(default)]` liberally because appliance
// builds are inconsistent about field presence, especially on older
// firmware.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Root password ────────────────────────────────────────────────────

/// Response of `GET /config/root-password-expired`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordExpiration {
    #[serde(default)]
    pub root_password_expired: bool,
    #[serde(default)]
    pub seconds_until_expiration: i64,
}

// ── License ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct LicenseRequest {
    pub key: String,
}

/// Response of `POST /license`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub is_licensed: bool,
    #[serde(default)]
    pub expiration_date: i64,
}

// ── Site identity ────────────────────────────────────────────────────

/// Manager-role body of `POST /config/site`.
#[derive(Debug, Serialize)]
pub struct SiteNameRequest {
    pub site: String,
}

/// Cloud-role body of `POST /config/site`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudSiteRequest {
    pub local_site: String,
    pub local_site_description: String,
}

/// Manager-role site configuration, returned by `GET /config`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub site: String,
    #[serde(default)]
    pub ls_url: String,
    #[serde(default)]
    pub ls_thumbprint: String,
    #[serde(default)]
    pub tunnel_url: String,
    #[serde(default)]
    pub tunnel_certificate: String,
}

/// Cloud-role site configuration, returned by `GET /config`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudSiteConfig {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub ls_url: String,
    #[serde(default)]
    pub ls_thumbprint: String,
    #[serde(default)]
    pub local_site: String,
    #[serde(default)]
    pub local_site_description: String,
    #[serde(default)]
    pub vcd_url: String,
    #[serde(default)]
    pub vcd_thumbprint: String,
    #[serde(default)]
    pub vcd_username: String,
    #[serde(default)]
    pub tunnel_url: String,
    #[serde(default)]
    pub tunnel_certificate: String,
    #[serde(default)]
    pub is_combined: bool,
}

// ── Endpoints ────────────────────────────────────────────────────────

/// Body of `POST /config/endpoints`. The API and management service
/// ports are fixed by the appliance; only the public API endpoint is
/// operator-configurable. Unset fields serialize as `null` -- the
/// endpoint expects the full record every time.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointRequest {
    pub api_address: Option<String>,
    pub api_port: i64,
    pub api_public_address: String,
    pub api_public_port: i64,
    pub mgmt_address: Option<String>,
    pub mgmt_port: i64,
    pub mgmt_public_address: Option<String>,
    pub mgmt_public_port: Option<i64>,
}

/// Response of `GET /config/endpoints`.
#[derive(Debug, Clone, Deserialize)]
pub struct Endpoints {
    pub configured: EndpointConfig,
    pub effective: EndpointConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfig {
    #[serde(default)]
    pub mgmt_address: Option<String>,
    #[serde(default)]
    pub mgmt_port: i64,
    #[serde(default)]
    pub mgmt_public_address: Option<String>,
    #[serde(default)]
    pub mgmt_public_port: Option<i64>,
    #[serde(default)]
    pub api_address: Option<String>,
    #[serde(default)]
    pub api_port: i64,
    #[serde(default)]
    pub api_public_address: String,
    #[serde(default)]
    pub api_public_port: i64,
}

// ── Lookup service ───────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct LookupServiceRequest {
    pub url: String,
    pub thumbprint: String,
}

/// Manager variant: the manager appliance authenticates to the lookup
/// service on the operator's behalf, so it needs SSO admin credentials.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerLookupServiceRequest {
    pub url: String,
    pub thumbprint: String,
    pub sso_admin_credentials: SsoAdminCredentials,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SsoAdminCredentials {
    pub sso_user: String,
    pub sso_password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupService {
    #[serde(default)]
    pub ls_url: String,
    #[serde(default)]
    pub ls_thumbprint: String,
}

/// Body of `POST /config/replicators/lookup-service` -- points a
/// replicator at the lookup service through the manager endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicatorLookupServiceRequest {
    pub ls_url: String,
    pub ls_thumbprint: String,
    pub api_url: String,
    pub api_thumbprint: String,
    pub root_password: String,
}

// ── Cloud Director ───────────────────────────────────────────────────

/// Body of `POST /config/vcloud`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudDirectorRequest {
    pub vcd_password: String,
    pub vcd_thumbprint: String,
    pub vcd_url: String,
    pub vcd_username: String,
}

// ── Replicators ──────────────────────────────────────────────────────

/// Connection details for a replicator appliance, shared by the add and
/// repair operations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicatorSettings {
    pub api_url: String,
    pub api_thumbprint: String,
    pub root_password: String,
    pub sso_user: String,
    pub sso_password: String,
}

/// Body of `POST /replicators`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddReplicatorRequest {
    pub description: String,
    pub owner: String,
    pub site: String,
    pub replicator_id: Option<String>,
    pub details: ReplicatorSettings,
}

/// A registered replicator, as listed by `GET /replicators`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Replicator {
    pub id: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub site: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub cert_thumbprint: String,
    #[serde(default)]
    pub pairing_cookie: Option<Value>,
    #[serde(default)]
    pub state: CommState,
    #[serde(default)]
    pub is_in_maintenance_mode: bool,
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub data_address: Option<String>,
    #[serde(default)]
    pub build_version: Option<String>,
}

/// Bidirectional communication state reported for replicators and
/// remote sites.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommState {
    #[serde(default)]
    pub incoming_comm_error: Option<Value>,
    #[serde(default)]
    pub outgoing_comm_error: Option<Value>,
}

// ── Tunnels ──────────────────────────────────────────────────────────

/// Body of `POST /config/tunnels`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TunnelRequest {
    pub certificate: String,
    pub root_password: String,
    pub url: String,
}

/// Response of `GET /config/tunnels`.
#[derive(Debug, Clone, Deserialize)]
pub struct Tunnels {
    #[serde(default)]
    pub tunnels: Vec<TunnelConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TunnelConfig {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub certificate: String,
}

// ── UI plugin / service state ────────────────────────────────────────

/// Response of `POST config/vsphere-ui/register`.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginStatus {
    #[serde(default)]
    pub status: String,
}

/// Response of `GET /config/is-configured`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IsServiceConfigured {
    #[serde(default)]
    pub is_configured: bool,
}

// ── Site pairing ─────────────────────────────────────────────────────

/// Cloud-to-cloud pairing body (`site` names the peer cloud site).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairCloudSiteRequest {
    pub api_thumbprint: String,
    pub api_url: String,
    pub description: String,
    pub site: String,
}

/// Cloud-to-vcenter pairing body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairVcenterSiteRequest {
    pub api_thumbprint: String,
    pub api_url: String,
    pub description: String,
}

/// Reference to a server-side task, as returned by the pairing and
/// health-trigger endpoints.
///
/// Decoded strictly: a 2xx response that lacks the `id` field is a
/// schema mismatch and surfaces as a decode error rather than a silent
/// nil identifier.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskRef {
    pub id: String,
}

/// A paired vCenter-role remote site, as listed by `GET /sites`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VcenterSite {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub site: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub api_public_url: String,
    #[serde(default)]
    pub api_thumbprint: String,
    #[serde(default)]
    pub is_local: bool,
    #[serde(default)]
    pub state: CommState,
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub is_provider_deployment: bool,
    #[serde(default)]
    pub peer_tunnel_cert: Option<Value>,
}

/// A paired cloud-role remote site, as listed by `GET /sites`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudSite {
    #[serde(default)]
    pub site: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub api_public_url: String,
    #[serde(default)]
    pub api_thumbprint: String,
    #[serde(default)]
    pub is_local: bool,
    #[serde(default)]
    pub state: CommState,
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub build_version: String,
}

// ── Tasks ────────────────────────────────────────────────────────────

/// Lifecycle state of a server-side asynchronous task.
///
/// QUEUED and RUNNING are retryable (the poller sleeps and re-fetches);
/// FAILED is terminal-and-fatal; anything else ends the wait
/// successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Queued,
    Running,
    Succeeded,
    Failed,
    #[serde(other)]
    Unknown,
}

/// A server-side asynchronous unit of work, fetched from `/tasks/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub workflow_info: Option<Value>,
    #[serde(default)]
    pub progress: i64,
    pub state: TaskState,
    #[serde(default)]
    pub last_updated: i64,
    #[serde(default)]
    pub start_time: i64,
    #[serde(default)]
    pub end_time: i64,
    #[serde(default)]
    pub result_type: Option<String>,
    /// Opaque payload whose shape depends on the operation that created
    /// the task; see [`Task::decode_result`].
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<TaskError>,
    #[serde(default)]
    pub warnings: Vec<Value>,
    #[serde(default)]
    pub site: String,
}

/// Error block carried by a FAILED task.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub stacktrace: String,
}

impl Task {
    /// Decode the opaque `result` payload into an operation-specific type.
    ///
    /// An absent result or a shape mismatch is a decode error carrying
    /// the raw payload.
    pub fn decode_result<T: serde::de::DeserializeOwned>(&self) -> Result<T, crate::error::Error> {
        let value = self
            .result
            .as_ref()
            .ok_or_else(|| crate::error::Error::Decode {
                message: format!("task {} has no result payload", self.id),
                body: String::new(),
            })?;
        serde_json::from_value(value.clone()).map_err(|e| crate::error::Error::Decode {
            message: format!("unexpected shape for task {} result: {e}", self.id),
            body: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_state_parses_wire_values() {
        let task: Task = serde_json::from_value(serde_json::json!({
            "id": "t-1",
            "state": "SUCCEEDED",
        }))
        .expect("minimal task decodes");
        assert_eq!(task.state, TaskState::Succeeded);

        let task: Task = serde_json::from_value(serde_json::json!({
            "id": "t-2",
            "state": "SOMETHING_NEW",
        }))
        .expect("unknown state decodes");
        assert_eq!(task.state, TaskState::Unknown);
    }

    #[test]
    fn task_ref_requires_id() {
        let ok: Result<TaskRef, _> = serde_json::from_str(r#"{"id":"task-9"}"#);
        assert_eq!(ok.expect("id present").id, "task-9");

        let missing: Result<TaskRef, _> = serde_json::from_str("{}");
        assert!(missing.is_err(), "missing id must not decode");
    }

    #[test]
    fn endpoint_request_serializes_nulls() {
        let req = EndpointRequest {
            api_address: None,
            api_port: 8443,
            api_public_address: "dr.example.com".into(),
            api_public_port: 443,
            mgmt_address: None,
            mgmt_port: 8046,
            mgmt_public_address: None,
            mgmt_public_port: None,
        };
        let value = serde_json::to_value(&req).expect("serializes");
        assert_eq!(value["apiAddress"], Value::Null);
        assert_eq!(value["mgmtPublicPort"], Value::Null);
        assert_eq!(value["apiPort"], 8443);
        assert_eq!(value["mgmtPort"], 8046);
    }
}
