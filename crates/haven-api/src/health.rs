// Health diagnostics payloads
//
// The `diagnostics/health` task produces a nested, role-dependent tree:
// four shapes share a common envelope (product/build identity,
// timestamps, disk usage) extended with role-specific error blocks and
// peer lists. Each payload is decoded ONCE into these types at the task
// boundary; every subtree is optional because its presence depends on
// which appliance role produced the report. Absent subtrees are `None`
// or empty -- never errors.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// Per-subsystem error block (`{code, msg, args, stacktrace}`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub stacktrace: Option<String>,
}

/// Common health envelope shared by every appliance role.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthInfo {
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub build_version: Option<String>,
    #[serde(default)]
    pub build_date: Option<f64>,
    #[serde(default)]
    pub instance_id: Option<String>,
    #[serde(default)]
    pub runtime_id: Option<String>,
    #[serde(default)]
    pub current_time: Option<f64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub service_boot_timestamp: Option<i64>,
    #[serde(default)]
    pub appliance_boot_timestamp: Option<f64>,
    /// Mount point -> used bytes.
    #[serde(default)]
    pub disk_usage: BTreeMap<String, i64>,
    #[serde(default)]
    pub ls_error: Option<HealthError>,
    #[serde(default)]
    pub db_error: Option<HealthError>,
    #[serde(default)]
    pub ntp_error: Option<HealthError>,
}

/// A peer entry carrying a bare `id` (online/offline peer lists).
#[derive(Debug, Clone, Deserialize)]
pub struct PeerRef {
    #[serde(default)]
    pub id: Option<String>,
}

/// The tunnel service identity nested in a connectivity probe.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TunnelService {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub certificate: Option<String>,
}

/// One entry of the `tunnelConnectivity` list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TunnelProbe {
    #[serde(default)]
    pub tunnel_service: Option<TunnelService>,
    #[serde(default)]
    pub error: Option<HealthError>,
}

/// Health report of a manager-role service.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerHealth {
    #[serde(flatten)]
    pub info: HealthInfo,
    #[serde(default)]
    pub sso_admin_error: Option<HealthError>,
    #[serde(default)]
    pub local_replicators_ls_mismatch: Option<HealthError>,
    #[serde(default)]
    pub tunnel_connectivity: Option<Vec<TunnelProbe>>,
    #[serde(default)]
    pub online_replicators: Option<Vec<PeerRef>>,
    #[serde(default)]
    pub offline_replicators: Option<Vec<PeerRef>>,
    #[serde(default)]
    pub local_replicators_health: Option<Vec<ReplicatorHealth>>,
}

/// Health report of a cloud-role service. Nests the manager report when
/// the appliance runs a combined deployment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudHealth {
    #[serde(flatten)]
    pub info: HealthInfo,
    #[serde(default)]
    pub vcd_error: Option<HealthError>,
    #[serde(default)]
    pub manager_error: Option<HealthError>,
    #[serde(default)]
    pub tunnel_connectivity: Option<Vec<TunnelProbe>>,
    #[serde(default)]
    pub manager_health: Option<ManagerHealth>,
}

/// Health report of a replicator-role service, listed under its
/// manager's `localReplicatorsHealth`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicatorHealth {
    #[serde(flatten)]
    pub info: HealthInfo,
    #[serde(default)]
    pub lwd_error: Option<HealthError>,
    #[serde(default)]
    pub hbr_error: Option<HealthError>,
    #[serde(default)]
    pub h4dm_error: Option<HealthError>,
    #[serde(default)]
    pub online_managers: Option<Vec<PeerRef>>,
    #[serde(default)]
    pub offline_managers: Option<Vec<PeerRef>>,
}
