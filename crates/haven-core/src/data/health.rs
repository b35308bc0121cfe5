// Health data sources
//
// Every health read follows the same rhythm: trigger a diagnostics
// task, poll it to completion, decode the role-specific payload from
// the task result, then project it into flat attributes. The task id
// doubles as the data source's identity.
//
// Projection rules: envelope scalars are copied when present, error
// blocks become `<prefix>_error_*` keys when their subtree exists, and
// peer-list subtrees always produce a list attribute -- empty when the
// subtree is absent -- in payload order.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use haven_api::health::{
    CloudHealth, HealthError, HealthInfo, ManagerHealth, PeerRef, ReplicatorHealth, TunnelProbe,
};
use haven_api::models::Task;
use haven_api::{ApplianceClient, TaskPoller};

use crate::attributes::{AttrValue, Attributes};
use crate::error::CoreError;
use crate::resource::Reconciled;

// ── Data sources ─────────────────────────────────────────────────────

/// Health of a manager-role service.
///
/// `manager_id` marks the report as coming from a combined appliance:
/// when supplied, the manager section is read from under the cloud
/// payload instead of the payload root.
pub async fn manager_health(
    client: &ApplianceClient,
    service_cert: &str,
    manager_id: Option<&str>,
    poller: &TaskPoller,
    cancel: &CancellationToken,
) -> Result<Reconciled, CoreError> {
    let task = run_health_task(client, service_cert, poller, cancel).await?;

    let attributes = if manager_id.is_some() {
        let cloud: CloudHealth = task.decode_result()?;
        let manager = cloud.manager_health.ok_or_else(|| {
            CoreError::Internal("health report has no nested manager section".into())
        })?;
        flatten_manager_health(&manager)
    } else {
        let manager: ManagerHealth = task.decode_result()?;
        flatten_manager_health(&manager)
    };

    Ok(Reconciled {
        id: task.id,
        attributes,
    })
}

/// Health of a cloud-role service.
pub async fn cloud_health(
    client: &ApplianceClient,
    service_cert: &str,
    poller: &TaskPoller,
    cancel: &CancellationToken,
) -> Result<Reconciled, CoreError> {
    let task = run_health_task(client, service_cert, poller, cancel).await?;

    let cloud: CloudHealth = task.decode_result()?;
    Ok(Reconciled {
        id: task.id,
        attributes: flatten_cloud_health(&cloud),
    })
}

/// Health of one replicator, located by instance id.
///
/// The replicator list lives at the payload root on a manager report
/// and under the nested manager section on a cloud report; both spots
/// are tried in that order.
pub async fn replicator_health(
    client: &ApplianceClient,
    service_cert: &str,
    replicator_id: &str,
    poller: &TaskPoller,
    cancel: &CancellationToken,
) -> Result<Reconciled, CoreError> {
    let task = run_health_task(client, service_cert, poller, cancel).await?;

    let manager: ManagerHealth = task.decode_result()?;
    let replicator = if let Some(list) = &manager.local_replicators_health {
        find_replicator(list, replicator_id)?.clone()
    } else {
        let cloud: CloudHealth = task.decode_result()?;
        let nested = cloud.manager_health.ok_or_else(|| {
            CoreError::Internal("health report has no nested manager section".into())
        })?;
        let list = nested.local_replicators_health.ok_or_else(|| {
            CoreError::Internal("health report has no replicator section".into())
        })?;
        find_replicator(&list, replicator_id)?.clone()
    };

    Ok(Reconciled {
        id: task.id,
        attributes: flatten_replicator_health(&replicator),
    })
}

/// Connectivity of one tunnel, located by tunnel service id.
pub async fn tunnel_connectivity(
    client: &ApplianceClient,
    service_cert: &str,
    tunnel_id: &str,
    poller: &TaskPoller,
    cancel: &CancellationToken,
) -> Result<Reconciled, CoreError> {
    let task = run_health_task(client, service_cert, poller, cancel).await?;

    let manager: ManagerHealth = task.decode_result()?;
    let probes = manager.tunnel_connectivity.ok_or_else(|| {
        CoreError::Internal("health report has no tunnel connectivity section".into())
    })?;

    let probe = find_tunnel(&probes, tunnel_id)?;
    Ok(Reconciled {
        id: task.id,
        attributes: flatten_tunnel_probe(probe)?,
    })
}

/// Trigger `diagnostics/health` and poll the task to completion.
async fn run_health_task(
    client: &ApplianceClient,
    service_cert: &str,
    poller: &TaskPoller,
    cancel: &CancellationToken,
) -> Result<Task, CoreError> {
    let task_ref = client.start_health_check(service_cert).await?;
    debug!(task = %task_ref.id, "health diagnostics started");

    let task = poller
        .wait(client, service_cert, &task_ref.id, cancel)
        .await?;
    Ok(task)
}

// ── Flattening ───────────────────────────────────────────────────────

/// Flatten a manager health report.
pub fn flatten_manager_health(health: &ManagerHealth) -> Attributes {
    let mut attrs = Attributes::new();
    health_info_attrs(&mut attrs, &health.info);

    error_attrs(
        &mut attrs,
        "local_replicators_ls_mismatch",
        health.local_replicators_ls_mismatch.as_ref(),
    );
    error_attrs(&mut attrs, "sso_admin", health.sso_admin_error.as_ref());

    attrs.insert(
        "tunnels_ids".into(),
        tunnel_ids(health.tunnel_connectivity.as_deref()).into(),
    );
    attrs.insert(
        "online_replicators_ids".into(),
        peer_ids(health.online_replicators.as_deref()).into(),
    );
    attrs.insert(
        "offline_replicators_ids".into(),
        peer_ids(health.offline_replicators.as_deref()).into(),
    );
    attrs.insert(
        "local_replicators_ids".into(),
        replicator_instance_ids(health.local_replicators_health.as_deref()).into(),
    );

    attrs
}

/// Flatten a cloud health report.
pub fn flatten_cloud_health(health: &CloudHealth) -> Attributes {
    let mut attrs = Attributes::new();
    health_info_attrs(&mut attrs, &health.info);

    error_attrs(&mut attrs, "vcd", health.vcd_error.as_ref());
    error_attrs(&mut attrs, "manager", health.manager_error.as_ref());

    attrs.insert(
        "tunnels_ids".into(),
        tunnel_ids(health.tunnel_connectivity.as_deref()).into(),
    );

    if let Some(manager_id) = health
        .manager_health
        .as_ref()
        .and_then(|m| m.info.instance_id.clone())
    {
        attrs.insert("manager_id".into(), manager_id.into());
    }

    attrs
}

/// Flatten a replicator health report.
pub fn flatten_replicator_health(health: &ReplicatorHealth) -> Attributes {
    let mut attrs = Attributes::new();
    health_info_attrs(&mut attrs, &health.info);

    error_attrs(&mut attrs, "lwd", health.lwd_error.as_ref());
    error_attrs(&mut attrs, "hbr", health.hbr_error.as_ref());
    error_attrs(&mut attrs, "h4dm", health.h4dm_error.as_ref());

    attrs.insert(
        "online_managers_ids".into(),
        peer_ids(health.online_managers.as_deref()).into(),
    );
    attrs.insert(
        "offline_managers_ids".into(),
        peer_ids(health.offline_managers.as_deref()).into(),
    );

    attrs
}

/// Flatten one tunnel connectivity probe.
pub fn flatten_tunnel_probe(probe: &TunnelProbe) -> Result<Attributes, CoreError> {
    let service = probe.tunnel_service.as_ref().ok_or_else(|| {
        CoreError::Internal("tunnel probe has no tunnel service block".into())
    })?;

    let mut attrs = Attributes::new();
    let mut service_map = indexmap::IndexMap::new();
    service_map.insert("id".to_owned(), service.id.clone().unwrap_or_default());
    service_map.insert("url".to_owned(), service.url.clone().unwrap_or_default());
    service_map.insert(
        "certificate".to_owned(),
        service.certificate.clone().unwrap_or_default(),
    );
    attrs.insert("tunnel_service".into(), AttrValue::StrMap(service_map));

    error_attrs(&mut attrs, "tunnel_service", probe.error.as_ref());
    Ok(attrs)
}

/// Copy the common envelope. Absent scalars are skipped; the disk
/// usage map is copied when the appliance reported one.
fn health_info_attrs(attrs: &mut Attributes, info: &HealthInfo) {
    if let Some(v) = &info.product_name {
        attrs.insert("product_name".into(), v.clone().into());
    }
    if let Some(v) = &info.build_version {
        attrs.insert("build_version".into(), v.clone().into());
    }
    if let Some(v) = info.build_date {
        attrs.insert("build_date".into(), v.into());
    }
    if let Some(v) = &info.instance_id {
        attrs.insert("instance_id".into(), v.clone().into());
    }
    if let Some(v) = &info.runtime_id {
        attrs.insert("runtime_id".into(), v.clone().into());
    }
    if let Some(v) = info.current_time {
        attrs.insert("current_time".into(), v.into());
    }
    if let Some(v) = &info.address {
        attrs.insert("address".into(), v.clone().into());
    }
    if let Some(v) = info.service_boot_timestamp {
        attrs.insert("service_boot_timestamp".into(), v.into());
    }
    if let Some(v) = info.appliance_boot_timestamp {
        attrs.insert("appliance_boot_timestamp".into(), v.into());
    }
    if !info.disk_usage.is_empty() {
        let usage: indexmap::IndexMap<String, i64> = info
            .disk_usage
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        attrs.insert("disk_usage".into(), AttrValue::IntMap(usage));
    }

    error_attrs(attrs, "ls", info.ls_error.as_ref());
    error_attrs(attrs, "db", info.db_error.as_ref());
    error_attrs(attrs, "ntp", info.ntp_error.as_ref());
}

/// Project one error block into `<prefix>_error_*` keys.
fn error_attrs(attrs: &mut Attributes, prefix: &str, error: Option<&HealthError>) {
    let Some(error) = error else { return };

    attrs.insert(
        format!("{prefix}_error_code"),
        error.code.clone().unwrap_or_default().into(),
    );
    attrs.insert(
        format!("{prefix}_error_msg"),
        error.msg.clone().unwrap_or_default().into(),
    );
    let args: Vec<String> = error
        .args
        .iter()
        .map(|v| match v.as_str() {
            Some(s) => s.to_owned(),
            None => v.to_string(),
        })
        .collect();
    attrs.insert(format!("{prefix}_error_args"), args.into());
    attrs.insert(
        format!("{prefix}_error_stacktrace"),
        error.stacktrace.clone().unwrap_or_default().into(),
    );
}

/// Ids of `{id: ...}` peer entries, in payload order.
fn peer_ids(list: Option<&[PeerRef]>) -> Vec<String> {
    list.map_or_else(Vec::new, |peers| {
        peers.iter().filter_map(|p| p.id.clone()).collect()
    })
}

/// Tunnel service ids from connectivity probes, in payload order.
fn tunnel_ids(list: Option<&[TunnelProbe]>) -> Vec<String> {
    list.map_or_else(Vec::new, |probes| {
        probes
            .iter()
            .filter_map(|p| p.tunnel_service.as_ref().and_then(|s| s.id.clone()))
            .collect()
    })
}

/// Instance ids of local replicator reports, in payload order.
fn replicator_instance_ids(list: Option<&[ReplicatorHealth]>) -> Vec<String> {
    list.map_or_else(Vec::new, |reps| {
        reps.iter()
            .filter_map(|r| r.info.instance_id.clone())
            .collect()
    })
}

/// Locate a replicator report by instance id. First match wins.
fn find_replicator<'a>(
    list: &'a [ReplicatorHealth],
    replicator_id: &str,
) -> Result<&'a ReplicatorHealth, CoreError> {
    list.iter()
        .find(|r| r.info.instance_id.as_deref() == Some(replicator_id))
        .ok_or_else(|| CoreError::not_found("replicator", replicator_id))
}

/// Locate a connectivity probe by tunnel service id. First match wins.
fn find_tunnel<'a>(list: &'a [TunnelProbe], tunnel_id: &str) -> Result<&'a TunnelProbe, CoreError> {
    list.iter()
        .find(|p| {
            p.tunnel_service
                .as_ref()
                .is_some_and(|s| s.id.as_deref() == Some(tunnel_id))
        })
        .ok_or_else(|| CoreError::not_found("tunnel", tunnel_id))
}
