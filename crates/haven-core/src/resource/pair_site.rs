// Remote site pairing resource
//
// Pairing is asynchronous on the appliance: every mutation returns a
// task that must be polled to a terminal state before the peer list
// reflects it. The request and the computed attribute set both branch
// on whether a peer site name was supplied -- cloud-to-cloud pairings
// name the peer, cloud-to-vcenter pairings are matched by URL only.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use haven_api::{ApplianceClient, TaskPoller};

use crate::attributes::Attributes;
use crate::convert::{paired_cloud_site_attrs, paired_vcenter_site_attrs};
use crate::error::CoreError;
use crate::resource::Reconciled;

/// Desired state for a site pairing.
#[derive(Debug)]
pub struct PairSiteDesired {
    pub service_cert: String,
    pub api_thumbprint: String,
    pub api_url: String,
    pub pairing_description: String,
    /// Peer site name; `None` selects the cloud-to-vcenter schema.
    pub site: Option<String>,
}

impl PairSiteDesired {
    fn site_name(&self) -> &str {
        self.site.as_deref().unwrap_or_default()
    }
}

/// Pair with the remote site and wait for the pairing task. Identity
/// is the pairing task id.
pub async fn create(
    client: &ApplianceClient,
    desired: &PairSiteDesired,
    poller: &TaskPoller,
    cancel: &CancellationToken,
) -> Result<Reconciled, CoreError> {
    let task = client
        .pair_site(
            &desired.service_cert,
            &desired.api_thumbprint,
            &desired.api_url,
            &desired.pairing_description,
            desired.site_name(),
        )
        .await?;
    debug!(task = %task.id, url = %desired.api_url, "pairing started");

    poller
        .wait(client, &desired.service_cert, &task.id, cancel)
        .await?;

    let attributes = read(client, desired).await?;
    Ok(Reconciled {
        id: task.id,
        attributes,
    })
}

/// Find the paired site by public API URL and project its fields.
pub async fn read(
    client: &ApplianceClient,
    desired: &PairSiteDesired,
) -> Result<Attributes, CoreError> {
    let mut attrs = Attributes::new();

    if desired.site.as_deref().is_some_and(|s| !s.is_empty()) {
        let site = client
            .get_cloud_site(&desired.service_cert, &desired.api_url)
            .await?;
        paired_cloud_site_attrs(&mut attrs, &site);
    } else {
        let site = client
            .get_vcenter_site(&desired.service_cert, &desired.api_url)
            .await?;
        paired_vcenter_site_attrs(&mut attrs, &site);
    }

    Ok(attrs)
}

/// Re-pair after a thumbprint/URL/description change and wait for the
/// task. `target_site` is the site id for vcenter peers and the site
/// name for cloud peers (only vcenter peers carry a site id).
pub async fn update(
    client: &ApplianceClient,
    desired: &PairSiteDesired,
    target_site: &str,
    poller: &TaskPoller,
    cancel: &CancellationToken,
) -> Result<Reconciled, CoreError> {
    let task = client
        .repair_site(
            &desired.service_cert,
            target_site,
            &desired.api_thumbprint,
            &desired.api_url,
            &desired.pairing_description,
        )
        .await?;
    debug!(task = %task.id, site = target_site, "re-pairing started");

    poller
        .wait(client, &desired.service_cert, &task.id, cancel)
        .await?;

    let attributes = read(client, desired).await?;
    Ok(Reconciled {
        id: task.id,
        attributes,
    })
}

/// Unpair from the remote site and wait for the task.
pub async fn delete(
    client: &ApplianceClient,
    desired: &PairSiteDesired,
    target_site: &str,
    poller: &TaskPoller,
    cancel: &CancellationToken,
) -> Result<(), CoreError> {
    let task = client.unpair_site(&desired.service_cert, target_site).await?;
    debug!(task = %task.id, site = target_site, "unpairing started");

    poller
        .wait(client, &desired.service_cert, &task.id, cancel)
        .await?;
    Ok(())
}
