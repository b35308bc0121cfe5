// Cloud Director-facing replication manager resource
//
// The longest provisioning flow: license, site identity, public
// endpoint, Cloud Director credentials, lookup service, then a poll on
// /config/is-configured until the appliance finishes assembling itself.
// Each step depends on the previous one's side effects.

use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use haven_api::{ApplianceClient, TaskPoller};

use crate::attributes::Attributes;
use crate::convert::{cloud_site_attrs, endpoint_attrs, ensure_sha256_prefix, license_attrs};
use crate::error::CoreError;
use crate::resource::Reconciled;

/// Desired state for the cloud manager appliance.
#[derive(Debug)]
pub struct CloudManagerDesired {
    pub service_cert: String,
    pub license_key: String,
    pub site_name: String,
    pub site_description: String,
    pub public_endpoint_address: String,
    pub public_endpoint_port: i64,
    pub cloud_director_url: String,
    pub cloud_director_username: String,
    pub cloud_director_password: SecretString,
    pub cloud_director_thumbprint: String,
    pub lookup_service_url: String,
    pub lookup_service_thumbprint: String,
}

/// Which desired fields changed since the last reconcile.
#[derive(Debug, Default, Clone, Copy)]
pub struct CloudManagerChanged {
    pub license_key: bool,
    pub lookup_service: bool,
    pub cloud_director: bool,
    pub public_endpoint: bool,
}

/// Provision the cloud manager appliance. Identity is the site
/// configuration id; the flow completes only once the appliance
/// reports itself configured (bounded by the poller's ceiling).
pub async fn create(
    client: &ApplianceClient,
    desired: &CloudManagerDesired,
    poller: &TaskPoller,
    cancel: &CancellationToken,
) -> Result<Reconciled, CoreError> {
    let mut attrs = Attributes::new();

    let license = client
        .set_license(&desired.service_cert, &desired.license_key)
        .await?;
    license_attrs(&mut attrs, &license);

    let site = client
        .set_cloud_site(&desired.site_name, &desired.site_description, &desired.service_cert)
        .await?;
    debug!(site = %site.local_site, id = %site.id, "cloud site identity set");

    client
        .set_public_endpoint(
            &desired.public_endpoint_address,
            desired.public_endpoint_port,
            &desired.service_cert,
        )
        .await?;

    client
        .set_cloud_director(
            &desired.cloud_director_username,
            &desired.cloud_director_password,
            &desired.cloud_director_url,
            &ensure_sha256_prefix(&desired.cloud_director_thumbprint),
            &desired.service_cert,
        )
        .await?;

    client
        .set_lookup_service(
            &desired.lookup_service_url,
            &desired.lookup_service_thumbprint,
            &desired.service_cert,
        )
        .await?;

    poller
        .wait_configured(client, &desired.service_cert, cancel)
        .await?;

    attrs.extend(read(client, desired).await?);
    Ok(Reconciled {
        id: site.id,
        attributes: attrs,
    })
}

/// Read the cloud site configuration and the effective endpoints.
pub async fn read(
    client: &ApplianceClient,
    desired: &CloudManagerDesired,
) -> Result<Attributes, CoreError> {
    let site = client.get_cloud_site_config(&desired.service_cert).await?;
    let endpoints = client.get_endpoints(&desired.service_cert).await?;

    let mut attrs = Attributes::new();
    cloud_site_attrs(&mut attrs, &site);
    endpoint_attrs(&mut attrs, &endpoints.effective);
    Ok(attrs)
}

/// Re-apply the fields flagged as changed.
pub async fn update(
    client: &ApplianceClient,
    desired: &CloudManagerDesired,
    changed: CloudManagerChanged,
) -> Result<Attributes, CoreError> {
    let mut attrs = Attributes::new();

    if changed.license_key && !desired.license_key.is_empty() {
        let license = client
            .set_license(&desired.service_cert, &desired.license_key)
            .await?;
        license_attrs(&mut attrs, &license);
    }

    if changed.lookup_service && !desired.lookup_service_url.is_empty() {
        client
            .set_lookup_service(
                &desired.lookup_service_url,
                &desired.lookup_service_thumbprint,
                &desired.service_cert,
            )
            .await?;
    }

    if changed.cloud_director {
        client
            .set_cloud_director(
                &desired.cloud_director_username,
                &desired.cloud_director_password,
                &desired.cloud_director_url,
                &ensure_sha256_prefix(&desired.cloud_director_thumbprint),
                &desired.service_cert,
            )
            .await?;
    }

    if changed.public_endpoint {
        client
            .set_public_endpoint(
                &desired.public_endpoint_address,
                desired.public_endpoint_port,
                &desired.service_cert,
            )
            .await?;
    }

    attrs.extend(read(client, desired).await?);
    Ok(attrs)
}

/// Deleting the resource forgets the identity; remote state is left
/// as-is for the next reconcile pass to pick up.
pub fn delete() {}
