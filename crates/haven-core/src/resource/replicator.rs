// Replicator resource
//
// Replicators are registered under a manager site through the manager
// service endpoint ({host}:8441). Creation first points the replicator
// at the lookup service, then registers it; credential rotations go
// through the repair (reset-cookie) call rather than re-registration.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use haven_api::ApplianceClient;
use haven_api::models::ReplicatorSettings;

use crate::attributes::Attributes;
use crate::convert::{replicator_attrs, replicator_lookup_service_attrs};
use crate::error::CoreError;
use crate::resource::Reconciled;

/// Desired state for a replicator registration.
#[derive(Debug)]
pub struct ReplicatorDesired {
    pub service_cert: String,
    pub lookup_service_url: String,
    pub lookup_service_thumbprint: String,
    pub api_url: String,
    pub api_thumbprint: String,
    pub root_password: SecretString,
    pub sso_user: String,
    pub sso_password: SecretString,
    pub description: String,
    pub owner: String,
    pub site_name: String,
}

impl ReplicatorDesired {
    fn settings(&self) -> ReplicatorSettings {
        ReplicatorSettings {
            api_url: self.api_url.clone(),
            api_thumbprint: self.api_thumbprint.clone(),
            root_password: self.root_password.expose_secret().to_owned(),
            sso_user: self.sso_user.clone(),
            sso_password: self.sso_password.expose_secret().to_owned(),
        }
    }
}

/// Register a replicator. Identity is the server-assigned replicator id.
pub async fn create(
    client: &ApplianceClient,
    desired: &ReplicatorDesired,
) -> Result<Reconciled, CoreError> {
    let host = client.manager_endpoint();
    let mut attrs = Attributes::new();

    let lookup_service = client
        .set_replicator_lookup_service(
            &host,
            &desired.lookup_service_url,
            &desired.lookup_service_thumbprint,
            &desired.api_url,
            &desired.api_thumbprint,
            &desired.root_password,
            &desired.service_cert,
        )
        .await?;
    replicator_lookup_service_attrs(&mut attrs, &lookup_service);

    let replicator = client
        .add_replicator(
            &host,
            &desired.service_cert,
            &desired.description,
            &desired.owner,
            &desired.site_name,
            desired.settings(),
        )
        .await?;
    debug!(id = %replicator.id, site = %desired.site_name, "replicator registered");

    attrs.extend(read(client, desired, &replicator.id).await?);
    Ok(Reconciled {
        id: replicator.id,
        attributes: attrs,
    })
}

/// Look the replicator up by id (client-side scan of the full list).
pub async fn read(
    client: &ApplianceClient,
    desired: &ReplicatorDesired,
    replicator_id: &str,
) -> Result<Attributes, CoreError> {
    let host = client.manager_endpoint();
    let replicator = client
        .get_replicator(&host, &desired.service_cert, replicator_id)
        .await?;

    let mut attrs = Attributes::new();
    replicator_attrs(&mut attrs, &replicator);
    Ok(attrs)
}

/// Repair the pairing after a credential change (root password or SSO).
pub async fn update(
    client: &ApplianceClient,
    desired: &ReplicatorDesired,
    replicator_id: &str,
) -> Result<Attributes, CoreError> {
    let host = client.manager_endpoint();
    client
        .repair_replicator(&host, &desired.service_cert, replicator_id, &desired.settings())
        .await?;

    read(client, desired, replicator_id).await
}

/// Remove the replicator from its manager site.
pub async fn delete(
    client: &ApplianceClient,
    desired: &ReplicatorDesired,
    replicator_id: &str,
) -> Result<(), CoreError> {
    let host = client.manager_endpoint();
    client
        .delete_replicator(&host, &desired.service_cert, replicator_id)
        .await?;
    Ok(())
}
