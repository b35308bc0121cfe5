// vCenter-facing replication manager resource
//
// Provisioning order matters: license first, then site identity, then
// the lookup service (which needs the site to exist), then the UI
// plugin registration. Later steps depend on the side effects of
// earlier ones on the same appliance, so the flow is strictly
// sequential.

use secrecy::SecretString;
use tracing::debug;

use haven_api::ApplianceClient;

use crate::attributes::Attributes;
use crate::convert::{license_attrs, manager_site_attrs};
use crate::error::CoreError;
use crate::resource::Reconciled;

/// Desired state for the manager appliance.
#[derive(Debug)]
pub struct ManagerDesired {
    pub service_cert: String,
    pub license_key: String,
    pub site_name: String,
    pub lookup_service_url: String,
    pub lookup_service_thumbprint: String,
    pub sso_user: String,
    pub sso_password: SecretString,
}

/// Which desired fields changed since the last reconcile.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManagerChanged {
    pub license_key: bool,
    pub lookup_service: bool,
}

/// Provision the manager appliance. Identity is the site configuration
/// id assigned by the appliance.
pub async fn create(
    client: &ApplianceClient,
    desired: &ManagerDesired,
) -> Result<Reconciled, CoreError> {
    let mut attrs = Attributes::new();

    let license = client
        .set_license(&desired.service_cert, &desired.license_key)
        .await?;
    license_attrs(&mut attrs, &license);

    let site = client
        .set_site_name(&desired.site_name, &desired.service_cert)
        .await?;
    debug!(site = %site.site, id = %site.id, "manager site identity set");

    client
        .set_manager_lookup_service(
            &desired.lookup_service_url,
            &desired.lookup_service_thumbprint,
            &desired.sso_user,
            &desired.sso_password,
            &desired.service_cert,
        )
        .await?;

    client
        .register_ui_plugin(&desired.sso_user, &desired.sso_password, &desired.service_cert)
        .await?;

    attrs.extend(read(client, desired).await?);
    Ok(Reconciled {
        id: site.id,
        attributes: attrs,
    })
}

/// Read the manager site configuration from the appliance -- the
/// remote is the source of truth on every pass.
pub async fn read(
    client: &ApplianceClient,
    desired: &ManagerDesired,
) -> Result<Attributes, CoreError> {
    let site = client.get_manager_site(&desired.service_cert).await?;

    let mut attrs = Attributes::new();
    manager_site_attrs(&mut attrs, &site);
    Ok(attrs)
}

/// Re-apply the fields flagged as changed.
pub async fn update(
    client: &ApplianceClient,
    desired: &ManagerDesired,
    changed: ManagerChanged,
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
            .set_manager_lookup_service(
                &desired.lookup_service_url,
                &desired.lookup_service_thumbprint,
                &desired.sso_user,
                &desired.sso_password,
                &desired.service_cert,
            )
            .await?;
    }

    attrs.extend(read(client, desired).await?);
    Ok(attrs)
}

/// Tear down the operator-visible surface: unregister the UI plugin.
/// Site identity and license stay on the appliance.
pub async fn delete(
    client: &ApplianceClient,
    desired: &ManagerDesired,
) -> Result<(), CoreError> {
    client
        .unregister_ui_plugin(&desired.sso_user, &desired.sso_password, &desired.service_cert)
        .await?;
    Ok(())
}
