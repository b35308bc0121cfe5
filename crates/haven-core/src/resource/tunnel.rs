// Tunnel resource
//
// Registers a tunnel appliance with the cloud service. The appliance
// assigns the tunnel id; re-registration with changed settings yields
// a (possibly new) id, so update repeats the set call.

use secrecy::SecretString;

use haven_api::ApplianceClient;

use crate::attributes::Attributes;
use crate::convert::tunnel_attrs;
use crate::error::CoreError;
use crate::resource::Reconciled;

/// Desired state for a tunnel registration.
#[derive(Debug)]
pub struct TunnelDesired {
    pub service_cert: String,
    pub url: String,
    pub certificate: String,
    pub root_password: SecretString,
}

/// Register the tunnel. Identity is the server-assigned tunnel id.
pub async fn create(
    client: &ApplianceClient,
    desired: &TunnelDesired,
) -> Result<Reconciled, CoreError> {
    let tunnel = client
        .set_tunnel(
            &desired.url,
            &desired.certificate,
            &desired.root_password,
            &desired.service_cert,
        )
        .await?;

    let attributes = read(client, desired, &tunnel.id).await?;
    Ok(Reconciled {
        id: tunnel.id,
        attributes,
    })
}

/// Look the tunnel up by id (client-side scan of the tunnel list).
pub async fn read(
    client: &ApplianceClient,
    desired: &TunnelDesired,
    tunnel_id: &str,
) -> Result<Attributes, CoreError> {
    let tunnel = client.get_tunnel(&desired.service_cert, tunnel_id).await?;

    let mut attrs = Attributes::new();
    tunnel_attrs(&mut attrs, &tunnel);
    Ok(attrs)
}

/// Update re-registers the tunnel with the new settings.
pub async fn update(
    client: &ApplianceClient,
    desired: &TunnelDesired,
) -> Result<Reconciled, CoreError> {
    create(client, desired).await
}

/// Deleting the resource forgets the identity; the tunnel registration
/// stays on the cloud service.
pub fn delete() {}
