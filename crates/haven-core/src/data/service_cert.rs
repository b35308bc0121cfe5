// Service certificate data source
//
// Fetches an appliance's pinned service certificate from the VM's
// extra-config metadata, selecting the key by appliance role. The
// certificate value doubles as the data source's identity.

use tracing::debug;

use crate::error::CoreError;
use crate::inventory::{ApplianceRole, ExtraConfigSource};

/// Look up the service certificate for `vm_name` in `datacenter_id`.
pub fn read(
    source: &dyn ExtraConfigSource,
    datacenter_id: &str,
    vm_name: &str,
    role: ApplianceRole,
) -> Result<String, CoreError> {
    let key = role.cert_extra_config_key();
    debug!(vm = vm_name, key, "looking up service certificate");

    let value = source.extra_config_value(datacenter_id, vm_name, key)?;

    match value {
        Some(cert) if !cert.is_empty() => Ok(cert),
        _ => Err(CoreError::NotFound {
            entity_type: "service certificate".into(),
            identifier: format!("{key} on {vm_name}"),
        }),
    }
}
