// ── Inventory glue ──
//
// Each appliance VM carries its pinned service certificate in the
// virtualization inventory's extra-config metadata, under a fixed key
// per appliance role. The inventory API itself is out of scope here --
// it is abstracted behind `ExtraConfigSource`, and implementations
// (vSphere, test fixtures) live with the embedding process.

use strum::{Display, EnumString};

use crate::error::CoreError;

/// The four deployable appliance roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ApplianceRole {
    Manager,
    Cloud,
    Tunnel,
    Replicator,
}

impl ApplianceRole {
    /// The extra-config key holding this role's service certificate.
    pub fn cert_extra_config_key(self) -> &'static str {
        match self {
            Self::Manager => "guestinfo.manager.certificate",
            Self::Cloud => "guestinfo.cloud.certificate",
            Self::Tunnel => "guestinfo.tunnel.certificate",
            Self::Replicator => "guestinfo.replicator.certificate",
        }
    }
}

/// Read access to a VM's extra-config metadata.
///
/// Returns `Ok(None)` when the VM exists but the key is absent;
/// locating the VM or datacenter is the implementation's concern and
/// failures there surface as errors.
pub trait ExtraConfigSource {
    fn extra_config_value(
        &self,
        datacenter_id: &str,
        vm_name: &str,
        key: &str,
    ) -> Result<Option<String>, CoreError>;
}
