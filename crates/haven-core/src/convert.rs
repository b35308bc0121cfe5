// ── API-to-attribute conversions ──
//
// Bridges raw `haven_api` response types into the flat attribute sets
// handed back to the reconciliation caller. Key names are the stable
// public contract of each resource; values come straight from the wire
// models.

use haven_api::models::{
    CloudSite, CloudSiteConfig, EndpointConfig, License, LookupService, PasswordExpiration,
    Replicator, SiteConfig, TunnelConfig, VcenterSite,
};

use crate::attributes::{AttrValue, Attributes};

/// License confirmation fields.
pub fn license_attrs(attrs: &mut Attributes, license: &License) {
    attrs.insert("is_licensed".into(), license.is_licensed.into());
    attrs.insert("expiration_date".into(), license.expiration_date.into());
}

/// Password expiration probe fields.
pub fn password_expiration_attrs(attrs: &mut Attributes, expiration: &PasswordExpiration) {
    attrs.insert(
        "root_password_expired".into(),
        expiration.root_password_expired.into(),
    );
    attrs.insert(
        "seconds_until_expiration".into(),
        expiration.seconds_until_expiration.into(),
    );
}

/// Manager-role site configuration fields.
pub fn manager_site_attrs(attrs: &mut Attributes, site: &SiteConfig) {
    attrs.insert("site".into(), site.site.clone().into());
    attrs.insert("ls_url".into(), site.ls_url.clone().into());
    attrs.insert("ls_thumbprint".into(), site.ls_thumbprint.clone().into());
    attrs.insert("tunnel_url".into(), site.tunnel_url.clone().into());
    attrs.insert(
        "tunnel_certificate".into(),
        site.tunnel_certificate.clone().into(),
    );
}

/// Cloud-role site configuration fields.
pub fn cloud_site_attrs(attrs: &mut Attributes, site: &CloudSiteConfig) {
    attrs.insert("ls_url".into(), site.ls_url.clone().into());
    attrs.insert("ls_thumbprint".into(), site.ls_thumbprint.clone().into());
    attrs.insert("local_site".into(), site.local_site.clone().into());
    attrs.insert(
        "local_site_description".into(),
        site.local_site_description.clone().into(),
    );
    attrs.insert("vcloud_url".into(), site.vcd_url.clone().into());
    attrs.insert("vcloud_thumbprint".into(), site.vcd_thumbprint.clone().into());
    attrs.insert("vcloud_username".into(), site.vcd_username.clone().into());
    attrs.insert("tunnel_url".into(), site.tunnel_url.clone().into());
    attrs.insert(
        "tunnel_certificate".into(),
        site.tunnel_certificate.clone().into(),
    );
    attrs.insert("is_combined".into(), site.is_combined.into());
}

/// Effective endpoint record fields.
pub fn endpoint_attrs(attrs: &mut Attributes, endpoint: &EndpointConfig) {
    attrs.insert(
        "mgmt_address".into(),
        endpoint.mgmt_address.clone().unwrap_or_default().into(),
    );
    attrs.insert("mgmt_port".into(), endpoint.mgmt_port.into());
    attrs.insert(
        "mgmt_public_address".into(),
        endpoint
            .mgmt_public_address
            .clone()
            .unwrap_or_default()
            .into(),
    );
    attrs.insert(
        "mgmt_public_port".into(),
        endpoint.mgmt_public_port.unwrap_or_default().into(),
    );
    attrs.insert(
        "api_address".into(),
        endpoint.api_address.clone().unwrap_or_default().into(),
    );
    attrs.insert("api_port".into(), endpoint.api_port.into());
    attrs.insert(
        "api_public_address".into(),
        endpoint.api_public_address.clone().into(),
    );
    attrs.insert("api_public_port".into(), endpoint.api_public_port.into());
}

/// Replicator state fields surfaced on the replicator resource.
pub fn replicator_attrs(attrs: &mut Attributes, replicator: &Replicator) {
    attrs.insert(
        "is_in_maintenance_mode".into(),
        replicator.is_in_maintenance_mode.into(),
    );
    attrs.insert(
        "data_address".into(),
        replicator.data_address.clone().unwrap_or_default().into(),
    );
    attrs.insert(
        "build_version".into(),
        replicator.build_version.clone().unwrap_or_default().into(),
    );
}

/// Replicator-side lookup service confirmation fields.
pub fn replicator_lookup_service_attrs(attrs: &mut Attributes, ls: &LookupService) {
    attrs.insert("replicator_ls_url".into(), ls.ls_url.clone().into());
    attrs.insert(
        "replicator_ls_thumbprint".into(),
        ls.ls_thumbprint.clone().into(),
    );
}

/// Tunnel registration fields.
pub fn tunnel_attrs(attrs: &mut Attributes, tunnel: &TunnelConfig) {
    attrs.insert("tunnel_url".into(), tunnel.url.clone().into());
    attrs.insert("tunnel_certificate".into(), tunnel.certificate.clone().into());
}

/// Fields of a paired cloud-role remote site.
pub fn paired_cloud_site_attrs(attrs: &mut Attributes, site: &CloudSite) {
    attrs.insert("site_name".into(), site.site.clone().into());
    attrs.insert("site_description".into(), site.description.clone().into());
    attrs.insert("api_public_url".into(), site.api_public_url.clone().into());
    attrs.insert("api_version".into(), site.api_version.clone().into());
    attrs.insert("build_version".into(), site.build_version.clone().into());
}

/// Fields of a paired vCenter-role remote site.
pub fn paired_vcenter_site_attrs(attrs: &mut Attributes, site: &VcenterSite) {
    attrs.insert("site_id".into(), site.id.clone().into());
    attrs.insert("site_name".into(), site.site.clone().into());
    attrs.insert("site_description".into(), site.description.clone().into());
    attrs.insert("api_public_url".into(), site.api_public_url.clone().into());
    attrs.insert("api_version".into(), site.api_version.clone().into());
    attrs.insert(
        "is_provider_deployment".into(),
        site.is_provider_deployment.into(),
    );
}

/// Normalize a thumbprint to the `SHA-256:` prefixed form the pairing
/// and Cloud Director endpoints expect. Values that already carry the
/// prefix pass through unchanged.
pub fn ensure_sha256_prefix(thumbprint: &str) -> String {
    if thumbprint.starts_with("SHA-256:") {
        thumbprint.to_owned()
    } else {
        format!("SHA-256:{thumbprint}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn license_maps_both_fields() {
        let mut attrs = Attributes::new();
        license_attrs(
            &mut attrs,
            &License {
                key: "ABCDE-1234".into(),
                is_licensed: true,
                expiration_date: 0,
            },
        );
        assert_eq!(attrs["is_licensed"].as_bool(), Some(true));
        assert_eq!(attrs["expiration_date"].as_int(), Some(0));
    }

    #[test]
    fn sha256_prefix_is_idempotent() {
        assert_eq!(ensure_sha256_prefix("SHA-256:AA:BB"), "SHA-256:AA:BB");
        assert_eq!(ensure_sha256_prefix("AA:BB"), "SHA-256:AA:BB");
    }

    #[test]
    fn endpoint_nulls_become_empty_values() {
        let endpoint: EndpointConfig = serde_json::from_value(serde_json::json!({
            "mgmtAddress": null,
            "mgmtPort": 8046,
            "mgmtPublicAddress": null,
            "mgmtPublicPort": null,
            "apiAddress": null,
            "apiPort": 8443,
            "apiPublicAddress": "dr.example.com",
            "apiPublicPort": 443
        }))
        .expect("decodes");

        let mut attrs = Attributes::new();
        endpoint_attrs(&mut attrs, &endpoint);

        assert_eq!(attrs["mgmt_address"].as_str(), Some(""));
        assert_eq!(attrs["mgmt_public_port"].as_int(), Some(0));
        assert_eq!(attrs["api_public_address"].as_str(), Some("dr.example.com"));
        assert_eq!(attrs["api_public_port"].as_int(), Some(443));
    }
}
