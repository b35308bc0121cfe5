// Appliance configuration endpoints
//
// Identity, licensing, endpoints, lookup-service wiring, Cloud Director
// credentials, tunnel registration, and the vSphere UI plugin. Each
// operation is a fixed request/response shape bound to one path and
// verb; the remote appliance is the source of truth on every read.

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::client::{ApplianceClient, decode};
use crate::error::Error;
use crate::models::{
    CloudDirectorRequest, CloudSiteConfig, CloudSiteRequest, EndpointRequest, Endpoints,
    IsServiceConfigured, License, LicenseRequest, LookupService, LookupServiceRequest,
    ManagerLookupServiceRequest, PasswordExpiration, PluginStatus, SiteConfig, SiteNameRequest,
    SsoAdminCredentials, TunnelConfig, TunnelRequest, Tunnels,
};
use crate::transport::{
    ACCEPT_VALUE, AUTH_TOKEN_HEADER, CONFIG_SECRET_HEADER, USER_AGENT_VALUE,
};

impl ApplianceClient {
    /// Change the appliance root password.
    ///
    /// `POST /config/root-password` -- authenticates with the OLD
    /// password and repeats it in the `Config-Secret` header as a
    /// side-channel confirmation. The appliance acknowledges with
    /// HTTP 204 and nothing else; any other status (or body) is failure
    /// detail.
    ///
    /// On success the client's stored connection password is replaced
    /// with `new_password`. A failed change leaves it untouched, so the
    /// connection value always reflects the last confirmed password.
    pub async fn change_password(
        &mut self,
        host: &str,
        current_password: &SecretString,
        new_password: &SecretString,
        service_cert: &str,
    ) -> Result<(), Error> {
        let url = self.request_url(host, "/config/root-password")?;
        let http = self.http_client(service_cert)?;

        // Token fetched with the current password, not the stored one --
        // the two differ when recovering from an out-of-band rotation.
        let token = self.authenticate(host, current_password, service_cert).await?;

        debug!("POST {url}");

        let body = serde_json::json!({ "rootPassword": new_password.expose_secret() });

        let resp = http
            .post(url.clone())
            .header(AUTH_TOKEN_HEADER, token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::ACCEPT, ACCEPT_VALUE)
            .header(reqwest::header::USER_AGENT, USER_AGENT_VALUE)
            .header(CONFIG_SECRET_HEADER, current_password.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(Error::Transport)?;

        if status != reqwest::StatusCode::NO_CONTENT {
            return Err(Error::HttpStatus {
                method: Method::POST.to_string(),
                url: url.to_string(),
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        self.set_local_password(new_password.clone());
        Ok(())
    }

    /// Check whether the root password has expired.
    ///
    /// `GET /config/root-password-expired`
    pub async fn check_password_expired(
        &self,
        host: &str,
        service_cert: &str,
    ) -> Result<PasswordExpiration, Error> {
        let body = self
            .execute::<()>(host, Method::GET, "/config/root-password-expired", None, false, service_cert)
            .await?;
        decode(&body, "password expiration")
    }

    /// Install a license key.
    ///
    /// `POST /license` -- the response confirms the licensed state and
    /// expiration date.
    pub async fn set_license(&self, service_cert: &str, key: &str) -> Result<License, Error> {
        let req = LicenseRequest { key: key.to_owned() };
        let body = self.post("/license", Some(&req), false, service_cert).await?;
        decode(&body, "license")
    }

    /// Set the site name of a manager appliance.
    ///
    /// `POST /config/site` with the `Config-Secret` header.
    pub async fn set_site_name(
        &self,
        site_name: &str,
        service_cert: &str,
    ) -> Result<SiteConfig, Error> {
        let req = SiteNameRequest { site: site_name.to_owned() };
        let body = self.post("/config/site", Some(&req), true, service_cert).await?;
        decode(&body, "site configuration")
    }

    /// Set the local site name and description of a cloud appliance.
    ///
    /// `POST /config/site` with the `Config-Secret` header; the
    /// cloud-role schema differs from the manager one.
    pub async fn set_cloud_site(
        &self,
        site_name: &str,
        description: &str,
        service_cert: &str,
    ) -> Result<CloudSiteConfig, Error> {
        let req = CloudSiteRequest {
            local_site: site_name.to_owned(),
            local_site_description: description.to_owned(),
        };
        let body = self.post("/config/site", Some(&req), true, service_cert).await?;
        decode(&body, "cloud site configuration")
    }

    /// Configure the public API endpoint.
    ///
    /// `POST /config/endpoints` -- the service API port (8443) and
    /// management port (8046) are fixed; only the public address/port
    /// pair is operator-supplied.
    pub async fn set_public_endpoint(
        &self,
        address: &str,
        port: i64,
        service_cert: &str,
    ) -> Result<(), Error> {
        let req = EndpointRequest {
            api_address: None,
            api_port: 8443,
            api_public_address: address.to_owned(),
            api_public_port: port,
            mgmt_address: None,
            mgmt_port: 8046,
            mgmt_public_address: None,
            mgmt_public_port: None,
        };
        let body = self.post("/config/endpoints", Some(&req), false, service_cert).await?;
        let _: Endpoints = decode(&body, "endpoints")?;
        Ok(())
    }

    /// Fetch the configured and effective endpoint records.
    ///
    /// `GET /config/endpoints`
    pub async fn get_endpoints(&self, service_cert: &str) -> Result<Endpoints, Error> {
        let body = self.get("/config/endpoints", service_cert).await?;
        decode(&body, "endpoints")
    }

    /// Point the appliance at a lookup service.
    ///
    /// `POST /config/lookup-service`
    pub async fn set_lookup_service(
        &self,
        ls_url: &str,
        ls_thumbprint: &str,
        service_cert: &str,
    ) -> Result<(), Error> {
        let req = LookupServiceRequest {
            url: ls_url.to_owned(),
            thumbprint: ls_thumbprint.to_owned(),
        };
        let body = self.post("/config/lookup-service", Some(&req), false, service_cert).await?;
        let _: LookupService = decode(&body, "lookup service")?;
        Ok(())
    }

    /// Point a manager appliance at a lookup service.
    ///
    /// Same path as [`ApplianceClient::set_lookup_service`], but the
    /// manager must itself authenticate to the lookup service on the
    /// operator's behalf, so the request carries SSO admin credentials.
    pub async fn set_manager_lookup_service(
        &self,
        ls_url: &str,
        ls_thumbprint: &str,
        sso_user: &str,
        sso_password: &SecretString,
        service_cert: &str,
    ) -> Result<(), Error> {
        let req = ManagerLookupServiceRequest {
            url: ls_url.to_owned(),
            thumbprint: ls_thumbprint.to_owned(),
            sso_admin_credentials: SsoAdminCredentials {
                sso_user: sso_user.to_owned(),
                sso_password: sso_password.expose_secret().to_owned(),
            },
        };
        let body = self.post("/config/lookup-service", Some(&req), false, service_cert).await?;
        let _: LookupService = decode(&body, "lookup service")?;
        Ok(())
    }

    /// Configure Cloud Director credentials on a cloud appliance.
    ///
    /// `POST /config/vcloud` -- the Cloud Director URL is suffixed with
    /// `/api` before sending, matching what the appliance expects.
    pub async fn set_cloud_director(
        &self,
        username: &str,
        password: &SecretString,
        url: &str,
        thumbprint: &str,
        service_cert: &str,
    ) -> Result<(), Error> {
        let req = CloudDirectorRequest {
            vcd_password: password.expose_secret().to_owned(),
            vcd_thumbprint: thumbprint.to_owned(),
            vcd_url: format!("{url}/api"),
            vcd_username: username.to_owned(),
        };
        let body = self.post("/config/vcloud", Some(&req), false, service_cert).await?;
        let _: CloudSiteConfig = decode(&body, "cloud configuration")?;
        Ok(())
    }

    /// Register a tunnel appliance with the cloud service.
    ///
    /// `POST /config/tunnels`
    pub async fn set_tunnel(
        &self,
        tunnel_url: &str,
        tunnel_certificate: &str,
        root_password: &SecretString,
        service_cert: &str,
    ) -> Result<TunnelConfig, Error> {
        let req = TunnelRequest {
            certificate: tunnel_certificate.to_owned(),
            root_password: root_password.expose_secret().to_owned(),
            url: tunnel_url.to_owned(),
        };
        let body = self.post("/config/tunnels", Some(&req), false, service_cert).await?;
        decode(&body, "tunnel configuration")
    }

    /// Fetch one tunnel's configuration by id.
    ///
    /// `GET /config/tunnels` returns the full list with no server-side
    /// filter; the match is a client-side linear scan, first hit wins.
    pub async fn get_tunnel(
        &self,
        service_cert: &str,
        tunnel_id: &str,
    ) -> Result<TunnelConfig, Error> {
        let body = self.get("/config/tunnels", service_cert).await?;
        let tunnels: Tunnels = decode(&body, "tunnel list")?;

        tunnels
            .tunnels
            .into_iter()
            .find(|t| t.id == tunnel_id)
            .ok_or_else(|| Error::NotFound {
                entity: "tunnel",
                identifier: tunnel_id.to_owned(),
            })
    }

    /// Fetch the manager-role site configuration.
    ///
    /// `GET /config`
    pub async fn get_manager_site(&self, service_cert: &str) -> Result<SiteConfig, Error> {
        let body = self.get("/config", service_cert).await?;
        decode(&body, "site configuration")
    }

    /// Fetch the cloud-role site configuration.
    ///
    /// `GET /config`
    pub async fn get_cloud_site_config(
        &self,
        service_cert: &str,
    ) -> Result<CloudSiteConfig, Error> {
        let body = self.get("/config", service_cert).await?;
        decode(&body, "cloud site configuration")
    }

    /// Register the vSphere UI plugin.
    ///
    /// `POST /config/vsphere-ui/register`
    pub async fn register_ui_plugin(
        &self,
        sso_user: &str,
        sso_password: &SecretString,
        service_cert: &str,
    ) -> Result<PluginStatus, Error> {
        let req = SsoAdminCredentials {
            sso_user: sso_user.to_owned(),
            sso_password: sso_password.expose_secret().to_owned(),
        };
        let body = self
            .post("/config/vsphere-ui/register", Some(&req), false, service_cert)
            .await?;
        decode(&body, "plugin status")
    }

    /// Unregister the vSphere UI plugin.
    ///
    /// `POST /config/vsphere-ui/unregister`
    pub async fn unregister_ui_plugin(
        &self,
        sso_user: &str,
        sso_password: &SecretString,
        service_cert: &str,
    ) -> Result<(), Error> {
        let req = SsoAdminCredentials {
            sso_user: sso_user.to_owned(),
            sso_password: sso_password.expose_secret().to_owned(),
        };
        self.post("/config/vsphere-ui/unregister", Some(&req), false, service_cert)
            .await?;
        Ok(())
    }

    /// Check whether initial configuration has completed.
    ///
    /// `GET /config/is-configured` -- provisioning flows poll this
    /// until the appliance reports itself configured.
    pub async fn is_configured(&self, service_cert: &str) -> Result<IsServiceConfigured, Error> {
        let body = self.get("/config/is-configured", service_cert).await?;
        decode(&body, "configuration state")
    }
}
