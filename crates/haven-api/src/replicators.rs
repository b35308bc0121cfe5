// Replicator lifecycle endpoints
//
// Replicators register under a manager site and are managed through the
// manager service endpoint ({host}:8441), not the default API port.
// Lifecycle is add / repair / delete -- three distinct remote calls,
// not a generic PATCH.

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};

use crate::client::{ApplianceClient, decode};
use crate::error::Error;
use crate::models::{
    AddReplicatorRequest, LookupService, Replicator, ReplicatorLookupServiceRequest,
    ReplicatorSettings,
};

impl ApplianceClient {
    /// Point a replicator appliance at the lookup service, through the
    /// manager endpoint.
    ///
    /// `POST /config/replicators/lookup-service`
    #[allow(clippy::too_many_arguments)]
    pub async fn set_replicator_lookup_service(
        &self,
        host: &str,
        ls_url: &str,
        ls_thumbprint: &str,
        api_url: &str,
        api_thumbprint: &str,
        root_password: &SecretString,
        service_cert: &str,
    ) -> Result<LookupService, Error> {
        let req = ReplicatorLookupServiceRequest {
            ls_url: ls_url.to_owned(),
            ls_thumbprint: ls_thumbprint.to_owned(),
            api_url: api_url.to_owned(),
            api_thumbprint: api_thumbprint.to_owned(),
            root_password: root_password.expose_secret().to_owned(),
        };
        let body = self
            .execute(host, Method::POST, "/config/replicators/lookup-service", Some(&req), false, service_cert)
            .await?;
        decode(&body, "replicator lookup service")
    }

    /// Register a replicator under a manager site.
    ///
    /// `POST /replicators`
    pub async fn add_replicator(
        &self,
        host: &str,
        service_cert: &str,
        description: &str,
        owner: &str,
        site: &str,
        details: ReplicatorSettings,
    ) -> Result<Replicator, Error> {
        let req = AddReplicatorRequest {
            description: description.to_owned(),
            owner: owner.to_owned(),
            site: site.to_owned(),
            replicator_id: None,
            details,
        };
        let body = self
            .execute(host, Method::POST, "/replicators", Some(&req), false, service_cert)
            .await?;
        decode(&body, "replicator")
    }

    /// Fetch one replicator by id.
    ///
    /// `GET /replicators` returns the full list with no server-side
    /// filter; the match is a client-side linear scan, first hit wins.
    pub async fn get_replicator(
        &self,
        host: &str,
        service_cert: &str,
        replicator_id: &str,
    ) -> Result<Replicator, Error> {
        let body = self
            .execute::<()>(host, Method::GET, "/replicators", None, false, service_cert)
            .await?;
        let replicators: Vec<Replicator> = decode(&body, "replicator list")?;

        replicators
            .into_iter()
            .find(|r| r.id == replicator_id)
            .ok_or_else(|| Error::NotFound {
                entity: "replicator",
                identifier: replicator_id.to_owned(),
            })
    }

    /// Re-establish a broken manager/replicator pairing.
    ///
    /// `POST /replicators/{id}/reset-cookie`
    pub async fn repair_replicator(
        &self,
        host: &str,
        service_cert: &str,
        replicator_id: &str,
        details: &ReplicatorSettings,
    ) -> Result<(), Error> {
        let path = format!("/replicators/{replicator_id}/reset-cookie");
        let body = self
            .execute(host, Method::POST, &path, Some(details), false, service_cert)
            .await?;
        let _: Replicator = decode(&body, "replicator")?;
        Ok(())
    }

    /// Remove a replicator from its manager site.
    ///
    /// `DELETE /replicators/{id}` -- the delete-success contract is an
    /// EMPTY body. A 2xx response carrying a body is an error payload
    /// (the server reports partial failure under a success status), so
    /// it is surfaced as a failure with that body attached.
    pub async fn delete_replicator(
        &self,
        host: &str,
        service_cert: &str,
        replicator_id: &str,
    ) -> Result<(), Error> {
        let path = format!("/replicators/{replicator_id}");
        let body = self
            .execute::<()>(host, Method::DELETE, &path, None, false, service_cert)
            .await?;

        if !body.is_empty() {
            return Err(Error::Decode {
                message: format!("deleting replicator {replicator_id} returned an error payload"),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(())
    }
}
