// Remote site pairing endpoints
//
// Pairing, re-pairing, and unpairing are asynchronous on the appliance:
// each call returns a task reference that the caller polls to a
// terminal state. The request schema branches on whether a peer site
// name is supplied -- cloud-to-cloud pairing names the peer site,
// cloud-to-vcenter pairing does not.

use crate::client::{ApplianceClient, decode};
use crate::error::Error;
use crate::models::{
    CloudSite, PairCloudSiteRequest, PairVcenterSiteRequest, TaskRef, VcenterSite,
};

impl ApplianceClient {
    /// Pair this appliance with a remote site.
    ///
    /// `POST /sites` -- a non-empty `site` selects the cloud-to-cloud
    /// schema, an empty one selects cloud-to-vcenter. Returns the
    /// pairing task reference; a 2xx response without a task id is a
    /// schema mismatch and fails decoding.
    pub async fn pair_site(
        &self,
        service_cert: &str,
        api_thumbprint: &str,
        api_url: &str,
        description: &str,
        site: &str,
    ) -> Result<TaskRef, Error> {
        let body = if site.is_empty() {
            let req = PairVcenterSiteRequest {
                api_thumbprint: api_thumbprint.to_owned(),
                api_url: api_url.to_owned(),
                description: description.to_owned(),
            };
            self.post("/sites", Some(&req), false, service_cert).await?
        } else {
            let req = PairCloudSiteRequest {
                api_thumbprint: api_thumbprint.to_owned(),
                api_url: api_url.to_owned(),
                description: description.to_owned(),
                site: site.to_owned(),
            };
            self.post("/sites", Some(&req), false, service_cert).await?
        };

        decode(&body, "pairing task")
    }

    /// Re-pair an existing remote site (rotated thumbprint, moved
    /// endpoint, changed description).
    ///
    /// `PUT /sites/{site}` -- `site` is the site id for vcenter peers
    /// and the site name for cloud peers.
    pub async fn repair_site(
        &self,
        service_cert: &str,
        site: &str,
        api_thumbprint: &str,
        api_url: &str,
        description: &str,
    ) -> Result<TaskRef, Error> {
        let req = PairVcenterSiteRequest {
            api_thumbprint: api_thumbprint.to_owned(),
            api_url: api_url.to_owned(),
            description: description.to_owned(),
        };
        let path = format!("/sites/{site}");
        let body = self.put(&path, Some(&req), service_cert).await?;
        decode(&body, "re-pairing task")
    }

    /// Unpair a remote site.
    ///
    /// `DELETE /sites/{site}`
    pub async fn unpair_site(&self, service_cert: &str, site: &str) -> Result<TaskRef, Error> {
        let path = format!("/sites/{site}");
        let body = self.delete(&path, service_cert).await?;
        decode(&body, "unpairing task")
    }

    /// Find a paired vCenter-role site by its public API URL.
    ///
    /// `GET /sites` returns every peer with no server-side filter; the
    /// match is a client-side linear scan, first hit wins.
    pub async fn get_vcenter_site(
        &self,
        service_cert: &str,
        api_url: &str,
    ) -> Result<VcenterSite, Error> {
        let body = self.get("/sites", service_cert).await?;
        let sites: Vec<VcenterSite> = decode(&body, "site list")?;

        sites
            .into_iter()
            .find(|s| s.api_public_url == api_url)
            .ok_or_else(|| Error::NotFound {
                entity: "remote site",
                identifier: api_url.to_owned(),
            })
    }

    /// Find a paired cloud-role site by its public API URL.
    pub async fn get_cloud_site(
        &self,
        service_cert: &str,
        api_url: &str,
    ) -> Result<CloudSite, Error> {
        let body = self.get("/sites", service_cert).await?;
        let sites: Vec<CloudSite> = decode(&body, "site list")?;

        sites
            .into_iter()
            .find(|s| s.api_public_url == api_url)
            .ok_or_else(|| Error::NotFound {
                entity: "remote site",
                identifier: api_url.to_owned(),
            })
    }
}
