// Appliance HTTP client
//
// Wraps `reqwest` with Haven-specific URL construction, the session
// token protocol, and the 2xx status contract. All endpoint modules
// (config, replicators, sites, tasks) are implemented as inherent
// methods via separate files to keep this module focused on transport
// mechanics.

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::{
    ACCEPT_VALUE, AUTH_TOKEN_HEADER, CONFIG_SECRET_HEADER, LOCAL_USER_TYPE, USER_AGENT_VALUE,
    build_transport,
};

/// Port of the manager service on the management appliance; replicator
/// lifecycle operations go through it rather than the default API port.
pub const MANAGER_API_PORT: u16 = 8441;

/// Client for one Haven appliance's management API.
///
/// Holds the caller-owned connection value: base host, local user, and
/// the local password. The password always reflects the last confirmed
/// value -- [`ApplianceClient::change_password`] commits the new
/// password only after the appliance acknowledges the change, and a
/// failed change leaves it untouched.
///
/// Every operation takes the pinned service certificate per call and
/// builds a dedicated single-use transport for it; nothing TLS-related
/// is stored on the client.
pub struct ApplianceClient {
    host: String,
    local_user: String,
    local_password: SecretString,
    /// Pre-built transport + base URL, bypassing per-call construction.
    /// Used when the transport is managed externally (tests, proxies).
    shared: Option<(reqwest::Client, Url)>,
}

impl ApplianceClient {
    /// Create a client for the appliance at `host` (IP or hostname,
    /// optionally with a port).
    pub fn new(
        host: impl Into<String>,
        local_user: impl Into<String>,
        local_password: SecretString,
    ) -> Self {
        Self {
            host: host.into(),
            local_user: local_user.into(),
            local_password,
            shared: None,
        }
    }

    /// Create a client with a pre-built `reqwest::Client` and base URL.
    ///
    /// All requests go to `base_url` regardless of the per-operation
    /// host, and the per-call pinned-certificate transport is skipped.
    pub fn with_transport(
        http: reqwest::Client,
        base_url: Url,
        local_user: impl Into<String>,
        local_password: SecretString,
    ) -> Self {
        Self {
            host: base_url.authority().to_owned(),
            local_user: local_user.into(),
            local_password,
            shared: Some((http, base_url)),
        }
    }

    /// The appliance host this client talks to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The configured local user.
    pub fn local_user(&self) -> &str {
        &self.local_user
    }

    /// The last confirmed local password.
    pub fn local_password(&self) -> &SecretString {
        &self.local_password
    }

    /// The manager service endpoint (`{host}:8441`) used by replicator
    /// lifecycle operations.
    pub fn manager_endpoint(&self) -> String {
        format!("{}:{MANAGER_API_PORT}", self.host)
    }

    /// Commit a confirmed password change to the connection value.
    pub(crate) fn set_local_password(&mut self, password: SecretString) {
        self.local_password = password;
    }

    // ── URL building ─────────────────────────────────────────────────

    /// Build a full HTTPS URL for `path` on `host`.
    pub(crate) fn request_url(&self, host: &str, path: &str) -> Result<Url, Error> {
        let path = path.trim_start_matches('/');
        if let Some((_, ref base)) = self.shared {
            return base.join(path).map_err(Error::InvalidUrl);
        }
        Url::parse(&format!("https://{host}/{path}")).map_err(Error::InvalidUrl)
    }

    /// Obtain the transport for one call: the shared client when one
    /// was injected, otherwise a fresh single-use client trusting only
    /// the given service certificate.
    pub(crate) fn http_client(&self, service_cert: &str) -> Result<reqwest::Client, Error> {
        if let Some((ref http, _)) = self.shared {
            return Ok(http.clone());
        }
        build_transport(service_cert)
    }

    // ── Session tokens ───────────────────────────────────────────────

    /// Obtain a short-lived auth token from `POST /sessions`.
    ///
    /// The token is carried in the `X-Haven-Auth` response header, not
    /// the body. An absent header yields an EMPTY token rather than an
    /// error; the next request then fails with the server's own status
    /// diagnostic instead of a guess made here.
    pub async fn authenticate(
        &self,
        host: &str,
        password: &SecretString,
        service_cert: &str,
    ) -> Result<String, Error> {
        let url = self.request_url(host, "/sessions")?;
        let http = self.http_client(service_cert)?;

        trace!("requesting session token from {url}");

        let body = json!({
            "type": LOCAL_USER_TYPE,
            "localUser": self.local_user,
            "localPassword": password.expose_secret(),
        });

        let resp = http
            .post(url)
            .header(reqwest::header::ACCEPT, ACCEPT_VALUE)
            .header(reqwest::header::USER_AGENT, USER_AGENT_VALUE)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let token = resp
            .headers()
            .get(AUTH_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();

        Ok(token)
    }

    // ── Request execution ────────────────────────────────────────────

    /// The single execution path underlying every appliance operation.
    ///
    /// Fetches a fresh token, attaches the auth/content/accept/agent
    /// headers (plus `Config-Secret` when the operation requires the
    /// side-channel authorization factor), performs the request, and
    /// enforces the 2xx status contract. Non-2xx responses surface as
    /// [`Error::HttpStatus`] carrying the exact response body.
    pub(crate) async fn execute<B: Serialize + ?Sized>(
        &self,
        host: &str,
        method: Method,
        path: &str,
        body: Option<&B>,
        with_secret: bool,
        service_cert: &str,
    ) -> Result<Vec<u8>, Error> {
        let token = self
            .authenticate(host, &self.local_password, service_cert)
            .await?;

        let url = self.request_url(host, path)?;
        let http = self.http_client(service_cert)?;

        debug!("{method} {url}");

        let mut builder = http
            .request(method.clone(), url.clone())
            .header(AUTH_TOKEN_HEADER, token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::ACCEPT, ACCEPT_VALUE)
            .header(reqwest::header::USER_AGENT, USER_AGENT_VALUE);

        if with_secret {
            builder = builder.header(CONFIG_SECRET_HEADER, self.local_password.expose_secret());
        }

        if let Some(b) = body {
            builder = builder.json(b);
        }

        let resp = builder.send().await.map_err(Error::Transport)?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(Error::Transport)?;

        if !status.is_success() {
            return Err(Error::HttpStatus {
                method: method.to_string(),
                url: url.to_string(),
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        Ok(bytes.to_vec())
    }

    /// GET against the client's own host.
    pub(crate) async fn get(&self, path: &str, service_cert: &str) -> Result<Vec<u8>, Error> {
        self.execute::<()>(&self.host, Method::GET, path, None, false, service_cert)
            .await
    }

    /// POST against the client's own host.
    pub(crate) async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
        with_secret: bool,
        service_cert: &str,
    ) -> Result<Vec<u8>, Error> {
        self.execute(&self.host, Method::POST, path, body, with_secret, service_cert)
            .await
    }

    /// PUT against the client's own host.
    pub(crate) async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
        service_cert: &str,
    ) -> Result<Vec<u8>, Error> {
        self.execute(&self.host, Method::PUT, path, body, false, service_cert)
            .await
    }

    /// DELETE against the client's own host.
    pub(crate) async fn delete(&self, path: &str, service_cert: &str) -> Result<Vec<u8>, Error> {
        self.execute::<()>(&self.host, Method::DELETE, path, None, false, service_cert)
            .await
    }
}

/// Decode a JSON response body into `T`, keeping the raw body in the
/// error for debugging.
pub(crate) fn decode<T: DeserializeOwned>(body: &[u8], what: &str) -> Result<T, Error> {
    serde_json::from_slice(body).map_err(|e| Error::Decode {
        message: format!("unexpected {what} response: {e}"),
        body: String::from_utf8_lossy(body).into_owned(),
    })
}
