// Per-call HTTP client construction.
//
// Every appliance request rides on a dedicated single-use client whose
// trust pool contains exactly one certificate: the pinned service
// certificate supplied by the caller for that call. No pooling, no
// reuse -- reconciliation traffic is low-volume and each call pays the
// full TLS handshake in exchange for never holding appliance state.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::error::Error;

/// Session-token request/response header.
pub const AUTH_TOKEN_HEADER: &str = "X-Haven-Auth";
/// Side-channel authorization header carrying the current local password.
pub const CONFIG_SECRET_HEADER: &str = "Config-Secret";
/// Versioned vendor media type accepted from every endpoint.
pub const ACCEPT_VALUE: &str = "application/vnd.haven.dr-v4.7+json;charset=UTF-8";
/// Product identifier sent with every request.
pub const USER_AGENT_VALUE: &str = "haven/4.7";
/// Credential type discriminator for `/sessions`.
pub const LOCAL_USER_TYPE: &str = "localUser";

/// Fixed per-request timeout, independent of any poll-loop ceiling.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Build a single-use `reqwest::Client` trusting exactly one certificate.
///
/// `service_cert` is the appliance's pinned service certificate as a
/// base64-encoded DER blob (the form it takes in the VM's extra-config
/// metadata). It is decoded, re-wrapped as a PEM `CERTIFICATE` block,
/// and installed as the client's only trust root -- built-in roots are
/// disabled so nothing else can vouch for the appliance.
pub fn build_transport(service_cert: &str) -> Result<reqwest::Client, Error> {
    if service_cert.is_empty() {
        return Err(Error::Config {
            message: "service certificate is required".into(),
        });
    }

    let der = BASE64.decode(service_cert).map_err(|e| Error::Config {
        message: format!("could not decode service certificate: {e}"),
    })?;

    let block = pem::Pem::new("CERTIFICATE", der);
    let cert =
        reqwest::Certificate::from_pem(pem::encode(&block).as_bytes()).map_err(|e| {
            Error::Config {
                message: format!("service certificate is not a valid certificate: {e}"),
            }
        })?;

    reqwest::Client::builder()
        .use_rustls_tls()
        .tls_built_in_root_certs(false)
        .add_root_certificate(cert)
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT_VALUE)
        .build()
        .map_err(Error::Transport)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_certificate_is_rejected() {
        let err = build_transport("").expect_err("empty cert must fail");
        assert!(matches!(err, Error::Config { .. }), "got: {err:?}");
    }

    #[test]
    fn invalid_base64_is_rejected() {
        let err = build_transport("not%base64!").expect_err("bad base64 must fail");
        match err {
            Error::Config { message } => assert!(message.contains("decode")),
            other => panic!("expected Config error, got: {other:?}"),
        }
    }

    #[test]
    fn header_constants_match_wire_contract() {
        assert_eq!(ACCEPT_VALUE, "application/vnd.haven.dr-v4.7+json;charset=UTF-8");
        assert_eq!(AUTH_TOKEN_HEADER, "X-Haven-Auth");
        assert_eq!(CONFIG_SECRET_HEADER, "Config-Secret");
    }
}
