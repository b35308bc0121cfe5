// Thumbprint data source
//
// Computes the SHA-256 fingerprint of a remote service's certificate,
// either by probing a live endpoint (trust-on-first-use -- the result
// must be cross-checked out of band) or from a PEM file. The two
// request shapes are mutually exclusive by construction.

use std::path::PathBuf;

use crate::error::CoreError;

/// Where the certificate to fingerprint comes from.
#[derive(Debug, Clone)]
pub enum ThumbprintSource {
    /// Probe a live TLS endpoint with verification disabled.
    Endpoint { address: String, port: u16 },
    /// Read the end-entity certificate from a PEM file.
    PemFile(PathBuf),
}

/// Compute the thumbprint. The returned string doubles as the data
/// source's identity.
///
/// Blocking: the endpoint probe performs a synchronous TLS handshake.
/// Callers inside an async runtime should wrap this in
/// `spawn_blocking`.
pub fn read(source: &ThumbprintSource) -> Result<String, CoreError> {
    let thumbprint = match source {
        ThumbprintSource::Endpoint { address, port } => {
            haven_api::thumbprint_from_host(address, *port)?
        }
        ThumbprintSource::PemFile(path) => haven_api::thumbprint_from_file(path)?,
    };
    Ok(thumbprint)
}
