// Certificate thumbprints
//
// SHA-256 fingerprints over raw certificate DER, formatted as
// `SHA-256:` followed by colon-joined uppercase hex pairs. Two sources:
// a live TLS endpoint (trust-on-first-use -- verification is disabled
// and the caller is expected to cross-check the result out of band) or
// a PEM file holding the end-entity certificate.

use std::fmt::Write as _;
use std::net::TcpStream;
use std::path::Path;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use sha2::{Digest, Sha256};
use tracing::debug;
use x509_cert::Certificate;
use x509_cert::der::Decode as _;

use crate::error::Error;

/// Fingerprint the certificate served at `address:port`.
///
/// Opens a TLS connection with certificate verification disabled and
/// hashes the first peer certificate. Dial and handshake failures
/// surface as [`Error::Connection`].
pub fn thumbprint_from_host(address: &str, port: u16) -> Result<String, Error> {
    let connect = |reason: String| Error::Connection {
        address: format!("{address}:{port}"),
        reason,
    };

    let server_name =
        ServerName::try_from(address.to_owned()).map_err(|e| connect(e.to_string()))?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = rustls::ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()
        .map_err(|e| connect(e.to_string()))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyCert { provider }))
        .with_no_client_auth();

    debug!("probing certificate at {address}:{port}");

    let mut conn = rustls::ClientConnection::new(Arc::new(config), server_name)
        .map_err(|e| connect(e.to_string()))?;
    let mut tcp = TcpStream::connect((address, port)).map_err(|e| connect(e.to_string()))?;

    while conn.is_handshaking() {
        conn.complete_io(&mut tcp).map_err(|e| connect(e.to_string()))?;
    }

    let cert = conn
        .peer_certificates()
        .and_then(|certs| certs.first())
        .ok_or_else(|| connect("peer presented no certificate".into()))?;

    Ok(format_fingerprint(&Sha256::digest(cert.as_ref())))
}

/// Fingerprint the first certificate in a PEM file.
///
/// Fails with [`Error::PemFormat`] when decoding yields no block and
/// [`Error::CertificateParse`] when the block's DER is malformed.
pub fn thumbprint_from_file(path: impl AsRef<Path>) -> Result<String, Error> {
    let data = std::fs::read(path.as_ref())?;

    let block = pem::parse_many(&data)
        .ok()
        .and_then(|blocks| blocks.into_iter().next())
        .ok_or_else(|| Error::PemFormat("no PEM block found".into()))?;

    Certificate::from_der(block.contents())
        .map_err(|e| Error::CertificateParse(e.to_string()))?;

    Ok(format_fingerprint(&Sha256::digest(block.contents())))
}

/// `SHA-256:` + 32 colon-joined uppercase hex pairs.
fn format_fingerprint(digest: &[u8]) -> String {
    let mut out = String::with_capacity(8 + digest.len() * 3);
    out.push_str("SHA-256");
    for byte in digest {
        out.push(':');
        let _ = write!(out, "{byte:02X}");
    }
    out
}

/// Verifier that accepts any certificate -- the whole point of the
/// probe is to learn what certificate the peer presents.
#[derive(Debug)]
struct AcceptAnyCert {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_format_is_32_uppercase_pairs() {
        let digest = [0xABu8; 32];
        let printed = format_fingerprint(&digest);

        assert!(printed.starts_with("SHA-256:"));
        let pairs: Vec<&str> = printed["SHA-256:".len()..].split(':').collect();
        assert_eq!(pairs.len(), 32);
        assert!(pairs.iter().all(|p| *p == "AB"));
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let digest = Sha256::digest(b"certificate bytes");
        assert_eq!(format_fingerprint(&digest), format_fingerprint(&digest));
    }

    #[test]
    fn fingerprint_hex_is_zero_padded() {
        let mut digest = [0u8; 32];
        digest[0] = 0x0F;
        let printed = format_fingerprint(&digest);
        assert!(printed.starts_with("SHA-256:0F:00:"));
    }

    #[test]
    fn non_pem_file_is_a_format_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("not-a-cert.pem");
        std::fs::write(&path, "this is not pem at all").expect("write");

        let err = thumbprint_from_file(&path).expect_err("must fail");
        assert!(matches!(err, Error::PemFormat(_)), "got: {err:?}");
    }

    #[test]
    fn pem_with_garbage_der_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("garbage.pem");
        let block = pem::Pem::new("CERTIFICATE", b"garbage der bytes".to_vec());
        std::fs::write(&path, pem::encode(&block)).expect("write");

        let err = thumbprint_from_file(&path).expect_err("must fail");
        assert!(matches!(err, Error::CertificateParse(_)), "got: {err:?}");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = thumbprint_from_file("/nonexistent/cert.pem").expect_err("must fail");
        assert!(matches!(err, Error::Io(_)), "got: {err:?}");
    }
}
