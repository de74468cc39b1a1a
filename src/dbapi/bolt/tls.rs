//! TLS client setup.
//!
//! Server certificates are not checked against a trust store. When a trust
//! callback is configured it decides, given the certificate's key type and
//! SHA-512 fingerprint; otherwise every certificate is accepted.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{self, CryptoProvider};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use sha2::{Digest, Sha512};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, warn};

use crate::bolt::{BoltError, BoltResult};
use crate::dbapi::config::{ConnectConfig, TrustCallback};

// Contents of the SubjectPublicKeyInfo algorithm OIDs.
const OID_RSA_ENCRYPTION: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x01];
const OID_EC_PUBLIC_KEY: &[u8] = &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x02, 0x01];
const OID_ED25519: &[u8] = &[0x2B, 0x65, 0x70];

const DER_OID: u8 = 0x06;
const DER_EXPLICIT_0: u8 = 0xA0;

/// Key type name reported to the trust callback.
///
/// Only the algorithm of the certificate's SubjectPublicKeyInfo is looked
/// at. Malformed certificates report `"UNKNOWN"`.
pub fn key_type(cert_der: &[u8]) -> &'static str {
    match spki_algorithm(cert_der) {
        Some(OID_RSA_ENCRYPTION) => "RSA",
        Some(OID_EC_PUBLIC_KEY) => "EC",
        Some(OID_ED25519) => "ED25519",
        _ => "UNKNOWN",
    }
}

/// Split one DER element into `(tag, contents, rest)`.
fn der_element(data: &[u8]) -> Option<(u8, &[u8], &[u8])> {
    let (&tag, rest) = data.split_first()?;
    let (&first, rest) = rest.split_first()?;
    let (len, rest) = if first < 0x80 {
        (usize::from(first), rest)
    } else {
        let n = usize::from(first & 0x7F);
        if n == 0 || n > 4 || rest.len() < n {
            return None;
        }
        let len = rest[..n]
            .iter()
            .fold(0usize, |acc, b| (acc << 8) | usize::from(*b));
        (len, &rest[n..])
    };
    if rest.len() < len {
        return None;
    }
    Some((tag, &rest[..len], &rest[len..]))
}

/// OID contents of `tbsCertificate.subjectPublicKeyInfo.algorithm`.
fn spki_algorithm(cert_der: &[u8]) -> Option<&[u8]> {
    let (_, certificate, _) = der_element(cert_der)?;
    let (_, mut tbs, _) = der_element(certificate)?;
    if tbs.first() == Some(&DER_EXPLICIT_0) {
        tbs = der_element(tbs)?.2;
    }
    // serialNumber, signature, issuer, validity, subject
    for _ in 0..5 {
        tbs = der_element(tbs)?.2;
    }
    let (_, spki, _) = der_element(tbs)?;
    let (_, algorithm, _) = der_element(spki)?;
    let (tag, oid, _) = der_element(algorithm)?;
    (tag == DER_OID).then_some(oid)
}

/// Hex SHA-512 of the DER certificate.
pub fn fingerprint(cert_der: &[u8]) -> String {
    hex::encode(Sha512::digest(cert_der))
}

struct CallbackVerifier {
    callback: Option<TrustCallback>,
    hostname: String,
    ip: String,
    provider: Arc<CryptoProvider>,
}

impl std::fmt::Debug for CallbackVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackVerifier")
            .field("callback", &self.callback.is_some())
            .field("hostname", &self.hostname)
            .field("ip", &self.ip)
            .finish()
    }
}

impl ServerCertVerifier for CallbackVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        if let Some(callback) = &self.callback {
            let der = end_entity.as_ref();
            let key_type = key_type(der);
            let fingerprint = fingerprint(der);
            if !callback(&self.hostname, &self.ip, key_type, &fingerprint) {
                warn!(host = %self.hostname, ip = %self.ip, key_type, "server certificate rejected");
                return Err(rustls::Error::General(
                    "server certificate rejected by trust callback".to_string(),
                ));
            }
            debug!(host = %self.hostname, key_type, "server certificate accepted");
        }
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

fn tls_error(context: &str, err: impl std::fmt::Display) -> BoltError {
    BoltError::Tls(format!("{}: {}", context, err))
}

fn load_certs(path: &Path) -> BoltResult<Vec<CertificateDer<'static>>> {
    let file = File::open(path).map_err(|e| tls_error(&path.display().to_string(), e))?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| tls_error("invalid client certificate", e))?;
    if certs.is_empty() {
        return Err(BoltError::Tls(format!(
            "no certificate found in {}",
            path.display()
        )));
    }
    Ok(certs)
}

fn load_key(path: &Path) -> BoltResult<PrivateKeyDer<'static>> {
    let file = File::open(path).map_err(|e| tls_error(&path.display().to_string(), e))?;
    rustls_pemfile::private_key(&mut BufReader::new(file))
        .map_err(|e| tls_error("invalid client key", e))?
        .ok_or_else(|| BoltError::Tls(format!("no private key found in {}", path.display())))
}

/// Build the client configuration for one connection.
pub fn client_config(config: &ConnectConfig, ip: String) -> BoltResult<ClientConfig> {
    let provider = Arc::new(crypto::ring::default_provider());
    let verifier = CallbackVerifier {
        callback: config.trust_callback.clone(),
        hostname: config.server_name().to_string(),
        ip,
        provider: Arc::clone(&provider),
    };
    let builder = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| tls_error("unsupported protocol versions", e))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier));

    match (&config.sslcert, &config.sslkey) {
        (Some(cert), Some(key)) => builder
            .with_client_auth_cert(load_certs(cert)?, load_key(key)?)
            .map_err(|e| tls_error("invalid client certificate", e)),
        _ => Ok(builder.with_no_client_auth()),
    }
}

/// Run the TLS handshake over an open TCP stream.
pub async fn connect(stream: TcpStream, config: &ConnectConfig) -> BoltResult<TlsStream<TcpStream>> {
    let ip = stream.peer_addr().map(|a| a.ip().to_string())?;
    let tls_config = client_config(config, ip)?;
    let server_name = ServerName::try_from(config.server_name().to_string())
        .map_err(|e| tls_error("invalid server name", e))?;
    TlsConnector::from(Arc::new(tls_config))
        .connect(server_name, stream)
        .await
        .map_err(|e| tls_error("TLS handshake failed", e))
}
