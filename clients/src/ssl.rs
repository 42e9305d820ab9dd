use log::error;
use rustls::client::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::{Certificate, DigitallySignedStruct, PrivateKey, ServerName};
use rustls_pemfile::{certs, read_one, Item};
use std::fs::File;
use std::io::{BufReader, Error, ErrorKind};
use std::iter;
use std::time::SystemTime;

/// Full nodes present certificates signed by their own private CA, so the
/// server side of the handshake is not verified. The client side is
/// authenticated with the node's daemon certificate.
pub struct NoCertificateVerification;

impl ServerCertVerifier for NoCertificateVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &Certificate,
        _intermediates: &[Certificate],
        _server_name: &ServerName,
        _scts: &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now: SystemTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &Certificate,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &Certificate,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }
}

pub fn load_certs(filename: &str) -> Result<Vec<Certificate>, Error> {
    let cert_file = File::open(filename)
        .map_err(|e| Error::new(e.kind(), format!("Failed to open {filename}: {e}")))?;
    let mut reader = BufReader::new(cert_file);
    let certs = certs(&mut reader)?;
    if certs.is_empty() {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!("No certificates found in {filename}"),
        ));
    }
    Ok(certs.into_iter().map(Certificate).collect())
}

pub fn load_private_key(filename: &str) -> Result<PrivateKey, Error> {
    let keyfile = File::open(filename)
        .map_err(|e| Error::new(e.kind(), format!("Failed to open {filename}: {e}")))?;
    let mut reader = BufReader::new(keyfile);
    for item in iter::from_fn(|| read_one(&mut reader).transpose()) {
        match item? {
            Item::X509Certificate(_) => error!("Found Certificate, not Private Key"),
            Item::RSAKey(key) | Item::PKCS8Key(key) | Item::ECKey(key) => {
                return Ok(PrivateKey(key));
            }
            _ => error!("Unknown Item while loading private key"),
        }
    }
    Err(Error::new(
        ErrorKind::NotFound,
        format!("Private Key Not Found in {filename}"),
    ))
}
