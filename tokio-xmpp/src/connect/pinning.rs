//! Certificate pinning on top of rustls's default verifier.
//!
//! Pins are consulted first: if a host has pins configured, at least one
//! must match or the handshake is rejected, bypassing the normal PKI check
//! entirely (this is trust-on-first-use style pinning, not a narrowing of
//! the CA set). Hosts with no configured pins fall through to the wrapped
//! verifier unchanged.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use base64::engine::{general_purpose::STANDARD as Base64, Engine as _};
use sha2::{Digest, Sha256};
use tokio_rustls::rustls::{
    client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier},
    pki_types::{CertificateDer, ServerName, UnixTime},
    DistinguishedName, Error as TlsError, SignatureScheme,
};

/// What a [`PinnedKey`]'s bytes are computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinKind {
    /// SHA-256 of the certificate's SubjectPublicKeyInfo, as used by HPKP.
    PublicKey,
    /// SHA-256 of the whole DER-encoded certificate.
    Certificate,
}

/// A single pin: the hash of either a public key or a full certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedKey {
    /// What `value` is a hash of.
    pub kind: PinKind,
    /// The SHA-256 digest, 32 bytes.
    pub value: Vec<u8>,
}

impl PinnedKey {
    fn matches(&self, cert: &CertificateDer<'_>) -> bool {
        let digest = match self.kind {
            PinKind::Certificate => Sha256::digest(cert.as_ref()).to_vec(),
            PinKind::PublicKey => match spki_of(cert) {
                Some(spki) => Sha256::digest(&spki).to_vec(),
                None => return false,
            },
        };
        digest == self.value
    }
}

/// Reads one DER TLV (tag-length-value) from the front of `buf`, definite
/// lengths only (as X.509 always uses), returning `(tag, content, rest)`.
fn read_tlv(buf: &[u8]) -> Option<(u8, &[u8], &[u8])> {
    let tag = *buf.first()?;
    let first_len_byte = *buf.get(1)?;
    let (len, header_len) = if first_len_byte & 0x80 == 0 {
        (first_len_byte as usize, 2)
    } else {
        let n = (first_len_byte & 0x7f) as usize;
        if n == 0 || n > 4 {
            return None;
        }
        let mut len = 0usize;
        for b in buf.get(2..2 + n)? {
            len = (len << 8) | (*b as usize);
        }
        (len, 2 + n)
    };
    let content = buf.get(header_len..header_len + len)?;
    let rest = &buf[header_len + len..];
    Some((tag, content, rest))
}

/// Extracts the DER-encoded SubjectPublicKeyInfo from an X.509 certificate,
/// by walking just enough of the ASN.1 structure (Certificate ::= SEQUENCE {
/// tbsCertificate, signatureAlgorithm, signatureValue }, tbsCertificate's
/// 7th element after the optional `[0] version`) to locate it, without a
/// full X.509 parser.
fn spki_of(cert: &CertificateDer<'_>) -> Option<Vec<u8>> {
    const SEQUENCE: u8 = 0x30;
    const CONTEXT_0: u8 = 0xa0;

    let (tag, certificate, _) = read_tlv(cert.as_ref())?;
    if tag != SEQUENCE {
        return None;
    }
    let (tag, mut tbs, _) = read_tlv(certificate)?;
    if tag != SEQUENCE {
        return None;
    }

    // Optional `[0] EXPLICIT Version`.
    if let Some((tag, _, rest)) = read_tlv(tbs) {
        if tag == CONTEXT_0 {
            tbs = rest;
        }
    }
    // serialNumber, signature, issuer, validity, subject: skip five fields.
    for _ in 0..5 {
        let (_, _, rest) = read_tlv(tbs)?;
        tbs = rest;
    }
    let (tag, _, rest) = read_tlv(tbs)?;
    if tag != SEQUENCE {
        return None;
    }
    // SPKI pins are conventionally over the whole TLV, not just its content.
    let tlv_len = tbs.len() - rest.len();
    Some(tbs[..tlv_len].to_vec())
}

/// Maps a hostname to the pins accepted for it.
#[derive(Debug, Clone, Default)]
pub struct PinStore(HashMap<String, Vec<PinnedKey>>);

/// Error produced while loading a pin store file.
#[derive(Debug)]
pub enum PinStoreError {
    Io(io::Error),
    /// `line`, 1-indexed.
    Malformed(usize),
}

impl fmt::Display for PinStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinStoreError::Io(e) => write!(f, "failed to read pin store: {}", e),
            PinStoreError::Malformed(line) => write!(f, "malformed pin store entry at line {}", line),
        }
    }
}

impl std::error::Error for PinStoreError {}

impl From<io::Error> for PinStoreError {
    fn from(e: io::Error) -> Self {
        PinStoreError::Io(e)
    }
}

impl PinStore {
    /// An empty pin store, which pins nothing (every host falls through to
    /// the wrapped verifier).
    pub fn empty() -> PinStore {
        PinStore(HashMap::new())
    }

    /// Loads a pin store from a file with one pin per line:
    /// `<host> <pubkey|cert> <base64-sha256>`. Blank lines and lines
    /// starting with `#` are ignored.
    pub fn load_from_file(path: &Path) -> Result<PinStore, PinStoreError> {
        let contents = fs::read_to_string(path)?;
        let mut store = HashMap::new();
        for (lineno, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            let host = parts.next().ok_or(PinStoreError::Malformed(lineno + 1))?;
            let kind = match parts.next() {
                Some("pubkey") => PinKind::PublicKey,
                Some("cert") => PinKind::Certificate,
                _ => return Err(PinStoreError::Malformed(lineno + 1)),
            };
            let b64 = parts.next().ok_or(PinStoreError::Malformed(lineno + 1))?;
            let value = Base64
                .decode(b64)
                .map_err(|_| PinStoreError::Malformed(lineno + 1))?;
            store
                .entry(host.to_ascii_lowercase())
                .or_insert_with(Vec::new)
                .push(PinnedKey { kind, value });
        }
        Ok(PinStore(store))
    }

    /// Registers `pins` for `host`, replacing any previously registered.
    pub fn insert(&mut self, host: impl Into<String>, pins: Vec<PinnedKey>) {
        self.0.insert(host.into().to_ascii_lowercase(), pins);
    }

    /// Adds a single pin for `host`, alongside any already registered.
    pub fn add_pin(&mut self, host: impl Into<String>, pin: PinnedKey) {
        self.0
            .entry(host.into().to_ascii_lowercase())
            .or_insert_with(Vec::new)
            .push(pin);
    }

    fn pins_for(&self, host: &str) -> Option<&[PinnedKey]> {
        self.0.get(&host.to_ascii_lowercase()).map(Vec::as_slice)
    }
}

/// Wraps an inner [`ServerCertVerifier`] (normally rustls's default WebPKI
/// verifier) with a [`PinStore`] consulted first for hosts that have pins.
#[derive(Debug)]
pub struct PinningServerVerifier {
    inner: Arc<dyn ServerCertVerifier>,
    pins: PinStore,
}

impl PinningServerVerifier {
    /// Wraps `inner`, consulting `pins` before falling through to it.
    pub fn new(inner: Arc<dyn ServerCertVerifier>, pins: PinStore) -> Arc<PinningServerVerifier> {
        Arc::new(PinningServerVerifier { inner, pins })
    }
}

impl ServerCertVerifier for PinningServerVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, TlsError> {
        let host = match server_name {
            ServerName::DnsName(name) => Some(name.as_ref()),
            _ => None,
        };

        if let Some(pins) = host.and_then(|h| self.pins.pins_for(h)) {
            if pins.iter().any(|pin| pin.matches(end_entity)) {
                return Ok(ServerCertVerified::assertion());
            }
            return Err(TlsError::General(format!(
                "certificate for {:?} does not match any pinned key",
                host
            )));
        }

        self.inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &tokio_rustls::rustls::DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &tokio_rustls::rustls::DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }

    fn root_hint_subjects(&self) -> Option<&[DistinguishedName]> {
        self.inner.root_hint_subjects()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn read_tlv_short_form() {
        let buf = [0x30, 0x03, 0x01, 0x02, 0x03, 0xff];
        let (tag, content, rest) = read_tlv(&buf).unwrap();
        assert_eq!(tag, 0x30);
        assert_eq!(content, [0x01, 0x02, 0x03]);
        assert_eq!(rest, [0xff]);
    }

    #[test]
    fn read_tlv_long_form() {
        let mut buf = vec![0x30, 0x81, 0x80];
        buf.extend(std::iter::repeat(0xaa).take(0x80));
        let (tag, content, rest) = read_tlv(&buf).unwrap();
        assert_eq!(tag, 0x30);
        assert_eq!(content.len(), 0x80);
        assert!(rest.is_empty());
    }

    #[test]
    fn read_tlv_truncated_is_none() {
        let buf = [0x30, 0x05, 0x01];
        assert!(read_tlv(&buf).is_none());
    }

    #[test]
    fn pin_store_parses_lines() {
        let mut file = tempfile_with(
            "# comment\n\nexample.org cert QUJD\nother.example pubkey REUY\n",
        );
        let store = PinStore::load_from_file(file.path()).unwrap();
        let pins = store.pins_for("EXAMPLE.ORG").unwrap();
        assert_eq!(pins.len(), 1);
        assert_eq!(pins[0].kind, PinKind::Certificate);
    }

    #[test]
    fn pin_store_rejects_malformed_kind() {
        let file = tempfile_with("example.org nonsense QUJD\n");
        assert!(matches!(
            PinStore::load_from_file(file.path()),
            Err(PinStoreError::Malformed(1))
        ));
    }

    fn tempfile_with(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }
}
