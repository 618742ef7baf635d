//! X.509 certificate material handling.
//!
//! IdP metadata is not guaranteed to PEM-wrap certificate contents, so this
//! module can re-armor a bare base64 blob, and SP metadata needs the armor
//! stripped back off. Chain verification is deliberately non-strict:
//! real-world IdPs ship expired-but-pinned certificates, and the operator
//! decides whether to trust them. Verification failures therefore surface
//! as [`CertVerificationWarning`]s, never as errors.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use x509_parser::pem::{parse_x509_pem, Pem};
use x509_parser::prelude::*;

use crate::error::{SpError, SpResult};

/// Where certificate or key material comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CertSource {
    /// A filesystem path to a PEM file.
    Path(PathBuf),
    /// Inline PEM text.
    Pem(String),
}

/// A parsed X.509 certificate, retaining both encodings.
#[derive(Debug, Clone)]
pub struct Certificate {
    pem: String,
    der: Vec<u8>,
}

impl Certificate {
    /// The PEM text as loaded.
    #[must_use]
    pub fn pem(&self) -> &str {
        &self.pem
    }

    /// The DER bytes.
    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// The base64 body with armor stripped, as used verbatim in metadata.
    #[must_use]
    pub fn body(&self) -> String {
        strip_armor(&self.pem)
    }
}

/// Loads and parses a PEM certificate from a path or inline text.
pub fn load_pem(source: &CertSource) -> SpResult<Certificate> {
    match source {
        CertSource::Path(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                SpError::InvalidCertificate(format!("failed to read {}: {e}", path.display()))
            })?;
            parse_pem(&text)
        }
        CertSource::Pem(text) => parse_pem(text),
    }
}

/// Parses PEM certificate text, validating the X.509 structure.
pub fn parse_pem(text: &str) -> SpResult<Certificate> {
    let (_, pem) = parse_x509_pem(text.as_bytes())
        .map_err(|e| SpError::InvalidCertificate(format!("PEM parse error: {e}")))?;
    X509Certificate::from_der(&pem.contents)
        .map_err(|e| SpError::InvalidCertificate(format!("X.509 parse error: {e}")))?;
    Ok(Certificate {
        pem: text.to_string(),
        der: pem.contents,
    })
}

/// Removes PEM armor lines, producing a single base64 blob.
///
/// Line wrapping of the result is the caller's concern.
#[must_use]
pub fn strip_armor(pem: &str) -> String {
    pem.lines()
        .filter(|line| !line.trim_start().starts_with("-----"))
        .flat_map(|line| line.chars())
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Re-wraps a possibly-unwrapped base64 blob into PEM with `width`-column
/// lines and standard CERTIFICATE armor.
///
/// Tolerates input that already carries armor; re-wrapping an already
/// wrapped body is a fixed point.
#[must_use]
pub fn rewrap_base64(text: &str, width: usize) -> String {
    let body: String = text
        .lines()
        .filter(|line| !line.trim_start().starts_with("-----"))
        .flat_map(|line| line.chars())
        .filter(|c| !c.is_whitespace())
        .collect();

    let mut out = String::from("-----BEGIN CERTIFICATE-----\n");
    let bytes = body.as_bytes();
    for chunk in bytes.chunks(width.max(1)) {
        // base64 text is ASCII; chunking on bytes is chunking on chars
        out.push_str(std::str::from_utf8(chunk).unwrap_or_default());
        out.push('\n');
    }
    out.push_str("-----END CERTIFICATE-----\n");
    out
}

/// A non-fatal certificate verification failure.
///
/// Delivered through the observer callback on descriptor construction; the
/// certificate is retained regardless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertVerificationWarning {
    /// The key usage the certificate was stored under (`signing`,
    /// `encryption`).
    pub usage: String,
    /// Why verification failed.
    pub reason: String,
}

impl fmt::Display for CertVerificationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "certificate verification warning ({}): {}",
            self.usage, self.reason
        )
    }
}

/// Observer for certificate verification warnings.
pub type CertWarningSink<'a> = &'a mut dyn FnMut(CertVerificationWarning);

/// Verifies a certificate against a CA bundle, non-strictly.
///
/// Accepts the certificate when it is pinned directly in the bundle, or
/// when its signature verifies against a bundle certificate whose subject
/// matches the issuer. Validity periods are not checked; operators pin
/// expired IdP certificates in practice.
pub fn verify_chain(cert_pem: &str, ca_bundle: &[u8]) -> Result<(), String> {
    let cert = parse_pem(cert_pem).map_err(|e| e.to_string())?;
    let (_, parsed) = X509Certificate::from_der(cert.der())
        .map_err(|e| format!("X.509 parse error: {e}"))?;

    let mut pems = Vec::new();
    for pem in Pem::iter_from_buffer(ca_bundle) {
        let pem = pem.map_err(|e| format!("CA bundle PEM error: {e}"))?;
        pems.push(pem);
    }
    if pems.is_empty() {
        return Err("CA bundle contains no certificates".to_string());
    }

    // Direct pin: the certificate itself appears in the bundle.
    if pems.iter().any(|p| p.contents == cert.der()) {
        return Ok(());
    }

    let mut issuer_seen = false;
    for pem in &pems {
        let Ok((_, candidate)) = X509Certificate::from_der(&pem.contents) else {
            continue;
        };
        if candidate.subject().as_raw() != parsed.issuer().as_raw() {
            continue;
        }
        issuer_seen = true;
        if parsed.verify_signature(Some(candidate.public_key())).is_ok() {
            return Ok(());
        }
    }

    if issuer_seen {
        Err("signature does not verify against any bundle certificate".to_string())
    } else {
        Err(format!("issuer not found in CA bundle: {}", parsed.issuer()))
    }
}
