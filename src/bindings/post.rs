//! HTTP-POST binding.
//!
//! Responses arrive base64-encoded in the `SAMLResponse` form field with
//! the signature embedded in the XML as an enveloped XML-DSig.

use std::path::PathBuf;

use base64::Engine;
use roxmltree::Document;

use crate::certs;
use crate::error::{SpError, SpResult};
use crate::xml;

use super::{DecodedMessage, SamlMessageType, SignatureVerifier};

/// HTTP-POST binding.
///
/// Created through [`crate::metadata::SpDescriptor::post_binding`], which
/// seeds it with the SP's CA bundle for the embedded-certificate chain
/// check.
pub struct PostBinding {
    cacert: Option<PathBuf>,
}

impl PostBinding {
    /// Creates a binding; `cacert` is the optional CA bundle the embedded
    /// certificate is checked against.
    #[must_use]
    pub fn new(cacert: Option<PathBuf>) -> Self {
        Self { cacert }
    }

    /// Decodes a `SAMLResponse` form value without verifying anything.
    pub fn decode(&self, raw: &str) -> SpResult<DecodedMessage> {
        // Form fields may arrive with embedded whitespace from line wrapping.
        let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        let decoded = base64::engine::general_purpose::STANDARD.decode(cleaned.as_bytes())?;
        let xml = String::from_utf8(decoded)
            .map_err(|e| SpError::XmlParse(format!("invalid UTF-8 in message: {e}")))?;
        Ok(DecodedMessage {
            xml,
            message_type: SamlMessageType::Response,
            relay_state: None,
        })
    }

    /// Decodes a `SAMLResponse` form value and verifies its enveloped
    /// signature.
    ///
    /// The certificate embedded in the `ds:Signature` is re-armored and,
    /// when a CA bundle is configured, chain-checked non-strictly (failure
    /// logs a warning, as with metadata certificates). The returned boolean
    /// is the verifier's verdict on the XML-DSig; a response without an
    /// embedded certificate is reported as unverified rather than an error.
    pub fn handle_response(
        &self,
        raw: &str,
        verifier: &dyn SignatureVerifier,
    ) -> SpResult<(DecodedMessage, bool)> {
        let decoded = self.decode(raw)?;
        let stripped = xml::strip_comments(decoded.xml.as_bytes())?;
        let doc = Document::parse(&stripped)?;

        let Some(blob) =
            xml::descendants_local(doc.root(), "X509Certificate").find_map(xml::element_text)
        else {
            return Ok((decoded, false));
        };
        let cert_pem = certs::rewrap_base64(blob, 64);

        if let Some(cacert) = self.cacert.as_deref() {
            match std::fs::read(cacert) {
                Ok(bundle) => {
                    if let Err(reason) = certs::verify_chain(&cert_pem, &bundle) {
                        tracing::warn!(%reason, "POST response certificate failed chain check");
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        path = %cacert.display(),
                        error = %e,
                        "failed to read CA bundle for POST response check"
                    );
                }
            }
        }

        let valid = verifier
            .verify_enveloped(&cert_pem, &stripped)
            .unwrap_or(false);
        Ok((decoded, valid))
    }
}
