//! SOAP binding.
//!
//! Used for ArtifactResolve and back-channel logout: the message is signed
//! with the SP key, wrapped in a SOAP 1.1 envelope, posted to the IdP, and
//! the enveloped response is verified against the IdP certificate. The
//! HTTP round-trip itself goes through the injected
//! [`HttpClient`](super::HttpClient).

use roxmltree::Document;

use crate::error::{SpError, SpResult};

use super::{HttpClient, MessageSigner, SignatureVerifier};

const SOAP_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Result of a SOAP round-trip.
#[derive(Debug, Clone)]
pub struct SoapResponse {
    /// The body payload extracted from the response envelope.
    pub xml: String,
    /// Whether the response signature verified against the IdP
    /// certificate.
    pub signature_valid: bool,
}

/// SOAP binding bound to one IdP endpoint.
pub struct SoapBinding<'a> {
    ua: &'a dyn HttpClient,
    url: String,
    idp_cert_pem: String,
    key: Vec<u8>,
}

impl<'a> SoapBinding<'a> {
    /// Creates a binding posting to `url` and verifying responses against
    /// `idp_cert_pem`.
    #[must_use]
    pub fn new(
        ua: &'a dyn HttpClient,
        url: impl Into<String>,
        idp_cert_pem: impl Into<String>,
        key: Vec<u8>,
    ) -> Self {
        Self {
            ua,
            url: url.into(),
            idp_cert_pem: idp_cert_pem.into(),
            key,
        }
    }

    /// Signs `xml`, wraps it in a SOAP envelope, posts it, and unwraps and
    /// verifies the response.
    pub fn request(
        &self,
        xml: &str,
        signer: &dyn MessageSigner,
        verifier: &dyn SignatureVerifier,
    ) -> SpResult<SoapResponse> {
        let signed = signer.sign_xml(&self.key, xml).map_err(SpError::Crypto)?;
        let envelope = wrap_envelope(&signed);

        let response = self
            .ua
            .post_xml(&self.url, &envelope)
            .map_err(SpError::Transport)?;

        self.handle_response(&response, verifier)
    }

    /// Unwraps a response envelope and verifies the payload signature.
    ///
    /// Verification failure is reported through
    /// [`SoapResponse::signature_valid`], not as an error.
    pub fn handle_response(
        &self,
        envelope: &str,
        verifier: &dyn SignatureVerifier,
    ) -> SpResult<SoapResponse> {
        let xml = unwrap_envelope(envelope)?;
        let signature_valid = verifier
            .verify_enveloped(&self.idp_cert_pem, &xml)
            .unwrap_or(false);
        Ok(SoapResponse {
            xml,
            signature_valid,
        })
    }
}

/// Wraps a payload in a SOAP 1.1 envelope.
#[must_use]
pub fn wrap_envelope(xml: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><soap-env:Envelope xmlns:soap-env="{SOAP_NS}"><soap-env:Body>{xml}</soap-env:Body></soap-env:Envelope>"#
    )
}

/// Extracts the first element inside the envelope body.
pub fn unwrap_envelope(envelope: &str) -> SpResult<String> {
    let doc = Document::parse(envelope)?;
    let body = doc
        .descendants()
        .find(|n| {
            n.is_element()
                && n.tag_name().name() == "Body"
                && n.tag_name().namespace() == Some(SOAP_NS)
        })
        .ok_or_else(|| SpError::MissingElement("soap-env:Body".to_string()))?;
    let payload = body
        .children()
        .find(|n| n.is_element())
        .ok_or_else(|| SpError::MissingElement("SOAP body payload".to_string()))?;
    Ok(envelope[payload.range()].to_string())
}
