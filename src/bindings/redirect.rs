//! HTTP-Redirect binding.
//!
//! Messages travel DEFLATE-compressed, base64-encoded and URL-encoded in
//! query parameters; the signature is detached, computed over the exact
//! `SAMLRequest=…&RelayState=…&SigAlg=…` string. Two IdP quirks affect the
//! inbound side: forced-lowercase percent escapes and double URL encoding
//! (see [`IdpQuirks`]).

use base64::Engine;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::{Read, Write};

use crate::error::{SpError, SpResult};
use crate::metadata::IdpQuirks;

use super::{DecodedMessage, MessageSigner, SamlMessageType, SignatureVerifier};

/// HTTP-Redirect binding bound to one IdP endpoint.
///
/// Created through the SP factories
/// ([`crate::metadata::SpDescriptor::sso_redirect_binding`] and
/// [`crate::metadata::SpDescriptor::slo_redirect_binding`]); holds the
/// IdP's signing certificate for verification and the SP key material for
/// signing.
pub struct RedirectBinding {
    message_type: SamlMessageType,
    destination: String,
    cert_pem: String,
    key: Vec<u8>,
    quirks: IdpQuirks,
}

impl RedirectBinding {
    /// Creates a binding for `message_type` addressed to `destination`.
    #[must_use]
    pub fn new(
        message_type: SamlMessageType,
        destination: impl Into<String>,
        cert_pem: impl Into<String>,
        key: Vec<u8>,
        quirks: IdpQuirks,
    ) -> Self {
        Self {
            message_type,
            destination: destination.into(),
            cert_pem: cert_pem.into(),
            key,
            quirks,
        }
    }

    /// The endpoint this binding addresses.
    #[must_use]
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Builds the signed redirect URL carrying `xml`.
    pub fn sign_url(
        &self,
        xml: &str,
        relay_state: Option<&str>,
        signer: &dyn MessageSigner,
    ) -> SpResult<String> {
        let compressed = deflate_compress(xml.as_bytes())?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&compressed);

        let to_sign = self.signed_string(&encoded, relay_state, signer.algorithm_uri());
        let signature = signer
            .sign_bytes(&self.key, to_sign.as_bytes())
            .map_err(SpError::Crypto)?;
        let signature_b64 = base64::engine::general_purpose::STANDARD.encode(&signature);

        let separator = if self.destination.contains('?') { '&' } else { '?' };
        Ok(format!(
            "{}{}{}&Signature={}",
            self.destination,
            separator,
            to_sign,
            self.encode_component(&signature_b64)
        ))
    }

    /// Decodes a received redirect message and verifies its detached
    /// signature against the IdP certificate.
    ///
    /// Accepts a full URL or a bare query string. A missing or failing
    /// signature yields `false` alongside the decoded message; only
    /// malformed input is an error.
    pub fn handle_response(
        &self,
        url_or_query: &str,
        verifier: &dyn SignatureVerifier,
    ) -> SpResult<(DecodedMessage, bool)> {
        let pairs = parse_query(url_or_query)?;

        let mut message = None;
        let mut message_type = self.message_type;
        let mut relay_state = None;
        let mut signature = None;
        let mut sig_alg = None;
        for (key, value) in pairs {
            match key.as_str() {
                "SAMLRequest" | "SAMLResponse" => {
                    message_type = SamlMessageType::from_param(&key).unwrap_or(message_type);
                    message = Some(value);
                }
                "RelayState" => relay_state = Some(value),
                "Signature" => signature = Some(value),
                "SigAlg" => sig_alg = Some(value),
                _ => {}
            }
        }

        let mut encoded = message.ok_or_else(|| {
            SpError::MissingElement("SAMLRequest or SAMLResponse parameter".to_string())
        })?;
        if self.quirks.sls_double_encoded_response {
            encoded = urlencoding::decode(&encoded)
                .map_err(|e| SpError::XmlParse(format!("URL decode error: {e}")))?
                .into_owned();
        }

        let valid = match (signature, sig_alg) {
            (Some(signature_b64), Some(alg)) => {
                let to_verify = self.signed_string(&encoded, relay_state.as_deref(), &alg);
                let signature = base64::engine::general_purpose::STANDARD
                    .decode(signature_b64.as_bytes())?;
                verifier
                    .verify_bytes(&self.cert_pem, to_verify.as_bytes(), &signature)
                    .unwrap_or(false)
            }
            _ => false,
        };

        let compressed =
            base64::engine::general_purpose::STANDARD.decode(encoded.as_bytes())?;
        let xml_bytes = deflate_decompress(&compressed)?;
        let xml = String::from_utf8(xml_bytes)
            .map_err(|e| SpError::XmlParse(format!("invalid UTF-8 in message: {e}")))?;

        Ok((
            DecodedMessage {
                xml,
                message_type,
                relay_state,
            },
            valid,
        ))
    }

    /// The exact byte string covered by the detached signature.
    fn signed_string(&self, encoded: &str, relay_state: Option<&str>, sig_alg: &str) -> String {
        let mut out = format!(
            "{}={}",
            self.message_type.form_param(),
            self.encode_component(encoded)
        );
        if let Some(rs) = relay_state {
            out.push_str("&RelayState=");
            out.push_str(&self.encode_component(rs));
        }
        out.push_str("&SigAlg=");
        out.push_str(&self.encode_component(sig_alg));
        out
    }

    fn encode_component(&self, value: &str) -> String {
        let encoded = urlencoding::encode(value).into_owned();
        if self.quirks.sls_force_lcase_url_encoding {
            lowercase_percent_escapes(&encoded)
        } else {
            encoded
        }
    }
}

/// Lowercases the hex digits of every percent escape, leaving everything
/// else untouched.
fn lowercase_percent_escapes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut hex_left = 0usize;
    for c in s.chars() {
        if c == '%' {
            hex_left = 2;
            out.push(c);
        } else if hex_left > 0 {
            hex_left -= 1;
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn parse_query(url_or_query: &str) -> SpResult<Vec<(String, String)>> {
    let parsed = url::Url::parse(url_or_query)
        .or_else(|_| url::Url::parse(&format!("http://localhost/?{url_or_query}")))
        .map_err(|e| SpError::InvalidUrl(format!("{url_or_query}: {e}")))?;
    Ok(parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect())
}

/// Compresses data using raw DEFLATE (no zlib header).
fn deflate_compress(data: &[u8]) -> SpResult<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder
        .finish()
        .map_err(|e| SpError::Deflate(format!("compression finish error: {e}")))
}

/// Decompresses raw DEFLATE data.
fn deflate_decompress(data: &[u8]) -> SpResult<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed)?;
    Ok(decompressed)
}
