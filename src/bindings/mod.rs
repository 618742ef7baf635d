//! SAML binding contracts and parameter handling.
//!
//! The wire-level work a binding can do without I/O lives here: DEFLATE
//! and base64 coding, signed-query construction, SOAP envelope handling.
//! Everything that touches a network or a private key goes through the
//! collaborator traits below, injected by the caller:
//!
//! - [`MessageSigner`] - sign-bytes / sign-XML with the SP key
//! - [`SignatureVerifier`] - verify a detached or enveloped signature
//!   against an IdP certificate
//! - [`HttpClient`] - the SOAP round-trip
//!
//! Signature verification failures are reported as `false` from
//! `handle_response`/`verify`; bindings do not raise for them.

mod post;
mod redirect;
mod soap;

pub use post::*;
pub use redirect::*;
pub use soap::*;

/// SAML message type for binding operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamlMessageType {
    /// AuthnRequest / LogoutRequest / ArtifactResolve.
    Request,
    /// Response / LogoutResponse.
    Response,
}

impl SamlMessageType {
    /// Returns the query or form parameter name for this message type.
    #[must_use]
    pub const fn form_param(&self) -> &'static str {
        match self {
            Self::Request => "SAMLRequest",
            Self::Response => "SAMLResponse",
        }
    }

    /// Parses a message type from its parameter name.
    #[must_use]
    pub fn from_param(name: &str) -> Option<Self> {
        match name {
            "SAMLRequest" => Some(Self::Request),
            "SAMLResponse" => Some(Self::Response),
            _ => None,
        }
    }
}

/// Decoded SAML binding message.
#[derive(Debug, Clone)]
pub struct DecodedMessage {
    /// The decoded XML message.
    pub xml: String,
    /// The message type (request or response).
    pub message_type: SamlMessageType,
    /// The RelayState if present.
    pub relay_state: Option<String>,
}

/// Sign-bytes collaborator holding no key of its own; the SP's private key
/// material is passed in by the binding.
///
/// Keys are opaque bytes to the core and must never appear in logs or
/// emitted XML.
pub trait MessageSigner {
    /// Signs raw bytes (the HTTP-Redirect signed string).
    fn sign_bytes(&self, key: &[u8], data: &[u8]) -> Result<Vec<u8>, String>;

    /// Produces an enveloped XML-DSig over `xml` (SOAP requests).
    fn sign_xml(&self, key: &[u8], xml: &str) -> Result<String, String>;

    /// The signature algorithm URI advertised as `SigAlg`.
    fn algorithm_uri(&self) -> &str;
}

/// Verify-signature collaborator.
pub trait SignatureVerifier {
    /// Verifies a detached signature over raw bytes against a PEM
    /// certificate.
    fn verify_bytes(&self, cert_pem: &str, data: &[u8], signature: &[u8])
        -> Result<bool, String>;

    /// Verifies the enveloped XML-DSig of a document against a PEM
    /// certificate.
    fn verify_enveloped(&self, cert_pem: &str, xml: &str) -> Result<bool, String>;
}

/// Blocking SOAP transport collaborator.
pub trait HttpClient {
    /// Posts an XML body to `url` and returns the response body.
    fn post_xml(&self, url: &str, body: &str) -> Result<String, String>;
}
