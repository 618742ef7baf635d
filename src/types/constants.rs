//! SAML 2.0 constants and URIs.
//!
//! Binding URIs, NameID format handling, and status codes as defined in
//! the SAML 2.0 specification.

use std::sync::LazyLock;

use regex::Regex;

/// SAML protocol version emitted on every message.
pub const SAML_VERSION: &str = "2.0";

/// NameID format used when IdP metadata lists none.
pub const NAMEID_FORMAT_UNSPECIFIED: &str =
    "urn:oasis:names:tc:SAML:1.1:nameid-format:unspecified";

/// Short name of [`NAMEID_FORMAT_UNSPECIFIED`].
pub const NAMEID_SHORT_UNSPECIFIED: &str = "unspecified";

static NAMEID_FORMAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^urn:oasis:names:tc:SAML:(?:2\.0|1\.1):nameid-format:(.*)$").unwrap()
});

/// Extracts the short name from a NameID format URI.
///
/// `urn:oasis:names:tc:SAML:2.0:nameid-format:transient` yields
/// `transient`; URIs outside the SAML 1.1/2.0 nameid-format families yield
/// `None`.
#[must_use]
pub fn nameid_short_name(uri: &str) -> Option<&str> {
    NAMEID_FORMAT_RE
        .captures(uri)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

// ============================================================================
// Binding URIs
// ============================================================================

/// HTTP-Redirect binding URI.
pub const BINDING_HTTP_REDIRECT: &str = "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect";

/// HTTP-POST binding URI.
pub const BINDING_HTTP_POST: &str = "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST";

/// HTTP-Artifact binding URI.
pub const BINDING_HTTP_ARTIFACT: &str = "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Artifact";

/// SOAP binding URI.
pub const BINDING_SOAP: &str = "urn:oasis:names:tc:SAML:2.0:bindings:SOAP";

/// SAML binding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamlBinding {
    /// HTTP POST binding.
    HttpPost,
    /// HTTP Redirect binding.
    HttpRedirect,
    /// HTTP Artifact binding.
    HttpArtifact,
    /// SOAP binding.
    Soap,
}

impl SamlBinding {
    /// Returns the URI for this binding.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::HttpPost => BINDING_HTTP_POST,
            Self::HttpRedirect => BINDING_HTTP_REDIRECT,
            Self::HttpArtifact => BINDING_HTTP_ARTIFACT,
            Self::Soap => BINDING_SOAP,
        }
    }

    /// Parses a binding from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            BINDING_HTTP_POST => Some(Self::HttpPost),
            BINDING_HTTP_REDIRECT => Some(Self::HttpRedirect),
            BINDING_HTTP_ARTIFACT => Some(Self::HttpArtifact),
            BINDING_SOAP => Some(Self::Soap),
            _ => None,
        }
    }

    /// Resolves the symbolic short names used in SP configuration.
    ///
    /// Only `redirect` and `soap` are recognized; everything else is
    /// absent.
    #[must_use]
    pub fn from_short_name(name: &str) -> Option<Self> {
        match name {
            "redirect" => Some(Self::HttpRedirect),
            "soap" => Some(Self::Soap),
            _ => None,
        }
    }
}

// ============================================================================
// Status Codes
// ============================================================================

/// Top-level SAML status codes.
pub mod status_codes {
    /// Success status code.
    pub const SUCCESS: &str = "urn:oasis:names:tc:SAML:2.0:status:Success";

    /// Requester error status code.
    pub const REQUESTER: &str = "urn:oasis:names:tc:SAML:2.0:status:Requester";

    /// Responder error status code.
    pub const RESPONDER: &str = "urn:oasis:names:tc:SAML:2.0:status:Responder";

    /// Version mismatch status code.
    pub const VERSION_MISMATCH: &str = "urn:oasis:names:tc:SAML:2.0:status:VersionMismatch";
}
