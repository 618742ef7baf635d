//! Error types for SP operations.
//!
//! Construction errors (metadata, certificates) surface through these
//! variants and abort descriptor creation. Assertion validity is reported
//! through the boolean result of [`crate::types::Assertion::valid`] rather
//! than an error, and certificate chain verification failures are warnings
//! (see [`crate::certs::CertVerificationWarning`]), never errors.

use thiserror::Error;

/// Result type for SP operations.
pub type SpResult<T> = Result<T, SpError>;

/// SP core errors.
#[derive(Debug, Error)]
pub enum SpError {
    /// Metadata URL returned a non-success status.
    #[error("metadata fetch failed ({status}): {message}")]
    MetadataFetchFailed {
        /// HTTP status reported by the fetcher.
        status: u16,
        /// Status line or fetcher-supplied message.
        message: String,
    },

    /// Metadata XML malformed or missing required elements.
    #[error("metadata parse failed: {0}")]
    MetadataParseFailed(String),

    /// Certificate body could not be parsed.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// Missing required element or attribute.
    #[error("missing required element: {0}")]
    MissingElement(String),

    /// Configuration value missing or malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Base64 decoding error.
    #[error("base64 decode error: {0}")]
    Base64Decode(String),

    /// Deflate compression or decompression error.
    #[error("deflate error: {0}")]
    Deflate(String),

    /// Cryptographic operation error from an injected signer or verifier.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// The injected HTTP collaborator failed at the transport level.
    #[error("transport error: {0}")]
    Transport(String),
}

impl SpError {
    /// Returns the HTTP status code a caller should map this error to.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::MetadataFetchFailed { .. } => 502,
            Self::MetadataParseFailed(_)
            | Self::XmlParse(_)
            | Self::MissingElement(_)
            | Self::Base64Decode(_)
            | Self::Deflate(_) => 400,
            Self::InvalidCertificate(_) | Self::Crypto(_) => 401,
            Self::Transport(_) => 502,
            Self::InvalidConfig(_) | Self::InvalidUrl(_) => 500,
        }
    }
}

impl From<quick_xml::Error> for SpError {
    fn from(err: quick_xml::Error) -> Self {
        Self::XmlParse(err.to_string())
    }
}

impl From<roxmltree::Error> for SpError {
    fn from(err: roxmltree::Error) -> Self {
        Self::XmlParse(err.to_string())
    }
}

impl From<base64::DecodeError> for SpError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Base64Decode(err.to_string())
    }
}

impl From<std::io::Error> for SpError {
    fn from(err: std::io::Error) -> Self {
        Self::Deflate(err.to_string())
    }
}
