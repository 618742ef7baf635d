//! ArtifactResolve request construction.
//!
//! When a response arrives over the HTTP-Artifact binding, the SP redeems
//! the artifact token at the IdP's artifact resolution service over SOAP.

use crate::xml;

use super::constants::SAML_VERSION;
use super::message::{MessageEnvelope, ToXml};

/// SAML ArtifactResolve request.
#[derive(Debug, Clone)]
pub struct ArtifactResolve {
    /// Common message envelope.
    pub envelope: MessageEnvelope,
    /// The artifact token received on the ACS endpoint.
    pub artifact: String,
}

impl ArtifactResolve {
    /// Creates a new artifact resolution request.
    #[must_use]
    pub fn new(
        issuer: impl Into<String>,
        destination: impl Into<String>,
        artifact: impl Into<String>,
    ) -> Self {
        Self {
            envelope: MessageEnvelope::new(issuer, destination),
            artifact: artifact.into(),
        }
    }

    /// The request ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.envelope.id
    }
}

impl ToXml for ArtifactResolve {
    fn to_xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<samlp:ArtifactResolve xmlns:samlp="{samlp}" ID="{id}" Version="{version}" IssueInstant="{instant}" Destination="{destination}">
{issuer}
<samlp:Artifact>{artifact}</samlp:Artifact>
</samlp:ArtifactResolve>"#,
            samlp = xml::SAMLP_NS,
            id = self.envelope.id,
            version = SAML_VERSION,
            instant = self.envelope.issue_instant_str(),
            destination = xml::escape(&self.envelope.destination),
            issuer = self.envelope.issuer_element(),
            artifact = xml::escape(&self.artifact),
        )
    }
}
