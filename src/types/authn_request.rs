//! SAML AuthnRequest construction.
//!
//! Authentication request message sent by the SP to an identity provider.

use crate::xml;

use super::constants::{BINDING_HTTP_POST, SAML_VERSION};
use super::message::{MessageEnvelope, ToXml};

/// SAML Authentication Request.
///
/// Built through [`crate::metadata::SpDescriptor::authn_request`]; the SP's
/// entity ID becomes the issuer and the IdP's SSO endpoint the destination.
#[derive(Debug, Clone)]
pub struct AuthnRequest {
    /// Common message envelope.
    pub envelope: MessageEnvelope,
    /// Requested NameID format URI.
    pub nameid_format: String,
    /// Where the IdP should send the response.
    pub assertion_consumer_service_url: Option<String>,
}

impl AuthnRequest {
    /// Creates a new request addressed to `destination`.
    #[must_use]
    pub fn new(
        issuer: impl Into<String>,
        destination: impl Into<String>,
        nameid_format: impl Into<String>,
    ) -> Self {
        Self {
            envelope: MessageEnvelope::new(issuer, destination),
            nameid_format: nameid_format.into(),
            assertion_consumer_service_url: None,
        }
    }

    /// Sets the assertion consumer service URL.
    #[must_use]
    pub fn with_acs_url(mut self, url: impl Into<String>) -> Self {
        self.assertion_consumer_service_url = Some(url.into());
        self
    }

    /// The request ID, which the caller must retain to correlate the
    /// response's `InResponseTo`.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.envelope.id
    }
}

impl ToXml for AuthnRequest {
    fn to_xml(&self) -> String {
        let acs = self
            .assertion_consumer_service_url
            .as_deref()
            .map(|url| {
                format!(
                    r#" AssertionConsumerServiceURL="{}" ProtocolBinding="{}""#,
                    xml::escape(url),
                    BINDING_HTTP_POST
                )
            })
            .unwrap_or_default();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<samlp:AuthnRequest xmlns:samlp="{samlp}" ID="{id}" Version="{version}" IssueInstant="{instant}" Destination="{destination}"{acs}>
{issuer}
<samlp:NameIDPolicy Format="{format}" AllowCreate="1"/>
</samlp:AuthnRequest>"#,
            samlp = xml::SAMLP_NS,
            id = self.envelope.id,
            version = SAML_VERSION,
            instant = self.envelope.issue_instant_str(),
            destination = xml::escape(&self.envelope.destination),
            acs = acs,
            issuer = self.envelope.issuer_element(),
            format = xml::escape(&self.nameid_format),
        )
    }
}
