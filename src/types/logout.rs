//! Single Logout (SLO) request and response messages.

use crate::xml;

use super::constants::{status_codes, SAML_VERSION};
use super::message::{MessageEnvelope, ToXml};

/// SAML Logout Request.
///
/// Sent by the SP to terminate the session identified by `nameid` and
/// `session`.
#[derive(Debug, Clone)]
pub struct LogoutRequest {
    /// Common message envelope.
    pub envelope: MessageEnvelope,
    /// Name identifier of the principal to log out.
    pub nameid: String,
    /// Format URI qualifying `nameid`.
    pub nameid_format: String,
    /// Session index from the assertion that established the session.
    pub session: String,
}

impl LogoutRequest {
    /// Creates a new logout request.
    #[must_use]
    pub fn new(
        issuer: impl Into<String>,
        destination: impl Into<String>,
        nameid: impl Into<String>,
        nameid_format: impl Into<String>,
        session: impl Into<String>,
    ) -> Self {
        Self {
            envelope: MessageEnvelope::new(issuer, destination),
            nameid: nameid.into(),
            nameid_format: nameid_format.into(),
            session: session.into(),
        }
    }

    /// The request ID, retained to correlate the logout response.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.envelope.id
    }
}

impl ToXml for LogoutRequest {
    fn to_xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<samlp:LogoutRequest xmlns:samlp="{samlp}" ID="{id}" Version="{version}" IssueInstant="{instant}" Destination="{destination}">
{issuer}
<saml:NameID xmlns:saml="{saml}" Format="{format}">{nameid}</saml:NameID>
<samlp:SessionIndex>{session}</samlp:SessionIndex>
</samlp:LogoutRequest>"#,
            samlp = xml::SAMLP_NS,
            saml = xml::SAML_NS,
            id = self.envelope.id,
            version = SAML_VERSION,
            instant = self.envelope.issue_instant_str(),
            destination = xml::escape(&self.envelope.destination),
            issuer = self.envelope.issuer_element(),
            format = xml::escape(&self.nameid_format),
            nameid = xml::escape(&self.nameid),
            session = xml::escape(&self.session),
        )
    }
}

/// SAML Logout Response.
///
/// Sent back to the IdP after it initiated a logout against this SP.
#[derive(Debug, Clone)]
pub struct LogoutResponse {
    /// Common message envelope.
    pub envelope: MessageEnvelope,
    /// Status code URI to report.
    pub status: String,
    /// ID of the `LogoutRequest` this answers.
    pub response_to: String,
}

impl LogoutResponse {
    /// Creates a new logout response.
    #[must_use]
    pub fn new(
        issuer: impl Into<String>,
        destination: impl Into<String>,
        status: impl Into<String>,
        response_to: impl Into<String>,
    ) -> Self {
        Self {
            envelope: MessageEnvelope::new(issuer, destination),
            status: status.into(),
            response_to: response_to.into(),
        }
    }

    /// Creates a success response to `response_to`.
    #[must_use]
    pub fn success(
        issuer: impl Into<String>,
        destination: impl Into<String>,
        response_to: impl Into<String>,
    ) -> Self {
        Self::new(issuer, destination, status_codes::SUCCESS, response_to)
    }

    /// Returns true if the status reports success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == status_codes::SUCCESS
    }
}

impl ToXml for LogoutResponse {
    fn to_xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<samlp:LogoutResponse xmlns:samlp="{samlp}" ID="{id}" Version="{version}" IssueInstant="{instant}" Destination="{destination}" InResponseTo="{response_to}">
{issuer}
<samlp:Status>
<samlp:StatusCode Value="{status}"/>
</samlp:Status>
</samlp:LogoutResponse>"#,
            samlp = xml::SAMLP_NS,
            id = self.envelope.id,
            version = SAML_VERSION,
            instant = self.envelope.issue_instant_str(),
            destination = xml::escape(&self.envelope.destination),
            response_to = xml::escape(&self.response_to),
            issuer = self.envelope.issuer_element(),
            status = xml::escape(&self.status),
        )
    }
}
