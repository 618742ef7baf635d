//! Common envelope shared by every outbound protocol message.
//!
//! AuthnRequest, LogoutRequest, LogoutResponse and ArtifactResolve all
//! carry the same four attributes; each message type embeds a
//! [`MessageEnvelope`] rather than repeating them.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::xml;

/// The attributes every SAML protocol message carries.
#[derive(Debug, Clone)]
pub struct MessageEnvelope {
    /// Opaque freshly generated message identifier.
    pub id: String,
    /// Entity ID of the sender, emitted as `saml:Issuer`.
    pub issuer: String,
    /// Endpoint URL the message is addressed to.
    pub destination: String,
    /// When the message was created.
    pub issue_instant: DateTime<Utc>,
}

impl MessageEnvelope {
    /// Creates an envelope stamped with a fresh ID and the current instant.
    #[must_use]
    pub fn new(issuer: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            id: format!("_id{}", Uuid::new_v4()),
            issuer: issuer.into(),
            destination: destination.into(),
            issue_instant: Utc::now(),
        }
    }

    /// `IssueInstant` formatted as ISO 8601 UTC.
    #[must_use]
    pub fn issue_instant_str(&self) -> String {
        self.issue_instant.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    /// The `saml:Issuer` child element.
    #[must_use]
    pub fn issuer_element(&self) -> String {
        format!(
            r#"<saml:Issuer xmlns:saml="{}">{}</saml:Issuer>"#,
            xml::SAML_NS,
            xml::escape(&self.issuer)
        )
    }
}

/// Serialization into the message's wire XML.
pub trait ToXml {
    /// Renders the message as a standalone XML document.
    fn to_xml(&self) -> String;
}
