//! Inbound SAML Assertion parsing and validation.
//!
//! An [`Assertion`] is an immutable parsed view of a `saml:Assertion`,
//! created per inbound response and discarded when the request completes.
//! Validation never raises: [`Assertion::valid`] returns `false` and the
//! caller must log and reject.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use roxmltree::Document;

use crate::error::{SpError, SpResult};
use crate::xml::{self, SAML_NS, SAMLP_NS};

/// Validity window applied when `Conditions` omits `NotOnOrAfter`.
const DEFAULT_VALIDITY_SECS: i64 = 1000;

/// Parsed view of an inbound `saml:Assertion`.
///
/// The input may be a full `samlp:Response` or, when the caller has already
/// peeled off the signed subtree, a bare `saml:Assertion`; in the latter
/// case [`Assertion::destination`] and [`Assertion::response_status`] are
/// empty strings.
#[derive(Debug, Clone)]
pub struct Assertion {
    /// Entity URI that issued the assertion.
    pub issuer: String,
    /// `samlp:Response/@Destination`, empty for a bare assertion.
    pub destination: String,
    /// Attribute name to ordered list of string values.
    pub attributes: HashMap<String, Vec<String>>,
    /// `SessionIndex` of the first `AuthnStatement` in document order.
    pub session: String,
    /// Text of `saml:Subject/saml:NameID`.
    pub nameid: String,
    /// Text of `saml:AudienceRestriction/saml:Audience`.
    pub audience: String,
    /// `Conditions/@NotBefore`, defaulting to the parse instant.
    pub not_before: DateTime<Utc>,
    /// `Conditions/@NotOnOrAfter`, defaulting to the parse instant plus
    /// 1000 seconds.
    pub not_after: DateTime<Utc>,
    /// The request ID this assertion answers
    /// (`SubjectConfirmationData/@InResponseTo`).
    pub in_response_to: String,
    /// `samlp:Response/samlp:Status/samlp:StatusCode/@Value`, empty for a
    /// bare assertion.
    pub response_status: String,
    /// The comment-stripped document, retained for post-hoc inspection and
    /// signature verification by bindings.
    pub xml: String,
}

impl Assertion {
    /// Parses an assertion from response or assertion XML.
    ///
    /// Comments are stripped before any content is read.
    pub fn from_xml(input: &[u8]) -> SpResult<Self> {
        let stripped = xml::strip_comments(input)?;
        let doc = Document::parse(&stripped)?;

        let assertion = xml::descendants_named(doc.root(), SAML_NS, "Assertion")
            .next()
            .ok_or_else(|| SpError::MissingElement("saml:Assertion".to_string()))?;

        let issuer = xml::descendants_named(assertion, SAML_NS, "Issuer")
            .find_map(xml::element_text)
            .unwrap_or_default()
            .to_string();

        let response = xml::descendants_named(doc.root(), SAMLP_NS, "Response").next();
        let destination = response
            .and_then(|r| r.attribute("Destination"))
            .unwrap_or_default()
            .to_string();
        let response_status = response
            .and_then(|r| {
                xml::descendants_named(r, SAMLP_NS, "Status")
                    .next()
                    .and_then(|s| xml::descendants_named(s, SAMLP_NS, "StatusCode").next())
                    .and_then(|c| c.attribute("Value"))
            })
            .unwrap_or_default()
            .to_string();

        let mut attributes: HashMap<String, Vec<String>> = HashMap::new();
        for statement in xml::descendants_named(assertion, SAML_NS, "AttributeStatement") {
            for attribute in xml::descendants_named(statement, SAML_NS, "Attribute") {
                let Some(name) = attribute.attribute("Name") else {
                    continue;
                };
                let values: Vec<String> = attribute
                    .children()
                    .filter(|n| n.is_element() && n.tag_name().name() == "AttributeValue")
                    .map(|n| n.text().unwrap_or_default().to_string())
                    .collect();
                attributes.entry(name.to_string()).or_default().extend(values);
            }
        }

        let session = xml::descendants_named(assertion, SAML_NS, "AuthnStatement")
            .next()
            .and_then(|s| s.attribute("SessionIndex"))
            .unwrap_or_default()
            .to_string();

        let nameid = xml::descendants_named(assertion, SAML_NS, "Subject")
            .next()
            .and_then(|s| xml::descendants_named(s, SAML_NS, "NameID").next())
            .and_then(xml::element_text)
            .unwrap_or_default()
            .to_string();

        let audience = xml::descendants_named(assertion, SAML_NS, "AudienceRestriction")
            .next()
            .and_then(|r| xml::descendants_named(r, SAML_NS, "Audience").next())
            .and_then(xml::element_text)
            .unwrap_or_default()
            .to_string();

        let in_response_to = xml::descendants_named(assertion, SAML_NS, "SubjectConfirmationData")
            .next()
            .and_then(|d| d.attribute("InResponseTo"))
            .unwrap_or_default()
            .to_string();

        let conditions = xml::descendants_named(assertion, SAML_NS, "Conditions").next();
        let now = Utc::now();
        let not_before = match conditions.and_then(|c| c.attribute("NotBefore")) {
            Some(raw) => parse_instant(raw)?,
            None => now,
        };
        let not_after = match conditions.and_then(|c| c.attribute("NotOnOrAfter")) {
            Some(raw) => parse_instant(raw)?,
            None => now + Duration::seconds(DEFAULT_VALIDITY_SECS),
        };

        Ok(Self {
            issuer,
            destination,
            attributes,
            session,
            nameid,
            audience,
            not_before,
            not_after,
            in_response_to,
            response_status,
            xml: stripped,
        })
    }

    /// Validates the assertion against the SP's audience and the ID of the
    /// request it answers.
    ///
    /// Returns true iff the audience matches, the request correlation
    /// holds (pass the AuthnRequest ID; `None` skips the check), and the
    /// current instant lies inside the validity window. `NotBefore` is
    /// inclusive, `NotOnOrAfter` exclusive.
    #[must_use]
    pub fn valid(&self, audience: &str, in_response_to: Option<&str>) -> bool {
        self.valid_at(audience, in_response_to, Utc::now())
    }

    /// [`Assertion::valid`] evaluated at an explicit instant.
    #[must_use]
    pub fn valid_at(
        &self,
        audience: &str,
        in_response_to: Option<&str>,
        now: DateTime<Utc>,
    ) -> bool {
        if audience.is_empty() || self.audience.is_empty() || audience != self.audience {
            return false;
        }
        if let Some(request_id) = in_response_to {
            if request_id != self.in_response_to {
                return false;
            }
        }
        now >= self.not_before && now < self.not_after
    }

    /// The subject's common name, when the IdP sent a `CN` attribute.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.attributes
            .get("CN")
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

fn parse_instant(raw: &str) -> SpResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SpError::XmlParse(format!("invalid dateTime '{raw}': {e}")))
}
