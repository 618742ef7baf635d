//! IdP metadata descriptor.
//!
//! Parses an `EntityDescriptor` carrying an `IDPSSODescriptor` and exposes
//! endpoint URLs keyed by binding URI, certificates keyed by usage, and the
//! advertised NameID formats.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use roxmltree::Document;
use serde::{Deserialize, Serialize};

use crate::certs::{self, CertVerificationWarning};
use crate::error::{SpError, SpResult};
use crate::types::{
    nameid_short_name, SamlBinding, NAMEID_FORMAT_UNSPECIFIED, NAMEID_SHORT_UNSPECIFIED,
};
use crate::xml::{self, MD_NS};

use super::{FetchedMetadata, MetadataFetcher};

/// Per-IdP protocol quirks.
///
/// Both flags work around IdPs whose HTTP-Redirect logout handling deviates
/// from the binding specification; Azure AD is the known offender for the
/// lowercase-escape requirement.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct IdpQuirks {
    /// Percent-escape hex digits in the signed redirect string must be
    /// lowercase.
    #[serde(default)]
    pub sls_force_lcase_url_encoding: bool,
    /// The received logout response parameter is URL-encoded twice.
    #[serde(default)]
    pub sls_double_encoded_response: bool,
}

/// Immutable view of an IdP's metadata.
#[derive(Debug, Clone)]
pub struct IdpDescriptor {
    entity_id: String,
    sso_urls: HashMap<String, String>,
    slo_urls: HashMap<String, String>,
    artifact_urls: HashMap<String, String>,
    certs: HashMap<String, String>,
    formats: HashMap<String, String>,
    default_format: String,
    cacert: Option<PathBuf>,
    quirks: IdpQuirks,
}

impl IdpDescriptor {
    /// Parses metadata XML.
    ///
    /// When `cacert` names a CA bundle, every certificate in the metadata
    /// is verified against it after construction; failures are logged as
    /// warnings and the certificates are retained.
    pub fn from_xml(
        input: &[u8],
        cacert: Option<&Path>,
        quirks: IdpQuirks,
    ) -> SpResult<Self> {
        let mut log_warning = |warning: CertVerificationWarning| {
            tracing::warn!(usage = %warning.usage, reason = %warning.reason, "IdP certificate verification failed");
        };
        Self::from_xml_with_observer(input, cacert, quirks, &mut log_warning)
    }

    /// [`IdpDescriptor::from_xml`] with an explicit observer for
    /// certificate verification warnings.
    pub fn from_xml_with_observer(
        input: &[u8],
        cacert: Option<&Path>,
        quirks: IdpQuirks,
        observer: certs::CertWarningSink<'_>,
    ) -> SpResult<Self> {
        let stripped = xml::strip_comments(input)?;
        let doc = Document::parse(&stripped)?;

        let entity = xml::descendants_named(doc.root(), MD_NS, "EntityDescriptor")
            .next()
            .ok_or_else(|| {
                SpError::MetadataParseFailed("no md:EntityDescriptor element".to_string())
            })?;
        let entity_id = entity
            .attribute("entityID")
            .ok_or_else(|| SpError::MetadataParseFailed("no entityID attribute".to_string()))?
            .to_string();

        // Endpoint, key and format children are read from the first role
        // descriptor. IDPSSODescriptor is the production case; accepting
        // any *SSODescriptor lets SP metadata round-trip through this
        // parser, which test harnesses rely on.
        let role = entity
            .children()
            .find(|n| {
                n.is_element()
                    && n.tag_name().namespace() == Some(MD_NS)
                    && n.tag_name().name().ends_with("SSODescriptor")
            })
            .ok_or_else(|| {
                SpError::MetadataParseFailed("no IDPSSODescriptor element".to_string())
            })?;

        let sso_urls = collect_endpoints(role, "SingleSignOnService")?;
        let slo_urls = collect_endpoints(role, "SingleLogoutService")?;
        let artifact_urls = collect_endpoints(role, "ArtifactResolutionService")?;

        let mut formats = HashMap::new();
        let mut default_format = String::new();
        for node in xml::descendants_named(role, MD_NS, "NameIDFormat") {
            let Some(uri) = xml::element_text(node) else {
                continue;
            };
            let Some(short) = nameid_short_name(uri) else {
                continue;
            };
            if default_format.is_empty() {
                default_format = short.to_string();
            }
            formats.insert(short.to_string(), uri.to_string());
        }
        if formats.is_empty() {
            formats.insert(
                NAMEID_SHORT_UNSPECIFIED.to_string(),
                NAMEID_FORMAT_UNSPECIFIED.to_string(),
            );
            default_format = NAMEID_SHORT_UNSPECIFIED.to_string();
        }

        let mut cert_map = HashMap::new();
        for descriptor in xml::descendants_named(role, MD_NS, "KeyDescriptor") {
            let usage = descriptor.attribute("use").unwrap_or("signing");
            let Some(blob) = xml::descendants_local(descriptor, "X509Certificate")
                .find_map(xml::element_text)
            else {
                continue;
            };
            let pem = certs::rewrap_base64(blob, 64);
            certs::parse_pem(&pem)?;
            cert_map.insert(usage.to_string(), pem);
        }

        let descriptor = Self {
            entity_id,
            sso_urls,
            slo_urls,
            artifact_urls,
            certs: cert_map,
            formats,
            default_format,
            cacert: cacert.map(Path::to_path_buf),
            quirks,
        };

        descriptor.verify_certs(observer);
        Ok(descriptor)
    }

    /// Fetches metadata from a URL and parses it.
    ///
    /// The fetch goes through the injected [`MetadataFetcher`]; a
    /// non-success status fails with
    /// [`SpError::MetadataFetchFailed`].
    pub fn from_url(
        url: &str,
        cacert: Option<&Path>,
        fetcher: &dyn MetadataFetcher,
        quirks: IdpQuirks,
    ) -> SpResult<Self> {
        let FetchedMetadata {
            status,
            message,
            body,
        } = fetcher
            .fetch(url)
            .map_err(|message| SpError::MetadataFetchFailed { status: 0, message })?;

        if !(200..300).contains(&status) {
            return Err(SpError::MetadataFetchFailed { status, message });
        }

        tracing::debug!(url, bytes = body.len(), "fetched IdP metadata");
        Self::from_xml(&body, cacert, quirks)
    }

    fn verify_certs(&self, observer: certs::CertWarningSink<'_>) {
        let Some(path) = self.cacert.as_deref() else {
            return;
        };
        let bundle = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                observer(CertVerificationWarning {
                    usage: "*".to_string(),
                    reason: format!("failed to read CA bundle {}: {e}", path.display()),
                });
                return;
            }
        };
        for (usage, pem) in &self.certs {
            if let Err(reason) = certs::verify_chain(pem, &bundle) {
                observer(CertVerificationWarning {
                    usage: usage.clone(),
                    reason,
                });
            }
        }
    }

    /// The IdP's entity ID.
    #[must_use]
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Single sign-on endpoint for a binding URI.
    #[must_use]
    pub fn sso_url(&self, binding: &str) -> Option<&str> {
        self.sso_urls.get(binding).map(String::as_str)
    }

    /// Single logout endpoint for a binding URI.
    #[must_use]
    pub fn slo_url(&self, binding: &str) -> Option<&str> {
        self.slo_urls.get(binding).map(String::as_str)
    }

    /// Artifact resolution endpoint for a binding URI.
    #[must_use]
    pub fn artifact_url(&self, binding: &str) -> Option<&str> {
        self.artifact_urls.get(binding).map(String::as_str)
    }

    /// PEM certificate for a key usage (`signing`, `encryption`).
    #[must_use]
    pub fn cert(&self, usage: &str) -> Option<&str> {
        self.certs.get(usage).map(String::as_str)
    }

    /// Resolves the symbolic binding names used in configuration
    /// (`redirect`, `soap`) to binding URIs.
    #[must_use]
    pub fn binding(&self, short_name: &str) -> Option<&'static str> {
        SamlBinding::from_short_name(short_name).map(|b| b.uri())
    }

    /// Full NameID format URI for a short name, or the default format when
    /// `None` is passed.
    #[must_use]
    pub fn format(&self, short_name: Option<&str>) -> Option<&str> {
        let key = short_name.unwrap_or(&self.default_format);
        self.formats.get(key).map(String::as_str)
    }

    /// Short name of the format listed first in the metadata.
    #[must_use]
    pub fn default_format(&self) -> &str {
        &self.default_format
    }

    /// All advertised formats, short name to URI.
    #[must_use]
    pub fn formats(&self) -> &HashMap<String, String> {
        &self.formats
    }

    /// The per-IdP quirk flags this descriptor was constructed with.
    #[must_use]
    pub fn quirks(&self) -> IdpQuirks {
        self.quirks
    }
}

fn collect_endpoints(
    role: roxmltree::Node<'_, '_>,
    local: &str,
) -> SpResult<HashMap<String, String>> {
    let mut endpoints = HashMap::new();
    for node in xml::descendants_named(role, MD_NS, local) {
        let (Some(binding), Some(location)) =
            (node.attribute("Binding"), node.attribute("Location"))
        else {
            continue;
        };
        url::Url::parse(location).map_err(|e| {
            SpError::MetadataParseFailed(format!("bad {local} Location '{location}': {e}"))
        })?;
        endpoints.insert(binding.to_string(), location.to_string());
    }
    Ok(endpoints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BINDING_HTTP_POST, BINDING_HTTP_REDIRECT};

    const IDP_CERT_PEM: &str = include_str!("../../tests/fixtures/idp-cert.pem");

    fn cert_blob() -> String {
        certs::strip_armor(IDP_CERT_PEM)
    }

    fn metadata(extra: &str) -> String {
        format!(
            r#"<md:EntityDescriptor xmlns:md="urn:oasis:names:tc:SAML:2.0:metadata" entityID="https://idp.example/">
  <md:IDPSSODescriptor protocolSupportEnumeration="urn:oasis:names:tc:SAML:2.0:protocol">
    {extra}
    <md:SingleSignOnService Binding="urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect" Location="https://idp.example/sso"/>
  </md:IDPSSODescriptor>
</md:EntityDescriptor>"#
        )
    }

    #[test]
    fn parses_endpoints_formats_and_certs() {
        let xml = metadata(&format!(
            r#"<md:KeyDescriptor use="signing">
      <ds:KeyInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#">
        <ds:X509Data><ds:X509Certificate>{}</ds:X509Certificate></ds:X509Data>
      </ds:KeyInfo>
    </md:KeyDescriptor>
    <md:NameIDFormat>urn:oasis:names:tc:SAML:2.0:nameid-format:transient</md:NameIDFormat>"#,
            cert_blob()
        ));

        let idp = IdpDescriptor::from_xml(xml.as_bytes(), None, IdpQuirks::default()).unwrap();
        assert_eq!(idp.entity_id(), "https://idp.example/");
        assert_eq!(
            idp.sso_url(BINDING_HTTP_REDIRECT),
            Some("https://idp.example/sso")
        );
        assert_eq!(idp.sso_url(BINDING_HTTP_POST), None);
        assert_eq!(
            idp.format(None),
            Some("urn:oasis:names:tc:SAML:2.0:nameid-format:transient")
        );
        assert_eq!(idp.default_format(), "transient");

        let pem = idp.cert("signing").unwrap();
        assert!(pem.starts_with("-----BEGIN CERTIFICATE-----"));
        assert!(pem.trim_end().ends_with("-----END CERTIFICATE-----"));
        for line in pem.lines().filter(|l| !l.starts_with("-----")) {
            assert!(line.len() <= 64);
        }
    }

    #[test]
    fn cert_body_roundtrips_ignoring_wrapping() {
        // An unwrapped blob in the metadata comes back out with the same
        // base64 body once the armor is stripped again.
        let blob = cert_blob();
        let xml = metadata(&format!(
            r#"<md:KeyDescriptor><ds:KeyInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#"><ds:X509Data><ds:X509Certificate>{blob}</ds:X509Certificate></ds:X509Data></ds:KeyInfo></md:KeyDescriptor>"#
        ));
        let idp = IdpDescriptor::from_xml(xml.as_bytes(), None, IdpQuirks::default()).unwrap();
        assert_eq!(certs::strip_armor(idp.cert("signing").unwrap()), blob);
    }

    #[test]
    fn key_descriptor_use_defaults_to_signing() {
        let xml = metadata(&format!(
            r#"<md:KeyDescriptor><ds:KeyInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#"><ds:X509Data><ds:X509Certificate>{}</ds:X509Certificate></ds:X509Data></ds:KeyInfo></md:KeyDescriptor>"#,
            cert_blob()
        ));
        let idp = IdpDescriptor::from_xml(xml.as_bytes(), None, IdpQuirks::default()).unwrap();
        assert!(idp.cert("signing").is_some());
        assert!(idp.cert("encryption").is_none());
    }

    #[test]
    fn missing_nameid_format_falls_back_to_unspecified() {
        let xml = metadata("");
        let idp = IdpDescriptor::from_xml(xml.as_bytes(), None, IdpQuirks::default()).unwrap();
        assert_eq!(
            idp.format(None),
            Some("urn:oasis:names:tc:SAML:1.1:nameid-format:unspecified")
        );
        assert_eq!(idp.default_format(), "unspecified");
        assert_eq!(idp.formats().len(), 1);
    }

    #[test]
    fn default_format_is_first_in_document_order() {
        let xml = metadata(
            "<md:NameIDFormat> urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress </md:NameIDFormat>
             <md:NameIDFormat>urn:oasis:names:tc:SAML:2.0:nameid-format:persistent</md:NameIDFormat>
             <md:NameIDFormat>https://not-a-saml-format.example/</md:NameIDFormat>",
        );
        let idp = IdpDescriptor::from_xml(xml.as_bytes(), None, IdpQuirks::default()).unwrap();
        assert_eq!(idp.default_format(), "emailAddress");
        assert_eq!(
            idp.format(Some("persistent")),
            Some("urn:oasis:names:tc:SAML:2.0:nameid-format:persistent")
        );
        // Non-SAML format URIs are skipped entirely.
        assert_eq!(idp.formats().len(), 2);
    }

    #[test]
    fn binding_resolves_symbolic_names() {
        let xml = metadata("");
        let idp = IdpDescriptor::from_xml(xml.as_bytes(), None, IdpQuirks::default()).unwrap();
        assert_eq!(
            idp.binding("redirect"),
            Some("urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect")
        );
        assert_eq!(
            idp.binding("soap"),
            Some("urn:oasis:names:tc:SAML:2.0:bindings:SOAP")
        );
        assert_eq!(idp.binding("post"), None);
    }

    #[test]
    fn missing_entity_id_is_parse_failure() {
        let xml = br#"<md:EntityDescriptor xmlns:md="urn:oasis:names:tc:SAML:2.0:metadata">
  <md:IDPSSODescriptor/>
</md:EntityDescriptor>"#;
        let err = IdpDescriptor::from_xml(xml, None, IdpQuirks::default()).unwrap_err();
        assert!(matches!(err, SpError::MetadataParseFailed(_)));
    }

    #[test]
    fn missing_role_descriptor_is_parse_failure() {
        let xml = br#"<md:EntityDescriptor xmlns:md="urn:oasis:names:tc:SAML:2.0:metadata" entityID="https://idp.example/"/>"#;
        let err = IdpDescriptor::from_xml(xml, None, IdpQuirks::default()).unwrap_err();
        assert!(matches!(err, SpError::MetadataParseFailed(_)));
    }

    #[test]
    fn invalid_endpoint_url_is_parse_failure() {
        let xml = r#"<md:EntityDescriptor xmlns:md="urn:oasis:names:tc:SAML:2.0:metadata" entityID="https://idp.example/">
  <md:IDPSSODescriptor>
    <md:SingleSignOnService Binding="urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect" Location="not a url"/>
  </md:IDPSSODescriptor>
</md:EntityDescriptor>"#;
        let err =
            IdpDescriptor::from_xml(xml.as_bytes(), None, IdpQuirks::default()).unwrap_err();
        assert!(matches!(err, SpError::MetadataParseFailed(_)));
    }

    #[test]
    fn comments_in_metadata_are_stripped() {
        let xml = metadata(
            "<md:NameIDFormat>urn:oasis:names:tc:SAML:2.0:nameid-format:<!-- wrap -->transient</md:NameIDFormat>",
        );
        let idp = IdpDescriptor::from_xml(xml.as_bytes(), None, IdpQuirks::default()).unwrap();
        assert_eq!(idp.default_format(), "transient");
    }

    #[test]
    fn cacert_failure_is_warning_not_error() {
        let cacert = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures/sp-cert.pem");
        let xml = metadata(&format!(
            r#"<md:KeyDescriptor use="signing"><ds:KeyInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#"><ds:X509Data><ds:X509Certificate>{}</ds:X509Certificate></ds:X509Data></ds:KeyInfo></md:KeyDescriptor>"#,
            cert_blob()
        ));

        let mut warnings = Vec::new();
        let mut sink = |w: CertVerificationWarning| warnings.push(w);
        // The IdP cert does not chain to the SP cert bundle, so a warning
        // fires, but construction succeeds and the cert is retained.
        let idp = IdpDescriptor::from_xml_with_observer(
            xml.as_bytes(),
            Some(&cacert),
            IdpQuirks::default(),
            &mut sink,
        )
        .unwrap();
        assert!(idp.cert("signing").is_some());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].usage, "signing");
    }

    #[test]
    fn cacert_match_produces_no_warning() {
        let cacert = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures/idp-cert.pem");
        let xml = metadata(&format!(
            r#"<md:KeyDescriptor use="signing"><ds:KeyInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#"><ds:X509Data><ds:X509Certificate>{}</ds:X509Certificate></ds:X509Data></ds:KeyInfo></md:KeyDescriptor>"#,
            cert_blob()
        ));

        let mut warnings = Vec::new();
        let mut sink = |w: CertVerificationWarning| warnings.push(w);
        IdpDescriptor::from_xml_with_observer(
            xml.as_bytes(),
            Some(&cacert),
            IdpQuirks::default(),
            &mut sink,
        )
        .unwrap();
        assert!(warnings.is_empty());
    }

    struct StubFetcher {
        status: u16,
        body: String,
    }

    impl MetadataFetcher for StubFetcher {
        fn fetch(&self, _url: &str) -> Result<FetchedMetadata, String> {
            Ok(FetchedMetadata {
                status: self.status,
                message: "stub".to_string(),
                body: self.body.clone().into_bytes(),
            })
        }
    }

    #[test]
    fn from_url_delegates_to_from_xml() {
        let fetcher = StubFetcher {
            status: 200,
            body: metadata(""),
        };
        let idp = IdpDescriptor::from_url(
            "https://idp.example/metadata",
            None,
            &fetcher,
            IdpQuirks::default(),
        )
        .unwrap();
        assert_eq!(idp.entity_id(), "https://idp.example/");
    }

    #[test]
    fn from_url_non_success_status_fails() {
        let fetcher = StubFetcher {
            status: 404,
            body: String::new(),
        };
        let err = IdpDescriptor::from_url(
            "https://idp.example/metadata",
            None,
            &fetcher,
            IdpQuirks::default(),
        )
        .unwrap_err();
        match err {
            SpError::MetadataFetchFailed { status, .. } => assert_eq!(status, 404),
            other => panic!("unexpected error: {other}"),
        }
    }
}
