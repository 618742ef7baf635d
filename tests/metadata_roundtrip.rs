//! End-to-end scenarios: SP metadata round-trips through the IdP parser,
//! and an SSO exchange correlates the AuthnRequest with the returned
//! assertion.

use saml_sp::certs::{strip_armor, CertSource};
use saml_sp::metadata::{IdpDescriptor, IdpQuirks, SpConfig, SpDescriptor};
use saml_sp::types::{Assertion, ToXml, BINDING_HTTP_REDIRECT};

const SP_CERT_PEM: &str = include_str!("fixtures/sp-cert.pem");
const SP_KEY_PEM: &str = include_str!("fixtures/sp-key.pem");
const IDP_CERT_PEM: &str = include_str!("fixtures/idp-cert.pem");

fn sp_config() -> SpConfig {
    SpConfig {
        id: "http://localhost:3000".to_string(),
        url: "http://localhost:3000".to_string(),
        cert: CertSource::Pem(SP_CERT_PEM.to_string()),
        key: CertSource::Pem(SP_KEY_PEM.to_string()),
        cacert: None,
        slo_url_soap: "/slo-soap".to_string(),
        slo_url_redirect: "/slo-redirect".to_string(),
        slo_url_post: "/slo-post".to_string(),
        acs_url_post: "/consumer-post".to_string(),
        acs_url_artifact: "/consumer-artifact".to_string(),
        error_url: "/error".to_string(),
        org_name: "example".to_string(),
        org_display_name: "Example SP".to_string(),
        org_contact: "admin@example.com".to_string(),
        org_url: None,
        authnreq_signed: None,
        want_assertions_signed: None,
    }
}

fn idp_metadata_xml() -> String {
    format!(
        r#"<md:EntityDescriptor xmlns:md="urn:oasis:names:tc:SAML:2.0:metadata" entityID="https://idp.example/">
  <md:IDPSSODescriptor protocolSupportEnumeration="urn:oasis:names:tc:SAML:2.0:protocol">
    <md:KeyDescriptor use="signing">
      <ds:KeyInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#">
        <ds:X509Data><ds:X509Certificate>{cert}</ds:X509Certificate></ds:X509Data>
      </ds:KeyInfo>
    </md:KeyDescriptor>
    <md:NameIDFormat>urn:oasis:names:tc:SAML:2.0:nameid-format:transient</md:NameIDFormat>
    <md:SingleSignOnService Binding="urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect" Location="https://idp.example/sso"/>
    <md:SingleLogoutService Binding="urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect" Location="https://idp.example/slo"/>
  </md:IDPSSODescriptor>
</md:EntityDescriptor>"#,
        cert = strip_armor(IDP_CERT_PEM)
    )
}

#[test]
fn sp_metadata_reparses_through_idp_parser() {
    let sp = SpDescriptor::new(sp_config()).unwrap();
    let metadata = sp.metadata();

    let reparsed =
        IdpDescriptor::from_xml(metadata.as_bytes(), None, IdpQuirks::default()).unwrap();

    assert_eq!(reparsed.entity_id(), "http://localhost:3000");

    // The signing certificate body survives the round trip.
    let cert = reparsed.cert("signing").unwrap();
    assert_eq!(strip_armor(cert), sp.cert_text());

    // All three SLO endpoints come back with the locations we emitted.
    for (binding, path) in [
        ("urn:oasis:names:tc:SAML:2.0:bindings:SOAP", "/slo-soap"),
        (
            "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect",
            "/slo-redirect",
        ),
        ("urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST", "/slo-post"),
    ] {
        assert_eq!(
            reparsed.slo_url(binding),
            Some(format!("http://localhost:3000{path}").as_str())
        );
    }

    // SP metadata lists no NameID formats, so the parser falls back.
    assert_eq!(
        reparsed.format(None),
        Some("urn:oasis:names:tc:SAML:1.1:nameid-format:unspecified")
    );
}

#[test]
fn sso_exchange_correlates_request_and_assertion() {
    let sp = SpDescriptor::new(sp_config()).unwrap();
    let idp =
        IdpDescriptor::from_xml(idp_metadata_xml().as_bytes(), None, IdpQuirks::default())
            .unwrap();

    let destination = idp.sso_url(BINDING_HTTP_REDIRECT).unwrap();
    let nameid_format = idp.format(None).unwrap();
    let request = sp.authn_request(destination, nameid_format);
    let request_xml = request.to_xml();
    assert!(request_xml.contains(r#"Destination="https://idp.example/sso""#));

    // Simulated IdP response answering the request we just built.
    let response = format!(
        r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol"
    xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
    Destination="http://localhost:3000/consumer-post">
  <saml:Issuer>https://idp.example/</saml:Issuer>
  <samlp:Status><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Success"/></samlp:Status>
  <saml:Assertion ID="_resp1" Version="2.0" IssueInstant="2020-01-01T00:00:00Z">
    <saml:Issuer>https://idp.example/</saml:Issuer>
    <saml:Subject>
      <saml:NameID>_transient1</saml:NameID>
      <saml:SubjectConfirmation Method="urn:oasis:names:tc:SAML:2.0:cm:bearer">
        <saml:SubjectConfirmationData InResponseTo="{request_id}"/>
      </saml:SubjectConfirmation>
    </saml:Subject>
    <saml:Conditions NotBefore="2020-01-01T00:00:00Z" NotOnOrAfter="2099-01-01T00:00:00Z">
      <saml:AudienceRestriction><saml:Audience>http://localhost:3000</saml:Audience></saml:AudienceRestriction>
    </saml:Conditions>
    <saml:AuthnStatement AuthnInstant="2020-01-01T00:00:00Z" SessionIndex="_sess9"/>
  </saml:Assertion>
</samlp:Response>"#,
        request_id = request.id()
    );

    let assertion = Assertion::from_xml(response.as_bytes()).unwrap();
    assert!(assertion.valid(sp.id(), Some(request.id())));
    assert!(!assertion.valid(sp.id(), Some("_some_other_request")));
    assert_eq!(assertion.session, "_sess9");
    assert_eq!(assertion.issuer, idp.entity_id());
}
