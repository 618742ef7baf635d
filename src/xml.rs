//! XML utilities shared by metadata and message parsing.
//!
//! Inbound documents are stripped of comment nodes before anything else
//! looks at them. Signature-wrapping attacks rely on a comment node
//! splitting text content after signing so that naive text extraction sees
//! a different value than the signed one; removing comments up front closes
//! that gap for every downstream consumer.

use quick_xml::events::Event;
use quick_xml::{Reader, Writer};
use roxmltree::Node;

use crate::error::{SpError, SpResult};

/// SAML 2.0 metadata namespace URI.
pub const MD_NS: &str = "urn:oasis:names:tc:SAML:2.0:metadata";

/// XML Digital Signature namespace URI.
pub const DS_NS: &str = "http://www.w3.org/2000/09/xmldsig#";

/// SAML 2.0 assertion namespace URI.
pub const SAML_NS: &str = "urn:oasis:names:tc:SAML:2.0:assertion";

/// SAML 2.0 protocol namespace URI.
pub const SAMLP_NS: &str = "urn:oasis:names:tc:SAML:2.0:protocol";

/// Removes every comment node from an XML document, at any depth.
///
/// The document is re-emitted event by event with comments dropped; all
/// other content, including the XML declaration, passes through untouched.
/// The operation is idempotent.
pub fn strip_comments(xml: &[u8]) -> SpResult<String> {
    let text = std::str::from_utf8(xml)
        .map_err(|e| SpError::XmlParse(format!("invalid UTF-8 in document: {e}")))?;

    let mut reader = Reader::from_str(text);
    let mut writer = Writer::new(Vec::new());

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Comment(_) => {}
            event => writer
                .write_event(event)
                .map_err(|e| SpError::XmlParse(e.to_string()))?,
        }
    }

    String::from_utf8(writer.into_inner())
        .map_err(|e| SpError::XmlParse(format!("invalid UTF-8 after rewrite: {e}")))
}

/// Returns true if `node` is an element named `local` in namespace `ns`.
pub fn is_named(node: Node<'_, '_>, ns: &str, local: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local
        && node.tag_name().namespace() == Some(ns)
}

/// Iterates over descendant elements named `local` in namespace `ns`,
/// in document order.
pub fn descendants_named<'a, 'input>(
    node: Node<'a, 'input>,
    ns: &'a str,
    local: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.descendants().filter(move |n| is_named(*n, ns, local))
}

/// Iterates over descendant elements matched by local name only.
///
/// Some XPath engines mishandle namespaced element selection inside
/// attribute predicates, and real-world metadata occasionally emits
/// `X509Certificate` or `AttributeValue` under unexpected prefixes. Lookups
/// for those two elements go through this helper instead of
/// [`descendants_named`].
pub fn descendants_local<'a, 'input>(
    node: Node<'a, 'input>,
    local: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.descendants()
        .filter(move |n| n.is_element() && n.tag_name().name() == local)
}

/// Returns the trimmed text content of an element, if non-empty.
pub fn element_text<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    node.text().map(str::trim).filter(|t| !t.is_empty())
}

/// Escapes the five XML special characters for use in text or attributes.
pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_comments_at_every_depth() {
        let xml = br#"<?xml version="1.0"?><!-- top --><a><!-- one --><b>x<!-- two -->y</b></a>"#;
        let stripped = strip_comments(xml).unwrap();
        assert!(!stripped.contains("<!--"));
        assert!(stripped.contains("<b>xy</b>"));
    }

    #[test]
    fn strip_comments_is_idempotent() {
        let xml = br#"<a><!-- c --><b>text</b></a>"#;
        let once = strip_comments(xml).unwrap();
        let twice = strip_comments(once.as_bytes()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn comment_split_text_reunites() {
        // The signature-wrapping trick: a comment splitting "admin" into
        // two text nodes must not survive stripping.
        let xml = br#"<NameID>admin<!-- -->@evil</NameID>"#;
        let stripped = strip_comments(xml).unwrap();
        let doc = roxmltree::Document::parse(&stripped).unwrap();
        let root = doc.root_element();
        assert_eq!(root.text(), Some("admin@evil"));
    }

    #[test]
    fn namespaced_lookup() {
        let xml = r#"<md:EntityDescriptor xmlns:md="urn:oasis:names:tc:SAML:2.0:metadata">
            <md:NameIDFormat>fmt-a</md:NameIDFormat>
            <md:NameIDFormat>fmt-b</md:NameIDFormat>
        </md:EntityDescriptor>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let formats: Vec<_> = descendants_named(doc.root(), MD_NS, "NameIDFormat")
            .filter_map(element_text)
            .collect();
        assert_eq!(formats, vec!["fmt-a", "fmt-b"]);
    }

    #[test]
    fn local_name_lookup_ignores_prefix() {
        let xml = r#"<root xmlns:odd="urn:example:odd">
            <odd:X509Certificate>AAAA</odd:X509Certificate>
        </root>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let cert = descendants_local(doc.root(), "X509Certificate")
            .find_map(element_text);
        assert_eq!(cert, Some("AAAA"));
    }
}
