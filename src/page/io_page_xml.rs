//! PAGE XML reader and writer.
//!
//! Reading goes through `roxmltree` and copies the document into the owned
//! [`PageDocument`] tree. Writing is hand-rolled: the tree is emitted as-is,
//! with attribute order, whitespace, comments and processing instructions
//! kept. No XML declaration is written here; see
//! [`restore_namespace_on_serialize`](super::normalize::restore_namespace_on_serialize).

use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node, NodeType};

use super::tree::{NamespaceDecl, PageDocument, XmlAttribute, XmlElement, XmlName, XmlNode};
use crate::error::PagetagError;

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Read a PAGE XML file.
pub fn read_page_xml(path: &Path) -> Result<PageDocument, PagetagError> {
    let bytes = fs::read(path).map_err(|source| PagetagError::DocumentRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_page_xml_slice(&bytes, path)
}

/// Parse PAGE XML from a UTF-8 string.
pub fn from_page_xml_str(xml: &str) -> Result<PageDocument, PagetagError> {
    parse_page_xml_str(xml, Path::new("<memory>"))
}

/// Fuzz-only entrypoint: parse PAGE XML from bytes (must be valid UTF-8).
#[cfg(any(test, feature = "fuzzing"))]
pub fn from_page_xml_slice(bytes: &[u8]) -> Result<PageDocument, PagetagError> {
    parse_page_xml_slice(bytes, Path::new("<memory>"))
}

/// Serialize a document tree to XML text without a declaration.
pub fn to_page_xml_string(document: &PageDocument) -> String {
    let mut xml = String::new();

    for node in &document.prolog {
        write_node(&mut xml, node);
        xml.push('\n');
    }

    write_element(&mut xml, &document.root);

    for node in &document.epilog {
        xml.push('\n');
        write_node(&mut xml, node);
    }

    if document.trailing_newline {
        xml.push('\n');
    }

    xml
}

fn parse_page_xml_slice(bytes: &[u8], path: &Path) -> Result<PageDocument, PagetagError> {
    let xml = std::str::from_utf8(bytes).map_err(|source| PagetagError::PageXmlParse {
        path: path.to_path_buf(),
        message: format!("input is not valid UTF-8: {source}"),
    })?;
    parse_page_xml_str(xml, path)
}

fn parse_page_xml_str(xml: &str, path: &Path) -> Result<PageDocument, PagetagError> {
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    let document = Document::parse(xml).map_err(|source| PagetagError::PageXmlParse {
        path: path.to_path_buf(),
        message: source.to_string(),
    })?;

    let mut prolog = Vec::new();
    let mut epilog = Vec::new();
    let mut root = None;

    for child in document.root().children() {
        if child.is_element() {
            root = Some(build_element(child));
        } else if let Some(node) = build_misc_node(child) {
            if root.is_none() {
                prolog.push(node);
            } else {
                epilog.push(node);
            }
        }
    }

    let root = root.ok_or_else(|| PagetagError::PageXmlParse {
        path: PathBuf::from(path),
        message: "document has no root element".to_string(),
    })?;

    Ok(PageDocument {
        prolog,
        root,
        epilog,
        trailing_newline: xml.ends_with('\n'),
    })
}

fn build_element(node: Node<'_, '_>) -> XmlElement {
    let tag = node.tag_name();
    let name = XmlName {
        prefix: tag
            .namespace()
            .and_then(|uri| element_prefix(node, uri)),
        namespace: tag.namespace().map(ToOwned::to_owned),
        local: tag.name().to_string(),
    };

    let attributes = node
        .attributes()
        .map(|attr| XmlAttribute {
            name: XmlName {
                prefix: attr.namespace().and_then(|uri| attribute_prefix(node, uri)),
                namespace: attr.namespace().map(ToOwned::to_owned),
                local: attr.name().to_string(),
            },
            value: attr.value().to_string(),
        })
        .collect();

    let children = node
        .children()
        .filter_map(|child| {
            if child.is_element() {
                Some(XmlNode::Element(build_element(child)))
            } else if child.is_text() {
                child.text().map(|text| XmlNode::Text(text.to_string()))
            } else {
                build_misc_node(child)
            }
        })
        .collect();

    XmlElement {
        name,
        namespace_decls: declared_namespaces(node),
        attributes,
        children,
    }
}

fn build_misc_node(node: Node<'_, '_>) -> Option<XmlNode> {
    match node.node_type() {
        NodeType::Comment => node.text().map(|text| XmlNode::Comment(text.to_string())),
        NodeType::PI => node.pi().map(|pi| XmlNode::ProcessingInstruction {
            target: pi.target.to_string(),
            value: pi.value.map(ToOwned::to_owned),
        }),
        _ => None,
    }
}

/// Namespaces in scope on `node` that were not already in scope on its
/// parent element, i.e. the ones declared on `node` itself.
fn declared_namespaces(node: Node<'_, '_>) -> Vec<NamespaceDecl> {
    let inherited: Vec<(Option<String>, String)> = node
        .parent_element()
        .map(|parent| {
            parent
                .namespaces()
                .map(|ns| (ns.name().map(ToOwned::to_owned), ns.uri().to_string()))
                .collect()
        })
        .unwrap_or_default();

    node.namespaces()
        .filter(|ns| ns.name() != Some("xml"))
        .filter(|ns| {
            !inherited
                .iter()
                .any(|(prefix, uri)| prefix.as_deref() == ns.name() && uri == ns.uri())
        })
        .map(|ns| NamespaceDecl {
            prefix: ns.name().map(ToOwned::to_owned),
            uri: ns.uri().to_string(),
        })
        .collect()
}

fn element_prefix(node: Node<'_, '_>, uri: &str) -> Option<String> {
    if node
        .namespaces()
        .any(|ns| ns.name().is_none() && ns.uri() == uri)
    {
        return None;
    }
    attribute_prefix(node, uri)
}

fn attribute_prefix(node: Node<'_, '_>, uri: &str) -> Option<String> {
    if uri == XML_NAMESPACE {
        return Some("xml".to_string());
    }
    node.namespaces()
        .find(|ns| ns.uri() == uri && ns.name().is_some())
        .and_then(|ns| ns.name())
        .map(ToOwned::to_owned)
}

fn write_node(xml: &mut String, node: &XmlNode) {
    match node {
        XmlNode::Element(element) => write_element(xml, element),
        XmlNode::Text(text) => escape_into(xml, text, false),
        XmlNode::Comment(text) => {
            xml.push_str("<!--");
            xml.push_str(text);
            xml.push_str("-->");
        }
        XmlNode::ProcessingInstruction { target, value } => {
            xml.push_str("<?");
            xml.push_str(target);
            if let Some(value) = value {
                xml.push(' ');
                xml.push_str(value);
            }
            xml.push_str("?>");
        }
    }
}

fn write_element(xml: &mut String, element: &XmlElement) {
    let name = element.name.qualified();
    xml.push('<');
    xml.push_str(&name);

    for decl in &element.namespace_decls {
        xml.push_str(" xmlns");
        if let Some(prefix) = &decl.prefix {
            xml.push(':');
            xml.push_str(prefix);
        }
        xml.push_str("=\"");
        escape_into(xml, &decl.uri, true);
        xml.push('"');
    }

    for attr in &element.attributes {
        xml.push(' ');
        xml.push_str(&attr.name.qualified());
        xml.push_str("=\"");
        escape_into(xml, &attr.value, true);
        xml.push('"');
    }

    if element.children.is_empty() {
        xml.push_str("/>");
        return;
    }

    xml.push('>');
    for child in &element.children {
        write_node(xml, child);
    }
    xml.push_str("</");
    xml.push_str(&name);
    xml.push('>');
}

/// Escape markup characters. Attribute values additionally escape quotes
/// and the whitespace characters that attribute-value normalization would
/// otherwise turn into spaces.
fn escape_into(xml: &mut String, raw: &str, attribute: bool) {
    for c in raw.chars() {
        match c {
            '&' => xml.push_str("&amp;"),
            '<' => xml.push_str("&lt;"),
            '>' => xml.push_str("&gt;"),
            '"' if attribute => xml.push_str("&quot;"),
            '\n' if attribute => xml.push_str("&#10;"),
            '\r' if attribute => xml.push_str("&#13;"),
            '\t' if attribute => xml.push_str("&#9;"),
            _ => xml.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<!-- exported -->
<PcGts xmlns="http://schema.primaresearch.org/PAGE/gts/pagecontent/2013-07-15" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://schema.primaresearch.org/PAGE/gts/pagecontent/2013-07-15 pagecontent.xsd">
    <Page imageFilename="scan_0001.jpg">
        <TextRegion id="r1">
            <TextLine id="r1l1" custom="readingOrder {index:0;}">
                <TextEquiv><Unicode>Jan &amp; Piet</Unicode></TextEquiv>
            </TextLine>
            <TextLine id="r1l2"/>
        </TextRegion>
    </Page>
</PcGts>
"#;

    #[test]
    fn parse_keeps_names_namespaces_and_order() {
        let doc = from_page_xml_str(SAMPLE).expect("parse sample");

        assert_eq!(doc.prolog, vec![XmlNode::Comment(" exported ".to_string())]);
        assert!(doc.trailing_newline);
        assert_eq!(doc.root.name.local, "PcGts");
        assert_eq!(doc.root.name.prefix, None);
        assert_eq!(
            doc.root.name.namespace.as_deref(),
            Some("http://schema.primaresearch.org/PAGE/gts/pagecontent/2013-07-15")
        );
        assert_eq!(doc.root.namespace_decls.len(), 2);
        assert_eq!(doc.root.attributes[0].name.prefix.as_deref(), Some("xsi"));
        assert_eq!(doc.root.attributes[0].name.local, "schemaLocation");

        let page = doc.root.child("Page").expect("page");
        assert!(page.namespace_decls.is_empty());
        assert_eq!(doc.text_line_count(), 2);
    }

    #[test]
    fn serialize_reparses_to_the_same_tree() {
        let doc = from_page_xml_str(SAMPLE).expect("parse sample");
        let xml = to_page_xml_string(&doc);
        let again = from_page_xml_str(&xml).expect("reparse");

        assert_eq!(doc, again);
        assert!(xml.starts_with("<!-- exported -->\n<PcGts xmlns="));
        assert!(xml.contains("<TextLine id=\"r1l2\"/>"));
        assert!(xml.contains("<Unicode>Jan &amp; Piet</Unicode>"));
        assert!(xml.ends_with("</PcGts>\n"));
    }

    #[test]
    fn attribute_values_escape_quotes_and_whitespace() {
        let mut out = String::new();
        escape_into(&mut out, "a \"b\" <c>\n\t&", true);
        assert_eq!(out, "a &quot;b&quot; &lt;c&gt;&#10;&#9;&amp;");

        let mut text = String::new();
        escape_into(&mut text, "\"quoted\"\n", false);
        assert_eq!(text, "\"quoted\"\n");
    }

    #[test]
    fn malformed_xml_is_a_parse_error() {
        let err = from_page_xml_str("<PcGts><Page></PcGts>").unwrap_err();
        assert!(matches!(err, PagetagError::PageXmlParse { .. }));
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        let err = from_page_xml_slice(&[0x3c, 0xff, 0xfe, 0x3e]).unwrap_err();
        assert!(err.to_string().contains("not valid UTF-8"));
    }

    #[test]
    fn byte_order_mark_is_accepted() {
        let doc = from_page_xml_str("\u{feff}<PcGts/>").expect("parse with BOM");
        assert_eq!(doc.root.name.local, "PcGts");
        assert!(!doc.trailing_newline);
    }

    #[test]
    fn read_missing_file_is_a_document_read_error() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let err = read_page_xml(&temp.path().join("missing.xml")).unwrap_err();
        assert!(matches!(err, PagetagError::DocumentRead { .. }));
    }
}
