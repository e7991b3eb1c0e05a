//! Namespace stripping and output conventions for PAGE documents.
//!
//! Transkribus expects the 2013-07-15 PAGE content namespace as the default
//! namespace of the root element and a double-quoted declaration with
//! `standalone="yes"`. Processing works on local names only, so the tree is
//! stripped after loading and the namespace is put back on the serialized
//! text.

use super::tree::{PageDocument, XmlAttribute, XmlElement, XmlNode};

/// The PAGE content namespace written on every output root element.
pub const PAGE_NAMESPACE: &str = "http://schema.primaresearch.org/PAGE/gts/pagecontent/2013-07-15";

/// The XML declaration written at the top of every output file.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Remove namespace qualification from every element and attribute name.
///
/// Prefixes, resolved namespaces and `xmlns` declarations are dropped;
/// only local names remain. When two attributes of one element reduce to
/// the same local name, the later value wins and keeps the first position.
pub fn strip(document: &mut PageDocument) {
    strip_element(&mut document.root);
}

fn strip_element(element: &mut XmlElement) {
    element.name.prefix = None;
    element.name.namespace = None;
    element.namespace_decls.clear();

    let mut attributes: Vec<XmlAttribute> = Vec::with_capacity(element.attributes.len());
    for mut attr in element.attributes.drain(..) {
        attr.name.prefix = None;
        attr.name.namespace = None;
        match attributes
            .iter_mut()
            .find(|kept| kept.name.local == attr.name.local)
        {
            Some(kept) => kept.value = attr.value,
            None => attributes.push(attr),
        }
    }
    element.attributes = attributes;

    for child in &mut element.children {
        if let XmlNode::Element(child) = child {
            strip_element(child);
        }
    }
}

/// Apply the output conventions to serialized XML text.
///
/// Any leading XML declaration is replaced by [`XML_DECLARATION`] (one is
/// added if missing). The root start tag gets `xmlns="`[`PAGE_NAMESPACE`]`"`
/// inserted directly after its name unless it already declares it; a
/// different default namespace on the root is rewritten.
pub fn restore_namespace_on_serialize(xml: &str) -> String {
    let body = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    let body = match body.strip_prefix("<?xml") {
        Some(rest) if is_declaration_tail(rest) => {
            rest.find("?>").map_or(body, |end| &rest[end + 2..])
        }
        _ => body,
    };
    let body = body.trim_start_matches(['\r', '\n']);

    let mut out =
        String::with_capacity(XML_DECLARATION.len() + body.len() + PAGE_NAMESPACE.len() + 12);
    out.push_str(XML_DECLARATION);
    out.push('\n');

    let Some(tag) = find_root_start_tag(body) else {
        out.push_str(body);
        return out;
    };

    match find_default_namespace(&body[tag.name_end..tag.end]) {
        Some((value_start, value_end)) => {
            let value_start = tag.name_end + value_start;
            let value_end = tag.name_end + value_end;
            out.push_str(&body[..value_start]);
            out.push_str(PAGE_NAMESPACE);
            out.push_str(&body[value_end..]);
        }
        None => {
            out.push_str(&body[..tag.name_end]);
            out.push_str(" xmlns=\"");
            out.push_str(PAGE_NAMESPACE);
            out.push('"');
            out.push_str(&body[tag.name_end..]);
        }
    }

    out
}

/// `<?xml` opens the declaration only when the target ends there;
/// `<?xml-stylesheet ...?>` and friends are processing instructions.
fn is_declaration_tail(rest: &str) -> bool {
    rest.starts_with("?>") || rest.starts_with(|c: char| c.is_ascii_whitespace())
}

/// Byte positions of the root element's start tag: end of its name and
/// position of the closing `>` (or `/>`).
struct StartTag {
    name_end: usize,
    end: usize,
}

fn find_root_start_tag(xml: &str) -> Option<StartTag> {
    let bytes = xml.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] != b'<' {
            pos += 1;
            continue;
        }

        let rest = &xml[pos..];
        if rest.starts_with("<!--") {
            pos += rest.find("-->")? + 3;
        } else if rest.starts_with("<?") {
            pos += rest.find("?>")? + 2;
        } else if rest.starts_with("<!") {
            pos += rest.find('>')? + 1;
        } else {
            let name_start = pos + 1;
            let mut name_end = name_start;
            while name_end < bytes.len()
                && !bytes[name_end].is_ascii_whitespace()
                && !matches!(bytes[name_end], b'>' | b'/')
            {
                name_end += 1;
            }

            let mut end = name_end;
            let mut quote: Option<u8> = None;
            while end < bytes.len() {
                let b = bytes[end];
                match quote {
                    Some(q) if b == q => quote = None,
                    Some(_) => {}
                    None if b == b'"' || b == b'\'' => quote = Some(b),
                    None if b == b'>' => break,
                    None => {}
                }
                end += 1;
            }
            if end >= bytes.len() {
                return None;
            }
            if bytes[end - 1] == b'/' {
                end -= 1;
            }
            return Some(StartTag { name_end, end });
        }
    }

    None
}

/// Locate the value of a default `xmlns` attribute inside the attribute
/// section of a start tag. Returns byte offsets of the value (excluding
/// quotes) relative to `attrs`.
fn find_default_namespace(attrs: &str) -> Option<(usize, usize)> {
    let bytes = attrs.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let name_start = pos;
        while pos < bytes.len() && bytes[pos] != b'=' && !bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let name = &attrs[name_start..pos];

        while pos < bytes.len() && (bytes[pos].is_ascii_whitespace() || bytes[pos] == b'=') {
            pos += 1;
        }
        let quote = *bytes.get(pos)?;
        if quote != b'"' && quote != b'\'' {
            return None;
        }
        let value_start = pos + 1;
        let value_len = attrs[value_start..].find(quote as char)?;
        let value_end = value_start + value_len;

        if name == "xmlns" {
            return Some((value_start, value_end));
        }
        pos = value_end + 1;
    }

    None
}
