//! PAGE XML documents.
//!
//! `roxmltree` gives a read-only view, so a loaded document is copied into a
//! small owned tree that the annotator can mutate and the serializer can
//! write back out. The tree keeps everything a PAGE file carries (elements,
//! attributes in source order, text including whitespace, comments and
//! processing instructions); only entity/character-reference spelling and
//! the XML declaration are normalized on output.
//!
//! # Example
//!
//! ```
//! use pagetag::page::{io_page_xml, normalize, PAGE_NAMESPACE};
//!
//! let xml = format!(
//!     r#"<PcGts xmlns="{PAGE_NAMESPACE}"><Page><TextRegion><TextLine id="l1"><TextEquiv><Unicode>Jan</Unicode></TextEquiv></TextLine></TextRegion></Page></PcGts>"#
//! );
//! let mut doc = io_page_xml::from_page_xml_str(&xml).unwrap();
//! normalize::strip(&mut doc);
//! assert_eq!(doc.text_line_count(), 1);
//!
//! let out = normalize::restore_namespace_on_serialize(&io_page_xml::to_page_xml_string(&doc));
//! assert!(out.starts_with(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#));
//! ```

pub mod io_page_xml;
pub mod normalize;
mod tree;

pub use normalize::{PAGE_NAMESPACE, XML_DECLARATION};
pub use tree::{
    NamespaceDecl, PageDocument, XmlAttribute, XmlElement, XmlName, XmlNode, CUSTOM_ATTRIBUTE,
    TEXT_LINE_ELEMENT,
};
