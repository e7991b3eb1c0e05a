//! Owned, mutable XML tree for PAGE documents.

/// Local name of line-level elements.
pub const TEXT_LINE_ELEMENT: &str = "TextLine";
/// Local name of the attribute holding Transkribus custom tags.
pub const CUSTOM_ATTRIBUTE: &str = "custom";

const TEXT_EQUIV_ELEMENT: &str = "TextEquiv";
const UNICODE_ELEMENT: &str = "Unicode";

/// An element or attribute name.
///
/// `prefix` is the prefix used in the source document, `namespace` the URI
/// it resolved to. Both are cleared by [`strip`](super::normalize::strip).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlName {
    pub prefix: Option<String>,
    pub namespace: Option<String>,
    pub local: String,
}

impl XmlName {
    /// A name with no namespace.
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            namespace: None,
            local: local.into(),
        }
    }

    /// The name as written in markup (`prefix:local` or `local`).
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.local),
            None => self.local.clone(),
        }
    }
}

/// A namespace declared on an element (`xmlns` or `xmlns:prefix`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamespaceDecl {
    pub prefix: Option<String>,
    pub uri: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: XmlName,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    Comment(String),
    ProcessingInstruction {
        target: String,
        value: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlElement {
    pub name: XmlName,
    pub namespace_decls: Vec<NamespaceDecl>,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: XmlName) -> Self {
        Self {
            name,
            namespace_decls: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Value of the first attribute whose local name is `local`.
    pub fn attribute(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name.local == local)
            .map(|attr| attr.value.as_str())
    }

    /// Set an attribute by local name, replacing its value in place or
    /// appending it after the existing attributes.
    pub fn set_attribute(&mut self, local: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .attributes
            .iter_mut()
            .find(|attr| attr.name.local == local)
        {
            Some(attr) => attr.value = value,
            None => self.attributes.push(XmlAttribute {
                name: XmlName::local(local),
                value,
            }),
        }
    }

    /// Child elements, in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            _ => None,
        })
    }

    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            _ => None,
        })
    }

    /// First child element with the given local name.
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.child_elements().find(|child| child.name.local == local)
    }

    /// Concatenated text of the direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Transcription of a `TextLine`.
    ///
    /// The line's own `TextEquiv/Unicode` wins; otherwise the first
    /// `TextEquiv/Unicode` among its descendants (e.g. inside a `Word`).
    /// Missing or empty text yields `None`.
    pub fn line_text(&self) -> Option<String> {
        let own = self
            .child(TEXT_EQUIV_ELEMENT)
            .and_then(|equiv| equiv.child(UNICODE_ELEMENT));
        let unicode = own.or_else(|| self.find_descendant_unicode())?;
        let text = unicode.text();
        (!text.is_empty()).then_some(text)
    }

    fn find_descendant_unicode(&self) -> Option<&XmlElement> {
        for child in self.child_elements() {
            if child.name.local == TEXT_EQUIV_ELEMENT {
                if let Some(unicode) = child.child(UNICODE_ELEMENT) {
                    return Some(unicode);
                }
            }
            if let Some(found) = child.find_descendant_unicode() {
                return Some(found);
            }
        }
        None
    }

    /// Visit every descendant element named `local` in document order.
    ///
    /// Matches are not searched for nested matches.
    pub fn try_for_each_named_mut<E>(
        &mut self,
        local: &str,
        visit: &mut impl FnMut(&mut XmlElement) -> Result<(), E>,
    ) -> Result<(), E> {
        for child in self.child_elements_mut() {
            if child.name.local == local {
                visit(child)?;
            } else {
                child.try_for_each_named_mut(local, visit)?;
            }
        }
        Ok(())
    }

    fn count_named(&self, local: &str) -> usize {
        self.child_elements()
            .map(|child| {
                if child.name.local == local {
                    1
                } else {
                    child.count_named(local)
                }
            })
            .sum()
    }
}

/// A whole PAGE XML file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageDocument {
    /// Comments and processing instructions before the root element.
    pub prolog: Vec<XmlNode>,
    pub root: XmlElement,
    /// Comments and processing instructions after the root element.
    pub epilog: Vec<XmlNode>,
    /// Whether the source text ended with a newline.
    pub trailing_newline: bool,
}

impl PageDocument {
    pub fn text_line_count(&self) -> usize {
        if self.root.name.local == TEXT_LINE_ELEMENT {
            1
        } else {
            self.root.count_named(TEXT_LINE_ELEMENT)
        }
    }
}
