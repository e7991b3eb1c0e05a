//! Entity labels and the label → tag-name table.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::PagetagError;

/// Default Transkribus tag names per entity code.
const TRANSKRIBUS_TAGS: [(&str, &str); 7] = [
    ("PER", "persoon"),
    ("DAT", "datum"),
    ("LOC", "geonames_locations"),
    ("ORG", "organisatie"),
    ("HOE", "capaciteit_hoedanigheid"),
    ("COM", "commissie_committee"),
    ("RES", "document"),
];

/// An entity-type code reported by a tagger (e.g. `PER`, `DAT`).
///
/// Codes are normalized to trimmed upper case on construction, so `per`
/// and `PER` name the same label.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct EntityLabel(String);

impl EntityLabel {
    /// Creates a new label from a code.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_ascii_uppercase())
    }

    /// Returns the normalized code.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for EntityLabel {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

impl From<&str> for EntityLabel {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<EntityLabel> for String {
    fn from(label: EntityLabel) -> Self {
        label.0
    }
}

impl fmt::Debug for EntityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityLabel({})", self.0)
    }
}

impl fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable mapping from entity labels to Transkribus tag names.
///
/// The table is built once per run and passed explicitly to the line
/// annotator. Every tag name in it has been checked by
/// [`validate_tag_name`], so encoding a span can never produce a malformed
/// expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelTable {
    names: BTreeMap<EntityLabel, String>,
}

impl LabelTable {
    /// The default Transkribus table (PER, DAT, LOC, ORG, HOE, COM, RES).
    pub fn transkribus() -> Self {
        let names = TRANSKRIBUS_TAGS
            .iter()
            .map(|(label, name)| (EntityLabel::new(label), (*name).to_string()))
            .collect();
        Self { names }
    }

    /// Build a table from explicit `(label, tag name)` pairs.
    pub fn from_pairs<I, L, N>(pairs: I) -> Result<Self, PagetagError>
    where
        I: IntoIterator<Item = (L, N)>,
        L: AsRef<str>,
        N: Into<String>,
    {
        let mut names = BTreeMap::new();
        for (label, name) in pairs {
            let name = name.into();
            validate_tag_name(&name)?;
            names.insert(EntityLabel::new(label), name);
        }
        Ok(Self { names })
    }

    /// Return a copy of this table with `overrides` added or replacing
    /// existing entries.
    pub fn with_overrides<I, L, N>(&self, overrides: I) -> Result<Self, PagetagError>
    where
        I: IntoIterator<Item = (L, N)>,
        L: AsRef<str>,
        N: Into<String>,
    {
        let extra = Self::from_pairs(overrides)?;
        let mut names = self.names.clone();
        names.extend(extra.names);
        Ok(Self { names })
    }

    /// Load the default table extended by a JSON object
    /// `{"LABEL": "tag_name", ...}`.
    pub fn from_json_path(path: &Path) -> Result<Self, PagetagError> {
        let raw = fs::read_to_string(path).map_err(|source| PagetagError::LabelMapRead {
            path: path.to_path_buf(),
            source,
        })?;
        let overrides: BTreeMap<String, String> =
            serde_json::from_str(&raw).map_err(|source| PagetagError::LabelMapParse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::transkribus().with_overrides(overrides)
    }

    /// Tag name for a label, if the table knows it.
    pub fn tag_name(&self, label: &EntityLabel) -> Option<&str> {
        self.names.get(label).map(String::as_str)
    }

    /// Resolve a user-supplied label code, failing with a configuration
    /// error when it is not in the table.
    pub fn resolve(&self, code: &str) -> Result<EntityLabel, PagetagError> {
        let label = EntityLabel::new(code);
        if self.names.contains_key(&label) {
            Ok(label)
        } else {
            Err(PagetagError::UnknownEntityLabel {
                label: label.0,
                known: self.known_labels(),
            })
        }
    }

    /// Iterate `(label, tag name)` pairs in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&EntityLabel, &str)> {
        self.names.iter().map(|(label, name)| (label, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn known_labels(&self) -> String {
        self.names
            .keys()
            .map(EntityLabel::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::transkribus()
    }
}

/// Check that a tag name can be written into a custom attribute verbatim.
///
/// Names are not escaped on output, so anything that would break the
/// `name {key:value;}` grammar is rejected here.
pub fn validate_tag_name(name: &str) -> Result<(), PagetagError> {
    if name.is_empty() {
        return Err(PagetagError::InvalidTagName {
            name: name.to_string(),
            message: "tag name is empty".to_string(),
        });
    }

    if let Some(bad) = name
        .chars()
        .find(|c| c.is_whitespace() || matches!(c, '{' | '}' | ';' | ':'))
    {
        return Err(PagetagError::InvalidTagName {
            name: name.to_string(),
            message: format!("tag name contains reserved character {bad:?}"),
        });
    }

    Ok(())
}
