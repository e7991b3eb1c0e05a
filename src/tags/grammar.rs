//! Encoding and parsing of Transkribus custom-attribute expressions.
//!
//! Grammar (whitespace between expressions is a single space on output,
//! any ASCII whitespace on input):
//!
//! ```text
//! attribute := tag (SP tag)*
//! tag       := name SP "{" (key ":" value ";")* "}"
//! ```
//!
//! Entity tags always carry `offset` and `length` properties. Other tags
//! found in real files (for example `readingOrder {index:0;}`) parse as
//! [`CustomTag`]s without an entity interpretation.

use std::fmt;

use crate::error::PagetagError;

pub const OFFSET_KEY: &str = "offset";
pub const LENGTH_KEY: &str = "length";

/// One entity tag: tag name plus character offset and length.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TagExpression {
    pub name: String,
    pub offset: usize,
    pub length: usize,
}

impl TagExpression {
    pub fn new(name: impl Into<String>, offset: usize, length: usize) -> Self {
        Self {
            name: name.into(),
            offset,
            length,
        }
    }

    /// Serialized form, see [`encode`].
    pub fn encode(&self) -> String {
        encode(&self.name, self.offset, self.length)
    }
}

impl fmt::Display for TagExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {{{OFFSET_KEY}:{};{LENGTH_KEY}:{};}}",
            self.name, self.offset, self.length
        )
    }
}

/// A parsed expression with its properties in source order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomTag {
    pub name: String,
    pub properties: Vec<(String, String)>,
}

impl CustomTag {
    /// First value for `key`, if present.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Interpret this tag as an entity tag.
    ///
    /// Returns `None` unless both `offset` and `length` are present and
    /// parse as non-negative integers.
    pub fn to_expression(&self) -> Option<TagExpression> {
        let offset = self.property(OFFSET_KEY)?.parse::<usize>().ok()?;
        let length = self.property(LENGTH_KEY)?.parse::<usize>().ok()?;
        Some(TagExpression::new(self.name.clone(), offset, length))
    }
}

/// Serialize one entity tag as `"<name> {offset:<offset>;length:<length>;}"`.
///
/// `tag_name` is written verbatim; callers draw it from a validated
/// [`LabelTable`](super::LabelTable).
pub fn encode(tag_name: &str, offset: usize, length: usize) -> String {
    format!("{tag_name} {{{OFFSET_KEY}:{offset};{LENGTH_KEY}:{length};}}")
}

/// Append an expression to an existing attribute value.
///
/// An empty attribute becomes `expression`; otherwise the two are joined by
/// a single space. Existing content is never inspected, so appending the
/// same expression twice yields two copies.
pub fn append(existing: &str, expression: &str) -> String {
    if existing.is_empty() {
        expression.to_string()
    } else {
        let mut out = String::with_capacity(existing.len() + 1 + expression.len());
        out.push_str(existing);
        out.push(' ');
        out.push_str(expression);
        out
    }
}

/// Parse a full custom attribute into its expressions.
pub fn parse_attribute(attribute: &str) -> Result<Vec<CustomTag>, PagetagError> {
    Parser::new(attribute).parse_all()
}

/// Parse a custom attribute and keep only the entity tags, in order.
pub fn parse_expressions(attribute: &str) -> Result<Vec<TagExpression>, PagetagError> {
    Ok(parse_attribute(attribute)?
        .iter()
        .filter_map(CustomTag::to_expression)
        .collect())
}

/// Byte-level scanner. Every delimiter is ASCII, so slicing at delimiter
/// positions always lands on a char boundary.
struct Parser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn parse_all(mut self) -> Result<Vec<CustomTag>, PagetagError> {
        let mut tags = Vec::new();
        loop {
            self.skip_whitespace();
            if self.at_end() {
                return Ok(tags);
            }
            tags.push(self.parse_tag()?);
        }
    }

    fn parse_tag(&mut self) -> Result<CustomTag, PagetagError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() || matches!(b, b'{' | b'}' | b';' | b':') {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected tag name"));
        }
        let name = self.input[start..self.pos].to_string();

        self.skip_whitespace();
        if self.peek() != Some(b'{') {
            return Err(self.error(format!("expected '{{' after tag name '{name}'")));
        }
        self.pos += 1;

        let mut properties = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(self.error(format!("unterminated properties of '{name}'"))),
                Some(b'}') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => properties.push(self.parse_property()?),
            }
        }

        Ok(CustomTag { name, properties })
    }

    fn parse_property(&mut self) -> Result<(String, String), PagetagError> {
        let key_start = self.pos;
        loop {
            match self.peek() {
                Some(b':') => break,
                Some(b';') | Some(b'}') | None => {
                    return Err(self.error("expected ':' after property key"));
                }
                Some(_) => self.pos += 1,
            }
        }
        let key = self.input[key_start..self.pos].trim().to_string();
        if key.is_empty() {
            return Err(self.error("empty property key"));
        }
        self.pos += 1;

        let value_start = self.pos;
        loop {
            match self.peek() {
                Some(b';') => break,
                None => return Err(self.error(format!("missing ';' after value of '{key}'"))),
                Some(_) => self.pos += 1,
            }
        }
        let value = self.input[value_start..self.pos].trim().to_string();
        self.pos += 1;

        Ok((key, value))
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn error(&self, message: impl Into<String>) -> PagetagError {
        PagetagError::TagGrammar {
            position: self.pos,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_matches_transkribus_format() {
        assert_eq!(encode("persoon", 0, 12), "persoon {offset:0;length:12;}");
        assert_eq!(
            TagExpression::new("datum", 5, 4).to_string(),
            "datum {offset:5;length:4;}"
        );
    }

    #[test]
    fn append_to_empty_is_the_expression() {
        assert_eq!(
            append("", "persoon {offset:0;length:12;}"),
            "persoon {offset:0;length:12;}"
        );
    }

    #[test]
    fn append_joins_with_single_space() {
        assert_eq!(
            append("datum {offset:5;length:4;}", &encode("persoon", 0, 3)),
            "datum {offset:5;length:4;} persoon {offset:0;length:3;}"
        );
    }

    #[test]
    fn append_does_not_deduplicate() {
        let tag = encode("persoon", 0, 3);
        let once = append("", &tag);
        let twice = append(&once, &tag);
        assert_eq!(twice, format!("{tag} {tag}"));
    }

    #[test]
    fn parse_recovers_mixed_tags() {
        let attr = "readingOrder {index:0;} persoon {offset:0;length:12;} datum {offset:20;length:4;continued:true;}";
        let tags = parse_attribute(attr).expect("parse attribute");
        assert_eq!(tags.len(), 3);
        assert_eq!(tags[0].name, "readingOrder");
        assert_eq!(tags[0].property("index"), Some("0"));
        assert_eq!(tags[0].to_expression(), None);
        assert_eq!(
            tags[2].to_expression(),
            Some(TagExpression::new("datum", 20, 4))
        );

        let expressions = parse_expressions(attr).expect("parse expressions");
        assert_eq!(
            expressions,
            vec![
                TagExpression::new("persoon", 0, 12),
                TagExpression::new("datum", 20, 4)
            ]
        );
    }

    #[test]
    fn parse_tolerates_extra_whitespace_and_empty_input() {
        assert!(parse_attribute("").unwrap().is_empty());
        assert!(parse_attribute("   ").unwrap().is_empty());

        let tags = parse_attribute("  persoon  { offset:1; length:2; }  ").unwrap();
        assert_eq!(
            tags[0].to_expression(),
            Some(TagExpression::new("persoon", 1, 2))
        );
    }

    #[test]
    fn parse_rejects_malformed_input() {
        for bad in [
            "persoon",
            "persoon offset:0;",
            "persoon {offset:0;length:12;",
            "persoon {offset:0}",
            "persoon {offset;}",
            "{offset:0;}",
            "persoon {:0;}",
        ] {
            let err = parse_attribute(bad).unwrap_err();
            assert!(
                matches!(err, PagetagError::TagGrammar { .. }),
                "unexpected error for {bad:?}: {err}"
            );
        }
    }

    #[test]
    fn parse_keeps_non_ascii_values_intact() {
        let tags = parse_attribute("textStyle {offset:0;length:3;fontFamily:Schwabacher ß;}")
            .expect("parse attribute");
        assert_eq!(tags[0].property("fontFamily"), Some("Schwabacher ß"));
    }
}
