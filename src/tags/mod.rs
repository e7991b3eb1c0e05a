//! Transkribus custom-tag grammar.
//!
//! Entity annotations live in a single `custom` attribute on each
//! `TextLine`, as a space-separated list of expressions such as
//! `persoon {offset:0;length:12;}`. This module owns the label table that
//! maps model labels to tag names, and the codec for the expressions.
//!
//! # Example
//!
//! ```
//! use pagetag::tags::{append, encode, parse_expressions};
//!
//! let attr = append("datum {offset:5;length:4;}", &encode("persoon", 0, 3));
//! assert_eq!(attr, "datum {offset:5;length:4;} persoon {offset:0;length:3;}");
//!
//! let parsed = parse_expressions(&attr).unwrap();
//! assert_eq!(parsed[1].name, "persoon");
//! ```

mod grammar;
mod label;

pub use grammar::{
    append, encode, parse_attribute, parse_expressions, CustomTag, TagExpression, LENGTH_KEY,
    OFFSET_KEY,
};
pub use label::{validate_tag_name, EntityLabel, LabelTable};
