//! Entity sources: anything that turns a line of text into entity spans.
//!
//! The sequence-tagging model itself lives outside this crate. A source is
//! called once per text line, synchronously and in document order, and must
//! report offsets and lengths in Unicode scalar values (`char`s) of the
//! text it was given.
//!
//! Available sources:
//! - [`command::CommandTagger`]: a long-running child process that wraps the
//!   real model and speaks JSON lines on stdin/stdout.
//! - [`gazetteer::GazetteerTagger`]: dictionary lookup from a CSV lexicon.
//! - `http::HttpTagger` (feature `http`): a JSON tagging endpoint.
//!
//! Closures `FnMut(&str) -> Result<Vec<EntitySpan>, PagetagError>` are
//! sources too, which is what the tests use.

pub mod command;
pub mod gazetteer;
#[cfg(feature = "http")]
pub mod http;

use serde::{Deserialize, Serialize};

use crate::error::PagetagError;
use crate::tags::EntityLabel;

/// One entity found in a line of text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub label: EntityLabel,
    /// Zero-based offset in chars.
    pub offset: usize,
    /// Length in chars.
    pub length: usize,
}

impl EntitySpan {
    pub fn new(label: impl Into<EntityLabel>, offset: usize, length: usize) -> Self {
        Self {
            label: label.into(),
            offset,
            length,
        }
    }

    /// True when the span lies within a text of `text_chars` chars.
    pub fn fits(&self, text_chars: usize) -> bool {
        self.offset
            .checked_add(self.length)
            .is_some_and(|end| end <= text_chars)
    }
}

/// A tagger that can be called repeatedly, one line at a time.
pub trait EntitySource {
    /// Entity spans for `text`, in the order the tagger reports them.
    fn tag_line(&mut self, text: &str) -> Result<Vec<EntitySpan>, PagetagError>;
}

impl<F> EntitySource for F
where
    F: FnMut(&str) -> Result<Vec<EntitySpan>, PagetagError>,
{
    fn tag_line(&mut self, text: &str) -> Result<Vec<EntitySpan>, PagetagError> {
        self(text)
    }
}
