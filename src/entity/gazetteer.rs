//! Dictionary entity source.
//!
//! Reads a CSV lexicon with a `surface,label` header and tags every
//! whole-word occurrence of a surface form. At each position the longest
//! matching surface wins and matches never overlap, so spans come out in
//! text order.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use super::{EntitySource, EntitySpan};
use crate::error::PagetagError;
use crate::tags::EntityLabel;

#[derive(Debug, Deserialize)]
struct GazetteerRow {
    surface: String,
    label: String,
}

#[derive(Clone, Debug)]
struct Entry {
    surface: Vec<char>,
    label: EntityLabel,
}

/// Entity source backed by an in-memory lexicon.
#[derive(Clone, Debug)]
pub struct GazetteerTagger {
    entries: Vec<Entry>,
}

impl GazetteerTagger {
    /// Build from `(surface, label)` pairs. Blank surfaces are ignored.
    pub fn from_entries<I, S, L>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, L)>,
        S: AsRef<str>,
        L: Into<EntityLabel>,
    {
        let mut entries: Vec<Entry> = entries
            .into_iter()
            .filter_map(|(surface, label)| {
                let surface: Vec<char> = surface.as_ref().trim().chars().collect();
                (!surface.is_empty()).then(|| Entry {
                    surface,
                    label: label.into(),
                })
            })
            .collect();

        entries.sort_by(|a, b| {
            b.surface
                .len()
                .cmp(&a.surface.len())
                .then_with(|| a.surface.cmp(&b.surface))
        });
        entries.dedup_by(|a, b| a.surface == b.surface);

        Self { entries }
    }

    /// Load a `surface,label` CSV file.
    pub fn from_csv_path(path: &Path) -> Result<Self, PagetagError> {
        let file = File::open(path).map_err(|source| PagetagError::InvalidGazetteer {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?;
        let mut csv_reader = csv::Reader::from_reader(BufReader::new(file));

        let mut rows = Vec::new();
        for result in csv_reader.deserialize() {
            let row: GazetteerRow = result.map_err(|source| PagetagError::GazetteerParse {
                path: path.to_path_buf(),
                source,
            })?;
            rows.push((row.surface, row.label));
        }

        let tagger = Self::from_entries(rows);
        if tagger.is_empty() {
            return Err(PagetagError::InvalidGazetteer {
                path: path.to_path_buf(),
                message: "no entries".to_string(),
            });
        }
        Ok(tagger)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Labels used by the lexicon, deduplicated and sorted.
    pub fn labels(&self) -> Vec<EntityLabel> {
        let mut labels: Vec<EntityLabel> = self.entries.iter().map(|e| e.label.clone()).collect();
        labels.sort();
        labels.dedup();
        labels
    }

    fn match_at(&self, chars: &[char], pos: usize) -> Option<&Entry> {
        if pos > 0 && chars[pos - 1].is_alphanumeric() {
            return None;
        }
        self.entries.iter().find(|entry| {
            let end = pos + entry.surface.len();
            end <= chars.len()
                && chars[pos..end] == entry.surface[..]
                && chars.get(end).map_or(true, |c| !c.is_alphanumeric())
        })
    }
}

impl EntitySource for GazetteerTagger {
    fn tag_line(&mut self, text: &str) -> Result<Vec<EntitySpan>, PagetagError> {
        let chars: Vec<char> = text.chars().collect();
        let mut spans = Vec::new();
        let mut pos = 0;

        while pos < chars.len() {
            match self.match_at(&chars, pos) {
                Some(entry) => {
                    spans.push(EntitySpan {
                        label: entry.label.clone(),
                        offset: pos,
                        length: entry.surface.len(),
                    });
                    pos += entry.surface.len();
                }
                None => pos += 1,
            }
        }

        Ok(spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tagger() -> GazetteerTagger {
        GazetteerTagger::from_entries([
            ("Jan de Vries", "PER"),
            ("Jan", "PER"),
            ("Utrecht", "LOC"),
            ("Staten-Generaal", "ORG"),
        ])
    }

    #[test]
    fn longest_match_wins_and_spans_are_in_text_order() {
        let spans = tagger()
            .tag_line("Jan de Vries reisde naar Utrecht")
            .expect("tag line");
        assert_eq!(
            spans,
            vec![
                EntitySpan::new("PER", 0, 12),
                EntitySpan::new("LOC", 25, 7),
            ]
        );
    }

    #[test]
    fn matches_respect_word_boundaries() {
        let spans = tagger().tag_line("Janssen en Jan.").expect("tag line");
        assert_eq!(spans, vec![EntitySpan::new("PER", 11, 3)]);
    }

    #[test]
    fn offsets_count_chars_not_bytes() {
        let spans = tagger()
            .tag_line("Ñé, Staten-Generaal")
            .expect("tag line");
        assert_eq!(spans, vec![EntitySpan::new("ORG", 4, 15)]);
    }

    #[test]
    fn csv_lexicon_loads_and_rejects_empty_files() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("lexicon.csv");
        fs::write(&path, "surface,label\nUtrecht,loc\n  ,PER\n").expect("write csv");

        let tagger = GazetteerTagger::from_csv_path(&path).expect("load lexicon");
        assert_eq!(tagger.len(), 1);
        assert_eq!(tagger.labels(), vec![EntityLabel::new("LOC")]);

        fs::write(&path, "surface,label\n").expect("write empty csv");
        let err = GazetteerTagger::from_csv_path(&path).unwrap_err();
        assert!(matches!(err, PagetagError::InvalidGazetteer { .. }));
    }

    #[test]
    fn malformed_csv_is_a_parse_error() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("lexicon.csv");
        fs::write(&path, "name\nUtrecht\n").expect("write csv");

        let err = GazetteerTagger::from_csv_path(&path).unwrap_err();
        assert!(matches!(err, PagetagError::GazetteerParse { .. }));
    }
}
