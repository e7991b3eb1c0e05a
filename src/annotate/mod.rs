//! Line annotation: merging entity spans into a line's custom attribute.

use std::collections::HashSet;

use crate::entity::EntitySpan;
use crate::error::PagetagError;
use crate::tags::{append, parse_expressions, EntityLabel, LabelTable, TagExpression};

/// How new tags are merged into an existing custom attribute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// Append every span, even if an identical tag is already present.
    /// Running a tagger twice therefore duplicates its tags.
    #[default]
    Append,
    /// Skip spans whose `(tag name, offset, length)` is already present.
    /// Requires the existing attribute to parse.
    SkipExisting,
}

/// Options shared by every line of a run.
#[derive(Clone, Debug, Default)]
pub struct AnnotateOptions {
    pub policy: MergePolicy,
    /// Tag every span as this label, ignoring the label the tagger reported.
    pub forced_label: Option<EntityLabel>,
}

/// Result of annotating one line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineAnnotation {
    /// The new attribute value (unchanged if `added == 0`).
    pub attribute: String,
    /// Tags appended to the attribute.
    pub added: usize,
    /// Spans left out because their tag was already present.
    pub skipped: usize,
}

/// Merge `spans` into the `existing` custom attribute of one line.
///
/// Spans are applied in the order given, never re-sorted. Every span must
/// map to a tag name in `table`; otherwise the whole line fails and
/// `existing` is left as it was.
pub fn annotate_line(
    existing: &str,
    spans: &[EntitySpan],
    table: &LabelTable,
    options: &AnnotateOptions,
) -> Result<LineAnnotation, PagetagError> {
    let mut present: HashSet<TagExpression> = match options.policy {
        MergePolicy::SkipExisting if !spans.is_empty() => {
            parse_expressions(existing)?.into_iter().collect()
        }
        _ => HashSet::new(),
    };

    let mut attribute = existing.to_string();
    let mut added = 0;
    let mut skipped = 0;

    for span in spans {
        let label = options.forced_label.as_ref().unwrap_or(&span.label);
        let name = table
            .tag_name(label)
            .ok_or_else(|| PagetagError::UnmappedSpanLabel {
                label: label.to_string(),
            })?;
        let expression = TagExpression::new(name, span.offset, span.length);

        if options.policy == MergePolicy::SkipExisting && !present.insert(expression.clone()) {
            skipped += 1;
            continue;
        }

        attribute = append(&attribute, &expression.encode());
        added += 1;
    }

    Ok(LineAnnotation {
        attribute,
        added,
        skipped,
    })
}
