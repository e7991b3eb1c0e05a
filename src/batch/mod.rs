//! Batch orchestration over selected collections.
//!
//! Documents are processed one at a time, in collection order and then file
//! order. A document that fails is recorded in the [`BatchReport`] and the
//! batch moves on; nothing a single document does stops the run.

pub mod report;

use crate::discovery::Collection;
use crate::entity::EntitySource;
use crate::process::{process_document, DocumentOutcome, ProcessOptions};

pub use report::{BatchReport, CollectionReport, DocumentFailure};

/// Progress notifications emitted while a batch runs.
#[derive(Clone, Copy, Debug)]
pub enum BatchEvent<'a> {
    CollectionStarted {
        /// 1-based position in the selection.
        number: usize,
        collection: &'a Collection,
    },
    DocumentDone {
        outcome: &'a DocumentOutcome,
    },
    DocumentFailed {
        failure: &'a DocumentFailure,
    },
    CollectionFinished {
        report: &'a CollectionReport,
    },
}

/// Process every document of `collections` with `source`.
///
/// `on_event` sees progress as it happens; the returned report carries the
/// totals and every failure.
pub fn run_batch<S, F>(
    collections: &[Collection],
    source: &mut S,
    options: &ProcessOptions,
    mut on_event: F,
) -> BatchReport
where
    S: EntitySource + ?Sized,
    F: FnMut(BatchEvent<'_>),
{
    let mut report = BatchReport::new(options.dry_run);

    for (index, collection) in collections.iter().enumerate() {
        on_event(BatchEvent::CollectionStarted {
            number: index + 1,
            collection,
        });

        report
            .collections
            .push(CollectionReport::new(collection.name.as_str()));
        let current = report.collections.len() - 1;

        for path in &collection.documents {
            report.collections[current].documents_seen += 1;

            match process_document(path, &mut *source, options) {
                Ok(outcome) => {
                    let totals = &mut report.collections[current];
                    if outcome.stats.tags_added > 0 {
                        totals.documents_modified += 1;
                    }
                    totals.tags_added += outcome.stats.tags_added;
                    totals.tags_skipped += outcome.stats.tags_skipped;
                    on_event(BatchEvent::DocumentDone { outcome: &outcome });
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "document skipped");
                    let failure = DocumentFailure {
                        collection: collection.name.clone(),
                        path: path.clone(),
                        kind: err.kind(),
                        message: err.to_string(),
                    };
                    on_event(BatchEvent::DocumentFailed { failure: &failure });
                    report.add_failure(failure);
                }
            }
        }

        on_event(BatchEvent::CollectionFinished {
            report: &report.collections[current],
        });
    }

    report
}
