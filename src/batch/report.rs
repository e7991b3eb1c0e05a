//! Batch report types: per-collection totals, failures, and the final
//! summary.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::error::ErrorKind;

/// Summary of a whole batch run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct BatchReport {
    /// Collections in processing order.
    pub collections: Vec<CollectionReport>,
    /// Documents that could not be processed.
    pub failures: Vec<DocumentFailure>,
    /// Nothing was written.
    pub dry_run: bool,
}

impl BatchReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    /// Record a failed document and count it against its collection.
    pub fn add_failure(&mut self, failure: DocumentFailure) {
        if let Some(collection) = self
            .collections
            .iter_mut()
            .rev()
            .find(|c| c.name == failure.collection)
        {
            collection.documents_failed += 1;
        }
        self.failures.push(failure);
    }

    pub fn documents_seen(&self) -> usize {
        self.collections.iter().map(|c| c.documents_seen).sum()
    }

    /// Documents rewritten (or, on a dry run, that would have been).
    pub fn documents_modified(&self) -> usize {
        self.collections.iter().map(|c| c.documents_modified).sum()
    }

    pub fn tags_added(&self) -> usize {
        self.collections.iter().map(|c| c.tags_added).sum()
    }

    pub fn tags_skipped(&self) -> usize {
        self.collections.iter().map(|c| c.tags_skipped).sum()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Documents processed without error, modified or not.
    pub fn success_count(&self) -> usize {
        self.documents_seen() - self.failure_count()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// JSON shape of the report, with totals included.
#[derive(Serialize)]
struct BatchReportJson<'a> {
    documents_seen: usize,
    documents_modified: usize,
    documents_failed: usize,
    tags_added: usize,
    tags_skipped: usize,
    #[serde(flatten)]
    report: &'a BatchReport,
}

impl BatchReport {
    /// Pretty JSON including the computed totals.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&BatchReportJson {
            documents_seen: self.documents_seen(),
            documents_modified: self.documents_modified(),
            documents_failed: self.failure_count(),
            tags_added: self.tags_added(),
            tags_skipped: self.tags_skipped(),
            report: self,
        })
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modified = if self.dry_run {
            "would be modified"
        } else {
            "modified"
        };

        writeln!(
            f,
            "{} document(s) in {} collection(s): {} {}, {} tag(s) added",
            self.documents_seen(),
            self.collections.len(),
            self.documents_modified(),
            modified,
            self.tags_added()
        )?;

        let skipped = self.tags_skipped();
        if skipped > 0 {
            writeln!(f, "  {} tag(s) already present, skipped", skipped)?;
        }

        if !self.failures.is_empty() {
            writeln!(f)?;
            writeln!(f, "Failures ({}):", self.failures.len())?;
            for failure in &self.failures {
                writeln!(f, "  - {}", failure)?;
            }
        }

        Ok(())
    }
}

/// Totals for one collection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CollectionReport {
    pub name: String,
    pub documents_seen: usize,
    pub documents_modified: usize,
    pub documents_failed: usize,
    pub tags_added: usize,
    pub tags_skipped: usize,
}

impl CollectionReport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl fmt::Display for CollectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} of {} document(s) tagged, {} tag(s)",
            self.name, self.documents_modified, self.documents_seen, self.tags_added
        )?;
        if self.documents_failed > 0 {
            write!(f, ", {} failed", self.documents_failed)?;
        }
        Ok(())
    }
}

/// One document that was skipped because of an error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DocumentFailure {
    pub collection: String,
    pub path: PathBuf,
    pub kind: ErrorKind,
    pub message: String,
}

impl fmt::Display for DocumentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?}): {}", self.path.display(), self.kind, self.message)
    }
}
