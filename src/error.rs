use std::path::PathBuf;
use thiserror::Error;

/// The main error type for pagetag operations.
#[derive(Debug, Error)]
pub enum PagetagError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input location not found or not a directory: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Unknown entity label '{label}' (known labels: {known})")]
    UnknownEntityLabel { label: String, known: String },

    #[error("Invalid tag name '{name}': {message}")]
    InvalidTagName { name: String, message: String },

    #[error("Failed to read label map {path}: {source}")]
    LabelMapRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse label map from {path}: {source}")]
    LabelMapParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Tagger unavailable: {message}")]
    TaggerUnavailable { message: String },

    #[error("Failed to parse gazetteer CSV from {path}: {source}")]
    GazetteerParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid gazetteer {path}: {message}")]
    InvalidGazetteer { path: PathBuf, message: String },

    #[error("Invalid selection: {message}")]
    InvalidSelection { message: String },

    #[error("No documents found under {path}: {message}")]
    NoDocumentsFound { path: PathBuf, message: String },

    #[error("Failed to read {path}: {source}")]
    DocumentRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse PAGE XML from {path}: {message}")]
    PageXmlParse { path: PathBuf, message: String },

    #[error("Failed to write {path}: {source}")]
    DocumentWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Tagger failed: {message}")]
    TaggerFailed { message: String },

    #[error("Tagging failed on line '{line_id}': {message}")]
    Tagging { line_id: String, message: String },

    #[error("Span label '{label}' has no tag name in the label table")]
    UnmappedSpanLabel { label: String },

    #[error("Malformed custom attribute on line '{line_id}': {message}")]
    MalformedAnnotation { line_id: String, message: String },

    #[error("Invalid tag expression at byte {position}: {message}")]
    TagGrammar { position: usize, message: String },

    #[error("Failed to serialize report: {0}")]
    ReportSerialize(#[from] serde_json::Error),

    #[error("Batch finished with {failed} failed document(s) ({succeeded} succeeded)")]
    BatchIncomplete { failed: usize, succeeded: usize },
}

/// Coarse classification of errors, used for exit codes and batch summaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Invalid invocation; aborts before any document is touched.
    Configuration,
    /// Nothing to process under the given location.
    Discovery,
    /// A single document could not be loaded.
    DocumentParse,
    /// A single document could not be written back.
    DocumentWrite,
    /// The entity source failed, or its output could not be merged.
    Tagging,
    /// The batch completed but some documents failed.
    Batch,
}

impl PagetagError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PagetagError::Io(_)
            | PagetagError::InputNotFound { .. }
            | PagetagError::UnknownEntityLabel { .. }
            | PagetagError::InvalidTagName { .. }
            | PagetagError::LabelMapRead { .. }
            | PagetagError::LabelMapParse { .. }
            | PagetagError::TaggerUnavailable { .. }
            | PagetagError::GazetteerParse { .. }
            | PagetagError::InvalidGazetteer { .. }
            | PagetagError::InvalidSelection { .. }
            | PagetagError::ReportSerialize(_) => ErrorKind::Configuration,
            PagetagError::NoDocumentsFound { .. } => ErrorKind::Discovery,
            PagetagError::DocumentRead { .. } | PagetagError::PageXmlParse { .. } => {
                ErrorKind::DocumentParse
            }
            PagetagError::DocumentWrite { .. } => ErrorKind::DocumentWrite,
            PagetagError::TaggerFailed { .. }
            | PagetagError::Tagging { .. }
            | PagetagError::UnmappedSpanLabel { .. }
            | PagetagError::MalformedAnnotation { .. }
            | PagetagError::TagGrammar { .. } => ErrorKind::Tagging,
            PagetagError::BatchIncomplete { .. } => ErrorKind::Batch,
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self.kind() {
            ErrorKind::Batch
            | ErrorKind::DocumentParse
            | ErrorKind::DocumentWrite
            | ErrorKind::Tagging => 1,
            ErrorKind::Configuration => 2,
            ErrorKind::Discovery => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_distinguish_fatal_outcomes() {
        let config = PagetagError::InputNotFound {
            path: PathBuf::from("missing"),
        };
        let discovery = PagetagError::NoDocumentsFound {
            path: PathBuf::from("empty"),
            message: "no collections".to_string(),
        };
        let batch = PagetagError::BatchIncomplete {
            failed: 1,
            succeeded: 2,
        };

        assert_eq!(config.exit_code(), 2);
        assert_eq!(discovery.exit_code(), 3);
        assert_eq!(batch.exit_code(), 1);
    }

    #[test]
    fn document_errors_are_classified_by_stage() {
        let parse = PagetagError::PageXmlParse {
            path: PathBuf::from("a.xml"),
            message: "unexpected end of stream".to_string(),
        };
        let tagging = PagetagError::UnmappedSpanLabel {
            label: "MISC".to_string(),
        };

        assert_eq!(parse.kind(), ErrorKind::DocumentParse);
        assert_eq!(tagging.kind(), ErrorKind::Tagging);
    }
}
