//! Document processing: load, normalize, annotate, and write back one PAGE
//! file.
//!
//! A [`Document`] moves through `load → normalize → annotate → render →
//! persist`. Files that gain no tags are never rendered or written, so they
//! stay byte-identical to their input. Writes go to a temporary file in
//! the same directory that is then renamed over the source.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::annotate::{annotate_line, AnnotateOptions};
use crate::entity::EntitySource;
use crate::error::PagetagError;
use crate::page::{
    io_page_xml, normalize, PageDocument, XmlElement, CUSTOM_ATTRIBUTE, TEXT_LINE_ELEMENT,
};
use crate::tags::LabelTable;

/// Settings for processing documents.
#[derive(Clone, Debug, Default)]
pub struct ProcessOptions {
    pub table: LabelTable,
    pub annotate: AnnotateOptions,
    /// Annotate and count, but never write.
    pub dry_run: bool,
}

/// Per-document counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AnnotationStats {
    /// `TextLine` elements visited.
    pub lines_seen: usize,
    /// Lines whose custom attribute gained at least one tag.
    pub lines_tagged: usize,
    pub tags_added: usize,
    /// Spans left out by the skip-existing merge policy.
    pub tags_skipped: usize,
}

/// Result of processing one file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DocumentOutcome {
    pub path: PathBuf,
    #[serde(flatten)]
    pub stats: AnnotationStats,
    /// Whether the file was rewritten.
    pub written: bool,
}

/// A PAGE file being processed.
#[derive(Debug)]
pub struct Document {
    path: PathBuf,
    page: PageDocument,
}

impl Document {
    /// Parse the file at `path`.
    pub fn load(path: &Path) -> Result<Self, PagetagError> {
        let page = io_page_xml::read_page_xml(path)?;
        tracing::debug!(lines = page.text_line_count(), "loaded");
        Ok(Self {
            path: path.to_path_buf(),
            page,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page(&self) -> &PageDocument {
        &self.page
    }

    /// Strip namespaces so lines can be found by local name.
    pub fn normalize(&mut self) {
        normalize::strip(&mut self.page);
        tracing::debug!("normalized");
    }

    /// Tag every line with text and merge the spans into its custom
    /// attribute.
    pub fn annotate<S>(
        &mut self,
        source: &mut S,
        table: &LabelTable,
        options: &AnnotateOptions,
    ) -> Result<AnnotationStats, PagetagError>
    where
        S: EntitySource + ?Sized,
    {
        let stats = annotate_page(&mut self.page, &mut *source, table, options)?;
        tracing::debug!(
            lines = stats.lines_seen,
            tagged = stats.lines_tagged,
            tags = stats.tags_added,
            "annotated"
        );
        Ok(stats)
    }

    /// Serialize with the PAGE declaration and root namespace restored.
    pub fn render(&self) -> String {
        normalize::restore_namespace_on_serialize(&io_page_xml::to_page_xml_string(&self.page))
    }

    /// Overwrite the source file with `xml`.
    pub fn persist(&self, xml: &str) -> Result<(), PagetagError> {
        write_atomic(&self.path, xml.as_bytes()).map_err(|source| PagetagError::DocumentWrite {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(bytes = xml.len(), "written");
        Ok(())
    }
}

/// Run one file through the whole pipeline.
///
/// Any error leaves the file untouched, except a failed final rename which
/// leaves it with its previous content.
pub fn process_document<S>(
    path: &Path,
    source: &mut S,
    options: &ProcessOptions,
) -> Result<DocumentOutcome, PagetagError>
where
    S: EntitySource + ?Sized,
{
    let _span = tracing::debug_span!("document", path = %path.display()).entered();

    let mut document = Document::load(path)?;
    document.normalize();
    let stats = document.annotate(&mut *source, &options.table, &options.annotate)?;

    let written = if stats.tags_added == 0 {
        tracing::debug!("no tags added, leaving file unchanged");
        false
    } else if options.dry_run {
        tracing::debug!("dry run, not writing");
        false
    } else {
        let xml = document.render();
        document.persist(&xml)?;
        true
    };

    Ok(DocumentOutcome {
        path: path.to_path_buf(),
        stats,
        written,
    })
}

/// Annotate PAGE XML held in memory and return the rendered result.
///
/// Unlike [`process_document`] the output is rendered even when no tags
/// were added.
pub fn annotate_xml_str<S>(
    xml: &str,
    source: &mut S,
    table: &LabelTable,
    options: &AnnotateOptions,
) -> Result<(String, AnnotationStats), PagetagError>
where
    S: EntitySource + ?Sized,
{
    let mut page = io_page_xml::from_page_xml_str(xml)?;
    normalize::strip(&mut page);
    let stats = annotate_page(&mut page, source, table, options)?;
    let rendered =
        normalize::restore_namespace_on_serialize(&io_page_xml::to_page_xml_string(&page));
    Ok((rendered, stats))
}

fn annotate_page<S>(
    page: &mut PageDocument,
    source: &mut S,
    table: &LabelTable,
    options: &AnnotateOptions,
) -> Result<AnnotationStats, PagetagError>
where
    S: EntitySource + ?Sized,
{
    let mut stats = AnnotationStats::default();
    let mut visit =
        |line: &mut XmlElement| annotate_text_line(line, &mut *source, table, options, &mut stats);

    if page.root.name.local == TEXT_LINE_ELEMENT {
        visit(&mut page.root)?;
    } else {
        page.root.try_for_each_named_mut(TEXT_LINE_ELEMENT, &mut visit)?;
    }

    Ok(stats)
}

fn annotate_text_line<S>(
    line: &mut XmlElement,
    source: &mut S,
    table: &LabelTable,
    options: &AnnotateOptions,
    stats: &mut AnnotationStats,
) -> Result<(), PagetagError>
where
    S: EntitySource + ?Sized,
{
    stats.lines_seen += 1;
    let Some(text) = line.line_text() else {
        return Ok(());
    };
    let line_id = line
        .attribute("id")
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| format!("#{}", stats.lines_seen));

    let spans = source
        .tag_line(&text)
        .map_err(|err| PagetagError::Tagging {
            line_id: line_id.clone(),
            message: err.to_string(),
        })?;

    let chars = text.chars().count();
    for span in spans.iter().filter(|span| !span.fits(chars)) {
        tracing::warn!(
            line = %line_id,
            label = %span.label,
            offset = span.offset,
            length = span.length,
            chars,
            "entity span extends past the end of the line"
        );
    }

    let existing = line.attribute(CUSTOM_ATTRIBUTE).unwrap_or_default();
    let annotation = annotate_line(existing, &spans, table, options).map_err(|err| match err {
        PagetagError::TagGrammar { .. } => PagetagError::MalformedAnnotation {
            line_id: line_id.clone(),
            message: err.to_string(),
        },
        other => other,
    })?;

    stats.tags_skipped += annotation.skipped;
    if annotation.added > 0 {
        line.set_attribute(CUSTOM_ATTRIBUTE, annotation.attribute);
        stats.lines_tagged += 1;
        stats.tags_added += annotation.added;
    }
    Ok(())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;

    if let Ok(metadata) = fs::metadata(path) {
        temp.as_file().set_permissions(metadata.permissions())?;
    }

    temp.persist(path).map_err(|err| err.error)?;
    Ok(())
}
