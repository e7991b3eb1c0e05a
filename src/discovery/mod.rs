//! Finding PAGE documents on disk and choosing which collections to process.
//!
//! Two layouts are understood:
//!
//! - **collections**: `<base>/<name>/page/*.xml`, one collection per
//!   sub-directory of `<base>` whose `page/` folder holds at least one
//!   `.xml` file (the layout Transkribus exports unpack into).
//! - **flat**: `<dir>/*.xml`, a single collection named after `<dir>`.
//!
//! Collections are sorted by name and documents by file name, so the
//! numbers printed by `pagetag list` are stable between runs.

use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::error::PagetagError;

const PAGE_DIR: &str = "page";

/// On-disk arrangement of the input location.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Layout {
    /// `collections` if any collection folder is found, else `flat`.
    #[default]
    Auto,
    Collections,
    Flat,
}

/// A named batch of documents sharing a storage location.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Collection {
    pub name: String,
    /// Directory holding the documents.
    pub root: PathBuf,
    pub documents: Vec<PathBuf>,
}

/// Which collections to process, by 1-based position in the discovered
/// list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    All,
    Include(Vec<usize>),
    Exclude(Vec<usize>),
}

/// Find collections under `input`.
pub fn discover_collections(input: &Path, layout: Layout) -> Result<Vec<Collection>, PagetagError> {
    if !input.is_dir() {
        return Err(PagetagError::InputNotFound {
            path: input.to_path_buf(),
        });
    }

    let collections = match layout {
        Layout::Collections => collection_folders(input)?,
        Layout::Flat => vec![flat_collection(input)?],
        Layout::Auto => {
            let found = collection_folders(input)?;
            if found.is_empty() {
                vec![flat_collection(input)?]
            } else {
                found
            }
        }
    };

    if collections.is_empty() {
        return Err(PagetagError::NoDocumentsFound {
            path: input.to_path_buf(),
            message: format!("no '<name>/{PAGE_DIR}/' folders with .xml files"),
        });
    }
    if collections.iter().all(|c| c.documents.is_empty()) {
        return Err(PagetagError::NoDocumentsFound {
            path: input.to_path_buf(),
            message: "no .xml files".to_string(),
        });
    }

    tracing::debug!(
        path = %input.display(),
        collections = collections.len(),
        documents = collections.iter().map(|c| c.documents.len()).sum::<usize>(),
        "discovered"
    );
    Ok(collections)
}

/// Apply `selection` to `collections`, keeping their order.
///
/// Numbers outside `1..=collections.len()` are rejected, as is a selection
/// that leaves nothing to process.
pub fn select_collections(
    collections: Vec<Collection>,
    selection: &Selection,
) -> Result<Vec<Collection>, PagetagError> {
    let numbers = match selection {
        Selection::All => return Ok(collections),
        Selection::Include(numbers) | Selection::Exclude(numbers) => numbers,
    };

    if let Some(bad) = numbers
        .iter()
        .find(|&&n| n == 0 || n > collections.len())
    {
        return Err(PagetagError::InvalidSelection {
            message: format!(
                "collection number {bad} is out of range (1-{})",
                collections.len()
            ),
        });
    }

    let include = matches!(selection, Selection::Include(_));
    let selected: Vec<Collection> = collections
        .into_iter()
        .enumerate()
        .filter(|(index, _)| numbers.contains(&(index + 1)) == include)
        .map(|(_, collection)| collection)
        .collect();

    if selected.is_empty() {
        return Err(PagetagError::InvalidSelection {
            message: "no collections left to process".to_string(),
        });
    }
    Ok(selected)
}

fn collection_folders(base: &Path) -> Result<Vec<Collection>, PagetagError> {
    let mut collections = Vec::new();

    for entry in WalkDir::new(base)
        .follow_links(true)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| walk_error(base, source))?;
        let page_dir = entry.path().join(PAGE_DIR);
        if !entry.file_type().is_dir() || !page_dir.is_dir() {
            continue;
        }

        let documents = xml_files(&page_dir)?;
        if documents.is_empty() {
            continue;
        }

        collections.push(Collection {
            name: entry.file_name().to_string_lossy().into_owned(),
            documents,
            root: page_dir,
        });
    }

    Ok(collections)
}

fn flat_collection(dir: &Path) -> Result<Collection, PagetagError> {
    let name = dir
        .canonicalize()
        .ok()
        .as_deref()
        .and_then(Path::file_name)
        .or_else(|| dir.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string());

    Ok(Collection {
        name,
        root: dir.to_path_buf(),
        documents: xml_files(dir)?,
    })
}

fn xml_files(dir: &Path) -> Result<Vec<PathBuf>, PagetagError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| walk_error(dir, source))?;
        if entry.file_type().is_file() && has_xml_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

fn has_xml_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
}

fn walk_error(dir: &Path, source: walkdir::Error) -> PagetagError {
    PagetagError::NoDocumentsFound {
        path: dir.to_path_buf(),
        message: format!("failed while traversing directory: {source}"),
    }
}
