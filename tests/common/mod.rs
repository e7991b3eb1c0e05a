#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

pub const PAGE_NS: &str = "http://schema.primaresearch.org/PAGE/gts/pagecontent/2013-07-15";

pub fn fixture(path: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(path)
}

/// Copy `tests/fixtures/<from>` into `dest`, since tagging rewrites files
/// in place.
pub fn copy_fixture_tree(from: &str, dest: &Path) {
    let src = fixture(from);
    for entry in WalkDir::new(&src) {
        let entry = entry.expect("walk fixtures");
        let rel = entry.path().strip_prefix(&src).expect("relative path");
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).expect("create dir");
        } else {
            fs::copy(entry.path(), &target).expect("copy fixture");
        }
    }
}

/// A minimal PAGE document with one `TextLine` per entry of `lines`.
pub fn page_xml(lines: &[&str]) -> String {
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<PcGts xmlns=\"{PAGE_NS}\">\n  <Page imageFilename=\"p.jpg\">\n    <TextRegion id=\"r1\">\n"
    );
    for (i, text) in lines.iter().enumerate() {
        xml.push_str(&format!(
            "      <TextLine id=\"l{}\">\n        <TextEquiv>\n          <Unicode>{}</Unicode>\n        </TextEquiv>\n      </TextLine>\n",
            i + 1,
            text
        ));
    }
    xml.push_str("    </TextRegion>\n  </Page>\n</PcGts>\n");
    xml
}

pub fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, contents).expect("write file");
}
