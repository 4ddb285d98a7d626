use std::path::{Path, PathBuf};

use crate::date::ResolvedDate;

/// One input file on its way through classification and placement.
#[derive(Debug, Clone)]
pub struct MediaFile {
    /// Location on disk
    pub path: PathBuf,
    /// Just the filename, used for pattern matching
    pub name: String,
    /// Capture date, if any metadata field had one
    pub date: Option<ResolvedDate>,
    /// Source tag from the filename catalog
    pub tag: Option<&'static str>,
}

impl MediaFile {
    pub fn new(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path: path.to_path_buf(),
            name,
            date: None,
            tag: None,
        }
    }
}
